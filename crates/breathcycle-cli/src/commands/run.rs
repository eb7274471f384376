use std::io::Write;
use std::time::Duration;

use breathcycle_core::{BreathScheduler, Clock, Cue, CueSink, Event, SessionConfig, SystemClock};
use chrono_tz::Tz;
use clap::Args;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use super::session::{format_remaining, local_time, SessionArgs};

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub session: SessionArgs,
    /// Do not ring the terminal bell on cues
    #[arg(long)]
    pub quiet: bool,
    /// Print events as JSON lines
    #[arg(long)]
    pub json: bool,
}

/// Commands typed on stdin while a session runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    Pause,
    Resume,
    Stop,
    Status,
}

impl Control {
    fn parse(line: &str) -> Option<Self> {
        match line.trim().to_ascii_lowercase().as_str() {
            "p" | "pause" => Some(Control::Pause),
            "r" | "resume" => Some(Control::Resume),
            "s" | "stop" | "q" | "quit" => Some(Control::Stop),
            "t" | "status" => Some(Control::Status),
            _ => None,
        }
    }
}

/// Bell pattern per cue, so phases can be told apart with eyes closed.
fn bell_pattern(cue: Cue) -> &'static [u8] {
    match cue {
        Cue::Exhale => &b"\x07"[..],
        Cue::Inhale | Cue::FinalInhale => &b"\x07\x07"[..],
        Cue::FinalExhale => &b"\x07\x07\x07"[..],
    }
}

/// Rings the terminal bell. Write failures are ignored.
struct BellSink {
    enabled: bool,
}

impl CueSink for BellSink {
    fn on_cue(&mut self, cue: Cue) {
        if self.enabled {
            let mut out = std::io::stdout();
            let _ = out.write_all(bell_pattern(cue));
            let _ = out.flush();
        }
    }
}

struct Printer {
    tz: Tz,
    json: bool,
}

impl Printer {
    fn emit(&self, event: &Event) -> Result<(), serde_json::Error> {
        if self.json {
            println!("{}", serde_json::to_string(event)?);
            return Ok(());
        }
        let clock = local_time(event.at_ms(), self.tz, "%H:%M:%S");
        match event {
            Event::SessionStarted {
                exhale_secs,
                inhale_secs,
                deadline_ms,
                ..
            } => {
                println!(
                    "Session started: exhale {exhale_secs}s, inhale {inhale_secs}s, until {} ({})",
                    local_time(*deadline_ms, self.tz, "%Y-%m-%d %H:%M"),
                    self.tz
                );
                println!("Controls: p = pause, r = resume, s = stop, t = status");
            }
            Event::Cue {
                cue,
                taper_index: Some(index),
                ..
            } => println!("[{clock}]   {} ({})", cue.label(), index + 1),
            Event::Cue { cue, .. } => println!("[{clock}] {}", cue.label()),
            Event::TaperStarted {
                wait_secs, repeats, ..
            } => println!("[{clock}] winding down: wait {wait_secs}s, {repeats} repeats"),
            Event::SessionPaused { remaining_ms, .. } => {
                println!("[{clock}] paused ({} left)", format_remaining(*remaining_ms))
            }
            Event::SessionResumed { remaining_ms, .. } => {
                println!("[{clock}] resumed ({} left)", format_remaining(*remaining_ms))
            }
            Event::SessionStopped { completed, .. } => {
                if *completed {
                    println!("[{clock}] session complete");
                } else {
                    println!("[{clock}] stopped");
                }
            }
            Event::StateSnapshot {
                phase,
                paused,
                remaining_ms,
                progress_pct,
                ..
            } => println!(
                "[{clock}] {:?}{} | {} left | {:.0}%",
                phase,
                if *paused { " (paused)" } else { "" },
                format_remaining(*remaining_ms),
                progress_pct
            ),
        }
        Ok(())
    }

    fn emit_all<'a>(&self, events: impl IntoIterator<Item = &'a Event>) -> Result<(), serde_json::Error> {
        for event in events {
            self.emit(event)?;
        }
        Ok(())
    }
}

async fn read_controls(tx: mpsc::UnboundedSender<Control>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        match Control::parse(&line) {
            Some(control) => {
                if tx.send(control).is_err() {
                    break;
                }
            }
            None if line.trim().is_empty() => {}
            None => eprintln!("unknown command '{}': use p, r, s or t", line.trim()),
        }
    }
}

async fn sleep_for(wait: Option<Duration>) {
    match wait {
        Some(d) => tokio::time::sleep(d).await,
        None => std::future::pending().await,
    }
}

async fn drive(
    session: SessionConfig,
    bell: bool,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let printer = Printer {
        tz: session.timezone,
        json,
    };
    let mut scheduler = BreathScheduler::new(SystemClock, BellSink { enabled: bell });
    printer.emit_all(&scheduler.start(session)?)?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    tokio::spawn(read_controls(tx));
    let mut stdin_open = true;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    while scheduler.is_running() {
        let wait = scheduler
            .next_due_ms()
            .map(|due| Duration::from_millis(due.saturating_sub(SystemClock.now_ms())));

        tokio::select! {
            _ = sleep_for(wait) => printer.emit_all(&scheduler.tick())?,
            control = rx.recv(), if stdin_open => match control {
                Some(Control::Pause) => printer.emit_all(&scheduler.pause())?,
                Some(Control::Resume) => printer.emit_all(&scheduler.resume())?,
                Some(Control::Stop) => printer.emit_all(&scheduler.stop())?,
                Some(Control::Status) => printer.emit(&scheduler.snapshot())?,
                None => {
                    tracing::debug!("stdin closed");
                    stdin_open = false;
                    // Nobody can resume a paused session any more.
                    if scheduler.is_paused() {
                        printer.emit_all(&scheduler.stop())?;
                    }
                }
            },
            _ = &mut ctrl_c => printer.emit_all(&scheduler.stop())?,
        }
    }
    Ok(())
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (config, session) = args.session.resolve()?;
    // JSON lines share stdout with the bell.
    let bell = config.cues.bell && !args.quiet && !args.json;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(drive(session, bell, args.json));
    // The stdin reader may still be blocked on a read.
    runtime.shutdown_background();
    result
}
