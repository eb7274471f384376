//! Breath cycle scheduler.
//!
//! An explicit state machine over a single owned timer set. It never blocks
//! and has no thread of its own: the host asks [`BreathScheduler::next_due_ms`]
//! when to wake up and then calls [`BreathScheduler::tick`].
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Exhale <-> Inhale -> FinalExhale -> FinalInhale -> Idle
//! ```
//!
//! Before each exhale/inhale pair the scheduler checks whether the pair would
//! end past the deadline. If so the pair still runs in full, and the taper
//! begins when its inhale ends.
//!
//! ## Usage
//!
//! ```ignore
//! let mut scheduler = BreathScheduler::new(SystemClock, sink);
//! scheduler.start(config)?;
//! // In a loop:
//! sleep_until(scheduler.next_due_ms());
//! scheduler.tick();
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::clock::Clock;
use super::deadline::{compute_deadline, deadline_from_remaining};
use super::session::SessionConfig;
use super::taper::TaperPlan;
use super::timers::TimerSet;
use crate::cue::{Cue, CueSink};
use crate::error::ValidationError;
use crate::events::{stamp, Event};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Exhale,
    Inhale,
    FinalExhale,
    FinalInhale,
}

/// What a pending wakeup does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wake {
    /// End of an exhale. `overrun` was decided when the pair began.
    Inhale { overrun: bool },
    /// End of an inhale.
    PairDone { overrun: bool },
    TaperRepeat { index: u32 },
    FinalInhale,
    Finish,
}

#[derive(Debug, PartialEq, Eq)]
enum Step {
    Continue,
    Finished,
}

/// Everything that exists only while a session runs.
#[derive(Debug)]
struct RunState {
    config: SessionConfig,
    phase: Phase,
    started_at_ms: u64,
    deadline_ms: u64,
    paused: bool,
    /// Elapsed-mode budget frozen at pause time.
    paused_remaining_ms: Option<u64>,
    timers: TimerSet<Wake>,
}

impl RunState {
    fn remaining_ms(&self, now_ms: u64) -> u64 {
        match self.paused_remaining_ms {
            Some(frozen) if self.paused => frozen,
            _ => self.deadline_ms.saturating_sub(now_ms),
        }
    }

    fn progress_pct(&self, now_ms: u64) -> f64 {
        let total = self.deadline_ms.saturating_sub(self.started_at_ms).max(1);
        let elapsed = self
            .deadline_ms
            .saturating_sub(self.remaining_ms(now_ms))
            .saturating_sub(self.started_at_ms);
        (elapsed as f64 / total as f64 * 100.0).clamp(0.0, 100.0)
    }

    fn enter<S: CueSink>(
        &mut self,
        sink: &mut S,
        phase: Phase,
        cue: Cue,
        at_ms: u64,
        events: &mut Vec<Event>,
    ) {
        debug!(?phase, at_ms, "phase transition");
        self.phase = phase;
        sink.on_cue(cue);
        events.push(Event::Cue {
            cue,
            phase,
            taper_index: None,
            at: stamp(at_ms),
        });
    }

    /// Start an exhale/inhale pair at `at_ms`.
    fn begin_pair<S: CueSink>(&mut self, sink: &mut S, at_ms: u64, events: &mut Vec<Event>) {
        // A pair whose end cannot be represented is past any deadline.
        let overrun = at_ms
            .checked_add(self.config.pair_ms())
            .map_or(true, |end| end > self.deadline_ms);
        if overrun {
            debug!(at_ms, deadline_ms = self.deadline_ms, "last pair before taper");
        }
        self.enter(sink, Phase::Exhale, Cue::Exhale, at_ms, events);
        self.timers
            .schedule(at_ms.saturating_add(self.config.exhale_ms()), Wake::Inhale { overrun });
    }

    fn begin_taper<S: CueSink>(&mut self, sink: &mut S, at_ms: u64, events: &mut Vec<Event>) {
        let plan = TaperPlan::for_exhale(self.config.exhale_secs);
        info!(
            wait_secs = plan.wait_secs,
            repeats = plan.repeats,
            "starting final exhale"
        );
        self.enter(sink, Phase::FinalExhale, Cue::FinalExhale, at_ms, events);
        events.push(Event::TaperStarted {
            wait_secs: plan.wait_secs,
            repeats: plan.repeats,
            at: stamp(at_ms),
        });
        for index in 0..plan.repeats {
            self.timers.schedule(
                at_ms.saturating_add(plan.repeat_offset_ms(index)),
                Wake::TaperRepeat { index },
            );
        }
        self.timers
            .schedule(at_ms.saturating_add(plan.final_inhale_offset_ms()), Wake::FinalInhale);
    }

    fn fire<S: CueSink>(
        &mut self,
        sink: &mut S,
        due_ms: u64,
        wake: Wake,
        events: &mut Vec<Event>,
    ) -> Step {
        match wake {
            Wake::Inhale { overrun } => {
                self.enter(sink, Phase::Inhale, Cue::Inhale, due_ms, events);
                self.timers
                    .schedule(due_ms.saturating_add(self.config.inhale_ms()), Wake::PairDone { overrun });
            }
            Wake::PairDone { overrun: true } => self.begin_taper(sink, due_ms, events),
            Wake::PairDone { overrun: false } => self.begin_pair(sink, due_ms, events),
            Wake::TaperRepeat { index } => {
                debug!(index, "taper cue");
                sink.on_cue(Cue::Exhale);
                events.push(Event::Cue {
                    cue: Cue::Exhale,
                    phase: self.phase,
                    taper_index: Some(index),
                    at: stamp(due_ms),
                });
            }
            Wake::FinalInhale => {
                self.enter(sink, Phase::FinalInhale, Cue::FinalInhale, due_ms, events);
                self.timers
                    .schedule(due_ms.saturating_add(self.config.inhale_ms()), Wake::Finish);
            }
            Wake::Finish => return Step::Finished,
        }
        Step::Continue
    }
}

/// Breath cycle state machine.
///
/// Owns its run state exclusively. Callers read snapshots through the query
/// methods and drive it with `start`/`pause`/`resume`/`stop`/`tick`.
#[derive(Debug)]
pub struct BreathScheduler<C, S> {
    clock: C,
    sink: S,
    run: Option<RunState>,
}

impl<C: Clock, S: CueSink> BreathScheduler<C, S> {
    pub fn new(clock: C, sink: S) -> Self {
        Self {
            clock,
            sink,
            run: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> Phase {
        self.run.as_ref().map_or(Phase::Idle, |r| r.phase)
    }

    /// True from `start` until the session stops, including while paused.
    pub fn is_running(&self) -> bool {
        self.run.is_some()
    }

    pub fn is_paused(&self) -> bool {
        self.run.as_ref().is_some_and(|r| r.paused)
    }

    pub fn config(&self) -> Option<&SessionConfig> {
        self.run.as_ref().map(|r| &r.config)
    }

    pub fn started_at_ms(&self) -> Option<u64> {
        self.run.as_ref().map(|r| r.started_at_ms)
    }

    pub fn deadline_ms(&self) -> Option<u64> {
        self.run.as_ref().map(|r| r.deadline_ms)
    }

    /// Time left before the deadline; the frozen budget while paused in
    /// elapsed mode; zero when idle.
    pub fn remaining_ms(&self) -> u64 {
        let now = self.clock.now_ms();
        self.run.as_ref().map_or(0, |r| r.remaining_ms(now))
    }

    /// 0.0 .. 100.0 share of the session window already used.
    pub fn progress_pct(&self) -> f64 {
        let now = self.clock.now_ms();
        self.run.as_ref().map_or(0.0, |r| r.progress_pct(now))
    }

    /// When the host should next call `tick`. `None` while idle or paused.
    pub fn next_due_ms(&self) -> Option<u64> {
        self.run
            .as_ref()
            .filter(|r| !r.paused)
            .and_then(|r| r.timers.next_due_ms())
    }

    pub fn pending_timers(&self) -> usize {
        self.run.as_ref().map_or(0, |r| r.timers.len())
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        let now = self.clock.now_ms();
        Event::StateSnapshot {
            phase: self.phase(),
            running: self.is_running(),
            paused: self.is_paused(),
            started_at_ms: self.started_at_ms(),
            deadline_ms: self.deadline_ms(),
            remaining_ms: self.run.as_ref().map_or(0, |r| r.remaining_ms(now)),
            progress_pct: self.run.as_ref().map_or(0.0, |r| r.progress_pct(now)),
            at: stamp(now),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Validate `config` and begin with an exhale.
    ///
    /// Returns an empty list when a session is already running. On a
    /// validation error nothing changes.
    pub fn start(&mut self, config: SessionConfig) -> Result<Vec<Event>, ValidationError> {
        if self.run.is_some() {
            debug!("start ignored: session already running");
            return Ok(Vec::new());
        }
        config.validate()?;
        let now = self.clock.now_ms();
        let deadline_ms = compute_deadline(&config, now)?;

        info!(
            exhale_secs = config.exhale_secs,
            inhale_secs = config.inhale_secs,
            deadline_ms,
            "session started"
        );
        let mut run = RunState {
            config,
            phase: Phase::Exhale,
            started_at_ms: now,
            deadline_ms,
            paused: false,
            paused_remaining_ms: None,
            timers: TimerSet::new(),
        };
        let mut events = vec![Event::SessionStarted {
            exhale_secs: config.exhale_secs,
            inhale_secs: config.inhale_secs,
            deadline_ms,
            at: stamp(now),
        }];
        run.begin_pair(&mut self.sink, now, &mut events);
        self.run = Some(run);
        Ok(events)
    }

    /// Cancel every pending wakeup and hold the current phase.
    pub fn pause(&mut self) -> Option<Event> {
        let now = self.clock.now_ms();
        let run = self.run.as_mut().filter(|r| !r.paused)?;
        let dropped = run.timers.clear();
        if run.config.end.is_elapsed() {
            run.paused_remaining_ms = Some(run.deadline_ms.saturating_sub(now));
        }
        run.paused = true;
        info!(phase = ?run.phase, dropped, "session paused");
        Some(Event::SessionPaused {
            phase: run.phase,
            remaining_ms: run.remaining_ms(now),
            at: stamp(now),
        })
    }

    /// Continue a paused session with a fresh exhale.
    ///
    /// In elapsed mode the deadline moves so the budget left at pause time is
    /// preserved. A wall-clock deadline never moves.
    pub fn resume(&mut self) -> Vec<Event> {
        let now = self.clock.now_ms();
        let Some(run) = self.run.as_mut().filter(|r| r.paused) else {
            return Vec::new();
        };
        if let Some(remaining) = run.paused_remaining_ms.take() {
            run.deadline_ms = deadline_from_remaining(now, remaining);
        }
        run.paused = false;
        info!(deadline_ms = run.deadline_ms, "session resumed");
        let mut events = vec![Event::SessionResumed {
            deadline_ms: run.deadline_ms,
            remaining_ms: run.remaining_ms(now),
            at: stamp(now),
        }];
        run.begin_pair(&mut self.sink, now, &mut events);
        events
    }

    /// Cancel everything and return to `Idle`. No-op when idle.
    pub fn stop(&mut self) -> Option<Event> {
        let now = self.clock.now_ms();
        self.finish(now, false)
    }

    /// Fire every wakeup due at the current clock time, in order.
    pub fn tick(&mut self) -> Vec<Event> {
        let now = self.clock.now_ms();
        let mut events = Vec::new();
        loop {
            let Some(run) = self.run.as_mut() else {
                break;
            };
            if run.paused {
                break;
            }
            let Some((handle, wake)) = run.timers.pop_due(now) else {
                break;
            };
            if run.fire(&mut self.sink, handle.due_ms(), wake, &mut events) == Step::Finished {
                events.extend(self.finish(handle.due_ms(), true));
                break;
            }
        }
        events
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn finish(&mut self, at_ms: u64, completed: bool) -> Option<Event> {
        let mut run = self.run.take()?;
        let dropped = run.timers.clear();
        info!(completed, dropped, "session stopped");
        Some(Event::SessionStopped {
            completed,
            at: stamp(at_ms),
        })
    }
}
