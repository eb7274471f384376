use breathcycle_core::{simulate, Clock, SystemClock};
use clap::Args;

use super::session::{format_remaining, local_time, SessionArgs};

#[derive(Args, Debug)]
pub struct PlanArgs {
    #[command(flatten)]
    pub session: SessionArgs,
    /// List every cue, not just the summary
    #[arg(long)]
    pub all: bool,
    /// Print the timeline as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: PlanArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (_, session) = args.session.resolve()?;
    let timeline = simulate(session, SystemClock.now_ms())?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&timeline)?);
        return Ok(());
    }

    let tz = session.timezone;
    println!(
        "Deadline:     {} ({tz})",
        local_time(timeline.deadline_ms, tz, "%Y-%m-%d %H:%M")
    );
    println!(
        "Pairs:        {} (exhale {}s, inhale {}s)",
        timeline.pairs, session.exhale_secs, session.inhale_secs
    );
    println!(
        "Final exhale: wait {}s, {} repeats",
        timeline.taper.wait_secs, timeline.taper.repeats
    );
    println!(
        "Ends:         {} ({} after deadline)",
        local_time(timeline.finished_at_ms, tz, "%H:%M:%S"),
        format_remaining(timeline.overrun_ms())
    );

    if args.all {
        for entry in &timeline.entries {
            let label = match entry.taper_index {
                Some(index) => format!("  {} ({})", entry.cue.label(), index + 1),
                None => entry.cue.label().to_string(),
            };
            println!("+{:>8}  {label}", format_remaining(entry.offset_ms));
        }
    }
    Ok(())
}
