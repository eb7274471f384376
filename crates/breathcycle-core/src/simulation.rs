//! Deterministic simulation of a session.
//!
//! Runs the real scheduler on a [`ManualClock`], jumping straight from one
//! wakeup to the next. Used for dry-run timelines and for tests that need to
//! walk through many minutes of a session.

use serde::{Deserialize, Serialize};

use crate::cue::{Cue, CueSink, SilentSink};
use crate::error::ValidationError;
use crate::events::Event;
use crate::timer::{BreathScheduler, Clock, ManualClock, Phase, SessionConfig, TaperPlan};

/// One cue in a simulated session, relative to its start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub offset_ms: u64,
    pub cue: Cue,
    pub phase: Phase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taper_index: Option<u32>,
}

/// Complete cue timeline of a session run without interruption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeline {
    pub started_at_ms: u64,
    pub deadline_ms: u64,
    pub finished_at_ms: u64,
    /// Regular exhale/inhale pairs, including the one that crossed the deadline.
    pub pairs: u32,
    pub taper: TaperPlan,
    pub entries: Vec<TimelineEntry>,
}

impl Timeline {
    pub fn duration_ms(&self) -> u64 {
        self.finished_at_ms.saturating_sub(self.started_at_ms)
    }

    /// How far past the deadline the session ends. Zero if it ends in time.
    pub fn overrun_ms(&self) -> u64 {
        self.finished_at_ms.saturating_sub(self.deadline_ms)
    }

    pub fn cues(&self) -> impl Iterator<Item = (u64, Cue)> + '_ {
        self.entries.iter().map(|e| (e.offset_ms, e.cue))
    }
}

/// Fire every wakeup up to `until_ms`, moving the clock to each one in turn,
/// then leave the clock at `until_ms`. The clock never moves backwards.
pub fn drive_until<S: CueSink>(
    scheduler: &mut BreathScheduler<ManualClock, S>,
    until_ms: u64,
) -> Vec<Event> {
    let mut events = Vec::new();
    while let Some(due) = scheduler.next_due_ms().filter(|due| *due <= until_ms) {
        let now = scheduler.clock().now_ms();
        scheduler.clock().set(due.max(now));
        events.extend(scheduler.tick());
    }
    let now = scheduler.clock().now_ms();
    scheduler.clock().set(until_ms.max(now));
    events
}

/// Run a full session starting at `start_ms` and collect its cues.
pub fn simulate(config: SessionConfig, start_ms: u64) -> Result<Timeline, ValidationError> {
    let mut scheduler = BreathScheduler::new(ManualClock::new(start_ms), SilentSink);
    let mut events = scheduler.start(config)?;
    let deadline_ms = scheduler.deadline_ms().unwrap_or(start_ms);

    while let Some(due) = scheduler.next_due_ms() {
        scheduler.clock().set(due);
        events.extend(scheduler.tick());
    }

    let mut finished_at_ms = scheduler.clock().now_ms();
    let mut pairs = 0;
    let mut entries = Vec::new();
    for event in &events {
        match event {
            Event::Cue {
                cue,
                phase,
                taper_index,
                ..
            } => {
                if *phase == Phase::Exhale {
                    pairs += 1;
                }
                entries.push(TimelineEntry {
                    offset_ms: event.at_ms().saturating_sub(start_ms),
                    cue: *cue,
                    phase: *phase,
                    taper_index: *taper_index,
                });
            }
            Event::SessionStopped { .. } => finished_at_ms = event.at_ms(),
            _ => {}
        }
    }

    Ok(Timeline {
        started_at_ms: start_ms,
        deadline_ms,
        finished_at_ms,
        pairs,
        taper: TaperPlan::for_exhale(config.exhale_secs),
        entries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cue::CueLog;

    fn utc(exhale: u32, inhale: u32, minutes: u32) -> SessionConfig {
        SessionConfig::elapsed(exhale, inhale, minutes, chrono_tz::UTC)
    }

    #[test]
    fn short_session_timeline() {
        let timeline = simulate(utc(2, 2, 1), 0).unwrap();
        // Pairs start at 0, 4000, ..., 60000; the one at 60000 overruns.
        assert_eq!(timeline.pairs, 16);
        assert_eq!(timeline.deadline_ms, 60_000);
        assert_eq!(timeline.finished_at_ms, 67_000);
        assert_eq!(timeline.overrun_ms(), 7_000);

        let tail: Vec<(u64, Cue)> = timeline.cues().skip(30).collect();
        assert_eq!(
            tail,
            vec![
                (60_000, Cue::Exhale),
                (62_000, Cue::Inhale),
                (64_000, Cue::FinalExhale),
                (65_000, Cue::FinalInhale),
            ]
        );
    }

    #[test]
    fn offsets_are_relative_to_start() {
        let timeline = simulate(utc(2, 2, 1), 1_000_000).unwrap();
        assert_eq!(timeline.entries[0].offset_ms, 0);
        assert_eq!(timeline.duration_ms(), 67_000);
    }

    #[test]
    fn taper_repeats_appear_in_timeline() {
        let timeline = simulate(utc(7, 3, 1), 0).unwrap();
        let repeats: Vec<u32> = timeline
            .entries
            .iter()
            .filter_map(|e| e.taper_index)
            .collect();
        assert_eq!(repeats, vec![0, 1, 2, 3]);
        assert_eq!(timeline.taper, TaperPlan { wait_secs: 2, repeats: 4 });
    }

    #[test]
    fn invalid_config_is_rejected() {
        assert!(simulate(utc(2, 0, 1), 0).is_err());
    }

    #[test]
    fn drive_until_never_rewinds_clock() {
        let mut s = BreathScheduler::new(ManualClock::new(10_000), CueLog::new());
        s.start(utc(2, 2, 1)).unwrap();
        drive_until(&mut s, 5_000);
        assert_eq!(s.clock().now_ms(), 10_000);
        let events = drive_until(&mut s, 14_000);
        assert_eq!(events.len(), 2);
        assert_eq!(s.clock().now_ms(), 14_000);
    }
}
