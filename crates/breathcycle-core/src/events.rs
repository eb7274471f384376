use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cue::Cue;
use crate::timer::Phase;

/// Every state change of a session produces an Event.
/// Hosts print or forward them; the scheduler never reads them back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    SessionStarted {
        exhale_secs: u32,
        inhale_secs: u32,
        deadline_ms: u64,
        at: DateTime<Utc>,
    },
    /// A cue was delivered to the sink.
    Cue {
        cue: Cue,
        phase: Phase,
        /// Position within the taper's repeated cues, if this is one of them.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        taper_index: Option<u32>,
        at: DateTime<Utc>,
    },
    /// The lookahead diverted the session into its wind-down.
    TaperStarted {
        wait_secs: u32,
        repeats: u32,
        at: DateTime<Utc>,
    },
    SessionPaused {
        phase: Phase,
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    SessionResumed {
        deadline_ms: u64,
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    /// `completed` is true when the taper ran to its end, false on an explicit stop.
    SessionStopped {
        completed: bool,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        phase: Phase,
        running: bool,
        paused: bool,
        started_at_ms: Option<u64>,
        deadline_ms: Option<u64>,
        remaining_ms: u64,
        progress_pct: f64,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Event::SessionStarted { at, .. }
            | Event::Cue { at, .. }
            | Event::TaperStarted { at, .. }
            | Event::SessionPaused { at, .. }
            | Event::SessionResumed { at, .. }
            | Event::SessionStopped { at, .. }
            | Event::StateSnapshot { at, .. } => *at,
        }
    }

    pub fn at_ms(&self) -> u64 {
        self.at().timestamp_millis().max(0) as u64
    }

    /// The cue carried by this event, if any.
    pub fn cue(&self) -> Option<Cue> {
        match self {
            Event::Cue { cue, .. } => Some(*cue),
            _ => None,
        }
    }
}

/// Clock milliseconds as a UTC timestamp.
pub(crate) fn stamp(ms: u64) -> DateTime<Utc> {
    i64::try_from(ms)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .unwrap_or_default()
}
