//! Cues and the sink that receives them.
//!
//! The scheduler decides *when* a cue fires. What a cue sounds or looks like
//! is up to the sink.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cue {
    Exhale,
    Inhale,
    FinalExhale,
    FinalInhale,
}

impl Cue {
    pub fn label(&self) -> &'static str {
        match self {
            Cue::Exhale => "exhale",
            Cue::Inhale => "inhale",
            Cue::FinalExhale => "final exhale",
            Cue::FinalInhale => "final inhale",
        }
    }
}

/// Receives cues synchronously from the scheduler.
///
/// Delivery is fire-and-forget: a sink that fails to play something must
/// swallow the failure itself.
pub trait CueSink {
    fn on_cue(&mut self, cue: Cue);
}

impl<F: FnMut(Cue)> CueSink for F {
    fn on_cue(&mut self, cue: Cue) {
        self(cue)
    }
}

/// Sink that drops every cue.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentSink;

impl CueSink for SilentSink {
    fn on_cue(&mut self, _cue: Cue) {}
}

/// Sink that records every cue it receives, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CueLog {
    cues: Vec<Cue>,
}

impl CueLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }

    pub fn len(&self) -> usize {
        self.cues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    pub fn clear(&mut self) {
        self.cues.clear();
    }
}

impl CueSink for CueLog {
    fn on_cue(&mut self, cue: Cue) {
        self.cues.push(cue);
    }
}
