use serde::{Deserialize, Serialize};

/// Gap between the last repeated taper cue and the final inhale.
pub const FINAL_GAP_MS: u64 = 2_000;
/// Spacing of the repeated taper cues.
pub const TAPER_TICK_MS: u64 = 1_000;

/// Parameters of the wind-down that follows the last regular pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaperPlan {
    /// Seconds between the final exhale cue and the first repeated cue.
    pub wait_secs: u32,
    /// Number of repeated exhale cues, one per second.
    pub repeats: u32,
}

impl TaperPlan {
    /// Lookup by exhale duration. First matching row wins.
    pub fn for_exhale(exhale_secs: u32) -> Self {
        let (wait_secs, repeats) = match exhale_secs {
            n if n >= 17 => (4, 12),
            16 => (3, 12),
            n @ 5..=15 => (2, n - 3),
            n @ 2..=4 => (1, n - 2),
            _ => (1, 0),
        };
        Self { wait_secs, repeats }
    }

    pub fn wait_ms(&self) -> u64 {
        u64::from(self.wait_secs) * 1000
    }

    /// Offset of repeated cue `index` from the final exhale cue.
    pub fn repeat_offset_ms(&self, index: u32) -> u64 {
        self.wait_ms() + u64::from(index) * TAPER_TICK_MS
    }

    /// Offset of the final inhale cue from the final exhale cue.
    ///
    /// With no repeats the final inhale lands on the wait mark.
    pub fn final_inhale_offset_ms(&self) -> u64 {
        match self.repeats {
            0 => self.wait_ms(),
            n => self.repeat_offset_ms(n - 1) + FINAL_GAP_MS,
        }
    }
}
