//! # breathcycle Core Library
//!
//! Core logic for a guided breathing timer: alternating exhale and inhale
//! phases until an end condition is reached, followed by a tapering
//! "final exhale". The CLI is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Breath Scheduler**: a caller-driven state machine. The host sleeps until
//!   `next_due_ms()` and calls `tick()`; there is no internal thread.
//! - **Deadline Calculator**: turns a time of day (timezone-aware) or a minute
//!   budget into an absolute deadline.
//! - **Simulation**: runs a whole session on a manual clock to produce its
//!   cue timeline.
//! - **Storage**: TOML-based configuration.
//!
//! ## Key Components
//!
//! - [`BreathScheduler`]: Core state machine
//! - [`SessionConfig`]: Validated per-run configuration
//! - [`CueSink`]: Receives cues at phase transitions
//! - [`Config`]: Application configuration management

pub mod cue;
pub mod error;
pub mod events;
pub mod simulation;
pub mod storage;
pub mod timer;

pub use cue::{Cue, CueLog, CueSink, SilentSink};
pub use error::{ConfigError, CoreError, ValidationError};
pub use events::Event;
pub use simulation::{drive_until, simulate, Timeline, TimelineEntry};
pub use storage::{Config, EndMode};
pub use timer::{
    compute_deadline, BreathScheduler, Clock, EndCondition, ManualClock, Phase, SessionConfig,
    SystemClock, TaperPlan,
};
