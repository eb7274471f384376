mod clock;
mod deadline;
mod scheduler;
mod session;
mod taper;
mod timers;

pub use clock::{Clock, ManualClock, SystemClock};
pub use deadline::{compute_deadline, deadline_from_remaining};
pub use scheduler::{BreathScheduler, Phase};
pub use session::{
    parse_time_of_day, parse_timezone, EndCondition, SessionConfig, BREATH_SECS_RANGE,
    ELAPSED_MINUTES_RANGE,
};
pub use taper::{TaperPlan, FINAL_GAP_MS, TAPER_TICK_MS};
pub use timers::{TimerHandle, TimerSet};
