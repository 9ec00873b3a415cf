mod engine;
mod session_type;

pub use engine::{
    format_clock, TimerEngine, TimerState, BREAK_EARNED_MESSAGE, MESSAGE_REFRESH_SECS,
    PAUSED_MESSAGE,
};
pub use session_type::{ApiCategory, SessionType};
