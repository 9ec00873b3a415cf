use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::{CoachId, SessionId};
use crate::timer::{SessionType, TimerState};

/// Every state change in the engine produces an Event.
/// Front ends subscribe to them through [`Observer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TimerStarted {
        session_type: SessionType,
        remaining_secs: u32,
        /// `true` when continuing from a pause.
        resumed: bool,
        at: DateTime<Utc>,
    },
    TimerPaused {
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    TimerReset {
        session_type: SessionType,
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    Tick {
        remaining_secs: u32,
    },
    SessionTypeChanged {
        session_type: SessionType,
        remaining_secs: u32,
    },
    /// Countdown reached zero; the timer is stopped on `next`.
    PhaseCompleted {
        completed: SessionType,
        next: SessionType,
        at: DateTime<Utc>,
    },
    MessageChanged {
        message: String,
    },
    CoachChanged {
        coach_id: CoachId,
        name: String,
    },
    /// The server assigned an id to the current run.
    SessionRecorded {
        session_id: SessionId,
    },
    SessionFinalized {
        session_id: SessionId,
    },
    TodayCountUpdated {
        count: u32,
    },
    StateSnapshot {
        state: TimerState,
        session_type: SessionType,
        remaining_secs: u32,
        total_secs: u32,
        progress: f64,
        coach: Option<String>,
        message: String,
        today_session_count: u32,
        session_id: Option<SessionId>,
        at: DateTime<Utc>,
    },
}

/// Receives engine events. Closures taking `&Event` implement this.
pub trait Observer: Send {
    fn notify(&mut self, event: &Event);
}

impl<F> Observer for F
where
    F: FnMut(&Event) + Send,
{
    fn notify(&mut self, event: &Event) {
        self(event)
    }
}
