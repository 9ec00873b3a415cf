//! Timer engine implementation.
//!
//! The engine is a single-owner state machine. It does not use internal
//! threads: the owner calls `tick()` once per elapsed second while the
//! timer is running, and feeds background task results back through
//! `apply()`.
//!
//! ## State Transitions
//!
//! ```text
//! Stopped -> Running <-> Paused
//!    ^          |          |
//!    +----------+----------+   (reset, or countdown reaching zero)
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new(Box::new(runner)).with_coach(zeus);
//! engine.start();
//! // Once per second:
//! engine.tick(); // Returns Some(Event::PhaseCompleted { .. }) at zero
//! // Whenever the runner reports back:
//! engine.apply(outcome);
//! ```

use std::fmt;

use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand_pcg::Mcg128Xsl64;
use serde::{Deserialize, Serialize};

use super::session_type::SessionType;
use crate::api::{Coach, NewSession, SessionId};
use crate::config::TimerConfig;
use crate::events::{Event, Observer};
use crate::tasks::{BackgroundTask, RunId, TaskOutcome, TaskRunner};

/// Remaining-time interval at which the coach message is refreshed.
pub const MESSAGE_REFRESH_SECS: u32 = 300;
pub const PAUSED_MESSAGE: &str = "Paused. Ready when you are.";
pub const BREAK_EARNED_MESSAGE: &str = "Great work! Time for a break.";

/// Completed runs still waiting for a server id. Creates that failed never
/// report back, so the oldest entries are dropped past this bound.
const MAX_UNFINISHED_RUNS: usize = 16;

/// Format seconds as `MM:SS`.
pub fn format_clock(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    #[default]
    Stopped,
    Running,
    Paused,
}

impl TimerState {
    pub fn is_active(&self) -> bool {
        *self == TimerState::Running
    }

    pub fn can_start(&self) -> bool {
        *self != TimerState::Running
    }

    pub fn can_pause(&self) -> bool {
        *self == TimerState::Running
    }

    pub fn can_reset(&self) -> bool {
        *self != TimerState::Stopped
    }
}

/// Core timer engine.
pub struct TimerEngine {
    state: TimerState,
    session_type: SessionType,
    remaining_secs: u32,
    coach: Option<Coach>,
    current_session_id: Option<SessionId>,
    session_started_at: Option<DateTime<Utc>>,
    current_message: String,
    today_session_count: u32,
    sessions_before_long_break: u32,
    /// Incremented on every start from `Stopped`.
    run: RunId,
    /// Completed runs whose server id had not arrived yet, oldest first.
    unfinished: Vec<(RunId, DateTime<Utc>)>,
    runner: Box<dyn TaskRunner>,
    observers: Vec<Box<dyn Observer>>,
    rng: Mcg128Xsl64,
}

impl TimerEngine {
    /// Create a stopped engine on a focus phase.
    pub fn new(runner: Box<dyn TaskRunner>) -> Self {
        Self {
            state: TimerState::Stopped,
            session_type: SessionType::Focus,
            remaining_secs: SessionType::Focus.default_duration_secs(),
            coach: None,
            current_session_id: None,
            session_started_at: None,
            current_message: String::new(),
            today_session_count: 0,
            sessions_before_long_break: TimerConfig::default().sessions_before_long_break,
            run: 0,
            unfinished: Vec::new(),
            runner,
            observers: Vec::new(),
            rng: Mcg128Xsl64::from_entropy(),
        }
    }

    pub fn with_config(mut self, config: &TimerConfig) -> Self {
        self.sessions_before_long_break = config.sessions_before_long_break.max(1);
        self
    }

    pub fn with_coach(mut self, coach: Coach) -> Self {
        self.set_coach(coach);
        self
    }

    /// Deterministic message picks, for tests and replays.
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng = Mcg128Xsl64::seed_from_u64(seed);
        self
    }

    pub fn subscribe<O: Observer + 'static>(&mut self, observer: O) {
        self.observers.push(Box::new(observer));
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn session_type(&self) -> SessionType {
        self.session_type
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn total_secs(&self) -> u32 {
        self.session_type.default_duration_secs()
    }

    pub fn coach(&self) -> Option<&Coach> {
        self.coach.as_ref()
    }

    pub fn current_session_id(&self) -> Option<SessionId> {
        self.current_session_id
    }

    pub fn session_started_at(&self) -> Option<DateTime<Utc>> {
        self.session_started_at
    }

    pub fn current_message(&self) -> &str {
        &self.current_message
    }

    pub fn today_session_count(&self) -> u32 {
        self.today_session_count
    }

    /// 0.0 .. 1.0 progress within the current phase.
    pub fn progress(&self) -> f64 {
        let total = self.total_secs();
        if total == 0 {
            return 0.0;
        }
        1.0 - (self.remaining_secs as f64 / total as f64)
    }

    /// Remaining time as `MM:SS`.
    pub fn time_string(&self) -> String {
        format_clock(self.remaining_secs)
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            state: self.state,
            session_type: self.session_type,
            remaining_secs: self.remaining_secs,
            total_secs: self.total_secs(),
            progress: self.progress(),
            coach: self.coach.as_ref().map(|c| c.name.clone()),
            message: self.current_message.clone(),
            today_session_count: self.today_session_count,
            session_id: self.current_session_id,
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Option<Event> {
        if !self.state.can_start() {
            return None;
        }

        let resumed = self.state == TimerState::Paused;
        if !resumed {
            let now = Utc::now();
            self.run += 1;
            self.session_started_at = Some(now);
            self.current_session_id = None;
            self.request_session(now);
        }

        self.state = TimerState::Running;
        tracing::debug!(session_type = %self.session_type, resumed, "timer started");

        let phase = self.session_type;
        if let Some(message) = self
            .coach
            .as_ref()
            .map(|c| c.random_message(phase, &mut self.rng))
        {
            self.set_message(message);
        }

        let event = Event::TimerStarted {
            session_type: self.session_type,
            remaining_secs: self.remaining_secs,
            resumed,
            at: Utc::now(),
        };
        self.emit(event.clone());
        Some(event)
    }

    pub fn pause(&mut self) -> Option<Event> {
        if !self.state.can_pause() {
            return None;
        }

        self.state = TimerState::Paused;
        tracing::debug!(remaining_secs = self.remaining_secs, "timer paused");
        self.set_message(PAUSED_MESSAGE.to_string());

        let event = Event::TimerPaused {
            remaining_secs: self.remaining_secs,
            at: Utc::now(),
        };
        self.emit(event.clone());
        Some(event)
    }

    pub fn reset(&mut self) -> Option<Event> {
        if !self.state.can_reset() {
            return None;
        }

        self.state = TimerState::Stopped;
        self.remaining_secs = self.session_type.default_duration_secs();
        self.current_session_id = None;
        self.session_started_at = None;
        tracing::debug!(session_type = %self.session_type, "timer reset");

        if let Some(message) = self
            .coach
            .as_ref()
            .map(|c| c.random_start_message(&mut self.rng))
        {
            self.set_message(message);
        }

        let event = Event::TimerReset {
            session_type: self.session_type,
            remaining_secs: self.remaining_secs,
            at: Utc::now(),
        };
        self.emit(event.clone());
        Some(event)
    }

    /// Switch phase. Only allowed while stopped.
    pub fn set_session_type(&mut self, session_type: SessionType) -> Option<Event> {
        if self.state != TimerState::Stopped {
            return None;
        }

        self.session_type = session_type;
        self.remaining_secs = session_type.default_duration_secs();

        let event = Event::SessionTypeChanged {
            session_type,
            remaining_secs: self.remaining_secs,
        };
        self.emit(event.clone());
        Some(event)
    }

    pub fn set_coach(&mut self, coach: Coach) {
        let message = coach.random_start_message(&mut self.rng);
        self.emit(Event::CoachChanged {
            coach_id: coach.id,
            name: coach.name.clone(),
        });
        self.coach = Some(coach);
        self.set_message(message);
    }

    /// Ask the runner for today's session count.
    pub fn refresh_today_count(&mut self) {
        self.runner.spawn(BackgroundTask::RefreshTodayCount);
    }

    /// Call once per elapsed second. Returns `Some(Event::PhaseCompleted)`
    /// when the countdown finishes.
    pub fn tick(&mut self) -> Option<Event> {
        if self.state != TimerState::Running {
            return None;
        }

        if self.remaining_secs == 0 {
            return Some(self.complete_phase());
        }

        self.remaining_secs -= 1;
        self.emit(Event::Tick {
            remaining_secs: self.remaining_secs,
        });

        if self.remaining_secs == 0 {
            return Some(self.complete_phase());
        }

        if self.remaining_secs % MESSAGE_REFRESH_SECS == 0 {
            let phase = self.session_type;
            if let Some(message) = self
                .coach
                .as_ref()
                .map(|c| c.random_message(phase, &mut self.rng))
            {
                self.set_message(message);
            }
        }
        None
    }

    /// Apply the result of a background task.
    pub fn apply(&mut self, outcome: TaskOutcome) {
        match outcome {
            TaskOutcome::SessionCreated { run, session_id } => {
                self.on_session_created(run, session_id)
            }
            TaskOutcome::SessionCompleted { session_id } => {
                self.emit(Event::SessionFinalized { session_id });
            }
            TaskOutcome::TodayCount { count } => {
                self.today_session_count = count;
                self.emit(Event::TodayCountUpdated { count });
            }
            TaskOutcome::Failed { kind, error } => {
                tracing::debug!(task = ?kind, %error, "ignoring failed background task");
            }
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn request_session(&mut self, started_at: DateTime<Utc>) {
        let Some(coach) = self.coach.as_ref() else {
            tracing::debug!("no coach selected; run will not be recorded");
            return;
        };
        self.runner.spawn(BackgroundTask::CreateSession {
            run: self.run,
            request: NewSession {
                coach_id: coach.id,
                session_type: self.session_type.api_category(),
                duration_seconds: self.session_type.default_duration_secs(),
                started_at,
            },
        });
    }

    fn on_session_created(&mut self, run: RunId, session_id: SessionId) {
        if run == self.run && self.session_started_at.is_some() {
            self.current_session_id = Some(session_id);
            self.emit(Event::SessionRecorded { session_id });
            return;
        }

        match self.unfinished.iter().position(|(pending, _)| *pending == run) {
            Some(index) => {
                let (_, completed_at) = self.unfinished.remove(index);
                self.runner.spawn(BackgroundTask::CompleteSession {
                    session_id,
                    completed_at,
                });
            }
            None => tracing::debug!(run, session_id, "discarding session id for abandoned run"),
        }
    }

    fn complete_phase(&mut self) -> Event {
        let now = Utc::now();
        self.state = TimerState::Stopped;

        match self.current_session_id.take() {
            Some(session_id) => self.runner.spawn(BackgroundTask::CompleteSession {
                session_id,
                completed_at: now,
            }),
            None if self.session_started_at.is_some() => {
                if self.unfinished.len() == MAX_UNFINISHED_RUNS {
                    let (dropped, _) = self.unfinished.remove(0);
                    tracing::debug!(run = dropped, "forgetting run that never got a session id");
                }
                self.unfinished.push((self.run, now));
            }
            None => {}
        }
        self.session_started_at = None;
        self.runner.spawn(BackgroundTask::RefreshTodayCount);

        let completed = self.session_type;
        let next = self.next_session_type();
        self.session_type = next;
        self.remaining_secs = next.default_duration_secs();
        tracing::debug!(%completed, %next, "phase completed");

        let message = if next.is_break() {
            Some(BREAK_EARNED_MESSAGE.to_string())
        } else {
            self.coach
                .as_ref()
                .map(|c| c.random_start_message(&mut self.rng))
        };

        let event = Event::PhaseCompleted {
            completed,
            next,
            at: now,
        };
        self.emit(event.clone());
        if let Some(message) = message {
            self.set_message(message);
        }
        event
    }

    /// Uses the count cached before the post-completion refresh lands.
    fn next_session_type(&self) -> SessionType {
        match self.session_type {
            SessionType::Focus => {
                if (self.today_session_count + 1) % self.sessions_before_long_break == 0 {
                    SessionType::LongBreak
                } else {
                    SessionType::ShortBreak
                }
            }
            SessionType::ShortBreak | SessionType::LongBreak => SessionType::Focus,
        }
    }

    fn set_message(&mut self, message: String) {
        self.current_message = message.clone();
        self.emit(Event::MessageChanged { message });
    }

    fn emit(&mut self, event: Event) {
        for observer in &mut self.observers {
            observer.notify(&event);
        }
    }
}

impl fmt::Debug for TimerEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerEngine")
            .field("state", &self.state)
            .field("session_type", &self.session_type)
            .field("remaining_secs", &self.remaining_secs)
            .field("coach", &self.coach.as_ref().map(|c| &c.name))
            .field("current_session_id", &self.current_session_id)
            .field("today_session_count", &self.today_session_count)
            .field("run", &self.run)
            .finish_non_exhaustive()
    }
}
