//! # Pantheon Core Library
//!
//! Business logic for the Pantheon focus timer, where each session is
//! coached by a Greek god. Persistence lives on a remote HTTP server; this
//! crate holds the countdown state machine, the typed API client and the
//! coach selection rules. The `pantheon` CLI is a thin layer over it.
//!
//! ## Architecture
//!
//! - **Timer Engine**: a single-owner state machine; the caller invokes
//!   `tick()` once per second and feeds background results to `apply()`
//! - **Tasks**: network side effects handed off by the engine and run
//!   detached on tokio
//! - **API**: reqwest client for coaches, sessions, stats and preferences
//! - **Coach**: launch-time coach selection and the favorites roster
//! - **Config**: TOML configuration file
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: Core timer state machine
//! - [`ApiClient`]: Remote API client
//! - [`TaskRunner`]: Seam for detached network work
//! - [`Config`]: Application configuration management

pub mod api;
pub mod coach;
pub mod config;
pub mod error;
pub mod events;
pub mod tasks;
pub mod timer;

pub use api::{ApiClient, Coach, Session, UserPreferences, UserStats};
pub use coach::{bootstrap_coach, ChosenCoach, CoachRoster, CoachSource};
pub use config::Config;
pub use error::{ApiError, ConfigError, CoreError, Result};
pub use events::{Event, Observer};
pub use tasks::{BackgroundTask, PendingTasks, TaskOutcome, TaskRunner, TokioTaskRunner};
pub use timer::{format_clock, SessionType, TimerEngine, TimerState};
