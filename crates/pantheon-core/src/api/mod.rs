//! Remote API: typed client and wire types.

mod client;
pub mod datetime;
mod types;

pub use client::ApiClient;
pub use types::{
    Coach, CoachId, CompleteSession, FavoriteToggle, NewSession, PreferencesUpdate,
    SelectedCoachUpdate, Session, SessionId, TodaySessions, UserPreferences, UserStats,
};
