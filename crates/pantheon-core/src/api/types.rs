//! Request and response bodies for the Pantheon server.
//!
//! The server still calls coaches "gods", so wire names keep the `god_`
//! prefix while the Rust fields say `coach`.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::datetime;
use crate::timer::ApiCategory;

pub type CoachId = i64;
pub type SessionId = i64;

/// A themed persona with motivational message pools. Read-only reference data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coach {
    pub id: CoachId,
    pub name: String,
    pub domain: String,
    pub icon: String,
    pub coaching_style: String,
    #[serde(default)]
    pub focus_messages: Vec<String>,
    #[serde(default)]
    pub break_messages: Vec<String>,
    #[serde(default)]
    pub session_start_messages: Vec<String>,
}

/// A server-side record of one timer run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    #[serde(rename = "god_id")]
    pub coach_id: CoachId,
    pub session_type: ApiCategory,
    pub duration_seconds: u32,
    #[serde(with = "datetime")]
    pub started_at: DateTime<Utc>,
    #[serde(default, with = "datetime::option")]
    pub completed_at: Option<DateTime<Utc>>,
    pub was_completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodaySessions {
    pub count: u32,
    #[serde(default)]
    pub sessions: Vec<Session>,
}

/// Body of `POST /sessions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSession {
    #[serde(rename = "god_id")]
    pub coach_id: CoachId,
    pub session_type: ApiCategory,
    pub duration_seconds: u32,
    #[serde(with = "datetime")]
    pub started_at: DateTime<Utc>,
}

/// Body of `PATCH /sessions/{id}/complete`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompleteSession {
    #[serde(with = "datetime::option")]
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStats {
    pub id: i64,
    pub user_id: String,
    pub total_sessions: u32,
    pub total_focus_minutes: u32,
    pub current_streak: u32,
    #[serde(default)]
    pub last_session_date: Option<String>,
    #[serde(rename = "sessions_by_god", default)]
    pub sessions_by_coach: HashMap<String, u32>,
}

impl UserStats {
    /// Per-coach session counts, most used first, ties by name.
    pub fn ranked_coaches(&self) -> Vec<(&str, u32)> {
        let mut ranked: Vec<(&str, u32)> = self
            .sessions_by_coach
            .iter()
            .map(|(name, count)| (name.as_str(), *count))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPreferences {
    pub id: i64,
    pub user_id: String,
    #[serde(rename = "selected_god_id", default)]
    pub selected_coach_id: Option<CoachId>,
    #[serde(rename = "favorite_god_ids", default)]
    pub favorite_coach_ids: Vec<CoachId>,
    #[serde(default)]
    pub auto_select_favorites: bool,
    #[serde(with = "datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "datetime")]
    pub updated_at: DateTime<Utc>,
}

/// Body of `PUT /preferences`. Unset fields are left out of the JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreferencesUpdate {
    #[serde(rename = "selected_god_id", skip_serializing_if = "Option::is_none")]
    pub selected_coach_id: Option<CoachId>,
    #[serde(rename = "favorite_god_ids", skip_serializing_if = "Option::is_none")]
    pub favorite_coach_ids: Option<Vec<CoachId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_select_favorites: Option<bool>,
}

/// Body of `PATCH /preferences/favorites`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteToggle {
    #[serde(rename = "god_id")]
    pub coach_id: CoachId,
}

/// Body of `PATCH /preferences/selected-god`. `None` clears the selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedCoachUpdate {
    #[serde(rename = "god_id")]
    pub coach_id: Option<CoachId>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn session_decodes_server_shape() {
        let session: Session = serde_json::from_value(json!({
            "id": 7,
            "god_id": 1,
            "session_type": "focus",
            "duration_seconds": 1500,
            "started_at": "2025-03-01T09:00:00.000123",
            "completed_at": null,
            "was_completed": false
        }))
        .unwrap();
        assert_eq!(session.coach_id, 1);
        assert_eq!(session.session_type, ApiCategory::Focus);
        assert!(session.completed_at.is_none());
    }

    #[test]
    fn new_session_encodes_wire_names() {
        let started_at = datetime::parse("2025-03-01T09:00:00Z").unwrap();
        let body = serde_json::to_value(NewSession {
            coach_id: 3,
            session_type: ApiCategory::Break,
            duration_seconds: 300,
            started_at,
        })
        .unwrap();
        assert_eq!(
            body,
            json!({
                "god_id": 3,
                "session_type": "break",
                "duration_seconds": 300,
                "started_at": "2025-03-01T09:00:00Z"
            })
        );
    }

    #[test]
    fn preferences_update_omits_unset_fields() {
        let body = serde_json::to_value(PreferencesUpdate {
            auto_select_favorites: Some(true),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(body, json!({ "auto_select_favorites": true }));
    }

    #[test]
    fn clearing_selection_sends_null() {
        let body = serde_json::to_value(SelectedCoachUpdate { coach_id: None }).unwrap();
        assert_eq!(body, json!({ "god_id": null }));
    }

    #[test]
    fn ranked_coaches_orders_by_count_then_name() {
        let stats = UserStats {
            id: 1,
            user_id: "default".into(),
            total_sessions: 6,
            total_focus_minutes: 100,
            current_streak: 2,
            last_session_date: None,
            sessions_by_coach: HashMap::from([
                ("Zeus".to_string(), 2),
                ("Athena".to_string(), 3),
                ("Ares".to_string(), 2),
            ]),
        };
        assert_eq!(
            stats.ranked_coaches(),
            vec![("Athena", 3), ("Ares", 2), ("Zeus", 2)]
        );
    }
}
