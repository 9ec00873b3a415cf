//! HTTP client for the Pantheon server.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use super::types::{
    Coach, CoachId, CompleteSession, FavoriteToggle, NewSession, PreferencesUpdate,
    SelectedCoachUpdate, Session, SessionId, TodaySessions, UserPreferences, UserStats,
};
use crate::config::ApiConfig;
use crate::error::ApiError;

/// Typed JSON client. Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a client with reqwest's default timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidUrl`] if `base_url` is not an absolute
    /// http(s) URL.
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        Self::with_timeout(base_url, None)
    }

    pub fn with_timeout(base_url: &str, timeout: Option<Duration>) -> Result<Self, ApiError> {
        let parsed = Url::parse(base_url).map_err(|source| ApiError::InvalidUrl {
            url: base_url.to_string(),
            source,
        })?;
        if parsed.cannot_be_a_base() || !matches!(parsed.scheme(), "http" | "https") {
            return Err(ApiError::InvalidUrl {
                url: base_url.to_string(),
                source: url::ParseError::RelativeUrlWithCannotBeABaseBase,
            });
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| ApiError::Unknown(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: parsed,
        })
    }

    pub fn from_config(config: &ApiConfig) -> Result<Self, ApiError> {
        let timeout = (config.timeout_secs > 0).then(|| Duration::from_secs(config.timeout_secs));
        Self::with_timeout(&config.base_url, timeout)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Coaches ──────────────────────────────────────────────────────

    pub async fn list_coaches(&self) -> Result<Vec<Coach>, ApiError> {
        self.get("gods").await
    }

    pub async fn get_coach(&self, id: CoachId) -> Result<Coach, ApiError> {
        self.get(&format!("gods/{id}")).await
    }

    // ── Sessions ─────────────────────────────────────────────────────

    /// `POST /sessions`. Accepts 200 or 201.
    pub async fn create_session(&self, body: &NewSession) -> Result<Session, ApiError> {
        let request = self.request(Method::POST, "sessions")?.json(body);
        self.send(request, "sessions", &[StatusCode::OK, StatusCode::CREATED])
            .await
    }

    pub async fn complete_session(
        &self,
        id: SessionId,
        completed_at: DateTime<Utc>,
    ) -> Result<Session, ApiError> {
        let body = CompleteSession {
            completed_at: Some(completed_at),
        };
        self.with_body(Method::PATCH, &format!("sessions/{id}/complete"), &body)
            .await
    }

    pub async fn today_sessions(&self) -> Result<TodaySessions, ApiError> {
        self.get("sessions/today").await
    }

    // ── Stats ────────────────────────────────────────────────────────

    pub async fn stats(&self) -> Result<UserStats, ApiError> {
        self.get("stats").await
    }

    // ── Preferences ──────────────────────────────────────────────────

    pub async fn preferences(&self) -> Result<UserPreferences, ApiError> {
        self.get("preferences").await
    }

    pub async fn update_preferences(
        &self,
        update: &PreferencesUpdate,
    ) -> Result<UserPreferences, ApiError> {
        self.with_body(Method::PUT, "preferences", update).await
    }

    pub async fn toggle_favorite(&self, coach_id: CoachId) -> Result<UserPreferences, ApiError> {
        self.with_body(
            Method::PATCH,
            "preferences/favorites",
            &FavoriteToggle { coach_id },
        )
        .await
    }

    /// Pass `None` to clear the selection.
    pub async fn set_selected_coach(
        &self,
        coach_id: Option<CoachId>,
    ) -> Result<UserPreferences, ApiError> {
        self.with_body(
            Method::PATCH,
            "preferences/selected-god",
            &SelectedCoachUpdate { coach_id },
        )
        .await
    }

    // ── Health ───────────────────────────────────────────────────────

    /// `true` only on HTTP 200. Transport failures are returned as errors.
    pub async fn health_check(&self) -> Result<bool, ApiError> {
        let response = self.request(Method::GET, "health")?.send().await?;
        Ok(response.status() == StatusCode::OK)
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        let raw = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Url::parse(&raw).map_err(|source| ApiError::InvalidUrl { url: raw, source })
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let url = self.endpoint(path)?;
        tracing::debug!(%method, %url, "api request");
        Ok(self.http.request(method, url))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let request = self.request(Method::GET, path)?;
        self.send(request, path, &[StatusCode::OK]).await
    }

    async fn with_body<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.request(method, path)?.json(body);
        self.send(request, path, &[StatusCode::OK]).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        path: &str,
        accepted: &[StatusCode],
    ) -> Result<T, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        if !accepted.contains(&status) {
            return Err(ApiError::Server {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|source| ApiError::Decoding {
            endpoint: format!("/{path}"),
            source,
        })
    }
}
