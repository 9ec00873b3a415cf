use rand::seq::SliceRandom;
use rand::Rng;

use crate::api::{ApiClient, Coach, CoachId, PreferencesUpdate, UserPreferences};
use crate::error::ApiError;

/// Cached coach catalog plus the user's preferences.
///
/// Mutations write through to the server and replace the cached
/// preferences with whatever the server returns. A failed write leaves
/// the cache untouched.
#[derive(Debug, Clone, Default)]
pub struct CoachRoster {
    coaches: Vec<Coach>,
    preferences: Option<UserPreferences>,
}

impl CoachRoster {
    pub fn new(coaches: Vec<Coach>, preferences: Option<UserPreferences>) -> Self {
        Self {
            coaches,
            preferences,
        }
    }

    /// Fetch catalog and preferences concurrently.
    ///
    /// # Errors
    ///
    /// Fails if the catalog cannot be fetched. A preferences failure is
    /// logged and leaves the roster without preferences.
    pub async fn load(api: &ApiClient) -> Result<Self, ApiError> {
        let (coaches, preferences) = tokio::join!(api.list_coaches(), api.preferences());
        let preferences = match preferences {
            Ok(prefs) => Some(prefs),
            Err(e) => {
                tracing::warn!(error = %e, "failed to load preferences");
                None
            }
        };
        Ok(Self::new(coaches?, preferences))
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn coaches(&self) -> &[Coach] {
        &self.coaches
    }

    pub fn preferences(&self) -> Option<&UserPreferences> {
        self.preferences.as_ref()
    }

    pub fn find(&self, id: CoachId) -> Option<&Coach> {
        self.coaches.iter().find(|c| c.id == id)
    }

    pub fn is_favorite(&self, id: CoachId) -> bool {
        self.preferences
            .as_ref()
            .is_some_and(|p| p.favorite_coach_ids.contains(&id))
    }

    pub fn is_selected(&self, id: CoachId) -> bool {
        self.preferences
            .as_ref()
            .is_some_and(|p| p.selected_coach_id == Some(id))
    }

    pub fn favorite_coaches(&self) -> Vec<&Coach> {
        self.coaches.iter().filter(|c| self.is_favorite(c.id)).collect()
    }

    pub fn non_favorite_coaches(&self) -> Vec<&Coach> {
        self.coaches.iter().filter(|c| !self.is_favorite(c.id)).collect()
    }

    pub fn selected_coach(&self) -> Option<&Coach> {
        let id = self.preferences.as_ref()?.selected_coach_id?;
        self.find(id)
    }

    /// Same priority as [`super::bootstrap_coach`], over cached data.
    pub fn coach_for_session<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&Coach> {
        if let Some(selected) = self.selected_coach() {
            return Some(selected);
        }

        let auto_select = self
            .preferences
            .as_ref()
            .is_some_and(|p| p.auto_select_favorites);
        if auto_select {
            if let Some(&favorite) = self.favorite_coaches().choose(rng) {
                return Some(favorite);
            }
        }

        self.coaches.choose(rng)
    }

    // ── Write-through commands ───────────────────────────────────────

    pub async fn toggle_favorite(&mut self, api: &ApiClient, id: CoachId) -> Result<(), ApiError> {
        let result = api.toggle_favorite(id).await;
        self.store("toggle favorite", result)
    }

    pub async fn select(&mut self, api: &ApiClient, id: CoachId) -> Result<(), ApiError> {
        let result = api.set_selected_coach(Some(id)).await;
        self.store("select coach", result)
    }

    pub async fn clear_selection(&mut self, api: &ApiClient) -> Result<(), ApiError> {
        let result = api.set_selected_coach(None).await;
        self.store("clear coach selection", result)
    }

    pub async fn set_auto_select_favorites(
        &mut self,
        api: &ApiClient,
        enabled: bool,
    ) -> Result<(), ApiError> {
        let update = PreferencesUpdate {
            auto_select_favorites: Some(enabled),
            ..Default::default()
        };
        let result = api.update_preferences(&update).await;
        self.store("update auto-select", result)
    }

    fn store(
        &mut self,
        action: &str,
        result: Result<UserPreferences, ApiError>,
    ) -> Result<(), ApiError> {
        match result {
            Ok(prefs) => {
                self.preferences = Some(prefs);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(action, error = %e, "preferences write failed");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::datetime;
    use crate::coach::fixtures::coach;
    use mockito::Server;
    use rand::SeedableRng;
    use rand_pcg::Mcg128Xsl64;
    use serde_json::json;

    fn prefs(selected: Option<CoachId>, favorites: Vec<CoachId>, auto: bool) -> UserPreferences {
        let at = datetime::parse("2025-01-01T00:00:00Z").unwrap();
        UserPreferences {
            id: 1,
            user_id: "default".into(),
            selected_coach_id: selected,
            favorite_coach_ids: favorites,
            auto_select_favorites: auto,
            created_at: at,
            updated_at: at,
        }
    }

    fn roster(preferences: Option<UserPreferences>) -> CoachRoster {
        CoachRoster::new(
            vec![coach(1, "Zeus"), coach(2, "Athena"), coach(3, "Ares")],
            preferences,
        )
    }

    #[test]
    fn splits_favorites() {
        let r = roster(Some(prefs(None, vec![2], false)));
        let favs: Vec<_> = r.favorite_coaches().iter().map(|c| c.id).collect();
        let others: Vec<_> = r.non_favorite_coaches().iter().map(|c| c.id).collect();
        assert_eq!(favs, vec![2]);
        assert_eq!(others, vec![1, 3]);
        assert!(r.is_favorite(2));
        assert!(!r.is_favorite(1));
    }

    #[test]
    fn no_preferences_means_nothing_is_favorite() {
        let r = roster(None);
        assert!(r.favorite_coaches().is_empty());
        assert_eq!(r.non_favorite_coaches().len(), 3);
        assert!(r.selected_coach().is_none());
    }

    #[test]
    fn selected_coach_takes_priority() {
        let r = roster(Some(prefs(Some(3), vec![2], true)));
        let mut rng = Mcg128Xsl64::seed_from_u64(11);
        assert!(r.is_selected(3));
        assert_eq!(r.coach_for_session(&mut rng).map(|c| c.id), Some(3));
    }

    #[test]
    fn auto_select_draws_from_favorites_only() {
        let r = roster(Some(prefs(None, vec![2], true)));
        let mut rng = Mcg128Xsl64::seed_from_u64(11);
        for _ in 0..20 {
            assert_eq!(r.coach_for_session(&mut rng).map(|c| c.id), Some(2));
        }
    }

    #[test]
    fn empty_roster_has_no_coach() {
        let r = CoachRoster::default();
        let mut rng = Mcg128Xsl64::seed_from_u64(11);
        assert!(r.coach_for_session(&mut rng).is_none());
    }

    #[tokio::test]
    async fn toggle_favorite_replaces_cache() {
        let mut server = Server::new_async().await;
        server
            .mock("PATCH", "/preferences/favorites")
            .match_body(mockito::Matcher::Json(json!({ "god_id": 1 })))
            .with_status(200)
            .with_body(serde_json::to_string(&prefs(None, vec![1, 2], false)).unwrap())
            .create_async()
            .await;

        let api = ApiClient::new(&server.url()).unwrap();
        let mut r = roster(Some(prefs(None, vec![2], false)));
        r.toggle_favorite(&api, 1).await.unwrap();

        assert!(r.is_favorite(1));
        assert!(r.is_favorite(2));
    }

    #[tokio::test]
    async fn failed_write_keeps_cache() {
        let mut server = Server::new_async().await;
        server
            .mock("PATCH", "/preferences/selected-god")
            .with_status(500)
            .create_async()
            .await;

        let api = ApiClient::new(&server.url()).unwrap();
        let mut r = roster(Some(prefs(Some(1), vec![], false)));
        let err = r.clear_selection(&api).await.unwrap_err();

        assert!(matches!(err, ApiError::Server { status: 500 }));
        assert!(r.is_selected(1));
    }

    #[tokio::test]
    async fn load_survives_missing_preferences() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/gods")
            .with_status(200)
            .with_body(serde_json::to_string(&vec![coach(1, "Zeus")]).unwrap())
            .create_async()
            .await;
        server
            .mock("GET", "/preferences")
            .with_status(503)
            .create_async()
            .await;

        let api = ApiClient::new(&server.url()).unwrap();
        let r = CoachRoster::load(&api).await.unwrap();

        assert_eq!(r.coaches().len(), 1);
        assert!(r.preferences().is_none());
    }
}
