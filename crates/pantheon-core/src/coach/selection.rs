//! Launch-time coach selection.
//!
//! Priority: the coach selected in preferences, then a random favorite
//! when auto-select is on, then a random coach from the catalog. Any
//! failure on the way drops straight to the catalog pick.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

use crate::api::{ApiClient, Coach};
use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CoachSource {
    Selected,
    Favorite,
    Random,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChosenCoach {
    pub coach: Coach,
    pub source: CoachSource,
}

/// Resolve the coach for this app session.
///
/// Returns `Ok(None)` only when the catalog is empty.
///
/// # Errors
///
/// Returns the catalog fetch error when the final fallback fails too.
pub async fn bootstrap_coach<R>(api: &ApiClient, rng: &mut R) -> Result<Option<ChosenCoach>, ApiError>
where
    R: Rng + Send + ?Sized,
{
    match preferred_coach(api, rng).await {
        Ok(Some(chosen)) => return Ok(Some(chosen)),
        Ok(None) => {}
        Err(e) => {
            tracing::warn!(error = %e, "could not resolve preferred coach, picking at random");
        }
    }

    let coaches = api.list_coaches().await?;
    Ok(coaches.choose(rng).cloned().map(|coach| ChosenCoach {
        coach,
        source: CoachSource::Random,
    }))
}

async fn preferred_coach<R>(api: &ApiClient, rng: &mut R) -> Result<Option<ChosenCoach>, ApiError>
where
    R: Rng + Send + ?Sized,
{
    let prefs = api.preferences().await?;

    if let Some(id) = prefs.selected_coach_id {
        let coach = api.get_coach(id).await?;
        return Ok(Some(ChosenCoach {
            coach,
            source: CoachSource::Selected,
        }));
    }

    if prefs.auto_select_favorites {
        if let Some(&id) = prefs.favorite_coach_ids.choose(rng) {
            let coach = api.get_coach(id).await?;
            return Ok(Some(ChosenCoach {
                coach,
                source: CoachSource::Favorite,
            }));
        }
    }

    Ok(None)
}
