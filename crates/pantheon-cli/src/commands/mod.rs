pub mod coach;
pub mod config;
pub mod health;
pub mod prefs;
pub mod stats;
pub mod timer;

use pantheon_core::{ApiClient, ApiError, Config};

/// Build the API client every server-facing command uses.
pub fn api_client(config: &Config) -> Result<ApiClient, ApiError> {
    ApiClient::from_config(&config.api)
}
