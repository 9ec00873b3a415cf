use pantheon_core::{Config, CoreError};

use super::api_client;

pub async fn run(config: &Config) -> pantheon_core::Result<()> {
    let api = api_client(config)?;
    if api.health_check().await? {
        println!("ok: {}", api.base_url());
        Ok(())
    } else {
        Err(CoreError::Custom(format!(
            "server at {} reported unhealthy",
            api.base_url()
        )))
    }
}
