use clap::Subcommand;
use pantheon_core::{CoachRoster, Config};

use super::api_client;

#[derive(Subcommand)]
pub enum PrefsAction {
    /// Print the stored preferences as JSON
    Show,
    /// Pick a random favorite each session when no coach is selected
    AutoSelect {
        #[arg(action = clap::ArgAction::Set)]
        enabled: bool,
    },
}

pub async fn run(action: PrefsAction, config: &Config) -> pantheon_core::Result<()> {
    let api = api_client(config)?;

    match action {
        PrefsAction::Show => {
            let prefs = api.preferences().await?;
            println!("{}", serde_json::to_string_pretty(&prefs)?);
        }
        PrefsAction::AutoSelect { enabled } => {
            let mut roster = CoachRoster::default();
            roster.set_auto_select_favorites(&api, enabled).await?;
            println!(
                "auto-select favorites {}",
                if enabled { "enabled" } else { "disabled" }
            );
        }
    }
    Ok(())
}
