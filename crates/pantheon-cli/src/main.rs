use std::io::IsTerminal;

use clap::{Parser, Subcommand};
use pantheon_core::{Config, CoreError};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "pantheon", version, about = "Pantheon focus timer CLI")]
struct Cli {
    /// Override the server URL for this invocation
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the focus timer
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Browse, select and favorite coaches
    Coach {
        #[command(subcommand)]
        action: commands::coach::CoachAction,
    },
    /// Preferences stored on the server
    Prefs {
        #[command(subcommand)]
        action: commands::prefs::PrefsAction,
    },
    /// Session statistics
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Check that the server is reachable and healthy
    Health,
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let (config, load_error) = match Config::load() {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };
    init_tracing(&config.log_filter);
    if let Some(e) = load_error {
        tracing::warn!(error = %e, "using default configuration");
    }

    let mut config = config.with_env_overrides();
    if let Some(url) = cli.api_url {
        config.api.base_url = url;
    }

    let result = match cli.command {
        Commands::Timer { action } => commands::timer::run(action, &config).await,
        Commands::Coach { action } => commands::coach::run(action, &config).await,
        Commands::Prefs { action } => commands::prefs::run(action, &config).await,
        Commands::Stats { action } => commands::stats::run(action, &config).await,
        Commands::Health => commands::health::run(&config).await,
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        if matches!(&e, CoreError::Api(api) if api.is_retryable()) {
            eprintln!("hint: the server at {} may be down; try again shortly", config.api.base_url);
        }
        std::process::exit(1);
    }
}
