use clap::Subcommand;
use pantheon_core::{Config, UserStats};

use super::api_client;

#[derive(Subcommand)]
pub enum StatsAction {
    /// All-time stats
    Show {
        #[arg(long)]
        json: bool,
    },
    /// Sessions recorded today
    Today {
        #[arg(long)]
        json: bool,
    },
}

pub async fn run(action: StatsAction, config: &Config) -> pantheon_core::Result<()> {
    let api = api_client(config)?;

    match action {
        StatsAction::Show { json } => {
            let stats = api.stats().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                print!("{}", format_stats(&stats));
            }
        }
        StatsAction::Today { json } => {
            let today = api.today_sessions().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&today)?);
            } else {
                println!("Sessions today: {}", today.count);
                for session in &today.sessions {
                    let status = if session.was_completed { "done" } else { "open" };
                    println!(
                        "  #{:<5} {:<5} {:>3}m  {}  {}",
                        session.id,
                        session.session_type.as_str(),
                        session.duration_seconds / 60,
                        session.started_at.format("%H:%M"),
                        status
                    );
                }
            }
        }
    }
    Ok(())
}

fn format_stats(stats: &UserStats) -> String {
    let mut out = String::new();
    out.push_str(&format!("Total sessions:  {}\n", stats.total_sessions));
    out.push_str(&format!(
        "Focus time:      {}h {:02}m\n",
        stats.total_focus_minutes / 60,
        stats.total_focus_minutes % 60
    ));
    out.push_str(&format!("Current streak:  {} day(s)\n", stats.current_streak));
    if let Some(date) = &stats.last_session_date {
        out.push_str(&format!("Last session:    {date}\n"));
    }

    let ranked = stats.ranked_coaches();
    if !ranked.is_empty() {
        out.push_str("Sessions by coach:\n");
        for (name, count) in ranked {
            out.push_str(&format!("  {name:<12} {count}\n"));
        }
    }
    out
}
