use clap::Subcommand;
use pantheon_core::api::CoachId;
use pantheon_core::{bootstrap_coach, Coach, CoachRoster, CoachSource, Config};
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::api_client;

#[derive(Subcommand)]
pub enum CoachAction {
    /// List all coaches (* favorite, > selected)
    List {
        #[arg(long)]
        json: bool,
    },
    /// Show one coach in detail
    Show { id: CoachId },
    /// Always use this coach
    Select { id: CoachId },
    /// Stop always using one coach
    Clear,
    /// Toggle a coach in or out of favorites
    Favorite { id: CoachId },
    /// List favorite coaches
    Favorites,
    /// Show which coach the next timer run would get
    Next,
}

pub async fn run(action: CoachAction, config: &Config) -> pantheon_core::Result<()> {
    let api = api_client(config)?;

    match action {
        CoachAction::List { json } => {
            let roster = CoachRoster::load(&api).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(roster.coaches())?);
            } else {
                for coach in roster.coaches() {
                    println!("{}", list_line(&roster, coach));
                }
            }
        }
        CoachAction::Show { id } => {
            let coach = api.get_coach(id).await?;
            print!("{}", describe(&coach));
        }
        CoachAction::Select { id } => {
            let mut roster = CoachRoster::load(&api).await?;
            roster.select(&api, id).await?;
            match roster.selected_coach() {
                Some(coach) => println!("selected {}", coach.name),
                None => println!("selected coach #{id}"),
            }
        }
        CoachAction::Clear => {
            let mut roster = CoachRoster::default();
            roster.clear_selection(&api).await?;
            println!("selection cleared");
        }
        CoachAction::Favorite { id } => {
            let mut roster = CoachRoster::load(&api).await?;
            roster.toggle_favorite(&api, id).await?;
            let name = roster
                .find(id)
                .map(|c| c.name.clone())
                .unwrap_or_else(|| format!("#{id}"));
            if roster.is_favorite(id) {
                println!("{name} added to favorites");
            } else {
                println!("{name} removed from favorites");
            }
        }
        CoachAction::Favorites => {
            let roster = CoachRoster::load(&api).await?;
            let favorites = roster.favorite_coaches();
            if favorites.is_empty() {
                println!("no favorites yet");
            }
            for coach in favorites {
                println!("{}", list_line(&roster, coach));
            }
        }
        CoachAction::Next => {
            let mut rng = StdRng::from_entropy();
            match bootstrap_coach(&api, &mut rng).await? {
                Some(chosen) => println!("{} ({})", chosen.coach.name, source_label(chosen.source)),
                None => println!("no coaches available"),
            }
        }
    }
    Ok(())
}

fn source_label(source: CoachSource) -> &'static str {
    match source {
        CoachSource::Selected => "selected",
        CoachSource::Favorite => "random favorite",
        CoachSource::Random => "random",
    }
}

fn list_line(roster: &CoachRoster, coach: &Coach) -> String {
    let selected = if roster.is_selected(coach.id) { '>' } else { ' ' };
    let favorite = if roster.is_favorite(coach.id) { '*' } else { ' ' };
    format!(
        "{selected}{favorite} {:>3}  {:<12} {}",
        coach.id, coach.name, coach.domain
    )
}

fn describe(coach: &Coach) -> String {
    let mut out = format!(
        "{} (#{})\nDomain: {}\nStyle:  {}\n",
        coach.name, coach.id, coach.domain, coach.coaching_style
    );
    for (label, pool) in [
        ("Start", &coach.session_start_messages),
        ("Focus", &coach.focus_messages),
        ("Break", &coach.break_messages),
    ] {
        out.push_str(&format!("{label} messages ({}):\n", pool.len()));
        for message in pool {
            out.push_str(&format!("  - {message}\n"));
        }
    }
    out
}
