use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use clap::Subcommand;
use pantheon_core::api::CoachId;
use pantheon_core::{
    bootstrap_coach, format_clock, ApiClient, Coach, Config, Event, PendingTasks, SessionType,
    TaskOutcome, TimerEngine, TokioTaskRunner,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::MissedTickBehavior;

use super::api_client;

/// How long to wait for outstanding server writes before exiting.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Subcommand)]
pub enum TimerAction {
    /// Run the countdown in the foreground (Ctrl-C to stop)
    Run {
        /// Phase to start with: focus, short-break or long-break
        #[arg(long = "type", value_name = "TYPE")]
        session_type: Option<SessionType>,
        /// Coach id to use instead of the launch-time pick
        #[arg(long)]
        coach: Option<CoachId>,
        /// Number of phases to run before exiting
        #[arg(long, default_value_t = 1)]
        cycles: u32,
        /// Print every engine event as a JSON line
        #[arg(long)]
        json: bool,
    },
}

pub async fn run(action: TimerAction, config: &Config) -> pantheon_core::Result<()> {
    match action {
        TimerAction::Run {
            session_type,
            coach,
            cycles,
            json,
        } => {
            let api = Arc::new(api_client(config)?);
            let coach = resolve_coach(&api, coach).await;
            if coach.is_none() {
                eprintln!("no coach available; running without one");
            }

            let (runner, mut outcomes) = TokioTaskRunner::new(Arc::clone(&api));
            let pending = runner.pending();
            let mut engine = TimerEngine::new(Box::new(runner)).with_config(&config.timer);
            engine.subscribe(move |event: &Event| {
                if json {
                    if let Ok(line) = serde_json::to_string(event) {
                        println!("{line}");
                    }
                } else if let Some(line) = render(event) {
                    println!("{line}");
                }
            });

            if let Some(coach) = coach {
                engine.set_coach(coach);
            }
            engine.refresh_today_count();
            if let Some(session_type) = session_type {
                engine.set_session_type(session_type);
            }

            drive(
                &mut engine,
                &mut outcomes,
                cycles.max(1),
                tokio::signal::ctrl_c(),
            )
            .await;
            drain(&mut engine, &mut outcomes, &pending).await;
        }
    }
    Ok(())
}

/// The countdown never depends on the server, so lookup failures only
/// cost the run its coach.
async fn resolve_coach(api: &ApiClient, requested: Option<CoachId>) -> Option<Coach> {
    let result = match requested {
        Some(id) => api.get_coach(id).await.map(Some),
        None => {
            let mut rng = StdRng::from_entropy();
            bootstrap_coach(api, &mut rng).await.map(|chosen| {
                chosen.map(|chosen| {
                    tracing::info!(coach = %chosen.coach.name, source = ?chosen.source, "coach chosen");
                    chosen.coach
                })
            })
        }
    };

    result.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "could not load a coach");
        None
    })
}

/// Tick once per second until `cycles` phases have completed or `shutdown`
/// resolves. Returns the number of completed phases.
async fn drive<S: Future>(
    engine: &mut TimerEngine,
    outcomes: &mut UnboundedReceiver<TaskOutcome>,
    cycles: u32,
    shutdown: S,
) -> u32 {
    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick of an interval completes immediately.
    ticker.tick().await;

    tokio::pin!(shutdown);

    engine.start();
    let mut completed = 0;
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if engine.tick().is_some() {
                    completed += 1;
                    if completed >= cycles {
                        break;
                    }
                    engine.start();
                }
            }
            Some(outcome) = outcomes.recv() => engine.apply(outcome),
            _ = &mut shutdown => {
                engine.reset();
                break;
            }
        }
    }
    completed
}

/// Apply outcomes until the runner is idle, so session records are not
/// cut off by process exit.
async fn drain(
    engine: &mut TimerEngine,
    outcomes: &mut UnboundedReceiver<TaskOutcome>,
    pending: &PendingTasks,
) {
    let deadline = tokio::time::sleep(DRAIN_TIMEOUT);
    tokio::pin!(deadline);

    loop {
        // Outcomes are sent before the counter drops, so an idle reading
        // taken first means everything is already queued.
        let idle = pending.is_idle();
        while let Ok(outcome) = outcomes.try_recv() {
            engine.apply(outcome);
        }
        if idle && pending.is_idle() {
            return;
        }

        tokio::select! {
            Some(outcome) = outcomes.recv() => engine.apply(outcome),
            _ = pending.wait_idle() => {}
            _ = &mut deadline => {
                tracing::warn!(pending = pending.count(), "exiting with server writes outstanding");
                return;
            }
        }
    }
}

fn render(event: &Event) -> Option<String> {
    match event {
        Event::TimerStarted {
            session_type,
            remaining_secs,
            resumed: false,
            ..
        } => Some(format!(
            "{} started ({})",
            session_type.display_name(),
            format_clock(*remaining_secs)
        )),
        Event::TimerStarted { .. } => Some("resumed".into()),
        Event::TimerPaused { remaining_secs, .. } => {
            Some(format!("paused at {}", format_clock(*remaining_secs)))
        }
        Event::TimerReset { .. } => Some("stopped".into()),
        Event::Tick { remaining_secs } if remaining_secs % 60 == 0 => {
            Some(format!("  {} left", format_clock(*remaining_secs)))
        }
        Event::Tick { .. } => None,
        Event::SessionTypeChanged { session_type, .. } => {
            Some(format!("next up: {}", session_type.display_name()))
        }
        Event::PhaseCompleted { completed, next, .. } => Some(format!(
            "{} complete. Next: {}",
            completed.display_name(),
            next.display_name()
        )),
        Event::MessageChanged { message } => Some(format!("  \"{message}\"")),
        Event::CoachChanged { name, .. } => Some(format!("Coach: {name}")),
        Event::SessionRecorded { session_id } => {
            tracing::debug!(session_id, "session recorded");
            None
        }
        Event::SessionFinalized { session_id } => Some(format!("session #{session_id} saved")),
        Event::TodayCountUpdated { count } => Some(format!("sessions today: {count}")),
        Event::StateSnapshot { .. } => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use chrono::Utc;
    use mockito::{Server, ServerGuard};
    use pantheon_core::TimerState;
    use serde_json::json;

    #[test]
    fn ticks_render_on_whole_minutes_only() {
        assert_eq!(
            render(&Event::Tick { remaining_secs: 1440 }).as_deref(),
            Some("  24:00 left")
        );
        assert_eq!(render(&Event::Tick { remaining_secs: 1439 }), None);
    }

    #[test]
    fn completion_names_both_phases() {
        let event = Event::PhaseCompleted {
            completed: SessionType::Focus,
            next: SessionType::LongBreak,
            at: Utc::now(),
        };
        assert_eq!(
            render(&event).as_deref(),
            Some("Focus complete. Next: Long Break")
        );
    }

    #[test]
    fn fresh_start_shows_full_duration() {
        let event = Event::TimerStarted {
            session_type: SessionType::ShortBreak,
            remaining_secs: 300,
            resumed: false,
            at: Utc::now(),
        };
        assert_eq!(render(&event).as_deref(), Some("Short Break started (05:00)"));
    }

    fn hermes() -> Coach {
        Coach {
            id: 4,
            name: "Hermes".into(),
            domain: "Speed".into(),
            icon: "wing".into(),
            coaching_style: "Quick".into(),
            focus_messages: vec!["Run.".into()],
            break_messages: vec!["Breathe.".into()],
            session_start_messages: vec!["Go!".into()],
        }
    }

    fn session_body(id: i64) -> String {
        json!({
            "id": id,
            "god_id": 4,
            "session_type": "break",
            "duration_seconds": 300,
            "started_at": "2025-03-01T09:00:00Z",
            "completed_at": null,
            "was_completed": false
        })
        .to_string()
    }

    async fn mock_server(today_count: u32) -> ServerGuard {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/sessions")
            .with_status(201)
            .with_body(session_body(7))
            .create_async()
            .await;
        server
            .mock("PATCH", "/sessions/7/complete")
            .with_status(200)
            .with_body(session_body(7))
            .create_async()
            .await;
        server
            .mock("GET", "/sessions/today")
            .with_status(200)
            .with_body(json!({ "count": today_count, "sessions": [] }).to_string())
            .create_async()
            .await;
        server
    }

    fn engine_for(
        server: &ServerGuard,
    ) -> (TimerEngine, UnboundedReceiver<TaskOutcome>, PendingTasks, Arc<Mutex<Vec<Event>>>) {
        let api = Arc::new(ApiClient::new(&server.url()).unwrap());
        let (runner, outcomes) = TokioTaskRunner::new(api);
        let pending = runner.pending();
        let mut engine = TimerEngine::new(Box::new(runner)).with_coach(hermes());
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        engine.subscribe(move |event: &Event| sink.lock().unwrap().push(event.clone()));
        (engine, outcomes, pending, events)
    }

    fn completions(events: &Mutex<Vec<Event>>) -> usize {
        events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| matches!(e, Event::PhaseCompleted { .. }))
            .count()
    }

    #[tokio::test(start_paused = true)]
    async fn drive_runs_exactly_the_requested_cycles() {
        let server = mock_server(0).await;
        let (mut engine, mut outcomes, _pending, events) = engine_for(&server);
        engine.set_session_type(SessionType::ShortBreak);

        let done = drive(&mut engine, &mut outcomes, 2, std::future::pending::<()>()).await;

        assert_eq!(done, 2);
        assert_eq!(completions(&events), 2);
        assert_eq!(engine.state(), TimerState::Stopped);
        // Short break, then focus, leaving the next short break queued.
        assert_eq!(engine.session_type(), SessionType::ShortBreak);
        assert_eq!(engine.remaining_secs(), 300);
    }

    #[tokio::test(start_paused = true)]
    async fn drive_stops_after_a_single_cycle() {
        let server = mock_server(0).await;
        let (mut engine, mut outcomes, _pending, events) = engine_for(&server);
        engine.set_session_type(SessionType::ShortBreak);

        let done = drive(&mut engine, &mut outcomes, 1, std::future::pending::<()>()).await;

        assert_eq!(done, 1);
        assert_eq!(completions(&events), 1);
        assert_eq!(engine.session_type(), SessionType::Focus);
        assert_eq!(engine.remaining_secs(), 1500);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_resets_the_running_phase() {
        let server = mock_server(0).await;
        let (mut engine, mut outcomes, _pending, events) = engine_for(&server);

        let shutdown = tokio::time::sleep(Duration::from_secs(10));
        let done = drive(&mut engine, &mut outcomes, 1, shutdown).await;

        assert_eq!(done, 0);
        assert_eq!(completions(&events), 0);
        assert_eq!(engine.state(), TimerState::Stopped);
        assert_eq!(engine.session_type(), SessionType::Focus);
        assert_eq!(engine.remaining_secs(), 1500);
        assert!(events
            .lock()
            .unwrap()
            .iter()
            .any(|e| matches!(e, Event::TimerReset { .. })));
    }

    #[tokio::test]
    async fn drain_applies_completion_and_count_before_returning() {
        let server = mock_server(3).await;
        let (mut engine, mut outcomes, pending, events) = engine_for(&server);
        engine.set_session_type(SessionType::ShortBreak);
        engine.start();
        engine.apply(outcomes.recv().await.unwrap());
        assert_eq!(engine.current_session_id(), Some(7));
        for _ in 0..300 {
            engine.tick();
        }

        // Returns on idle, well before the drain deadline.
        tokio::time::timeout(Duration::from_secs(2), drain(&mut engine, &mut outcomes, &pending))
            .await
            .expect("drain waited for its deadline");

        assert!(pending.is_idle());
        assert_eq!(engine.today_session_count(), 3);
        assert!(events
            .lock()
            .unwrap()
            .iter()
            .any(|e| matches!(e, Event::SessionFinalized { session_id: 7 })));
    }

    #[tokio::test]
    async fn drain_returns_at_once_when_nothing_is_pending() {
        let server = mock_server(0).await;
        let (mut engine, mut outcomes, pending, _events) = engine_for(&server);

        tokio::time::timeout(Duration::from_millis(500), drain(&mut engine, &mut outcomes, &pending))
            .await
            .expect("drain should not wait");
    }
}
