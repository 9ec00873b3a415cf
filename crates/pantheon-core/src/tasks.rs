//! Detached execution of the engine's network side effects.
//!
//! The engine never awaits the network. It hands a [`BackgroundTask`] to a
//! [`TaskRunner`] and carries on; the runner reports a [`TaskOutcome`] that
//! the owner of the engine feeds back through `TimerEngine::apply`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{mpsc, Notify};

use crate::api::{ApiClient, NewSession, SessionId};
use crate::error::ApiError;

/// Identifies one start-from-stopped run of the timer.
pub type RunId = u64;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "task", rename_all = "snake_case")]
pub enum BackgroundTask {
    CreateSession {
        run: RunId,
        request: NewSession,
    },
    CompleteSession {
        session_id: SessionId,
        completed_at: DateTime<Utc>,
    },
    RefreshTodayCount,
}

impl BackgroundTask {
    pub fn kind(&self) -> TaskKind {
        match self {
            BackgroundTask::CreateSession { .. } => TaskKind::CreateSession,
            BackgroundTask::CompleteSession { .. } => TaskKind::CompleteSession,
            BackgroundTask::RefreshTodayCount => TaskKind::RefreshTodayCount,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    CreateSession,
    CompleteSession,
    RefreshTodayCount,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome {
    SessionCreated { run: RunId, session_id: SessionId },
    SessionCompleted { session_id: SessionId },
    TodayCount { count: u32 },
    Failed { kind: TaskKind, error: String },
}

/// Accepts background work without blocking the caller.
pub trait TaskRunner: Send {
    fn spawn(&self, task: BackgroundTask);
}

/// Runs tasks on the tokio runtime and reports outcomes on a channel.
pub struct TokioTaskRunner {
    api: Arc<ApiClient>,
    outcomes: mpsc::UnboundedSender<TaskOutcome>,
    in_flight: PendingTasks,
}

impl TokioTaskRunner {
    /// Returns the runner and the receiving end for its outcomes.
    pub fn new(api: Arc<ApiClient>) -> (Self, mpsc::UnboundedReceiver<TaskOutcome>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let runner = Self {
            api,
            outcomes: tx,
            in_flight: PendingTasks::default(),
        };
        (runner, rx)
    }

    /// Handle for counting tasks spawned but not yet reported. Stays valid
    /// after the runner is moved into an engine.
    pub fn pending(&self) -> PendingTasks {
        self.in_flight.clone()
    }
}

/// Number of tasks a [`TokioTaskRunner`] has not yet reported on.
///
/// A task's outcome is sent before it stops counting, so once the count
/// reads zero every outcome is already queued on the channel.
#[derive(Debug, Clone, Default)]
pub struct PendingTasks(Arc<PendingInner>);

#[derive(Debug, Default)]
struct PendingInner {
    count: AtomicUsize,
    idle: Notify,
}

impl PendingTasks {
    pub fn count(&self) -> usize {
        self.0.count.load(Ordering::Acquire)
    }

    pub fn is_idle(&self) -> bool {
        self.count() == 0
    }

    /// Resolves once no task is in flight.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.0.idle.notified();
            if self.is_idle() {
                return;
            }
            notified.await;
        }
    }

    fn begin(&self) {
        self.0.count.fetch_add(1, Ordering::AcqRel);
    }

    fn finish(&self) {
        if self.0.count.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.0.idle.notify_one();
        }
    }
}

impl TaskRunner for TokioTaskRunner {
    fn spawn(&self, task: BackgroundTask) {
        let api = Arc::clone(&self.api);
        let outcomes = self.outcomes.clone();
        let in_flight = self.in_flight.clone();
        in_flight.begin();
        tokio::spawn(async move {
            let outcome = execute(&api, task).await;
            // Receiver gone means the app is shutting down.
            let _ = outcomes.send(outcome);
            in_flight.finish();
        });
    }
}

/// Perform one task against the API. Failures become
/// [`TaskOutcome::Failed`] and are logged here.
pub async fn execute(api: &ApiClient, task: BackgroundTask) -> TaskOutcome {
    let kind = task.kind();
    let result: Result<TaskOutcome, ApiError> = match task {
        BackgroundTask::CreateSession { run, request } => api
            .create_session(&request)
            .await
            .map(|session| TaskOutcome::SessionCreated {
                run,
                session_id: session.id,
            }),
        BackgroundTask::CompleteSession {
            session_id,
            completed_at,
        } => api
            .complete_session(session_id, completed_at)
            .await
            .map(|session| TaskOutcome::SessionCompleted {
                session_id: session.id,
            }),
        BackgroundTask::RefreshTodayCount => api
            .today_sessions()
            .await
            .map(|today| TaskOutcome::TodayCount { count: today.count }),
    };

    result.unwrap_or_else(|e| {
        tracing::warn!(task = ?kind, error = %e, "background task failed");
        TaskOutcome::Failed {
            kind,
            error: e.to_string(),
        }
    })
}
