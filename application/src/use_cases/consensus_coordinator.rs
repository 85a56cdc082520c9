//! Consensus Coordinator use case
//!
//! Polls a backend consensus session on a timer and folds every snapshot
//! into the workspace. Transport failures and timeouts are retried on the
//! next tick; a lost or rejected session ends the poll with one error
//! notice.

use crate::ports::chat_dispatch::{DispatchError, SessionStatusSource};
use crate::use_cases::shared::Observers;
use crate::workspace::SharedWorkspace;
use codeagent_domain::SessionToken;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Result of one poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Keep polling
    Continue,
    /// The session ended or polling was cancelled; no more fetches
    Stopped,
}

/// Polls one consensus session
pub struct ConsensusCoordinator {
    workspace: SharedWorkspace,
    source: Arc<dyn SessionStatusSource>,
    token: SessionToken,
    observers: Observers,
    tick_timeout: Duration,
    cancel: CancellationToken,
}

impl ConsensusCoordinator {
    /// `cancel` must be the token registered with the workspace for `token`
    pub fn new(
        workspace: SharedWorkspace,
        source: Arc<dyn SessionStatusSource>,
        token: SessionToken,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            workspace,
            source,
            token,
            observers: Observers::default(),
            tick_timeout: Duration::from_secs(10),
            cancel,
        }
    }

    pub fn with_observers(mut self, observers: Observers) -> Self {
        self.observers = observers;
        self
    }

    pub fn with_tick_timeout(mut self, timeout: Duration) -> Self {
        self.tick_timeout = timeout;
        self
    }

    pub fn token(&self) -> &SessionToken {
        &self.token
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Perform one poll.
    ///
    /// After termination or cancellation this returns
    /// [`TickOutcome::Stopped`] without fetching or writing anything.
    pub async fn tick(&self) -> TickOutcome {
        if self.is_stopped() {
            return TickOutcome::Stopped;
        }

        let fetched = tokio::time::timeout(self.tick_timeout, self.source.fetch(&self.token)).await;
        let snapshot = match fetched {
            Err(_) => {
                warn!(
                    "Poll of session {} timed out after {:?}; retrying",
                    self.token, self.tick_timeout
                );
                return TickOutcome::Continue;
            }
            Ok(Err(e)) if e.is_retryable() => {
                warn!("Poll of session {} failed: {}; retrying", self.token, e);
                return TickOutcome::Continue;
            }
            Ok(Err(e)) => return self.terminate(&e),
            Ok(Ok(snapshot)) => snapshot,
        };

        // The cancellation check happens under the workspace lock, so a
        // concurrent cancel either waits for this write or prevents it
        let changes = self.workspace.update(|ws| {
            if self.cancel.is_cancelled() {
                return None;
            }
            ws.apply_snapshot(&self.token, snapshot)
        });

        let Some(changes) = changes else {
            debug!("Session {} is no longer polled; dropping snapshot", self.token);
            self.cancel.cancel();
            return TickOutcome::Stopped;
        };

        self.observers.publish(&changes);
        if let Some(outcome) = &changes.session_ended {
            info!("Consensus session {} ended: {:?}", self.token, outcome);
            return TickOutcome::Stopped;
        }
        TickOutcome::Continue
    }

    fn terminate(&self, error: &DispatchError) -> TickOutcome {
        warn!("Consensus session {} terminated: {}", self.token, error);
        let reason = error.to_string();
        let changes = self.workspace.update(|ws| {
            if self.cancel.is_cancelled() {
                return None;
            }
            ws.fail_session(&self.token, &reason)
        });
        if let Some(changes) = changes {
            self.observers.publish(&changes);
        }
        self.cancel.cancel();
        TickOutcome::Stopped
    }

    /// Stop polling. Idempotent; returns once any in-flight write finished.
    pub fn cancel(&self) {
        self.cancel.cancel();
        let changes = self
            .workspace
            .update(|ws| ws.stop_polling(Some(&self.token)));
        if !changes.is_empty() {
            info!("Cancelled polling of session {}", self.token);
            self.observers.publish(&changes);
        }
    }

    /// Poll every `interval` on a background task until the session ends or
    /// the returned handle is cancelled or dropped
    pub fn spawn(self, interval: Duration) -> PollHandle {
        let coordinator = Arc::new(self);
        let task_coordinator = Arc::clone(&coordinator);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = task_coordinator.cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        if task_coordinator.tick().await == TickOutcome::Stopped {
                            break;
                        }
                    }
                }
            }
            debug!("Poll loop for session {} finished", task_coordinator.token);
        });

        PollHandle {
            coordinator,
            task: Some(task),
        }
    }
}

/// Owner of a running poll loop
///
/// Cancelling is idempotent; dropping the handle cancels as well.
pub struct PollHandle {
    coordinator: Arc<ConsensusCoordinator>,
    task: Option<JoinHandle<()>>,
}

impl PollHandle {
    pub fn token(&self) -> &SessionToken {
        self.coordinator.token()
    }

    pub fn is_finished(&self) -> bool {
        self.coordinator.is_stopped()
            || self.task.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Poll once outside the timer
    pub async fn tick(&self) -> TickOutcome {
        self.coordinator.tick().await
    }

    pub fn cancel(&self) {
        self.coordinator.cancel();
    }

    /// Wait until the poll loop ends on its own (completion or failure)
    pub async fn wait(mut self) {
        if let Some(task) = self.task.take()
            && let Err(e) = task.await
        {
            warn!("Poll loop for session {} aborted: {}", self.token(), e);
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.coordinator.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionSettings;
    use crate::workspace::Workspace;
    use async_trait::async_trait;
    use codeagent_domain::{
        ConsensusPlan, PlanStep, ProgressStatus, RoleRegistry, SessionSnapshot, SessionState,
    };
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Replays scripted poll results; an exhausted script keeps reporting
    /// a running session with nothing new
    struct ScriptedStatus {
        script: Mutex<VecDeque<Result<SessionSnapshot, DispatchError>>>,
        fetches: AtomicUsize,
        delay: Option<Duration>,
    }

    impl ScriptedStatus {
        fn new(script: Vec<Result<SessionSnapshot, DispatchError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                fetches: AtomicUsize::new(0),
                delay: None,
            }
        }

        fn fetches(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SessionStatusSource for ScriptedStatus {
        async fn fetch(&self, _token: &SessionToken) -> Result<SessionSnapshot, DispatchError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(SessionSnapshot::running()))
        }
    }

    fn plan_of(steps: usize) -> ConsensusPlan {
        ConsensusPlan {
            name: "Clock".to_string(),
            steps: (1..=steps)
                .map(|i| PlanStep {
                    id: i.to_string(),
                    description: format!("step {i}"),
                    kind: None,
                    files: vec![],
                })
                .collect(),
        }
    }

    fn polling_workspace(token: &SessionToken) -> (SharedWorkspace, CancellationToken) {
        let workspace = SharedWorkspace::new(Workspace::new(
            SessionSettings::default(),
            RoleRegistry::default(),
        ));
        let cancel = CancellationToken::new();
        workspace.update(|ws| ws.begin_session(token.clone(), cancel.clone()));
        (workspace, cancel)
    }

    fn coordinator(
        script: Vec<Result<SessionSnapshot, DispatchError>>,
    ) -> (ConsensusCoordinator, SharedWorkspace, Arc<ScriptedStatus>) {
        let token = SessionToken::new("session-1");
        let (workspace, cancel) = polling_workspace(&token);
        let source = Arc::new(ScriptedStatus::new(script));
        let coordinator =
            ConsensusCoordinator::new(workspace.clone(), source.clone(), token, cancel);
        (coordinator, workspace, source)
    }

    #[tokio::test]
    async fn test_plan_progress_then_completion() {
        let (coordinator, workspace, source) = coordinator(vec![
            Ok(SessionSnapshot::running().with_plan(plan_of(3))),
            Ok(SessionSnapshot::running()
                .with_plan(plan_of(3))
                .with_completed_steps(1)
                .with_file("index.html", "<h1>Clock</h1>")),
            Ok(SessionSnapshot::running().with_state(SessionState::Completed)),
        ]);

        assert_eq!(coordinator.tick().await, TickOutcome::Continue);
        assert_eq!(coordinator.tick().await, TickOutcome::Continue);
        workspace.read(|ws| {
            let progress = ws.progress().unwrap();
            assert_eq!(progress.current(), 1);
            assert_eq!(progress.total(), 3);
            assert_eq!(progress.status(), ProgressStatus::Running);
            assert_eq!(ws.artifacts().get("index.html"), Some("<h1>Clock</h1>"));
        });

        assert_eq!(coordinator.tick().await, TickOutcome::Stopped);
        workspace.read(|ws| {
            assert!(!ws.is_polling());
            assert!(!ws.is_generating());
            assert_eq!(ws.progress().unwrap().status(), ProgressStatus::Completed);
        });

        // A manual tick after termination neither fetches nor writes
        let before = workspace.read(|ws| (ws.artifacts().clone(), ws.conversation().len()));
        assert_eq!(coordinator.tick().await, TickOutcome::Stopped);
        assert_eq!(source.fetches(), 3);
        let after = workspace.read(|ws| (ws.artifacts().clone(), ws.conversation().len()));
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_transport_failure_is_retried() {
        let (coordinator, workspace, source) = coordinator(vec![
            Err(DispatchError::Transport("connection reset".to_string())),
            Ok(SessionSnapshot::running().with_completed_steps(0)),
        ]);

        assert_eq!(coordinator.tick().await, TickOutcome::Continue);
        assert_eq!(coordinator.tick().await, TickOutcome::Continue);
        assert_eq!(source.fetches(), 2);
        workspace.read(|ws| {
            assert!(ws.is_polling());
            assert!(!ws.conversation().messages().iter().any(|m| m.is_error()));
        });
    }

    #[tokio::test]
    async fn test_lost_session_is_terminal_with_one_notice() {
        let (coordinator, workspace, _source) = coordinator(vec![Err(
            DispatchError::SessionLost("session-1".to_string()),
        )]);

        assert_eq!(coordinator.tick().await, TickOutcome::Stopped);
        assert_eq!(coordinator.tick().await, TickOutcome::Stopped);

        workspace.read(|ws| {
            let errors = ws
                .conversation()
                .messages()
                .iter()
                .filter(|m| m.is_error())
                .count();
            assert_eq!(errors, 1);
            assert!(!ws.is_polling());
            assert_eq!(ws.progress().unwrap().status(), ProgressStatus::Failed);
        });
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_poll_times_out_and_retries() {
        let token = SessionToken::new("slow");
        let (workspace, cancel) = polling_workspace(&token);
        let source = Arc::new(ScriptedStatus {
            delay: Some(Duration::from_secs(30)),
            ..ScriptedStatus::new(vec![])
        });
        let coordinator = ConsensusCoordinator::new(workspace.clone(), source, token, cancel)
            .with_tick_timeout(Duration::from_secs(1));

        assert_eq!(coordinator.tick().await, TickOutcome::Continue);
        assert!(workspace.read(|ws| ws.is_polling()));
    }

    #[tokio::test]
    async fn test_cancel_prevents_further_writes() {
        let (coordinator, workspace, source) = coordinator(vec![Ok(
            SessionSnapshot::running().with_file("script.js", "late();"),
        )]);

        coordinator.cancel();
        coordinator.cancel();
        assert_eq!(coordinator.tick().await, TickOutcome::Stopped);
        assert_eq!(source.fetches(), 0);
        workspace.read(|ws| {
            assert_ne!(ws.artifacts().get("script.js"), Some("late();"));
            assert!(!ws.is_polling());
            assert!(!ws.is_generating());
        });
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawned_loop_stops_on_completion() {
        let (coordinator, workspace, source) = coordinator(vec![
            Ok(SessionSnapshot::running().with_plan(plan_of(2))),
            Ok(SessionSnapshot::running().with_completed_steps(1)),
            Ok(SessionSnapshot::running().with_state(SessionState::Completed)),
        ]);

        let handle = coordinator.spawn(Duration::from_millis(500));
        let coordinator = handle.coordinator.clone();
        handle.wait().await;

        assert_eq!(source.fetches(), 3);
        assert!(coordinator.is_stopped());
        assert_eq!(coordinator.tick().await, TickOutcome::Stopped);
        assert_eq!(source.fetches(), 3);
        assert!(!workspace.read(|ws| ws.is_polling()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handle_cancels_poll() {
        let (coordinator, workspace, source) = coordinator(vec![]);
        let handle = coordinator.spawn(Duration::from_millis(500));
        tokio::time::sleep(Duration::from_millis(1200)).await;
        drop(handle);

        let fetched = source.fetches();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(source.fetches(), fetched);
        assert!(!workspace.read(|ws| ws.is_polling()));
    }
}
