//! Shared session state.
//!
//! All mutable state of a session lives in one [`Workspace`] behind one
//! mutex ([`SharedWorkspace`]). Every mutation is a short critical section
//! that is never held across an `.await`, so mutations are serialised the
//! way event-loop handlers would be. Mutations return [`Changes`] which the
//! caller publishes to observers after the lock is released.

use crate::config::SessionSettings;
use codeagent_domain::{
    ArtifactStore, ConsensusProgress, ConsensusSession, ConversationLog, DiscussionEntry,
    DomainError, Message, ModelReply, NoticeKind, RoleEntry, RoleKey, RoleRegistry, RoleUpdate,
    SessionOutcome, SessionSnapshot, SessionToken, WriteOutcome, extract_code_blocks,
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// What a mutation changed, for notification after the lock is released
#[derive(Debug, Default)]
pub struct Changes {
    pub messages: Vec<Message>,
    pub consensus_entries: Vec<DiscussionEntry>,
    pub files_written: Vec<String>,
    pub progress: Option<ConsensusProgress>,
    pub generating: Option<bool>,
    /// A previewable file changed; refresh after the debounce window
    pub needs_refresh: bool,
    /// Refresh without waiting (project load)
    pub refresh_now: bool,
    pub session_opened: Option<SessionToken>,
    pub session_ended: Option<SessionOutcome>,
}

impl Changes {
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
            && self.consensus_entries.is_empty()
            && self.files_written.is_empty()
            && self.progress.is_none()
            && self.generating.is_none()
            && !self.needs_refresh
            && !self.refresh_now
            && self.session_opened.is_none()
            && self.session_ended.is_none()
    }
}

/// The consensus session currently being polled
#[derive(Debug)]
struct ActivePoll {
    token: SessionToken,
    cancel: CancellationToken,
}

/// Artifact store, conversation log, roles and session state
#[derive(Debug)]
pub struct Workspace {
    artifacts: ArtifactStore,
    conversation: ConversationLog,
    roles: RoleRegistry,
    settings: SessionSettings,
    consensus_log: Vec<DiscussionEntry>,
    session: Option<ConsensusSession>,
    poll: Option<ActivePoll>,
    generating: bool,
}

impl Workspace {
    /// Fresh workspace on the scaffold project
    pub fn new(settings: SessionSettings, roles: RoleRegistry) -> Self {
        Self {
            artifacts: ArtifactStore::scaffold(),
            conversation: ConversationLog::new(),
            roles,
            settings,
            consensus_log: Vec::new(),
            session: None,
            poll: None,
            generating: false,
        }
    }

    // ==================== Queries ====================

    pub fn artifacts(&self) -> &ArtifactStore {
        &self.artifacts
    }

    pub fn conversation(&self) -> &ConversationLog {
        &self.conversation
    }

    pub fn roles(&self) -> &RoleRegistry {
        &self.roles
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Discussion entries of the current or last consensus session
    pub fn consensus_log(&self) -> &[DiscussionEntry] {
        &self.consensus_log
    }

    /// Current or last consensus session
    pub fn session(&self) -> Option<&ConsensusSession> {
        self.session.as_ref()
    }

    pub fn progress(&self) -> Option<&ConsensusProgress> {
        self.session.as_ref().map(ConsensusSession::progress)
    }

    pub fn is_generating(&self) -> bool {
        self.generating
    }

    /// A consensus session of an earlier turn is still being polled
    pub fn is_polling(&self) -> bool {
        self.poll.is_some()
    }

    // ==================== Settings ====================

    pub fn settings_mut(&mut self) -> &mut SessionSettings {
        &mut self.settings
    }

    pub fn update_role(&mut self, key: RoleKey, update: RoleUpdate) -> RoleEntry {
        self.roles.update(key, update).clone()
    }

    // ==================== Building blocks ====================

    fn append(&mut self, message: Message, changes: &mut Changes) {
        self.conversation.append(message.clone());
        changes.messages.push(message);
    }

    fn set_generating(&mut self, active: bool, changes: &mut Changes) {
        if self.generating != active {
            self.generating = active;
            changes.generating = Some(active);
        }
    }

    fn write_file(
        &mut self,
        filename: &str,
        content: &str,
        changes: &mut Changes,
    ) -> Result<WriteOutcome, DomainError> {
        let outcome = self.artifacts.write(filename, content)?;
        if outcome.changed {
            changes.files_written.push(filename.to_string());
        }
        changes.needs_refresh |= outcome.needs_refresh();
        Ok(outcome)
    }

    /// Apply a batch of writes, skipping (and logging) rejected names
    fn write_files<'a>(
        &mut self,
        files: impl IntoIterator<Item = (&'a str, &'a str)>,
        changes: &mut Changes,
    ) {
        for (filename, content) in files {
            if let Err(e) = self.write_file(filename, content, changes) {
                warn!("Skipping generated file '{}': {}", filename, e);
            }
        }
    }

    // ==================== Orchestration ====================

    /// Record the user's turn and raise the generating indicator
    pub fn begin_turn(&mut self, message: Message) -> Changes {
        let mut changes = Changes::default();
        self.append(message, &mut changes);
        self.set_generating(true, &mut changes);
        changes
    }

    /// Append each reply and apply its code blocks in order (last wins)
    pub fn apply_replies(&mut self, replies: Vec<ModelReply>) -> Changes {
        let mut changes = Changes::default();
        for reply in replies {
            let extraction = extract_code_blocks(&reply.content);
            debug!(
                "Reply from {} carries {} code block(s)",
                reply.model,
                extraction.blocks.len()
            );
            self.append(
                Message::assistant(reply.model, reply.content, reply.metadata),
                &mut changes,
            );
            self.write_files(extraction.pairs(), &mut changes);
        }
        self.set_generating(false, &mut changes);
        changes
    }

    /// A call failed: one error notice, artifacts untouched
    pub fn record_failure(&mut self, text: impl Into<String>) -> Changes {
        let mut changes = Changes::default();
        self.append(Message::error_notice(text), &mut changes);
        self.set_generating(false, &mut changes);
        changes
    }

    /// Start tracking a consensus session; the indicator stays on while it polls
    pub fn begin_session(&mut self, token: SessionToken, cancel: CancellationToken) -> Changes {
        let mut changes = Changes::default();
        if let Some(previous) = self.poll.take() {
            warn!("Session {} superseded by {}", previous.token, token);
            previous.cancel.cancel();
        }

        let session = ConsensusSession::new(token.clone());
        changes.progress = Some(session.progress().clone());
        self.session = Some(session);
        self.consensus_log.clear();
        self.poll = Some(ActivePoll {
            token: token.clone(),
            cancel,
        });

        self.append(
            Message::system(
                NoticeKind::Consensus,
                "Consensus session started. The agents are planning the project...",
            ),
            &mut changes,
        );
        self.set_generating(true, &mut changes);
        changes.session_opened = Some(token);
        changes
    }

    fn is_current_poll(&self, token: &SessionToken) -> bool {
        self.poll
            .as_ref()
            .is_some_and(|p| &p.token == token && !p.cancel.is_cancelled())
    }

    /// Fold one poll result into the workspace.
    ///
    /// Returns `None` when `token` is no longer the live poll (cancelled,
    /// finished, or replaced); nothing is written in that case.
    pub fn apply_snapshot(
        &mut self,
        token: &SessionToken,
        snapshot: SessionSnapshot,
    ) -> Option<Changes> {
        if !self.is_current_poll(token) {
            return None;
        }
        let session = self.session.as_mut()?;
        let update = session.apply(snapshot);
        let progress = session.progress().clone();
        let plan_name = session.plan().map(|p| p.name.clone());

        let mut changes = Changes::default();
        self.consensus_log.extend(update.new_entries.iter().cloned());
        changes.consensus_entries = update.new_entries;

        if let Some(plan) = &update.plan {
            self.append(
                Message::system(
                    NoticeKind::Consensus,
                    format!("Plan '{}' agreed with {} step(s).", plan.name, plan.total_steps()),
                ),
                &mut changes,
            );
        }

        self.write_files(
            update
                .file_writes
                .iter()
                .map(|(name, content)| (name.as_str(), content.as_str())),
            &mut changes,
        );

        if update.progress_changed || update.phase_changed {
            changes.progress = Some(progress.clone());
        }

        if let Some(outcome) = update.outcome {
            let message = match &outcome {
                SessionOutcome::Completed => Message::system(
                    NoticeKind::Consensus,
                    match plan_name {
                        Some(name) => format!(
                            "Consensus session completed: '{}' ({}/{} steps).",
                            name,
                            progress.current(),
                            progress.total()
                        ),
                        None => "Consensus session completed.".to_string(),
                    },
                ),
                SessionOutcome::Failed(reason) => {
                    Message::error_notice(format!("Consensus session failed: {reason}"))
                }
            };
            self.finish_poll(message, outcome, &mut changes);
        }

        Some(changes)
    }

    /// End the live poll with a failure raised on the client side
    pub fn fail_session(&mut self, token: &SessionToken, reason: &str) -> Option<Changes> {
        if !self.is_current_poll(token) {
            return None;
        }
        let session = self.session.as_mut()?;
        let update = session.fail(reason);
        let outcome = update.outcome?;

        let mut changes = Changes {
            progress: Some(session.progress().clone()),
            ..Default::default()
        };
        self.finish_poll(
            Message::error_notice(format!("Consensus session failed: {reason}")),
            outcome,
            &mut changes,
        );
        Some(changes)
    }

    fn finish_poll(&mut self, message: Message, outcome: SessionOutcome, changes: &mut Changes) {
        if let Some(poll) = self.poll.take() {
            poll.cancel.cancel();
        }
        self.append(message, changes);
        self.set_generating(false, changes);
        changes.session_ended = Some(outcome);
    }

    /// Stop polling without a notice (view teardown, project load).
    ///
    /// With `Some(token)`, only that session is stopped.
    pub fn stop_polling(&mut self, token: Option<&SessionToken>) -> Changes {
        let mut changes = Changes::default();
        let matches = self
            .poll
            .as_ref()
            .is_some_and(|p| token.is_none_or(|t| &p.token == t));
        if matches && let Some(poll) = self.poll.take() {
            poll.cancel.cancel();
            debug!("Stopped polling consensus session {}", poll.token);
            self.set_generating(false, &mut changes);
        }
        changes
    }

    // ==================== Projects ====================

    /// Swap in a loaded project; any live poll is cancelled first
    pub fn restore(
        &mut self,
        artifacts: ArtifactStore,
        conversation: ConversationLog,
        roles: RoleRegistry,
    ) -> Changes {
        let mut changes = self.stop_polling(None);
        self.artifacts = artifacts;
        self.conversation = conversation;
        self.roles = roles;
        self.consensus_log.clear();
        self.session = None;
        changes.files_written = self.artifacts.filenames().map(str::to_string).collect();
        changes.refresh_now = true;
        changes
    }

    // ==================== Direct edits ====================

    pub fn artifacts_mut(&mut self) -> &mut ArtifactStore {
        &mut self.artifacts
    }
}

/// Handle to the workspace shared between tasks
#[derive(Debug, Clone)]
pub struct SharedWorkspace {
    inner: Arc<Mutex<Workspace>>,
}

impl SharedWorkspace {
    pub fn new(workspace: Workspace) -> Self {
        Self {
            inner: Arc::new(Mutex::new(workspace)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Workspace> {
        // Every critical section leaves the workspace consistent, so a
        // poisoned lock still guards valid state
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` with shared access
    pub fn read<R>(&self, f: impl FnOnce(&Workspace) -> R) -> R {
        f(&self.lock())
    }

    /// Run `f` with exclusive access
    pub fn update<R>(&self, f: impl FnOnce(&mut Workspace) -> R) -> R {
        f(&mut self.lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codeagent_domain::{
        ConsensusPlan, Model, PlanStep, ProgressStatus, SessionState,
    };

    fn workspace() -> Workspace {
        Workspace::new(SessionSettings::default(), RoleRegistry::default())
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

    #[test]
    fn test_replies_apply_in_order_last_wins() {
        let mut ws = workspace();
        ws.begin_turn(Message::user("clock"));
        let changes = ws.apply_replies(vec![
            ModelReply::new(Model::Gpt4o, "```js\nfirst()\n```"),
            ModelReply::new(Model::ClaudeSonnet35, "```js\nsecond()\n```"),
        ]);

        assert_eq!(ws.artifacts().get("script.js"), Some("second()"));
        assert_eq!(ws.conversation().len(), 3);
        assert_eq!(changes.messages.len(), 2);
        assert!(changes.needs_refresh);
        assert_eq!(changes.generating, Some(false));
        assert!(!ws.is_generating());
    }

    #[test]
    fn test_failure_leaves_artifacts_untouched() {
        let mut ws = workspace();
        let before = ws.artifacts().clone();
        ws.begin_turn(Message::user("clock"));
        let changes = ws.record_failure("Request failed: boom");

        assert_eq!(ws.artifacts(), &before);
        assert!(ws.conversation().last().unwrap().is_error());
        assert!(changes.files_written.is_empty());
    }

    #[test]
    fn test_snapshot_for_stale_token_is_ignored() {
        let mut ws = workspace();
        let cancel = CancellationToken::new();
        ws.begin_session(SessionToken::new("a"), cancel.clone());

        let stale = ws.apply_snapshot(
            &SessionToken::new("b"),
            SessionSnapshot::running().with_file("script.js", "x()"),
        );
        assert!(stale.is_none());

        cancel.cancel();
        let cancelled = ws.apply_snapshot(
            &SessionToken::new("a"),
            SessionSnapshot::running().with_file("script.js", "x()"),
        );
        assert!(cancelled.is_none());
        assert_ne!(ws.artifacts().get("script.js"), Some("x()"));
    }

    #[test]
    fn test_session_lifecycle() {
        let mut ws = workspace();
        let token = SessionToken::new("s");
        let cancel = CancellationToken::new();
        ws.begin_session(token.clone(), cancel.clone());
        assert!(ws.is_polling());
        assert!(ws.is_generating());

        let changes = ws
            .apply_snapshot(&token, SessionSnapshot::running().with_plan(plan_of(3)))
            .unwrap();
        assert_eq!(changes.progress.unwrap().total(), 3);

        ws.apply_snapshot(&token, SessionSnapshot::running().with_completed_steps(1))
            .unwrap();
        let progress = ws.progress().unwrap();
        assert_eq!((progress.current(), progress.total()), (1, 3));
        assert_eq!(progress.status(), ProgressStatus::Running);

        let changes = ws
            .apply_snapshot(
                &token,
                SessionSnapshot::running().with_state(SessionState::Completed),
            )
            .unwrap();
        assert_eq!(changes.session_ended, Some(SessionOutcome::Completed));
        assert!(!ws.is_polling());
        assert!(!ws.is_generating());
        assert!(cancel.is_cancelled());
    }

    #[test]
    fn test_restore_cancels_poll_and_requests_refresh() {
        let mut ws = workspace();
        let cancel = CancellationToken::new();
        ws.begin_session(SessionToken::new("s"), cancel.clone());

        let changes = ws.restore(
            ArtifactStore::scaffold(),
            ConversationLog::new(),
            RoleRegistry::unassigned(),
        );
        assert!(cancel.is_cancelled());
        assert!(changes.refresh_now);
        assert!(ws.conversation().is_empty());
        assert!(ws.session().is_none());
    }

    #[test]
    fn test_stop_polling_only_matching_token() {
        let mut ws = workspace();
        ws.begin_session(SessionToken::new("live"), CancellationToken::new());
        assert!(ws.stop_polling(Some(&SessionToken::new("other"))).is_empty());
        assert!(ws.is_polling());
        ws.stop_polling(Some(&SessionToken::new("live")));
        assert!(!ws.is_polling());
    }
}
