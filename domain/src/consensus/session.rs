//! Client-side state machine of one consensus session.

use super::phase::ConsensusPhase;
use super::plan::ConsensusPlan;
use super::progress::ConsensusProgress;
use super::snapshot::{DiscussionEntry, SessionSnapshot, SessionState};
use crate::orchestration::request::SessionToken;
use std::collections::BTreeMap;

/// How a session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    Completed,
    Failed(String),
}

/// Effects of applying one snapshot, for the caller to carry out
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionUpdate {
    /// Discussion entries not seen before, in order
    pub new_entries: Vec<DiscussionEntry>,
    /// Set the first time a plan appears
    pub plan: Option<ConsensusPlan>,
    /// Files whose content differs from what this session last emitted
    pub file_writes: Vec<(String, String)>,
    pub phase_changed: bool,
    pub progress_changed: bool,
    pub outcome: Option<SessionOutcome>,
}

impl SessionUpdate {
    pub fn is_empty(&self) -> bool {
        *self == SessionUpdate::default()
    }
}

/// Folds poll snapshots into phase, progress and file writes
#[derive(Debug, Clone)]
pub struct ConsensusSession {
    token: SessionToken,
    phase: ConsensusPhase,
    progress: ConsensusProgress,
    plan: Option<ConsensusPlan>,
    seen_entries: usize,
    emitted: BTreeMap<String, String>,
    outcome: Option<SessionOutcome>,
}

impl ConsensusSession {
    pub fn new(token: SessionToken) -> Self {
        let mut phase = ConsensusPhase::Idle;
        phase.advance_to(ConsensusPhase::Planning);
        let mut progress = ConsensusProgress::new();
        progress.start(phase.as_str());
        Self {
            token,
            phase,
            progress,
            plan: None,
            seen_entries: 0,
            emitted: BTreeMap::new(),
            outcome: None,
        }
    }

    pub fn token(&self) -> &SessionToken {
        &self.token
    }

    pub fn phase(&self) -> ConsensusPhase {
        self.phase
    }

    pub fn progress(&self) -> &ConsensusProgress {
        &self.progress
    }

    pub fn plan(&self) -> Option<&ConsensusPlan> {
        self.plan.as_ref()
    }

    pub fn outcome(&self) -> Option<&SessionOutcome> {
        self.outcome.as_ref()
    }

    pub fn is_terminal(&self) -> bool {
        self.outcome.is_some()
    }

    /// Apply one poll result. A terminated session ignores further snapshots.
    pub fn apply(&mut self, snapshot: SessionSnapshot) -> SessionUpdate {
        let mut update = SessionUpdate::default();
        if self.is_terminal() {
            return update;
        }

        if snapshot.discussion.len() > self.seen_entries {
            update.new_entries = snapshot.discussion[self.seen_entries..].to_vec();
            self.seen_entries = snapshot.discussion.len();
        }

        if self.plan.is_none()
            && let Some(plan) = snapshot.plan
        {
            update.progress_changed |= self.progress.set_total(plan.total_steps());
            update.phase_changed |= self.advance(ConsensusPhase::Coding);
            self.plan = Some(plan.clone());
            update.plan = Some(plan);
        }

        if let Some(phase) = snapshot.phase.filter(|p| !p.is_terminal()) {
            update.phase_changed |= self.advance(phase);
        }

        for (name, content) in snapshot.files {
            if self.emitted.get(&name) != Some(&content) {
                self.emitted.insert(name.clone(), content.clone());
                update.file_writes.push((name, content));
            }
        }

        if let Some(steps) = snapshot.completed_steps {
            update.progress_changed |= self.progress.record_completed_steps(steps);
        }

        match snapshot.state {
            SessionState::Running => {}
            SessionState::Completed => {
                update.phase_changed |= self.phase.advance_to(ConsensusPhase::Completed);
                update.progress_changed |= self.progress.complete();
                self.outcome = Some(SessionOutcome::Completed);
                update.outcome = self.outcome.clone();
            }
            SessionState::Failed => {
                let reason = snapshot
                    .error
                    .filter(|e| !e.trim().is_empty())
                    .unwrap_or_else(|| "Consensus session failed".to_string());
                self.terminate_failed(reason, &mut update);
            }
        }

        update
    }

    /// End the session from the client side (lost session, rejected poll)
    pub fn fail(&mut self, reason: impl Into<String>) -> SessionUpdate {
        let mut update = SessionUpdate::default();
        if !self.is_terminal() {
            self.terminate_failed(reason.into(), &mut update);
        }
        update
    }

    fn advance(&mut self, phase: ConsensusPhase) -> bool {
        if self.phase.advance_to(phase) {
            self.progress.set_phase(phase.as_str());
            true
        } else {
            false
        }
    }

    fn terminate_failed(&mut self, reason: String, update: &mut SessionUpdate) {
        update.phase_changed |= self.phase.advance_to(ConsensusPhase::Failed);
        update.progress_changed |= self.progress.fail();
        self.outcome = Some(SessionOutcome::Failed(reason));
        update.outcome = self.outcome.clone();
    }
}
