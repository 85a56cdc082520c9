//! Poll results of a consensus session.

use super::phase::ConsensusPhase;
use super::plan::ConsensusPlan;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One message of the agents' discussion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscussionEntry {
    pub agent: String,
    pub content: String,
    /// `discussion`, `system`, `code`, ...
    #[serde(default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl DiscussionEntry {
    pub fn new(agent: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            agent: agent.into(),
            content: content.into(),
            kind: "discussion".to_string(),
            timestamp: None,
        }
    }
}

/// Backend-side state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    #[default]
    Running,
    Completed,
    Failed,
}

impl SessionState {
    /// Parse a backend status label, accepting the synonyms it uses
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "running" | "in_progress" | "pending" => Some(SessionState::Running),
            "completed" | "done" => Some(SessionState::Completed),
            "failed" | "error" => Some(SessionState::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, SessionState::Running)
    }
}

/// Everything one poll reported
///
/// `discussion` and `files` are cumulative: each snapshot repeats what
/// earlier ones carried.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionSnapshot {
    pub discussion: Vec<DiscussionEntry>,
    pub plan: Option<ConsensusPlan>,
    pub phase: Option<ConsensusPhase>,
    pub files: BTreeMap<String, String>,
    pub completed_steps: Option<usize>,
    pub state: SessionState,
    pub error: Option<String>,
}

impl SessionSnapshot {
    pub fn running() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, entry: DiscussionEntry) -> Self {
        self.discussion.push(entry);
        self
    }

    pub fn with_plan(mut self, plan: ConsensusPlan) -> Self {
        self.plan = Some(plan);
        self
    }

    pub fn with_phase(mut self, phase: ConsensusPhase) -> Self {
        self.phase = Some(phase);
        self
    }

    pub fn with_file(mut self, name: impl Into<String>, content: impl Into<String>) -> Self {
        self.files.insert(name.into(), content.into());
        self
    }

    pub fn with_completed_steps(mut self, steps: usize) -> Self {
        self.completed_steps = Some(steps);
        self
    }

    pub fn with_state(mut self, state: SessionState) -> Self {
        self.state = state;
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self.state = SessionState::Failed;
        self
    }
}
