//! Consensus session phase.

use serde::{Deserialize, Serialize};

/// Phase of a consensus session
///
/// Phases only move forward: `idle → planning → coding → testing`, then one
/// of the terminal phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsensusPhase {
    #[default]
    Idle,
    Planning,
    Coding,
    Testing,
    Completed,
    Failed,
}

impl ConsensusPhase {
    fn rank(&self) -> u8 {
        match self {
            ConsensusPhase::Idle => 0,
            ConsensusPhase::Planning => 1,
            ConsensusPhase::Coding => 2,
            ConsensusPhase::Testing => 3,
            ConsensusPhase::Completed | ConsensusPhase::Failed => 4,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ConsensusPhase::Completed | ConsensusPhase::Failed)
    }

    /// Move to `next` if it lies ahead; returns whether the phase changed
    pub fn advance_to(&mut self, next: ConsensusPhase) -> bool {
        if self.is_terminal() || next.rank() <= self.rank() {
            return false;
        }
        *self = next;
        true
    }

    /// Parse a backend phase label, accepting the synonyms it uses
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "idle" => Some(ConsensusPhase::Idle),
            "planning" | "plan" => Some(ConsensusPhase::Planning),
            "coding" | "code" | "implementation" => Some(ConsensusPhase::Coding),
            "testing" | "test" | "review" => Some(ConsensusPhase::Testing),
            "completed" | "done" => Some(ConsensusPhase::Completed),
            "failed" | "error" => Some(ConsensusPhase::Failed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConsensusPhase::Idle => "idle",
            ConsensusPhase::Planning => "planning",
            ConsensusPhase::Coding => "coding",
            ConsensusPhase::Testing => "testing",
            ConsensusPhase::Completed => "completed",
            ConsensusPhase::Failed => "failed",
        }
    }
}

impl std::fmt::Display for ConsensusPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_only() {
        let mut phase = ConsensusPhase::Idle;
        assert!(phase.advance_to(ConsensusPhase::Coding));
        assert!(!phase.advance_to(ConsensusPhase::Planning));
        assert_eq!(phase, ConsensusPhase::Coding);
        assert!(phase.advance_to(ConsensusPhase::Failed));
        assert!(!phase.advance_to(ConsensusPhase::Completed));
        assert_eq!(phase, ConsensusPhase::Failed);
    }

    #[test]
    fn test_labels() {
        assert_eq!(ConsensusPhase::from_label("done"), Some(ConsensusPhase::Completed));
        assert_eq!(ConsensusPhase::from_label("Implementation"), Some(ConsensusPhase::Coding));
        assert_eq!(ConsensusPhase::from_label("deploying"), None);
    }
}
