//! Step progress of a consensus session.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStatus {
    #[default]
    Idle,
    Running,
    Paused,
    Completed,
    Failed,
}

impl ProgressStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProgressStatus::Completed | ProgressStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressStatus::Idle => "idle",
            ProgressStatus::Running => "running",
            ProgressStatus::Paused => "paused",
            ProgressStatus::Completed => "completed",
            ProgressStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for ProgressStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `current` of `total` plan steps done (Value Object)
///
/// - `current` never decreases and never exceeds a positive `total`;
/// - once a plan has set a positive `total`, the status is `Completed`
///   exactly when `current == total`;
/// - `Completed` and `Failed` are final; only `Running ↔ Paused` goes back.
///
/// Every mutator returns whether anything changed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConsensusProgress {
    current: usize,
    total: usize,
    phase: String,
    status: ProgressStatus,
}

impl ConsensusProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn phase(&self) -> &str {
        &self.phase
    }

    pub fn status(&self) -> ProgressStatus {
        self.status
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Fraction of steps done, 0.0 when there is no plan yet
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.current as f64 / self.total as f64
        }
    }

    pub fn start(&mut self, phase: impl Into<String>) -> bool {
        if self.status != ProgressStatus::Idle {
            return false;
        }
        self.status = ProgressStatus::Running;
        self.phase = phase.into();
        true
    }

    pub fn pause(&mut self) -> bool {
        if self.status != ProgressStatus::Running {
            return false;
        }
        self.status = ProgressStatus::Paused;
        true
    }

    pub fn resume(&mut self) -> bool {
        if self.status != ProgressStatus::Paused {
            return false;
        }
        self.status = ProgressStatus::Running;
        true
    }

    pub fn set_phase(&mut self, phase: impl Into<String>) -> bool {
        let phase = phase.into();
        if self.is_terminal() || self.phase == phase {
            return false;
        }
        self.phase = phase;
        true
    }

    /// Set the number of plan steps; never below the steps already done
    pub fn set_total(&mut self, total: usize) -> bool {
        if self.is_terminal() {
            return false;
        }
        let total = total.max(self.current);
        if total == self.total {
            return false;
        }
        self.total = total;
        self.complete_if_done();
        true
    }

    /// Record the cumulative number of completed steps.
    ///
    /// Lower counts than already recorded are ignored; counts above a known
    /// total are clamped to it.
    pub fn record_completed_steps(&mut self, completed: usize) -> bool {
        if self.is_terminal() {
            return false;
        }
        let completed = if self.total > 0 {
            completed.min(self.total)
        } else {
            completed
        };
        if completed <= self.current {
            return false;
        }
        self.current = completed;
        self.complete_if_done();
        true
    }

    /// Mark the session finished; all steps count as done
    pub fn complete(&mut self) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.current = self.total;
        self.status = ProgressStatus::Completed;
        true
    }

    pub fn fail(&mut self) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.status = ProgressStatus::Failed;
        true
    }

    fn complete_if_done(&mut self) {
        if self.total > 0 && self.current == self.total {
            self.status = ProgressStatus::Completed;
        }
    }
}

impl std::fmt::Display for ConsensusProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{} [{}]", self.current, self.total, self.status)?;
        if !self.phase.is_empty() {
            write!(f, " {}", self.phase)?;
        }
        Ok(())
    }
}
