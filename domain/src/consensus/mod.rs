//! Consensus sessions: long-running multi-agent generation on the backend.
//!
//! The backend runs planning, coding and testing phases and is polled for
//! [`snapshot::SessionSnapshot`]s. [`session::ConsensusSession`] folds
//! successive snapshots into phase, progress and file writes.

pub mod phase;
pub mod plan;
pub mod progress;
pub mod session;
pub mod snapshot;
