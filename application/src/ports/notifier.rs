//! Workspace change notification port
//!
//! Implementations live in the presentation layer and show changes as they
//! happen. All callbacks are invoked after the workspace lock is released.

use codeagent_domain::{ConsensusProgress, DiscussionEntry, Message};

pub trait WorkspaceNotifier: Send + Sync {
    /// The generating indicator turned on or off
    fn on_generating(&self, _active: bool) {}

    /// A message was appended to the conversation log
    fn on_message(&self, _message: &Message) {}

    /// A consensus discussion entry arrived
    fn on_consensus_entry(&self, _entry: &DiscussionEntry) {}

    /// Consensus progress changed
    fn on_progress(&self, _progress: &ConsensusProgress) {}

    /// Files were written by an agent or a load
    fn on_files_changed(&self, _files: &[String]) {}
}

/// No-op notifier for tests and one-shot runs
pub struct NoNotifier;

impl WorkspaceNotifier for NoNotifier {}
