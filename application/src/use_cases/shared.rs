//! Shared utilities for use cases.
//!
//! [`Observers`] fans workspace [`Changes`] out to the notifier, the
//! conversation logger and the preview refresher once the workspace lock
//! has been released.

use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::notifier::{NoNotifier, WorkspaceNotifier};
use crate::use_cases::preview_refresher::PreviewTrigger;
use crate::workspace::Changes;
use std::sync::Arc;

/// Everything that reacts to workspace changes
#[derive(Clone)]
pub struct Observers {
    pub notifier: Arc<dyn WorkspaceNotifier>,
    pub logger: Arc<dyn ConversationLogger>,
    pub preview: PreviewTrigger,
}

impl Default for Observers {
    fn default() -> Self {
        Self {
            notifier: Arc::new(NoNotifier),
            logger: Arc::new(NoConversationLogger),
            preview: PreviewTrigger::disabled(),
        }
    }
}

impl Observers {
    pub fn with_notifier(mut self, notifier: Arc<dyn WorkspaceNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_preview(mut self, preview: PreviewTrigger) -> Self {
        self.preview = preview;
        self
    }

    /// Deliver `changes`; must be called without the workspace lock held
    pub fn publish(&self, changes: &Changes) {
        if let Some(token) = &changes.session_opened {
            self.logger.log(ConversationEvent::session_opened(token));
        }

        for message in &changes.messages {
            self.logger.log(ConversationEvent::message(message));
            self.notifier.on_message(message);
        }

        for entry in &changes.consensus_entries {
            self.logger.log(ConversationEvent::consensus_entry(entry));
            self.notifier.on_consensus_entry(entry);
        }

        if !changes.files_written.is_empty() {
            for file in &changes.files_written {
                self.logger.log(ConversationEvent::artifact_written(file));
            }
            self.notifier.on_files_changed(&changes.files_written);
        }

        if let Some(progress) = &changes.progress {
            self.notifier.on_progress(progress);
        }

        if let Some(outcome) = &changes.session_ended {
            self.logger.log(ConversationEvent::session_finished(outcome));
        }

        if let Some(active) = changes.generating {
            self.notifier.on_generating(active);
        }

        if changes.refresh_now {
            self.preview.request_now();
        } else if changes.needs_refresh {
            self.preview.request();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codeagent_domain::{Message, SessionOutcome, SessionToken};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingLogger {
        events: Mutex<Vec<&'static str>>,
    }

    impl ConversationLogger for RecordingLogger {
        fn log(&self, event: ConversationEvent) {
            self.events.lock().unwrap().push(event.event_type);
        }
    }

    #[test]
    fn test_publish_logs_in_order() {
        let logger = Arc::new(RecordingLogger::default());
        let observers = Observers::default().with_logger(logger.clone());

        let changes = Changes {
            session_opened: Some(SessionToken::new("s")),
            messages: vec![Message::user("hi"), Message::error_notice("boom")],
            files_written: vec!["index.html".to_string()],
            session_ended: Some(SessionOutcome::Failed("lost".to_string())),
            ..Default::default()
        };
        observers.publish(&changes);

        assert_eq!(
            *logger.events.lock().unwrap(),
            vec![
                "session_opened",
                "user_message",
                "error_notice",
                "artifact_written",
                "session_finished"
            ]
        );
    }
}
