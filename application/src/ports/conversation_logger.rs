//! Port for the project transcript.
//!
//! A [`ConversationLogger`] receives one [`ConversationEvent`] per thing that
//! happened to the workspace conversation: a user turn, a model reply that
//! may have written files, a consensus discussion entry, a notice, and the
//! start and end of a consensus session. Diagnostics stay in `tracing`; the
//! transcript is what a user would replay to see how a page was built.

use codeagent_domain::{DiscussionEntry, Message, MessageRole, SessionOutcome, SessionToken};
use serde_json::{Value, json};

pub const USER_MESSAGE: &str = "user_message";
pub const ASSISTANT_MESSAGE: &str = "assistant_message";
pub const ERROR_NOTICE: &str = "error_notice";
pub const NOTICE: &str = "notice";
pub const CONSENSUS_ENTRY: &str = "consensus_entry";
pub const ARTIFACT_WRITTEN: &str = "artifact_written";
pub const SESSION_OPENED: &str = "session_opened";
pub const SESSION_FINISHED: &str = "session_finished";

/// One transcript record; the logger stamps time and sequence
#[derive(Debug, Clone)]
pub struct ConversationEvent {
    pub event_type: &'static str,
    pub payload: Value,
}

impl ConversationEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }

    /// A conversation message. Assistant replies keep the model and role
    /// that produced them; system messages split into errors and notices.
    pub fn message(message: &Message) -> Self {
        let id = message.id().as_str();
        match message.role() {
            MessageRole::User => Self::new(
                USER_MESSAGE,
                json!({
                    "id": id,
                    "content": message.content(),
                    "has_image": message.image().is_some(),
                }),
            ),
            MessageRole::Assistant => Self::new(
                ASSISTANT_MESSAGE,
                json!({
                    "id": id,
                    "model": message.model().map(|m| m.to_string()),
                    "role": message.role_name(),
                    "bytes": message.content().len(),
                    "content": message.content(),
                }),
            ),
            MessageRole::System if message.is_error() => {
                Self::new(ERROR_NOTICE, json!({ "id": id, "content": message.content() }))
            }
            MessageRole::System => {
                Self::new(NOTICE, json!({ "id": id, "content": message.content() }))
            }
        }
    }

    pub fn consensus_entry(entry: &DiscussionEntry) -> Self {
        Self::new(
            CONSENSUS_ENTRY,
            json!({ "agent": entry.agent, "kind": entry.kind, "content": entry.content }),
        )
    }

    pub fn artifact_written(file: &str) -> Self {
        Self::new(ARTIFACT_WRITTEN, json!({ "file": file }))
    }

    pub fn session_opened(token: &SessionToken) -> Self {
        Self::new(SESSION_OPENED, json!({ "session": token.as_str() }))
    }

    pub fn session_finished(outcome: &SessionOutcome) -> Self {
        let (status, error) = match outcome {
            SessionOutcome::Completed => ("completed", None),
            SessionOutcome::Failed(reason) => ("failed", Some(reason.as_str())),
        };
        Self::new(SESSION_FINISHED, json!({ "status": status, "error": error }))
    }
}

/// Receives transcript events. Never fails: a broken transcript file must
/// not interrupt a generation, so implementations log and drop errors.
pub trait ConversationLogger: Send + Sync {
    fn log(&self, event: ConversationEvent);
}

/// Used when no transcript file is configured
pub struct NoConversationLogger;

impl ConversationLogger for NoConversationLogger {
    fn log(&self, _event: ConversationEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use codeagent_domain::Model;
    use std::collections::BTreeMap;

    #[test]
    fn test_assistant_reply_keeps_model_and_role() {
        let metadata = BTreeMap::from([("role".to_string(), json!("coder"))]);
        let reply = Message::assistant(Model::Gpt4o, "<p>hi</p>", metadata);
        let event = ConversationEvent::message(&reply);
        assert_eq!(event.event_type, ASSISTANT_MESSAGE);
        assert_eq!(event.payload["model"], "openai/gpt-4o");
        assert_eq!(event.payload["role"], "coder");
        assert_eq!(event.payload["bytes"], 9);
    }

    #[test]
    fn test_system_messages_split_by_severity() {
        let error = ConversationEvent::message(&Message::error_notice("rate limited"));
        assert_eq!(error.event_type, ERROR_NOTICE);
        assert_eq!(error.payload["content"], "rate limited");

        let user = ConversationEvent::message(&Message::user("make a clock"));
        assert_eq!(user.event_type, USER_MESSAGE);
        assert_eq!(user.payload["has_image"], false);
    }

    #[test]
    fn test_session_finished_carries_failure_reason() {
        let failed = ConversationEvent::session_finished(&SessionOutcome::Failed("lost".into()));
        assert_eq!(failed.payload, json!({ "status": "failed", "error": "lost" }));

        let done = ConversationEvent::session_finished(&SessionOutcome::Completed);
        assert_eq!(done.payload, json!({ "status": "completed", "error": null }));
    }
}
