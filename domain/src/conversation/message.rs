//! Immutable chat message entity.

use crate::core::model::Model;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metadata key holding the kind of a system message
pub const KIND_KEY: &str = "kind";
/// Metadata key holding the role a reply was produced for
pub const ROLE_KEY: &str = "role";
/// Metadata key holding the orchestration phase of a reply
pub const PHASE_KEY: &str = "phase";

/// Unique message identifier (UUID v4 string)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who produced a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            MessageRole::System => "system",
        }
    }
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of a system message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    /// Informational (session started, files updated, ...)
    Notice,
    /// A failed call or session
    Error,
    /// Consensus session lifecycle
    Consensus,
}

impl NoticeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoticeKind::Notice => "notice",
            NoticeKind::Error => "error",
            NoticeKind::Consensus => "consensus",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "notice" => Some(NoticeKind::Notice),
            "error" => Some(NoticeKind::Error),
            "consensus" => Some(NoticeKind::Consensus),
            _ => None,
        }
    }
}

/// Image attached to a user message (data URL or remote URL)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAttachment {
    pub url: String,
}

impl ImageAttachment {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// A single entry of the conversation log (Entity)
///
/// Messages never change after construction; all fields are private and only
/// exposed through accessors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    id: MessageId,
    role: MessageRole,
    content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    model: Option<Model>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    metadata: BTreeMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image: Option<ImageAttachment>,
    timestamp: DateTime<Utc>,
}

impl Message {
    fn build(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            role,
            content: content.into(),
            model: None,
            metadata: BTreeMap::new(),
            image: None,
            timestamp: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::build(MessageRole::User, content)
    }

    pub fn user_with_image(content: impl Into<String>, image: Option<ImageAttachment>) -> Self {
        Self {
            image,
            ..Self::build(MessageRole::User, content)
        }
    }

    pub fn assistant(
        model: Model,
        content: impl Into<String>,
        metadata: BTreeMap<String, serde_json::Value>,
    ) -> Self {
        Self {
            model: Some(model),
            metadata,
            ..Self::build(MessageRole::Assistant, content)
        }
    }

    pub fn system(kind: NoticeKind, content: impl Into<String>) -> Self {
        let mut message = Self::build(MessageRole::System, content);
        message.metadata.insert(
            KIND_KEY.to_string(),
            serde_json::Value::String(kind.as_str().to_string()),
        );
        message
    }

    pub fn notice(content: impl Into<String>) -> Self {
        Self::system(NoticeKind::Notice, content)
    }

    pub fn error_notice(content: impl Into<String>) -> Self {
        Self::system(NoticeKind::Error, content)
    }

    // ==================== Accessors ====================

    pub fn id(&self) -> &MessageId {
        &self.id
    }

    pub fn role(&self) -> MessageRole {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn model(&self) -> Option<&Model> {
        self.model.as_ref()
    }

    pub fn metadata(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.metadata
    }

    pub fn image(&self) -> Option<&ImageAttachment> {
        self.image.as_ref()
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(|v| v.as_str())
    }

    /// Kind of a system message; `None` for user and assistant messages
    pub fn notice_kind(&self) -> Option<NoticeKind> {
        if self.role != MessageRole::System {
            return None;
        }
        self.metadata_str(KIND_KEY)
            .and_then(NoticeKind::parse)
            .or(Some(NoticeKind::Notice))
    }

    pub fn is_error(&self) -> bool {
        self.notice_kind() == Some(NoticeKind::Error)
    }

    /// Role key the reply was produced for, when the backend reported one
    pub fn role_name(&self) -> Option<&str> {
        self.metadata_str(ROLE_KEY)
    }

    pub fn phase(&self) -> Option<&str> {
        self.metadata_str(PHASE_KEY)
    }

    /// Whether the message is part of the history sent back to models
    pub fn is_dialogue(&self) -> bool {
        matches!(self.role, MessageRole::User | MessageRole::Assistant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        let a = Message::user("hi");
        let b = Message::user("hi");
        assert_ne!(a.id(), b.id());
        assert_eq!(a.id().as_str().len(), 36);
    }

    #[test]
    fn test_assistant_metadata() {
        let mut metadata = BTreeMap::new();
        metadata.insert(ROLE_KEY.to_string(), serde_json::json!("coder"));
        metadata.insert(PHASE_KEY.to_string(), serde_json::json!("implementation"));
        let msg = Message::assistant(Model::Gpt4o, "done", metadata);

        assert_eq!(msg.role(), MessageRole::Assistant);
        assert_eq!(msg.model(), Some(&Model::Gpt4o));
        assert_eq!(msg.role_name(), Some("coder"));
        assert_eq!(msg.phase(), Some("implementation"));
        assert_eq!(msg.notice_kind(), None);
    }

    #[test]
    fn test_system_kinds() {
        assert!(Message::error_notice("boom").is_error());
        assert_eq!(
            Message::notice("saved").notice_kind(),
            Some(NoticeKind::Notice)
        );
        assert!(!Message::notice("saved").is_dialogue());
        assert!(Message::user("x").is_dialogue());
    }

    #[test]
    fn test_serde_roundtrip_preserves_everything() {
        let msg = Message::user_with_image("look", Some(ImageAttachment::new("data:image/png;base64,AA")));
        let json = serde_json::to_string(&msg).unwrap();
        let back: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(msg, back);
        assert!(json.contains("\"role\":\"user\""));
    }
}
