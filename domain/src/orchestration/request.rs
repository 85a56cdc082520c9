//! Chat request and reply value objects.

use super::routing::RoutingSpec;
use crate::conversation::log::HistoryEntry;
use crate::conversation::message::ImageAttachment;
use crate::core::model::Model;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Whether the backend answers inline or opens a consensus session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchMode {
    #[default]
    Direct,
    Consensus,
}

impl DispatchMode {
    pub fn is_consensus(&self) -> bool {
        matches!(self, DispatchMode::Consensus)
    }
}

/// One user turn ready for dispatch
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub message: String,
    pub routing: RoutingSpec,
    /// Prior user/assistant turns, oldest first, excluding `message`
    pub history: Vec<HistoryEntry>,
    pub image: Option<ImageAttachment>,
    pub mode: DispatchMode,
}

/// Inline answer from one model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelReply {
    pub model: Model,
    pub content: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl ModelReply {
    pub fn new(model: Model, content: impl Into<String>) -> Self {
        Self {
            model,
            content: content.into(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// Handle of a long-running consensus session on the backend
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Backend answer to a dispatch
#[derive(Debug, Clone, PartialEq)]
pub enum ChatReply {
    /// Replies to apply now, in order
    Direct(Vec<ModelReply>),
    /// A consensus session to poll
    Session(SessionToken),
}
