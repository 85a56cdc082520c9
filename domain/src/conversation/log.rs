//! Append-only conversation log.

use super::message::{Message, MessageRole};
use crate::core::model::Model;

/// One turn of dialogue as sent back to the models
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub role: MessageRole,
    pub content: String,
    pub model: Option<Model>,
}

/// Ordered sequence of messages in send order (Entity)
///
/// Entries are never removed or edited; the only way to drop messages is to
/// replace the whole log when a project is loaded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationLog {
    messages: Vec<Message>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_messages(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    pub fn append(&mut self, message: Message) -> &Message {
        self.messages.push(message);
        &self.messages[self.messages.len() - 1]
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Messages appended after the first `offset` entries
    pub fn since(&self, offset: usize) -> &[Message] {
        &self.messages[offset.min(self.messages.len())..]
    }

    /// User and assistant turns, oldest first
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.messages
            .iter()
            .filter(|m| m.is_dialogue())
            .map(|m| HistoryEntry {
                role: m.role(),
                content: m.content().to_string(),
                model: m.model().cloned(),
            })
            .collect()
    }

    /// Swap in a loaded log
    pub fn replace_all(&mut self, messages: Vec<Message>) {
        self.messages = messages;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_append_preserves_order() {
        let mut log = ConversationLog::new();
        log.append(Message::user("one"));
        log.append(Message::notice("two"));
        log.append(Message::user("three"));

        let contents: Vec<_> = log.messages().iter().map(|m| m.content()).collect();
        assert_eq!(contents, vec!["one", "two", "three"]);
        assert_eq!(log.since(1).len(), 2);
        assert!(log.since(10).is_empty());
    }

    #[test]
    fn test_history_excludes_notices() {
        let mut log = ConversationLog::new();
        log.append(Message::user("build a clock"));
        log.append(Message::error_notice("request failed"));
        log.append(Message::assistant(Model::Gpt4o, "here", BTreeMap::new()));

        let history = log.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, MessageRole::User);
        assert_eq!(history[1].model, Some(Model::Gpt4o));
    }
}
