//! Persisted form of a project.

use crate::artifact::store::ArtifactStore;
use crate::conversation::log::ConversationLog;
use crate::conversation::message::Message;
use crate::core::error::DomainError;
use crate::roles::registry::RoleRegistry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Everything needed to restore a session: files, selection, conversation
/// and role assignments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSnapshot {
    pub name: String,
    pub files: BTreeMap<String, String>,
    pub active_file: String,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub roles: RoleRegistry,
    pub timestamp: DateTime<Utc>,
}

/// Listing entry for a saved project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectSummary {
    pub name: String,
    pub timestamp: DateTime<Utc>,
    pub file_count: usize,
    pub message_count: usize,
}

impl ProjectSnapshot {
    pub fn capture(
        name: impl Into<String>,
        artifacts: &ArtifactStore,
        conversation: &ConversationLog,
        roles: &RoleRegistry,
    ) -> Self {
        Self {
            name: name.into(),
            files: artifacts.files().clone(),
            active_file: artifacts.active().to_string(),
            messages: conversation.messages().to_vec(),
            roles: roles.clone(),
            timestamp: Utc::now(),
        }
    }

    /// Rebuild the live state; fails if the saved file set is unusable
    pub fn restore(self) -> Result<(ArtifactStore, ConversationLog, RoleRegistry), DomainError> {
        let artifacts = ArtifactStore::from_files(self.files, Some(&self.active_file))?;
        Ok((
            artifacts,
            ConversationLog::from_messages(self.messages),
            self.roles,
        ))
    }

    pub fn summary(&self) -> ProjectSummary {
        ProjectSummary {
            name: self.name.clone(),
            timestamp: self.timestamp,
            file_count: self.files.len(),
            message_count: self.messages.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::Model;

    #[test]
    fn test_json_roundtrip_restores_equal_state() {
        let mut artifacts = ArtifactStore::scaffold();
        artifacts.write("script.js", "tick();").unwrap();
        artifacts.select("style.css").unwrap();
        let mut conversation = ConversationLog::new();
        conversation.append(Message::user("make a clock"));
        conversation.append(Message::assistant(Model::Gpt4o, "```js\ntick();\n```", BTreeMap::new()));
        let roles = RoleRegistry::default();

        let snapshot = ProjectSnapshot::capture("Clock", &artifacts, &conversation, &roles);
        let json = serde_json::to_string_pretty(&snapshot).unwrap();
        let loaded: ProjectSnapshot = serde_json::from_str(&json).unwrap();
        let (a, c, r) = loaded.restore().unwrap();

        assert_eq!(a, artifacts);
        assert_eq!(c, conversation);
        assert_eq!(r, roles);
    }

    #[test]
    fn test_restore_rejects_empty_file_set() {
        let snapshot = ProjectSnapshot {
            name: "broken".to_string(),
            files: BTreeMap::new(),
            active_file: "index.html".to_string(),
            messages: vec![],
            roles: RoleRegistry::default(),
            timestamp: Utc::now(),
        };
        assert_eq!(snapshot.restore().unwrap_err(), DomainError::EmptyProject);
    }
}
