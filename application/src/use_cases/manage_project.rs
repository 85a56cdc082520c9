//! Save, load and list projects.
//!
//! A load replaces files, selection, conversation and roles in one step and
//! cancels any consensus poll that was running.

use crate::ports::project_repository::{ProjectRepository, RepositoryError};
use crate::use_cases::shared::Observers;
use crate::workspace::SharedWorkspace;
use codeagent_domain::{DomainError, Message, ProjectSnapshot, ProjectSummary};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum ProjectError {
    #[error("Project name must not be empty")]
    InvalidName,

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("Saved project is unusable: {0}")]
    Domain(#[from] DomainError),
}

#[derive(Clone)]
pub struct ProjectManager {
    workspace: SharedWorkspace,
    repository: Arc<dyn ProjectRepository>,
    observers: Observers,
}

impl ProjectManager {
    pub fn new(workspace: SharedWorkspace, repository: Arc<dyn ProjectRepository>) -> Self {
        Self {
            workspace,
            repository,
            observers: Observers::default(),
        }
    }

    pub fn with_observers(mut self, observers: Observers) -> Self {
        self.observers = observers;
        self
    }

    pub async fn save(&self, name: &str) -> Result<ProjectSummary, ProjectError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ProjectError::InvalidName);
        }

        let snapshot = self.workspace.read(|ws| {
            ProjectSnapshot::capture(name, ws.artifacts(), ws.conversation(), ws.roles())
        });
        self.repository.save(&snapshot).await?;
        info!(
            "Saved project '{}' ({} files, {} messages)",
            name,
            snapshot.files.len(),
            snapshot.messages.len()
        );
        Ok(snapshot.summary())
    }

    pub async fn load(&self, name: &str) -> Result<ProjectSummary, ProjectError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ProjectError::InvalidName);
        }

        let snapshot = self.repository.load(name).await?;
        let summary = snapshot.summary();
        let (artifacts, conversation, roles) = snapshot.restore().inspect_err(|e| {
            warn!("Project '{}' could not be restored: {}", name, e);
        })?;

        let changes = self
            .workspace
            .update(|ws| ws.restore(artifacts, conversation, roles));
        self.observers.publish(&changes);
        self.observers
            .notifier
            .on_message(&Message::notice(format!("Loaded project '{}'.", summary.name)));
        info!("Loaded project '{}'", summary.name);
        Ok(summary)
    }

    pub async fn list(&self) -> Result<Vec<ProjectSummary>, ProjectError> {
        Ok(self.repository.list().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionSettings;
    use crate::workspace::Workspace;
    use async_trait::async_trait;
    use codeagent_domain::{Model, ModelReply, RoleRegistry, SessionToken};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tokio_util::sync::CancellationToken;

    #[derive(Default)]
    struct MemoryRepository {
        projects: Mutex<HashMap<String, String>>,
    }

    #[async_trait]
    impl ProjectRepository for MemoryRepository {
        async fn save(&self, snapshot: &ProjectSnapshot) -> Result<(), RepositoryError> {
            let json = serde_json::to_string(snapshot).map_err(|e| RepositoryError::Corrupt {
                name: snapshot.name.clone(),
                message: e.to_string(),
            })?;
            self.projects
                .lock()
                .unwrap()
                .insert(snapshot.name.clone(), json);
            Ok(())
        }

        async fn load(&self, name: &str) -> Result<ProjectSnapshot, RepositoryError> {
            let projects = self.projects.lock().unwrap();
            let json = projects
                .get(name)
                .ok_or_else(|| RepositoryError::NotFound(name.to_string()))?;
            serde_json::from_str(json).map_err(|e| RepositoryError::Corrupt {
                name: name.to_string(),
                message: e.to_string(),
            })
        }

        async fn list(&self) -> Result<Vec<ProjectSummary>, RepositoryError> {
            let projects = self.projects.lock().unwrap();
            Ok(projects
                .values()
                .filter_map(|json| serde_json::from_str::<ProjectSnapshot>(json).ok())
                .map(|s| s.summary())
                .collect())
        }
    }

    fn manager() -> (ProjectManager, SharedWorkspace) {
        let workspace = SharedWorkspace::new(Workspace::new(
            SessionSettings::default(),
            RoleRegistry::default(),
        ));
        let manager = ProjectManager::new(workspace.clone(), Arc::new(MemoryRepository::default()));
        (manager, workspace)
    }

    #[tokio::test]
    async fn test_save_then_load_restores_state() {
        let (manager, workspace) = manager();
        workspace.update(|ws| {
            ws.begin_turn(Message::user("clock"));
            ws.apply_replies(vec![ModelReply::new(Model::Gpt4o, "```js\ntick();\n```")]);
            ws.artifacts_mut().select("style.css").unwrap();
        });
        let (artifacts, conversation) =
            workspace.read(|ws| (ws.artifacts().clone(), ws.conversation().clone()));

        let summary = manager.save("Clock").await.unwrap();
        assert_eq!(summary.file_count, 3);
        assert_eq!(summary.message_count, 2);

        // Diverge, then load back
        workspace.update(|ws| {
            ws.artifacts_mut().write("script.js", "other();").unwrap();
            ws.begin_turn(Message::user("more"));
        });
        manager.load("Clock").await.unwrap();

        workspace.read(|ws| {
            assert_eq!(ws.artifacts(), &artifacts);
            assert_eq!(ws.conversation(), &conversation);
            assert_eq!(ws.artifacts().active(), "style.css");
        });
    }

    #[tokio::test]
    async fn test_load_cancels_live_poll() {
        let (manager, workspace) = manager();
        manager.save("Empty").await.unwrap();

        let cancel = CancellationToken::new();
        workspace.update(|ws| ws.begin_session(SessionToken::new("s"), cancel.clone()));
        manager.load("Empty").await.unwrap();

        assert!(cancel.is_cancelled());
        workspace.read(|ws| {
            assert!(!ws.is_polling());
            assert!(!ws.is_generating());
        });
    }

    #[tokio::test]
    async fn test_missing_project() {
        let (manager, _) = manager();
        let err = manager.load("ghost").await.unwrap_err();
        assert!(matches!(
            err,
            ProjectError::Repository(RepositoryError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_blank_name_rejected() {
        let (manager, _) = manager();
        assert!(matches!(
            manager.save("  ").await,
            Err(ProjectError::InvalidName)
        ));
    }
}
