//! Direct edits of the artifact store by the user.
//!
//! Rejections (`DuplicateName`, `LastArtifact`, ...) leave the store
//! untouched and are returned to the caller, which shows them as notices.

use crate::use_cases::shared::Observers;
use crate::workspace::{Changes, SharedWorkspace};
use codeagent_domain::{DomainError, FileKind, WriteOutcome};
use tracing::{debug, info};

pub struct ArtifactEditor {
    workspace: SharedWorkspace,
    observers: Observers,
}

impl ArtifactEditor {
    pub fn new(workspace: SharedWorkspace) -> Self {
        Self {
            workspace,
            observers: Observers::default(),
        }
    }

    pub fn with_observers(mut self, observers: Observers) -> Self {
        self.observers = observers;
        self
    }

    /// Create an empty (or seeded) file and select it
    pub fn create(&self, filename: &str, content: Option<&str>) -> Result<(), DomainError> {
        let outcome = self.workspace.update(|ws| {
            ws.artifacts_mut()
                .create(filename, content.unwrap_or_default())
        })?;
        info!("Created {}", filename);
        self.publish_write(filename, outcome);
        Ok(())
    }

    /// Overwrite a file's content (upsert)
    pub fn write(&self, filename: &str, content: &str) -> Result<(), DomainError> {
        let outcome = self
            .workspace
            .update(|ws| ws.artifacts_mut().write(filename, content))?;
        debug!("Wrote {} ({} bytes)", filename, content.len());
        self.publish_write(filename, outcome);
        Ok(())
    }

    pub fn delete(&self, filename: &str) -> Result<(), DomainError> {
        self.workspace
            .update(|ws| ws.artifacts_mut().delete(filename))?;
        info!("Deleted {}", filename);

        let changes = Changes {
            needs_refresh: FileKind::from_filename(filename).is_previewable(),
            ..Default::default()
        };
        self.observers.publish(&changes);
        Ok(())
    }

    pub fn select(&self, filename: &str) -> Result<(), DomainError> {
        self.workspace
            .update(|ws| ws.artifacts_mut().select(filename))
    }

    /// Recompose the preview now, skipping the debounce window
    pub fn refresh(&self) {
        self.observers.publish(&Changes {
            refresh_now: true,
            ..Default::default()
        });
    }

    fn publish_write(&self, filename: &str, outcome: WriteOutcome) {
        let changes = Changes {
            files_written: if outcome.changed {
                vec![filename.to_string()]
            } else {
                Vec::new()
            },
            needs_refresh: outcome.needs_refresh(),
            ..Default::default()
        };
        self.observers.publish(&changes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionSettings;
    use crate::ports::notifier::WorkspaceNotifier;
    use crate::workspace::Workspace;
    use codeagent_domain::RoleRegistry;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct RecordingNotifier {
        files: Mutex<Vec<String>>,
    }

    impl WorkspaceNotifier for RecordingNotifier {
        fn on_files_changed(&self, files: &[String]) {
            self.files.lock().unwrap().extend_from_slice(files);
        }
    }

    fn editor() -> (ArtifactEditor, SharedWorkspace, Arc<RecordingNotifier>) {
        let workspace = SharedWorkspace::new(Workspace::new(
            SessionSettings::default(),
            RoleRegistry::default(),
        ));
        let notifier = Arc::new(RecordingNotifier::default());
        let editor = ArtifactEditor::new(workspace.clone())
            .with_observers(Observers::default().with_notifier(notifier.clone()));
        (editor, workspace, notifier)
    }

    #[test]
    fn test_create_selects_and_notifies() {
        let (editor, workspace, notifier) = editor();
        editor.create("about.html", Some("<p>about</p>")).unwrap();

        workspace.read(|ws| {
            assert_eq!(ws.artifacts().active(), "about.html");
            assert_eq!(ws.artifacts().get("about.html"), Some("<p>about</p>"));
        });
        assert_eq!(*notifier.files.lock().unwrap(), vec!["about.html".to_string()]);
    }

    #[test]
    fn test_duplicate_create_is_rejected_without_change() {
        let (editor, workspace, notifier) = editor();
        let before = workspace.read(|ws| ws.artifacts().clone());

        let err = editor.create("index.html", None).unwrap_err();
        assert_eq!(err, DomainError::DuplicateName("index.html".to_string()));
        assert_eq!(workspace.read(|ws| ws.artifacts().clone()), before);
        assert!(notifier.files.lock().unwrap().is_empty());
    }

    #[test]
    fn test_delete_down_to_last_file() {
        let (editor, workspace, _) = editor();
        editor.delete("style.css").unwrap();
        editor.delete("script.js").unwrap();
        assert_eq!(editor.delete("index.html"), Err(DomainError::LastArtifact));
        assert_eq!(workspace.read(|ws| ws.artifacts().len()), 1);
    }

    #[test]
    fn test_select_unknown_file() {
        let (editor, _, _) = editor();
        assert_eq!(
            editor.select("nope.js"),
            Err(DomainError::UnknownArtifact("nope.js".to_string()))
        );
    }
}
