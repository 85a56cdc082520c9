//! One JSON file per project under a projects directory.

use async_trait::async_trait;
use codeagent_application::{ProjectRepository, RepositoryError};
use codeagent_domain::{ProjectSnapshot, ProjectSummary};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub struct JsonProjectRepository {
    dir: PathBuf,
}

impl JsonProjectRepository {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &str) -> Result<PathBuf, RepositoryError> {
        let slug = slugify(name);
        if slug.is_empty() {
            return Err(RepositoryError::InvalidName(name.to_string()));
        }
        Ok(self.dir.join(format!("{slug}.json")))
    }

    async fn read_snapshot(path: &Path, name: &str) -> Result<ProjectSnapshot, RepositoryError> {
        let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => RepositoryError::NotFound(name.to_string()),
            _ => RepositoryError::Io(e),
        })?;
        serde_json::from_slice(&bytes).map_err(|e| RepositoryError::Corrupt {
            name: name.to_string(),
            message: e.to_string(),
        })
    }
}

/// Lowercase ASCII letters and digits; runs of anything else become one `-`
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

#[async_trait]
impl ProjectRepository for JsonProjectRepository {
    async fn save(&self, snapshot: &ProjectSnapshot) -> Result<(), RepositoryError> {
        let path = self.path_for(&snapshot.name)?;
        let json = serde_json::to_vec_pretty(snapshot).map_err(|e| RepositoryError::Corrupt {
            name: snapshot.name.clone(),
            message: e.to_string(),
        })?;

        tokio::fs::create_dir_all(&self.dir).await?;
        // Write-then-rename so a crash never leaves a half-written project
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &json).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        debug!("Wrote {} ({} bytes)", path.display(), json.len());
        Ok(())
    }

    async fn load(&self, name: &str) -> Result<ProjectSnapshot, RepositoryError> {
        let path = self.path_for(name)?;
        Self::read_snapshot(&path, name).await
    }

    async fn list(&self) -> Result<Vec<ProjectSummary>, RepositoryError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut summaries = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let label = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default().to_string();
            match Self::read_snapshot(&path, &label).await {
                Ok(snapshot) => summaries.push(snapshot.summary()),
                Err(e) => warn!("Skipping {}: {}", path.display(), e),
            }
        }

        summaries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codeagent_domain::{ArtifactStore, ConversationLog, Message, RoleRegistry};
    use chrono::{Duration, Utc};

    fn snapshot(name: &str) -> ProjectSnapshot {
        let mut artifacts = ArtifactStore::scaffold();
        artifacts.write("script.js", "tick();").unwrap();
        let mut conversation = ConversationLog::new();
        conversation.append(Message::user("make a clock"));
        ProjectSnapshot::capture(name, &artifacts, &conversation, &RoleRegistry::default())
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("My Clock!"), "my-clock");
        assert_eq!(slugify("  a//b  "), "a-b");
        assert_eq!(slugify("???"), "");
    }

    #[tokio::test]
    async fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonProjectRepository::new(dir.path().join("projects"));
        let original = snapshot("My Clock");

        repo.save(&original).await.unwrap();
        assert!(dir.path().join("projects/my-clock.json").exists());
        assert!(!dir.path().join("projects/my-clock.json.tmp").exists());

        let loaded = repo.load("My Clock").await.unwrap();
        assert_eq!(loaded, original);
    }

    #[tokio::test]
    async fn test_save_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonProjectRepository::new(dir.path());
        repo.save(&snapshot("clock")).await.unwrap();

        let mut updated = snapshot("clock");
        updated.files.insert("extra.css".to_string(), "a {}".to_string());
        repo.save(&updated).await.unwrap();

        assert_eq!(repo.load("clock").await.unwrap().files.len(), 4);
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_and_invalid_names() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonProjectRepository::new(dir.path());
        assert!(matches!(
            repo.load("ghost").await,
            Err(RepositoryError::NotFound(_))
        ));
        assert!(matches!(
            repo.load("!!!").await,
            Err(RepositoryError::InvalidName(_))
        ));
    }

    #[tokio::test]
    async fn test_list_newest_first_and_skips_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonProjectRepository::new(dir.path());

        let mut older = snapshot("older");
        older.timestamp = Utc::now() - Duration::hours(1);
        repo.save(&older).await.unwrap();
        repo.save(&snapshot("newer")).await.unwrap();
        std::fs::write(dir.path().join("broken.json"), "{").unwrap();

        let names: Vec<_> = repo
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["newer", "older"]);
    }

    #[tokio::test]
    async fn test_list_of_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonProjectRepository::new(dir.path().join("nope"));
        assert!(repo.list().await.unwrap().is_empty());
    }
}
