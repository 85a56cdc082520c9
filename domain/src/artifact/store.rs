//! In-memory project file set (Artifact Store).
//!
//! The store maps file names to whole-file contents and tracks which file is
//! currently selected. Two invariants hold after every operation:
//!
//! - the store is never empty;
//! - the active selection names a file that exists.
//!
//! Every failing operation leaves the store exactly as it was.

use super::file_kind::{FileKind, MARKUP_FILE, SCRIPT_FILE, STYLESHEET_FILE};
use crate::core::error::DomainError;
use std::collections::BTreeMap;

const SCAFFOLD_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <title>New Project</title>
</head>
<body>
  <h1>Hello, world!</h1>
  <p>Describe what you want to build and the agents will take it from here.</p>
</body>
</html>"#;

const SCAFFOLD_CSS: &str = r#"body {
  font-family: system-ui, sans-serif;
  margin: 2rem;
  color: #1f2328;
}"#;

const SCAFFOLD_JS: &str = r#"console.log("ready");"#;

/// Result of a [`ArtifactStore::write`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOutcome {
    /// The file did not exist before the write
    pub created: bool,
    /// The stored content differs from what was there before
    pub changed: bool,
    /// The file participates in the composed preview
    pub previewable: bool,
}

impl WriteOutcome {
    /// Whether this write should trigger a preview refresh
    pub fn needs_refresh(&self) -> bool {
        self.previewable && self.changed
    }
}

/// The project's named files plus the active selection (Entity)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactStore {
    files: BTreeMap<String, String>,
    active: String,
}

impl Default for ArtifactStore {
    fn default() -> Self {
        Self::scaffold()
    }
}

impl ArtifactStore {
    /// The default three-file project a fresh session starts with
    pub fn scaffold() -> Self {
        let mut files = BTreeMap::new();
        files.insert(MARKUP_FILE.to_string(), SCAFFOLD_HTML.to_string());
        files.insert(STYLESHEET_FILE.to_string(), SCAFFOLD_CSS.to_string());
        files.insert(SCRIPT_FILE.to_string(), SCAFFOLD_JS.to_string());
        Self {
            files,
            active: MARKUP_FILE.to_string(),
        }
    }

    /// Build a store from a complete file map.
    ///
    /// The selection is `active` when it names a file in `files`, otherwise
    /// the markup file if present, otherwise the first file by name.
    pub fn from_files(
        files: BTreeMap<String, String>,
        active: Option<&str>,
    ) -> Result<Self, DomainError> {
        if files.is_empty() {
            return Err(DomainError::EmptyProject);
        }
        if let Some(bad) = files.keys().find(|name| !is_valid_filename(name)) {
            return Err(DomainError::InvalidFilename(bad.clone()));
        }

        let active = pick_selection(&files, active);
        Ok(Self { files, active })
    }

    // ==================== Queries ====================

    pub fn get(&self, filename: &str) -> Option<&str> {
        self.files.get(filename).map(String::as_str)
    }

    pub fn contains(&self, filename: &str) -> bool {
        self.files.contains_key(filename)
    }

    pub fn files(&self) -> &BTreeMap<String, String> {
        &self.files
    }

    pub fn filenames(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Always false; kept for API symmetry with collections
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Name of the active file
    pub fn active(&self) -> &str {
        &self.active
    }

    /// Content of the active file
    pub fn active_content(&self) -> &str {
        self.files.get(&self.active).map(String::as_str).unwrap_or("")
    }

    /// First file of the given kind, preferring the canonical name
    pub fn first_of_kind(&self, kind: FileKind) -> Option<(&str, &str)> {
        let canonical = match kind {
            FileKind::Markup => Some(MARKUP_FILE),
            FileKind::Stylesheet => Some(STYLESHEET_FILE),
            FileKind::Script => Some(SCRIPT_FILE),
            FileKind::Other => None,
        };
        if let Some(name) = canonical
            && let Some((k, v)) = self.files.get_key_value(name)
        {
            return Some((k.as_str(), v.as_str()));
        }
        self.files
            .iter()
            .find(|(name, _)| FileKind::from_filename(name) == kind)
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    // ==================== Mutations ====================

    /// Insert or replace a file's whole content.
    pub fn write(
        &mut self,
        filename: &str,
        content: impl Into<String>,
    ) -> Result<WriteOutcome, DomainError> {
        let filename = validate_filename(filename)?;
        let content = content.into();
        let previewable = FileKind::from_filename(filename).is_previewable();

        let (created, changed) = match self.files.get(filename) {
            Some(existing) => (false, *existing != content),
            None => (true, true),
        };
        if changed {
            self.files.insert(filename.to_string(), content);
        }

        Ok(WriteOutcome {
            created,
            changed,
            previewable,
        })
    }

    /// Create a new file and select it.
    pub fn create(
        &mut self,
        filename: &str,
        content: impl Into<String>,
    ) -> Result<WriteOutcome, DomainError> {
        let filename = validate_filename(filename)?;
        if self.files.contains_key(filename) {
            return Err(DomainError::DuplicateName(filename.to_string()));
        }
        let outcome = self.write(filename, content)?;
        self.active = filename.to_string();
        Ok(outcome)
    }

    /// Remove a file, moving the selection if it pointed at the removed file.
    pub fn delete(&mut self, filename: &str) -> Result<(), DomainError> {
        if !self.files.contains_key(filename) {
            return Err(DomainError::UnknownArtifact(filename.to_string()));
        }
        if self.files.len() == 1 {
            return Err(DomainError::LastArtifact);
        }

        self.files.remove(filename);
        if self.active == filename {
            self.active = pick_selection(&self.files, None);
        }
        Ok(())
    }

    /// Change the active selection
    pub fn select(&mut self, filename: &str) -> Result<(), DomainError> {
        if !self.files.contains_key(filename) {
            return Err(DomainError::UnknownArtifact(filename.to_string()));
        }
        self.active = filename.to_string();
        Ok(())
    }

    /// Swap the entire file set in one step (project load).
    pub fn replace_all(
        &mut self,
        files: BTreeMap<String, String>,
        active: Option<&str>,
    ) -> Result<(), DomainError> {
        let active = active.or(Some(self.active.as_str())).map(str::to_string);
        *self = Self::from_files(files, active.as_deref())?;
        Ok(())
    }
}

fn is_valid_filename(name: &str) -> bool {
    !name.trim().is_empty() && name.trim() == name && !name.contains(['\n', '\r'])
}

fn validate_filename(name: &str) -> Result<&str, DomainError> {
    if is_valid_filename(name) {
        Ok(name)
    } else {
        Err(DomainError::InvalidFilename(name.to_string()))
    }
}

fn pick_selection(files: &BTreeMap<String, String>, preferred: Option<&str>) -> String {
    preferred
        .filter(|name| files.contains_key(*name))
        .or_else(|| files.contains_key(MARKUP_FILE).then_some(MARKUP_FILE))
        .or_else(|| files.keys().next().map(String::as_str))
        .unwrap_or_default()
        .to_string()
}
