//! Classification of artifact files by extension.

use serde::{Deserialize, Serialize};

/// Canonical file name of the markup artifact
pub const MARKUP_FILE: &str = "index.html";
/// Canonical file name of the stylesheet artifact
pub const STYLESHEET_FILE: &str = "style.css";
/// Canonical file name of the script artifact
pub const SCRIPT_FILE: &str = "script.js";

/// Kind of an artifact, derived from its file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    Markup,
    Stylesheet,
    Script,
    Other,
}

impl FileKind {
    /// Classify a file name by its extension (case-insensitive)
    pub fn from_filename(filename: &str) -> Self {
        let ext = filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "html" | "htm" => FileKind::Markup,
            "css" => FileKind::Stylesheet,
            "js" | "mjs" => FileKind::Script,
            _ => FileKind::Other,
        }
    }

    /// Whether a change to a file of this kind affects the preview
    pub fn is_previewable(&self) -> bool {
        !matches!(self, FileKind::Other)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Markup => "markup",
            FileKind::Stylesheet => "stylesheet",
            FileKind::Script => "script",
            FileKind::Other => "other",
        }
    }
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
