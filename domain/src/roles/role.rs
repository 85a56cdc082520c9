//! Role keys and per-role configuration entries.

use crate::core::model::Model;
use serde::{Deserialize, Serialize};

/// Part a model can play in a generation turn, in dispatch order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleKey {
    /// Breaks the request into steps
    Planner,
    /// Decides layout and visual style
    Designer,
    /// Writes the files
    Coder,
    /// Reviews the coder's output
    Reviewer,
    /// Inspects the rendered preview
    Eyes,
    /// Fixes reported problems
    Debugger,
}

impl RoleKey {
    /// All roles in declared order
    pub const ALL: [RoleKey; 6] = [
        RoleKey::Planner,
        RoleKey::Designer,
        RoleKey::Coder,
        RoleKey::Reviewer,
        RoleKey::Eyes,
        RoleKey::Debugger,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RoleKey::Planner => "planner",
            RoleKey::Designer => "designer",
            RoleKey::Coder => "coder",
            RoleKey::Reviewer => "reviewer",
            RoleKey::Eyes => "eyes",
            RoleKey::Debugger => "debugger",
        }
    }

    pub fn default_display_name(&self) -> &'static str {
        match self {
            RoleKey::Planner => "Planner",
            RoleKey::Designer => "Designer",
            RoleKey::Coder => "Coder",
            RoleKey::Reviewer => "Reviewer",
            RoleKey::Eyes => "Eyes",
            RoleKey::Debugger => "Debugger",
        }
    }

    pub fn default_description(&self) -> &'static str {
        match self {
            RoleKey::Planner => "Breaks the request into concrete implementation steps",
            RoleKey::Designer => "Chooses layout, typography and colour",
            RoleKey::Coder => "Writes index.html, style.css and script.js",
            RoleKey::Reviewer => "Checks the generated code for bugs and omissions",
            RoleKey::Eyes => "Looks at the rendered preview and reports visual problems",
            RoleKey::Debugger => "Fixes errors reported by the reviewer or the preview",
        }
    }
}

impl std::fmt::Display for RoleKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown role key
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown role '{0}' (expected one of: planner, designer, coder, reviewer, eyes, debugger)")]
pub struct UnknownRole(pub String);

impl std::str::FromStr for RoleKey {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        RoleKey::ALL
            .into_iter()
            .find(|key| key.as_str() == needle)
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

/// Configuration of one role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleEntry {
    pub key: RoleKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<Model>,
    pub enabled: bool,
    pub display_name: String,
    pub description: String,
}

impl RoleEntry {
    /// Disabled, unassigned entry with the default labels
    pub fn new(key: RoleKey) -> Self {
        Self {
            key,
            model: None,
            enabled: false,
            display_name: key.default_display_name().to_string(),
            description: key.default_description().to_string(),
        }
    }

    /// Assigned model, ignoring blank identifiers
    pub fn assigned_model(&self) -> Option<&Model> {
        self.model.as_ref().filter(|m| !m.is_blank())
    }

    /// Enabled and assigned; inert entries are skipped, never an error
    pub fn is_active(&self) -> bool {
        self.enabled && self.assigned_model().is_some()
    }
}

/// Partial update merged into a [`RoleEntry`]
///
/// `model: Some(None)` clears the assignment; `model: None` leaves it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleUpdate {
    pub enabled: Option<bool>,
    pub model: Option<Option<Model>>,
    pub display_name: Option<String>,
    pub description: Option<String>,
}

impl RoleUpdate {
    pub fn enable() -> Self {
        Self {
            enabled: Some(true),
            ..Default::default()
        }
    }

    pub fn disable() -> Self {
        Self {
            enabled: Some(false),
            ..Default::default()
        }
    }

    pub fn assign(model: Model) -> Self {
        Self {
            model: Some(Some(model)),
            ..Default::default()
        }
    }

    pub fn clear_model() -> Self {
        Self {
            model: Some(None),
            ..Default::default()
        }
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    pub(crate) fn apply_to(self, entry: &mut RoleEntry) {
        if let Some(enabled) = self.enabled {
            entry.enabled = enabled;
        }
        if let Some(model) = self.model {
            entry.model = model;
        }
        if let Some(name) = self.display_name {
            entry.display_name = name;
        }
        if let Some(description) = self.description {
            entry.description = description;
        }
    }
}
