//! Routing configuration (`[routing]` section)

use codeagent_domain::{ConfigIssue, ConfigIssueCode, DispatchMode, RoutingMode};
use serde::{Deserialize, Serialize};

/// ```toml
/// [routing]
/// mode = "roles"      # or "flat"
/// consensus = false   # open a polled consensus session instead of inline replies
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRoutingConfig {
    pub mode: String,
    pub consensus: bool,
}

impl Default for FileRoutingConfig {
    fn default() -> Self {
        Self {
            mode: RoutingMode::default().as_str().to_string(),
            consensus: false,
        }
    }
}

impl FileRoutingConfig {
    /// Parse the routing mode; an invalid value falls back to `roles`
    pub fn parse_mode(&self) -> (RoutingMode, Vec<ConfigIssue>) {
        match self.mode.parse() {
            Ok(mode) => (mode, Vec::new()),
            Err(message) => (
                RoutingMode::default(),
                vec![ConfigIssue::warning(
                    ConfigIssueCode::InvalidRoutingMode,
                    format!("routing.mode: {message}; using 'roles'"),
                )],
            ),
        }
    }

    pub fn dispatch_mode(&self) -> DispatchMode {
        if self.consensus {
            DispatchMode::Consensus
        } else {
            DispatchMode::Direct
        }
    }
}
