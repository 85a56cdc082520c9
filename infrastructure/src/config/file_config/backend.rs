//! Backend and credential configuration (`[backend]`, `[credential]`)

use codeagent_domain::{ConfigIssue, ConfigIssueCode};
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

/// ```toml
/// [backend]
/// base_url = "http://127.0.0.1:8000"
/// request_timeout_secs = 120
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileBackendConfig {
    pub base_url: String,
    /// Upper bound for one chat dispatch (consensus polls use their own timeout)
    pub request_timeout_secs: u64,
}

impl Default for FileBackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: 120,
        }
    }
}

impl FileBackendConfig {
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        let url = self.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::InvalidBackendUrl,
                format!("backend.base_url: '{}' is not an http(s) URL", self.base_url),
            ));
        }
        if self.request_timeout_secs == 0 {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::ZeroInterval,
                "backend.request_timeout_secs must be greater than zero",
            ));
        }
        issues
    }
}

/// API key for the model router
///
/// Usually supplied through `CODEAGENT_CREDENTIAL__API_KEY` rather than a file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileCredentialConfig {
    pub api_key: Option<String>,
}
