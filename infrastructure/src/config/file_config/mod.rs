//! Raw TOML configuration data types
//!
//! These structs mirror the config file. They are deserialized directly and
//! converted into application values ([`SessionSettings`], [`RoleRegistry`],
//! [`TimingParams`]) by the accessors below.

mod backend;
mod roles;
mod routing;
mod storage;
mod timing;

pub use backend::{DEFAULT_BASE_URL, FileBackendConfig, FileCredentialConfig};
pub use roles::{FileRoleConfig, build_registry};
pub use routing::FileRoutingConfig;
pub use storage::{FileLoggingConfig, FileStorageConfig};
pub use timing::{FileConsensusConfig, FilePreviewConfig};

use codeagent_application::{Credential, SessionSettings, TimingParams};
use codeagent_domain::{ConfigIssue, RoleRegistry};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

const APP_DIR: &str = "codeagent";

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub backend: FileBackendConfig,
    pub credential: FileCredentialConfig,
    pub routing: FileRoutingConfig,
    /// `[roles.<key>]` tables keyed by role name
    pub roles: BTreeMap<String, FileRoleConfig>,
    pub consensus: FileConsensusConfig,
    pub preview: FilePreviewConfig,
    pub storage: FileStorageConfig,
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = self.backend.validate();
        issues.extend(self.routing.parse_mode().1);
        issues.extend(build_registry(&self.roles).1);
        issues.extend(timing::check_intervals(&self.consensus, &self.preview));
        issues
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings::default()
            .with_credential(Credential::from_optional(self.credential.api_key.clone()))
            .with_routing_mode(self.routing.parse_mode().0)
            .with_dispatch_mode(self.routing.dispatch_mode())
    }

    pub fn role_registry(&self) -> RoleRegistry {
        build_registry(&self.roles).0
    }

    /// Zero intervals are reported by [`validate`](Self::validate) and
    /// clamped to one millisecond here
    pub fn timing(&self) -> TimingParams {
        let ms = |value: u64| Duration::from_millis(value.max(1));
        TimingParams::default()
            .with_poll_interval(ms(self.consensus.poll_interval_ms))
            .with_tick_timeout(ms(self.consensus.tick_timeout_ms))
            .with_preview_debounce(ms(self.preview.debounce_ms))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.backend.request_timeout_secs.max(1))
    }

    /// `[storage] projects_dir`, else `<data dir>/codeagent/projects`
    pub fn projects_dir(&self) -> PathBuf {
        self.storage
            .projects_dir
            .clone()
            .unwrap_or_else(|| data_dir().join("projects"))
    }

    /// `[preview] output_dir`, else `<data dir>/codeagent/preview`
    pub fn preview_dir(&self) -> PathBuf {
        self.preview
            .output_dir
            .clone()
            .unwrap_or_else(|| data_dir().join("preview"))
    }
}

fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use codeagent_domain::{ConfigIssueCode, DispatchMode, RoleKey, RoutingMode};

    #[test]
    fn test_deserialize_full_config() {
        let toml_str = r#"
[backend]
base_url = "https://agents.example.com"

[credential]
api_key = "sk-or-test"

[routing]
mode = "flat"
consensus = true

[roles.designer]
enabled = true
model = "openai/gpt-4o"

[consensus]
poll_interval_ms = 1500

[storage]
projects_dir = "/tmp/projects"
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert!(config.validate().is_empty());

        let settings = config.session_settings();
        assert_eq!(settings.routing_mode, RoutingMode::Flat);
        assert_eq!(settings.dispatch_mode, DispatchMode::Consensus);
        assert_eq!(settings.usable_credential().unwrap().as_str(), "sk-or-test");

        assert!(config.role_registry().get(RoleKey::Designer).is_active());
        assert_eq!(config.timing().poll_interval, Duration::from_millis(1500));
        assert_eq!(config.projects_dir(), PathBuf::from("/tmp/projects"));
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = FileConfig::default();
        assert!(config.validate().is_empty());
        assert!(config.session_settings().usable_credential().is_none());
        assert_eq!(config.timing(), TimingParams::default());
    }

    #[test]
    fn test_validation_collects_every_issue() {
        let toml_str = r#"
[backend]
base_url = "ftp://nope"

[routing]
mode = "round-robin"

[preview]
debounce_ms = 0
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        let codes: Vec<_> = config.validate().iter().map(|i| i.code).collect();
        assert_eq!(
            codes,
            vec![
                ConfigIssueCode::InvalidBackendUrl,
                ConfigIssueCode::InvalidRoutingMode,
                ConfigIssueCode::ZeroInterval,
            ]
        );
        assert_eq!(config.session_settings().routing_mode, RoutingMode::Roles);
    }
}
