//! Configuration file loading for codeagent
//!
//! This module handles file I/O and merging of configuration from multiple
//! sources. The priority order (highest to lowest):
//!
//! 1. Environment variables `CODEAGENT_*`
//! 2. `--config <path>` specified file
//! 3. Project root: `./codeagent.toml` or `./.codeagent.toml`
//! 4. Global: `$XDG_CONFIG_HOME/codeagent/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    DEFAULT_BASE_URL, FileBackendConfig, FileConfig, FileConsensusConfig, FileCredentialConfig,
    FileLoggingConfig, FilePreviewConfig, FileRoleConfig, FileRoutingConfig, FileStorageConfig,
};
pub use loader::ConfigLoader;
