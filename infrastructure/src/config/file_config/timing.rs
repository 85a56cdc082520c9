//! Polling and preview configuration (`[consensus]`, `[preview]`)

use codeagent_domain::{ConfigIssue, ConfigIssueCode};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConsensusConfig {
    pub poll_interval_ms: u64,
    pub tick_timeout_ms: u64,
}

impl Default for FileConsensusConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 2000,
            tick_timeout_ms: 10_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilePreviewConfig {
    pub debounce_ms: u64,
    /// Where the live preview page is written
    pub output_dir: Option<PathBuf>,
}

impl Default for FilePreviewConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 300,
            output_dir: None,
        }
    }
}

pub(super) fn check_intervals(
    consensus: &FileConsensusConfig,
    preview: &FilePreviewConfig,
) -> Vec<ConfigIssue> {
    [
        ("consensus.poll_interval_ms", consensus.poll_interval_ms),
        ("consensus.tick_timeout_ms", consensus.tick_timeout_ms),
        ("preview.debounce_ms", preview.debounce_ms),
    ]
    .into_iter()
    .filter(|(_, value)| *value == 0)
    .map(|(field, _)| {
        ConfigIssue::error(
            ConfigIssueCode::ZeroInterval,
            format!("{field} must be greater than zero"),
        )
    })
    .collect()
}
