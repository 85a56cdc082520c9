//! Preview display port.

use async_trait::async_trait;
use codeagent_domain::{PreviewDocument, SandboxedFrame};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SurfaceError {
    #[error("Preview surface unavailable: {0}")]
    Unavailable(String),

    #[error("Preview I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Where composed previews go
///
/// Render failures are logged by the caller and never reach the user's
/// request flow.
#[async_trait]
pub trait PreviewSurface: Send + Sync {
    /// Replace the displayed preview
    async fn render(&self, frame: &SandboxedFrame) -> Result<(), SurfaceError>;

    /// Write a standalone document; returns the path written
    async fn export(
        &self,
        document: &PreviewDocument,
        destination: &Path,
    ) -> Result<PathBuf, SurfaceError>;
}
