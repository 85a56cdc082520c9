//! File-backed preview surface.
//!
//! The live preview is a host page (`preview.html`) that embeds the
//! composed document in a sandboxed iframe. Open it in a browser and reload
//! to see the latest state.

use async_trait::async_trait;
use codeagent_application::{PreviewSurface, SurfaceError};
use codeagent_domain::{PreviewDocument, SandboxedFrame};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const HOST_PAGE: &str = "preview.html";

pub struct FilePreviewSurface {
    dir: PathBuf,
}

impl FilePreviewSurface {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the live host page
    pub fn host_page_path(&self) -> PathBuf {
        self.dir.join(HOST_PAGE)
    }

    async fn write_atomic(path: &Path, contents: &str) -> Result<(), SurfaceError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = path.with_extension("html.tmp");
        tokio::fs::write(&tmp, contents).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }
}

#[async_trait]
impl PreviewSurface for FilePreviewSurface {
    async fn render(&self, frame: &SandboxedFrame) -> Result<(), SurfaceError> {
        let path = self.host_page_path();
        Self::write_atomic(&path, &frame.host_page()).await?;
        debug!("Preview written to {}", path.display());
        Ok(())
    }

    async fn export(
        &self,
        document: &PreviewDocument,
        destination: &Path,
    ) -> Result<PathBuf, SurfaceError> {
        let path = if destination.is_dir() {
            destination.join("index.html")
        } else {
            destination.to_path_buf()
        };
        Self::write_atomic(&path, document.as_str()).await?;
        Ok(path)
    }
}
