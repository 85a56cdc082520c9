//! Preview Refresher
//!
//! Keeps the preview surface consistent with the artifact store. Previewable
//! writes send a debounced request; bursts of writes collapse into a single
//! refresh. A steady stream of writes still renders at least once per
//! [`MAX_WAIT_FACTOR`] debounce windows. Project loads and explicit
//! refreshes render immediately. Composition runs on the refresher's own
//! task and surface failures are logged, never propagated.

use crate::ports::preview_surface::{PreviewSurface, SurfaceError};
use crate::workspace::SharedWorkspace;
use codeagent_domain::{SandboxPolicy, SandboxedFrame, compose, export_standalone};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Longest a debounced refresh may be postponed, in debounce windows
pub const MAX_WAIT_FACTOR: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RefreshRequest {
    Debounced,
    Immediate,
}

/// Cheap handle for requesting preview refreshes
///
/// A disabled trigger drops every request.
#[derive(Debug, Clone)]
pub struct PreviewTrigger {
    tx: Option<mpsc::UnboundedSender<RefreshRequest>>,
}

impl PreviewTrigger {
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    /// Refresh after the debounce window closes
    pub fn request(&self) {
        self.send(RefreshRequest::Debounced);
    }

    /// Refresh as soon as the refresher task runs
    pub fn request_now(&self) {
        self.send(RefreshRequest::Immediate);
    }

    fn send(&self, request: RefreshRequest) {
        if let Some(tx) = &self.tx
            && tx.send(request).is_err()
        {
            debug!("Preview refresher has stopped; dropping {:?} request", request);
        }
    }
}

/// Composes the artifact store into the preview surface
#[derive(Clone)]
pub struct PreviewRefresher {
    workspace: SharedWorkspace,
    surface: Arc<dyn PreviewSurface>,
    policy: SandboxPolicy,
    debounce: Duration,
}

impl PreviewRefresher {
    pub fn new(workspace: SharedWorkspace, surface: Arc<dyn PreviewSurface>) -> Self {
        Self {
            workspace,
            surface,
            policy: SandboxPolicy::default(),
            debounce: Duration::from_millis(300),
        }
    }

    pub fn with_policy(mut self, policy: SandboxPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// The sandboxed frame for the current artifact snapshot
    pub fn current_frame(&self) -> SandboxedFrame {
        let document = self.workspace.read(|ws| compose(ws.artifacts()));
        SandboxedFrame::new(document, self.policy.clone())
    }

    /// Compose and render now; failures are logged
    pub async fn render_now(&self) {
        let frame = self.current_frame();
        match self.surface.render(&frame).await {
            Ok(()) => debug!("Preview rendered ({} bytes)", frame.document().len()),
            Err(e) => warn!("Preview render failed: {}", e),
        }
    }

    /// Write the standalone document (no error guard) to `destination`
    pub async fn export(&self, destination: &Path) -> Result<PathBuf, SurfaceError> {
        let document = self.workspace.read(|ws| export_standalone(ws.artifacts()));
        let path = self.surface.export(&document, destination).await?;
        info!("Exported preview to {}", path.display());
        Ok(path)
    }

    /// Start the refresher task
    pub fn spawn(&self) -> (PreviewTrigger, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let refresher = self.clone();

        let task = tokio::spawn(async move {
            while let Some(request) = rx.recv().await {
                let mut closed = false;
                if request == RefreshRequest::Debounced {
                    // Extend the window while writes keep arriving, up to the deadline
                    let deadline = Instant::now() + refresher.debounce * MAX_WAIT_FACTOR;
                    loop {
                        let window_end = (Instant::now() + refresher.debounce).min(deadline);
                        match tokio::time::timeout_at(window_end, rx.recv()).await {
                            Ok(Some(RefreshRequest::Debounced)) => continue,
                            Ok(Some(RefreshRequest::Immediate)) => break,
                            Ok(None) => {
                                closed = true;
                                break;
                            }
                            Err(_) => break,
                        }
                    }
                }
                refresher.render_now().await;
                if closed {
                    break;
                }
            }
            debug!("Preview refresher stopped");
        });

        (PreviewTrigger { tx: Some(tx) }, task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionSettings;
    use crate::workspace::Workspace;
    use async_trait::async_trait;
    use codeagent_domain::{PreviewDocument, RoleRegistry};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSurface {
        renders: Mutex<Vec<String>>,
        exports: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl PreviewSurface for RecordingSurface {
        async fn render(&self, frame: &SandboxedFrame) -> Result<(), SurfaceError> {
            if self.fail {
                return Err(SurfaceError::Unavailable("closed".to_string()));
            }
            self.renders
                .lock()
                .unwrap()
                .push(frame.document().as_str().to_string());
            Ok(())
        }

        async fn export(
            &self,
            document: &PreviewDocument,
            destination: &Path,
        ) -> Result<PathBuf, SurfaceError> {
            self.exports
                .lock()
                .unwrap()
                .push(document.as_str().to_string());
            Ok(destination.to_path_buf())
        }
    }

    fn shared() -> SharedWorkspace {
        SharedWorkspace::new(Workspace::new(
            SessionSettings::default(),
            RoleRegistry::default(),
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_of_writes_renders_once() {
        let workspace = shared();
        let surface = Arc::new(RecordingSurface::default());
        let refresher = PreviewRefresher::new(workspace.clone(), surface.clone())
            .with_debounce(Duration::from_millis(100));
        let (trigger, _task) = refresher.spawn();

        for i in 0..5 {
            workspace.update(|ws| {
                ws.artifacts_mut()
                    .write("script.js", format!("step({i});"))
                    .unwrap()
            });
            trigger.request();
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        tokio::time::sleep(Duration::from_millis(500)).await;

        let renders = surface.renders.lock().unwrap();
        assert_eq!(renders.len(), 1);
        assert!(renders[0].contains("step(4);"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_steady_writes_render_by_deadline() {
        let workspace = shared();
        let surface = Arc::new(RecordingSurface::default());
        let refresher = PreviewRefresher::new(workspace, surface.clone())
            .with_debounce(Duration::from_millis(100));
        let (trigger, _task) = refresher.spawn();

        // A request every 50ms never leaves a quiet 100ms window
        for _ in 0..9 {
            trigger.request();
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        assert_eq!(surface.renders.lock().unwrap().len(), 1);

        for _ in 0..9 {
            trigger.request();
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        assert_eq!(surface.renders.lock().unwrap().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_request_skips_debounce() {
        let workspace = shared();
        let surface = Arc::new(RecordingSurface::default());
        let refresher = PreviewRefresher::new(workspace, surface.clone())
            .with_debounce(Duration::from_secs(60));
        let (trigger, _task) = refresher.spawn();

        trigger.request_now();
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(surface.renders.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_render_failure_is_swallowed() {
        let surface = Arc::new(RecordingSurface {
            fail: true,
            ..Default::default()
        });
        let refresher = PreviewRefresher::new(shared(), surface.clone());
        refresher.render_now().await;
        assert!(surface.renders.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_export_omits_error_guard() {
        let surface = Arc::new(RecordingSurface::default());
        let refresher = PreviewRefresher::new(shared(), surface.clone());
        let path = refresher.export(Path::new("out.html")).await.unwrap();
        assert_eq!(path, PathBuf::from("out.html"));
        assert!(!surface.exports.lock().unwrap()[0].contains("preview-error"));
        assert!(refresher.current_frame().document().as_str().contains("preview-error"));
    }

    #[test]
    fn test_disabled_trigger_is_inert() {
        let trigger = PreviewTrigger::disabled();
        trigger.request();
        trigger.request_now();
    }
}
