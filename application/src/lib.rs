//! Application layer for codeagent
//!
//! This crate contains use cases, port definitions, the shared workspace
//! state and session configuration. It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;
pub mod workspace;

// Re-export commonly used types
pub use config::{Credential, SessionSettings, TimingParams};
pub use ports::{
    chat_dispatch::{ChatDispatch, DispatchError, ModelCatalog, SessionStatusSource},
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    notifier::{NoNotifier, WorkspaceNotifier},
    preview_surface::{PreviewSurface, SurfaceError},
    project_repository::{ProjectRepository, RepositoryError},
};
pub use use_cases::consensus_coordinator::{ConsensusCoordinator, PollHandle, TickOutcome};
pub use use_cases::edit_artifacts::ArtifactEditor;
pub use use_cases::load_model_options::{CatalogSource, LoadModelOptions, ModelOptions};
pub use use_cases::manage_project::{ProjectError, ProjectManager};
pub use use_cases::orchestrate::{OrchestrationEngine, SubmitError, SubmitOutcome};
pub use use_cases::preview_refresher::{PreviewRefresher, PreviewTrigger};
pub use use_cases::shared::Observers;
pub use workspace::{Changes, SharedWorkspace, Workspace};
