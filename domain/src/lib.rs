//! Domain layer for codeagent
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Artifacts
//!
//! A project is a small set of named files (`index.html`, `style.css`,
//! `script.js`, ...) held in an [`ArtifactStore`]. Model replies are turned
//! into file writes by [`extract_code_blocks`], and the files are combined
//! into one sandboxed preview document by [`compose`].
//!
//! ## Roles and routing
//!
//! The [`RoleRegistry`] decides which model plays which part (planner,
//! designer, coder, reviewer, eyes, debugger). A [`RoutingSpec`] derived
//! from it goes out with every [`ChatRequest`].
//!
//! ## Consensus
//!
//! Long-running multi-agent sessions are polled; a [`ConsensusSession`]
//! folds each [`SessionSnapshot`] into phase, [`ConsensusProgress`] and file
//! writes.

pub mod artifact;
pub mod catalog;
pub mod config;
pub mod consensus;
pub mod conversation;
pub mod core;
pub mod orchestration;
pub mod preview;
pub mod project;
pub mod roles;

// Re-export commonly used types
pub use artifact::{
    extractor::{CodeBlock, DEFAULT_FILENAME, Extraction, extract_code_blocks, resolve_filename},
    file_kind::{FileKind, MARKUP_FILE, SCRIPT_FILE, STYLESHEET_FILE},
    store::{ArtifactStore, WriteOutcome},
};
pub use catalog::{ModelAvailability, ModelInfo, ModelPricing, fallback_catalog};
pub use config::validation::{ConfigIssue, ConfigIssueCode, Severity};
pub use consensus::{
    phase::ConsensusPhase,
    plan::{ConsensusPlan, PlanStep, parse_plan_json},
    progress::{ConsensusProgress, ProgressStatus},
    session::{ConsensusSession, SessionOutcome, SessionUpdate},
    snapshot::{DiscussionEntry, SessionSnapshot, SessionState},
};
pub use conversation::{
    log::{ConversationLog, HistoryEntry},
    message::{ImageAttachment, Message, MessageId, MessageRole, NoticeKind},
};
pub use core::{
    error::DomainError,
    model::Model,
    string::{headline, truncate},
};
pub use orchestration::{
    request::{ChatReply, ChatRequest, DispatchMode, ModelReply, SessionToken},
    routing::{RoleAssignment, RoutingMode, RoutingSpec},
};
pub use preview::{
    compositor::{PreviewDocument, VIEWPORT_META, compose, export_standalone},
    sandbox::{SandboxPolicy, SandboxToken, SandboxedFrame},
};
pub use project::snapshot::{ProjectSnapshot, ProjectSummary};
pub use roles::{
    registry::RoleRegistry,
    role::{RoleEntry, RoleKey, RoleUpdate, UnknownRole},
};
