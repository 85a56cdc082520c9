//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod consensus_coordinator;
pub mod edit_artifacts;
pub mod load_model_options;
pub mod manage_project;
pub mod orchestrate;
pub mod preview_refresher;
pub mod shared;
