//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure and presentation adapters
//! must implement.

pub mod chat_dispatch;
pub mod conversation_logger;
pub mod notifier;
pub mod preview_surface;
pub mod project_repository;
