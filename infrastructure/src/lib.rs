//! Infrastructure layer for codeagent
//!
//! This crate contains adapters that implement the ports defined in the
//! application layer: the HTTP backend, project storage, the conversation
//! transcript and configuration file loading.

pub mod config;
pub mod http;
pub mod logging;
pub mod storage;

// Re-export commonly used types
pub use config::{ConfigLoader, FileConfig};
pub use http::{HttpBackend, HttpError};
pub use logging::JsonlConversationLogger;
pub use storage::JsonProjectRepository;
