//! Project persistence port.

use async_trait::async_trait;
use codeagent_domain::{ProjectSnapshot, ProjectSummary};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("No saved project named '{0}'")]
    NotFound(String),

    #[error("Invalid project name: '{0}'")]
    InvalidName(String),

    #[error("Project '{name}' could not be read: {message}")]
    Corrupt { name: String, message: String },

    #[error("Storage error: {0}")]
    Io(#[from] std::io::Error),
}

/// Saves and restores whole projects; a load always replaces everything
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    async fn save(&self, snapshot: &ProjectSnapshot) -> Result<(), RepositoryError>;

    async fn load(&self, name: &str) -> Result<ProjectSnapshot, RepositoryError>;

    /// Saved projects, most recent first
    async fn list(&self) -> Result<Vec<ProjectSummary>, RepositoryError>;
}
