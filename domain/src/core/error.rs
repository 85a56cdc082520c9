//! Domain error types

use thiserror::Error;

/// Domain-level errors
///
/// Every variant is a synchronous rejection: the operation that returned it
/// left the state it was called on untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("A file named '{0}' already exists")]
    DuplicateName(String),

    #[error("Cannot delete the last remaining file")]
    LastArtifact,

    #[error("No file named '{0}'")]
    UnknownArtifact(String),

    #[error("Invalid file name: '{0}'")]
    InvalidFilename(String),

    #[error("A project must contain at least one file")]
    EmptyProject,
}

impl DomainError {
    /// Rejections the user can fix by choosing a different name or file.
    pub fn is_user_correctable(&self) -> bool {
        matches!(
            self,
            DomainError::DuplicateName(_)
                | DomainError::UnknownArtifact(_)
                | DomainError::InvalidFilename(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            DomainError::DuplicateName("index.html".to_string()).to_string(),
            "A file named 'index.html' already exists"
        );
        assert_eq!(
            DomainError::LastArtifact.to_string(),
            "Cannot delete the last remaining file"
        );
    }

    #[test]
    fn test_user_correctable() {
        assert!(DomainError::DuplicateName("a".to_string()).is_user_correctable());
        assert!(!DomainError::LastArtifact.is_user_correctable());
        assert!(!DomainError::EmptyProject.is_user_correctable());
    }
}
