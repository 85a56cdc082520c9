//! Chat dispatch port
//!
//! Defines how the application layer hands a user turn to the backend that
//! talks to the model provider, and how it polls consensus sessions.

use crate::config::Credential;
use async_trait::async_trait;
use codeagent_domain::{
    ChatReply, ChatRequest, Model, ModelAvailability, ModelInfo, SessionSnapshot, SessionToken,
};
use thiserror::Error;

/// Errors that can occur while talking to the backend
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Backend rejected the request ({status}): {message}")]
    UpstreamRejected { status: u16, message: String },

    #[error("Consensus session '{0}' is no longer known to the backend")]
    SessionLost(String),
}

impl DispatchError {
    /// Failures worth retrying on the next poll
    pub fn is_retryable(&self) -> bool {
        matches!(self, DispatchError::Transport(_) | DispatchError::Timeout)
    }
}

/// Sends one user turn to the backend
#[async_trait]
pub trait ChatDispatch: Send + Sync {
    async fn dispatch(
        &self,
        request: &ChatRequest,
        credential: &Credential,
    ) -> Result<ChatReply, DispatchError>;
}

/// Reports the state of a consensus session
#[async_trait]
pub trait SessionStatusSource: Send + Sync {
    async fn fetch(&self, token: &SessionToken) -> Result<SessionSnapshot, DispatchError>;
}

/// Lists the models the credential may use
#[async_trait]
pub trait ModelCatalog: Send + Sync {
    async fn list_models(&self, credential: &Credential) -> Result<Vec<ModelInfo>, DispatchError>;

    /// Ask the model for a minimal reply. `Err` means the backend itself
    /// could not be reached; a model that refuses is `Unavailable`.
    async fn ping(
        &self,
        model: &Model,
        credential: &Credential,
    ) -> Result<ModelAvailability, DispatchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(DispatchError::Timeout.is_retryable());
        assert!(DispatchError::Transport("reset".to_string()).is_retryable());
        assert!(!DispatchError::SessionLost("s".to_string()).is_retryable());
        assert!(
            !DispatchError::UpstreamRejected {
                status: 401,
                message: "bad key".to_string()
            }
            .is_retryable()
        );
    }
}
