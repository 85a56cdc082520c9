//! HTTP adapter errors and their mapping onto [`DispatchError`].

use codeagent_application::DispatchError;
use reqwest::StatusCode;
use thiserror::Error;

/// Errors raised while constructing the HTTP adapter
#[derive(Error, Debug)]
pub enum HttpError {
    #[error("Invalid backend URL '{0}'")]
    InvalidUrl(String),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Timeouts map to `Timeout`; connection and body errors to `Transport`
pub(crate) fn classify(error: reqwest::Error) -> DispatchError {
    if error.is_timeout() {
        DispatchError::Timeout
    } else {
        DispatchError::Transport(error.to_string())
    }
}

/// Map a non-success status; `session` marks a consensus status lookup,
/// where 404/410 mean the backend forgot the session
pub(crate) fn rejection(status: StatusCode, body: &str, session: Option<&str>) -> DispatchError {
    if let Some(token) = session
        && matches!(status, StatusCode::NOT_FOUND | StatusCode::GONE)
    {
        return DispatchError::SessionLost(token.to_string());
    }
    DispatchError::UpstreamRejected {
        status: status.as_u16(),
        message: detail(body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        }),
    }
}

/// `{"detail": "..."}` bodies carry the human-readable reason
fn detail(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(value) => value
            .get("detail")
            .or_else(|| value.get("error"))
            .and_then(|d| d.as_str())
            .map(str::to_string),
        Err(_) => Some(codeagent_domain::truncate(trimmed, 200)),
    }
}
