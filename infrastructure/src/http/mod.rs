//! HTTP adapter for the agent backend.
//!
//! - `POST /chat`: one user turn; answers inline or with a session id
//! - `GET /consensus/{id}`: consensus session status
//! - `GET /models`: model catalog, authenticated with `X-Api-Key`

mod backend;
mod error;
mod wire;

pub use backend::HttpBackend;
pub use error::HttpError;
