//! Application-level configuration.
//!
//! - [`SessionSettings`]: credential, routing and dispatch mode of a session
//! - [`TimingParams`]: poll, timeout and debounce intervals

pub mod session_settings;
pub mod timing;

pub use session_settings::{Credential, SessionSettings};
pub use timing::TimingParams;
