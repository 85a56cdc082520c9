//! Requests sent to the backend and the replies it returns.

pub mod request;
pub mod routing;
