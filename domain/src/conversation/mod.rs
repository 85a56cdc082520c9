//! Conversation log and its messages.

pub mod log;
pub mod message;
