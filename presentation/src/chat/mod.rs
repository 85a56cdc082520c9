//! Interactive chat module
//!
//! A reedline-based REPL for building a project turn by turn.

mod repl;

pub use repl::{ChatRepl, ReplCommand, RoleAction};
