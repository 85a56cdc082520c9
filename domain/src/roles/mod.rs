//! Role registry: which model plays which part in a generation turn.

pub mod registry;
pub mod role;
