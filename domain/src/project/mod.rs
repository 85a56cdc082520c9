//! Saved projects.

pub mod snapshot;
