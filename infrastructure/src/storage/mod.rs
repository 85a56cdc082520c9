//! Project persistence.

mod json_repository;

pub use json_repository::{JsonProjectRepository, slugify};
