//! Core domain concepts shared across all subdomains.
//!
//! - [`model::Model`]: external model identifiers
//! - [`error::DomainError`]: domain-level errors
//! - [`string`]: small text helpers

pub mod error;
pub mod model;
pub mod string;
