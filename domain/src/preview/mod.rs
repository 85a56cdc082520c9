//! Live preview composition.
//!
//! [`compositor`] turns an artifact snapshot into one self-contained HTML
//! document; [`sandbox`] wraps that document for display in an isolated
//! frame.

pub mod compositor;
pub mod sandbox;
