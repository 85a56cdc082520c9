//! Project files and the extraction of files from model text.
//!
//! - [`store::ArtifactStore`]: named files plus the active selection
//! - [`extractor`]: fenced code blocks → `(filename, content)` pairs
//! - [`file_kind::FileKind`]: extension-based classification

pub mod extractor;
pub mod file_kind;
pub mod store;
