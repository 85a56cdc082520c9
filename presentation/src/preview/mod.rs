//! Preview surfaces

pub mod file_surface;
