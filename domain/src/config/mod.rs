//! Configuration checks shared by the loaders.

pub mod validation;
