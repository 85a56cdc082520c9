//! Presentation layer for codeagent
//!
//! CLI definitions, console formatting, progress display, the file-backed
//! preview surface and the interactive chat REPL.

pub mod chat;
pub mod cli;
pub mod output;
pub mod preview;
pub mod progress;

pub use chat::ChatRepl;
pub use cli::commands::Cli;
pub use output::console::ConsoleFormatter;
pub use preview::file_surface::FilePreviewSurface;
pub use progress::reporter::{ProgressReporter, SimpleProgress};
