//! CLI module for the media organizer
//!
//! # Submodules
//!
//! - `args` - Command-line argument definitions using clap
//! - `commands` - Command handler implementations
//! - `progress` - Progress bars and CLI output utilities

pub mod args;
pub mod commands;
pub mod progress;

pub use args::{Args, Commands};
pub use commands::run_command;
pub use progress::DualWriter;
