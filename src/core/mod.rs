//! Core functionality module
//!
//! # Submodules
//!
//! - `config` - Configuration loading, saving, and management
//! - `error` - Error types and result aliases
//! - `extensions` - Recognized extension set
//! - `record` - File records, grouping keys and run results
//! - `metadata` - Capture date and camera model extraction
//! - `source` - Local folder and portable device sources
//! - `enumerator` - Listing and extension filtering
//! - `grouper` - Date/model classification
//! - `copier` - Folder creation and the parallel copy engine
//! - `report` - Run summaries
//! - `prompt` - Confirmation before writing into an existing destination
//! - `organizer` - Run state machine

pub mod config;
pub mod copier;
pub mod enumerator;
pub mod error;
pub mod extensions;
pub mod grouper;
pub mod metadata;
pub mod organizer;
pub mod prompt;
pub mod record;
pub mod report;
pub mod source;
