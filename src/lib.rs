//! Media Organizer Library
//!
//! Sorts photos and videos into a `YYYY-MM-DD/[model/]` folder tree, taking
//! the capture date and camera model from embedded EXIF data and falling back
//! to the file's modification time.
//!
//! # Architecture
//!
//! - [`core`] - Configuration, errors, enumeration, grouping, copying and the
//!   run state machine
//! - [`device`] - Portable device access via Windows Portable Devices
//! - [`cli`] - Command-line interface (only used by the binary)
//! - [`testdb`] - Mock devices and media fixtures for testing
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use media_organizer::core::organizer::Organizer;
//! use media_organizer::core::prompt::AssumeYes;
//! use media_organizer::core::source::LocalSource;
//!
//! fn main() -> anyhow::Result<()> {
//!     let source = LocalSource::new("D:/Camera");
//!     let mut organizer = Organizer::new(&source, "D:/Sorted").workers(4);
//!     let outcome = organizer.run(&AssumeYes, &mut |summary| println!("{}", summary))?;
//!     println!("{}", outcome.summary());
//!     Ok(())
//! }
//! ```
//!
//! # Platform Support
//!
//! Local folders work everywhere. Portable devices (cameras and phones over
//! MTP) are only available on Windows.

pub mod cli;
pub mod core;
pub mod device;
pub mod testdb;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
