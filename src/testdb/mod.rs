//! Test support
//!
//! Lets the whole pipeline run without a camera or phone attached.
//!
//! - `mock_device` - In-memory device object store and device manager
//! - `fixtures` - Minimal JPEG files with or without EXIF, mtime helpers

pub mod fixtures;
pub mod mock_device;

pub use mock_device::{MockDeviceConfig, MockDeviceManager, MockFileSystem};
