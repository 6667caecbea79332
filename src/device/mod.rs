//! Portable device access
//!
//! # Submodules
//!
//! - `traits` - Abstraction traits shared by real and mock devices
//! - `tree` - Folder/file composite over a device's object store
//! - `keys` - WPD property keys (Windows only)
//! - `wpd` - Windows Portable Devices API wrapper (Windows only)
//!
//! Everything above the traits works the same against the WPD backend and the
//! in-memory mock device, so the organize pipeline is tested without hardware.

pub mod traits;
pub mod tree;

#[cfg(windows)]
pub mod keys;
#[cfg(windows)]
pub mod wpd;

pub use traits::{DeviceContentTrait, DeviceInfo, DeviceManagerTrait, DeviceObject};
pub use tree::ContentNode;

#[cfg(windows)]
pub use wpd::{initialize_com, ComGuard, DeviceContent, DeviceManager};
