//! Error types for the media organizer
//!
//! Metadata decode failures never show up here: they are recovered inside the
//! metadata extractor and degrade to filesystem timestamps.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the media organizer
#[derive(Error, Debug)]
pub enum OrganizeError {
    /// The source root is missing, unreadable, or not a directory
    #[error("Invalid source '{}': {reason}", path.display())]
    InvalidSource { path: PathBuf, reason: String },

    /// General I/O error
    #[error("IO error: {0}")]
    Io(String),

    /// Recursive traversal of the source tree failed
    #[error("Traversal failed: {0}")]
    Traversal(String),

    /// General device communication error
    #[error("Device error: {0}")]
    DeviceError(String),

    /// No portable devices were found
    #[error("No devices found. Make sure the device is connected and unlocked.")]
    NoDevicesFound,

    /// Access to the device was denied
    #[error("Access denied. Please unlock the device and allow access when prompted.")]
    AccessDenied,

    /// Failed to access device content
    #[error("Failed to access device content: {0}")]
    ContentError(String),

    /// A single file could not be transferred
    #[error("Transfer failed for '{filename}': {message}")]
    TransferError { filename: String, message: String },

    /// The copy worker pool could not be started
    #[error("Worker pool error: {0}")]
    WorkerPool(String),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// Windows API error
    #[cfg(windows)]
    #[error("Windows API error: {0}")]
    WindowsError(#[from] windows::core::Error),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, OrganizeError>;

impl From<std::io::Error> for OrganizeError {
    fn from(err: std::io::Error) -> Self {
        OrganizeError::Io(err.to_string())
    }
}

impl From<walkdir::Error> for OrganizeError {
    fn from(err: walkdir::Error) -> Self {
        OrganizeError::Traversal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_source_message() {
        let err = OrganizeError::InvalidSource {
            path: PathBuf::from("/nowhere"),
            reason: "does not exist".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid source '/nowhere': does not exist");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: OrganizeError = io.into();
        assert!(matches!(err, OrganizeError::Io(ref m) if m.contains("denied")));
    }
}
