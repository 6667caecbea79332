//! Device abstraction traits
//!
//! The organizer only needs a small contract from a portable device: list the
//! devices, browse folders, stream a file's bytes and read its metadata. Both the
//! Windows Portable Devices backend and the mock device implement it, so the
//! device-backed source can be tested on any platform.
//!
//! # Architecture
//!
//! - `DeviceManagerTrait` - Enumerates and opens devices
//! - `DeviceContentTrait` - Browses a device's object tree and reads files
//! - `DeviceInfo` / `DeviceObject` - Plain data shared by all backends

use crate::core::error::Result;
use std::fmt;
use std::io::Write;
use std::sync::Arc;

/// Parent ID of top-level objects
pub const ROOT_OBJECT_ID: &str = "DEVICE";

/// Common device information shared between real and mock devices
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Unique device identifier (WPD device ID or mock ID)
    pub device_id: String,
    /// User-friendly device name (e.g., "Camera EOS")
    pub friendly_name: String,
    /// Device manufacturer
    pub manufacturer: String,
    /// Device description or model
    pub model: String,
}

impl DeviceInfo {
    pub fn new(device_id: &str, friendly_name: &str, manufacturer: &str, model: &str) -> Self {
        Self {
            device_id: device_id.to_string(),
            friendly_name: friendly_name.to_string(),
            manufacturer: manufacturer.to_string(),
            model: model.to_string(),
        }
    }

    /// Name used as the first segment of device paths
    pub fn display_name(&self) -> &str {
        if self.friendly_name.is_empty() {
            &self.model
        } else {
            &self.friendly_name
        }
    }
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.manufacturer.is_empty() {
            write!(f, "{}", self.display_name())
        } else {
            write!(f, "{} ({})", self.display_name(), self.manufacturer)
        }
    }
}

/// A file or folder on a device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceObject {
    /// Unique object identifier on the device
    pub object_id: String,
    /// Parent object ID (`ROOT_OBJECT_ID` for top-level objects)
    pub parent_id: String,
    /// File or folder name
    pub name: String,
    pub is_folder: bool,
    /// Size in bytes (0 for folders)
    pub size: u64,
    /// Creation date as reported by the device
    pub date_created: Option<String>,
    /// Modification date as reported by the device
    pub date_modified: Option<String>,
    /// Content type hint (e.g., "image/jpeg")
    pub content_type: Option<String>,
}

impl DeviceObject {
    pub fn folder(object_id: &str, parent_id: &str, name: &str) -> Self {
        Self {
            object_id: object_id.to_string(),
            parent_id: parent_id.to_string(),
            name: name.to_string(),
            is_folder: true,
            ..Default::default()
        }
    }

    pub fn file(object_id: &str, parent_id: &str, name: &str, size: u64) -> Self {
        Self {
            object_id: object_id.to_string(),
            parent_id: parent_id.to_string(),
            name: name.to_string(),
            is_folder: false,
            size,
            content_type: guess_content_type(name),
            ..Default::default()
        }
    }

    /// Builder-style setter for the modification date
    pub fn with_modified(mut self, date: &str) -> Self {
        self.date_modified = Some(date.to_string());
        self
    }

    /// Builder-style setter for the creation date
    pub fn with_created(mut self, date: &str) -> Self {
        self.date_created = Some(date.to_string());
        self
    }
}

impl Default for DeviceObject {
    fn default() -> Self {
        Self {
            object_id: String::new(),
            parent_id: ROOT_OBJECT_ID.to_string(),
            name: String::new(),
            is_folder: false,
            size: 0,
            date_created: None,
            date_modified: None,
            content_type: None,
        }
    }
}

fn guess_content_type(name: &str) -> Option<String> {
    let ext = std::path::Path::new(name)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())?;
    let mime = match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "heic" | "heif" => "image/heic",
        "tif" | "tiff" => "image/tiff",
        "mov" => "video/quicktime",
        "mp4" | "m4v" => "video/mp4",
        _ => return None,
    };
    Some(mime.to_string())
}

/// Browsing and reading a device's object tree
pub trait DeviceContentTrait: Send + Sync {
    /// Objects directly under the device root
    fn enumerate_objects(&self) -> Result<Vec<DeviceObject>> {
        self.enumerate_children(ROOT_OBJECT_ID)
    }

    /// Objects directly under `parent_id`
    fn enumerate_children(&self, parent_id: &str) -> Result<Vec<DeviceObject>>;

    /// Stream a file object's content into `writer`, returning the bytes written
    ///
    /// Fails if the transfer stops early; whatever was already written stays
    /// in `writer`.
    fn copy_to_writer(&self, object_id: &str, writer: &mut dyn Write) -> Result<u64>;

    /// At most `limit` bytes from the start of a file object
    fn read_head(&self, object_id: &str, limit: usize) -> Result<Vec<u8>>;

    /// Metadata of a single object, `None` when it does not exist
    fn get_object(&self, object_id: &str) -> Result<Option<DeviceObject>>;
}

impl<T: DeviceContentTrait + ?Sized> DeviceContentTrait for Arc<T> {
    fn enumerate_children(&self, parent_id: &str) -> Result<Vec<DeviceObject>> {
        (**self).enumerate_children(parent_id)
    }

    fn copy_to_writer(&self, object_id: &str, writer: &mut dyn Write) -> Result<u64> {
        (**self).copy_to_writer(object_id, writer)
    }

    fn read_head(&self, object_id: &str, limit: usize) -> Result<Vec<u8>> {
        (**self).read_head(object_id, limit)
    }

    fn get_object(&self, object_id: &str) -> Result<Option<DeviceObject>> {
        (**self).get_object(object_id)
    }
}

/// Device discovery and connection
pub trait DeviceManagerTrait {
    /// Content interface returned when opening a device
    type Content: DeviceContentTrait;

    /// All connected portable devices
    fn enumerate_devices(&self) -> Result<Vec<DeviceInfo>>;

    /// Open a connection to a device
    fn open_device(&self, device_id: &str) -> Result<Self::Content>;

    /// Information about a specific device
    fn get_device_info(&self, device_id: &str) -> Option<DeviceInfo> {
        self.enumerate_devices()
            .ok()?
            .into_iter()
            .find(|d| d.device_id == device_id)
    }
}
