//! Mock device implementation for testing without a real device
//!
//! [`MockFileSystem`] is an in-memory object tree implementing
//! `DeviceContentTrait`; [`MockDeviceManager`] hands out shared references to
//! those trees through `DeviceManagerTrait`.

use crate::core::error::{OrganizeError, Result};
use crate::device::traits::{DeviceContentTrait, DeviceInfo, DeviceManagerTrait, DeviceObject};
use std::collections::HashMap;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Configuration for mock device behavior
#[derive(Debug, Clone, Default)]
pub struct MockDeviceConfig {
    /// Simulate device being locked (access denied)
    pub simulate_locked: bool,
    /// Simulate disconnection after N file reads
    pub disconnect_after_reads: Option<usize>,
    /// Simulate read errors for specific object IDs
    pub read_error_objects: Vec<String>,
    /// Objects whose stream ends silently after half of their bytes
    pub short_read_objects: Vec<String>,
    /// Objects whose stream fails after half of their bytes were delivered
    pub interrupted_objects: Vec<String>,
}

/// Mock device file system state
#[derive(Debug, Default)]
pub struct MockFileSystem {
    /// All objects indexed by object ID
    objects: HashMap<String, DeviceObject>,
    /// File bytes indexed by object ID
    contents: HashMap<String, Vec<u8>>,
    /// Children index: parent_id -> object IDs in insertion order
    children_index: HashMap<String, Vec<String>>,
    /// Read counter for disconnect simulation
    read_count: AtomicUsize,
    config: MockDeviceConfig,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: MockDeviceConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn set_config(&mut self, config: MockDeviceConfig) {
        self.config = config;
    }

    /// Add an object to the tree
    pub fn add_object(&mut self, object: DeviceObject) {
        let object_id = object.object_id.clone();
        self.children_index
            .entry(object.parent_id.clone())
            .or_default()
            .push(object_id.clone());
        self.objects.insert(object_id, object);
    }

    pub fn add_folder(&mut self, object_id: &str, parent_id: &str, name: &str) {
        self.add_object(DeviceObject::folder(object_id, parent_id, name));
    }

    /// Add a file object with its content; the size is taken from `content`
    pub fn add_file(&mut self, mut object: DeviceObject, content: Vec<u8>) {
        object.size = content.len() as u64;
        self.contents.insert(object.object_id.clone(), content);
        self.add_object(object);
    }

    fn open_content(&self, object_id: &str) -> Result<&[u8]> {
        if self.config.simulate_locked {
            return Err(OrganizeError::AccessDenied);
        }

        let reads = self.read_count.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(limit) = self.config.disconnect_after_reads {
            if reads > limit {
                return Err(OrganizeError::DeviceError(
                    "Device disconnected during transfer".to_string(),
                ));
            }
        }

        if self.config.read_error_objects.iter().any(|id| id == object_id) {
            return Err(OrganizeError::TransferError {
                filename: object_id.to_string(),
                message: "Simulated read error".to_string(),
            });
        }

        let obj = self.objects.get(object_id).ok_or_else(|| {
            OrganizeError::ContentError(format!("Object not found: {}", object_id))
        })?;
        if obj.is_folder {
            return Err(OrganizeError::ContentError(
                "Cannot read folder content".to_string(),
            ));
        }

        self.contents
            .get(object_id)
            .map(Vec::as_slice)
            .ok_or_else(|| OrganizeError::ContentError("No content available".to_string()))
    }

    pub fn file_count(&self) -> usize {
        self.objects.values().filter(|o| !o.is_folder).count()
    }

    /// Number of streams opened so far
    pub fn read_count(&self) -> usize {
        self.read_count.load(Ordering::SeqCst)
    }
}

impl DeviceContentTrait for MockFileSystem {
    fn enumerate_children(&self, parent_id: &str) -> Result<Vec<DeviceObject>> {
        if self.config.simulate_locked {
            return Err(OrganizeError::AccessDenied);
        }
        Ok(self
            .children_index
            .get(parent_id)
            .map(|ids| ids.iter().filter_map(|id| self.objects.get(id)).cloned().collect())
            .unwrap_or_default())
    }

    fn copy_to_writer(&self, object_id: &str, writer: &mut dyn Write) -> Result<u64> {
        let content = self.open_content(object_id)?;
        let listed = |ids: &[String]| ids.iter().any(|id| id == object_id);

        let delivered = if listed(&self.config.short_read_objects)
            || listed(&self.config.interrupted_objects)
        {
            &content[..content.len() / 2]
        } else {
            content
        };
        writer
            .write_all(delivered)
            .map_err(|e| OrganizeError::ContentError(e.to_string()))?;

        if listed(&self.config.interrupted_objects) {
            return Err(OrganizeError::DeviceError(
                "Device disconnected during transfer".to_string(),
            ));
        }
        Ok(delivered.len() as u64)
    }

    fn read_head(&self, object_id: &str, limit: usize) -> Result<Vec<u8>> {
        let content = self.open_content(object_id)?;
        Ok(content[..content.len().min(limit)].to_vec())
    }

    fn get_object(&self, object_id: &str) -> Result<Option<DeviceObject>> {
        Ok(self.objects.get(object_id).cloned())
    }
}

/// Mock device manager that simulates the WPD device manager
#[derive(Default)]
pub struct MockDeviceManager {
    devices: Vec<DeviceInfo>,
    file_systems: HashMap<String, Arc<MockFileSystem>>,
}

impl MockDeviceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a device with its file system
    pub fn add_device(&mut self, info: DeviceInfo, fs: MockFileSystem) {
        self.file_systems
            .insert(info.device_id.clone(), Arc::new(fs));
        self.devices.push(info);
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }
}

impl DeviceManagerTrait for MockDeviceManager {
    type Content = Arc<MockFileSystem>;

    fn enumerate_devices(&self) -> Result<Vec<DeviceInfo>> {
        Ok(self.devices.clone())
    }

    fn open_device(&self, device_id: &str) -> Result<Self::Content> {
        let fs = self
            .file_systems
            .get(device_id)
            .cloned()
            .ok_or_else(|| OrganizeError::DeviceError(format!("Device not found: {}", device_id)))?;
        if fs.config.simulate_locked {
            return Err(OrganizeError::AccessDenied);
        }
        Ok(fs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::traits::ROOT_OBJECT_ID;

    fn camera_fs() -> MockFileSystem {
        let mut fs = MockFileSystem::new();
        fs.add_folder("dcim", ROOT_OBJECT_ID, "DCIM");
        fs.add_folder("100olymp", "dcim", "100OLYMP");
        fs.add_file(
            DeviceObject::file("img1", "100olymp", "P1.JPG", 0),
            vec![0xFF, 0xD8, 0xFF, 0xD9],
        );
        fs
    }

    #[test]
    fn test_mock_file_system_children() {
        let fs = camera_fs();
        let roots = fs.enumerate_objects().unwrap();
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].name, "DCIM");
        assert_eq!(fs.enumerate_children("100olymp").unwrap().len(), 1);
        assert!(fs.enumerate_children("nothing").unwrap().is_empty());
    }

    #[test]
    fn test_add_file_sets_size() {
        let fs = camera_fs();
        let obj = fs.get_object("img1").unwrap().unwrap();
        assert_eq!(obj.size, 4);
        assert_eq!(fs.file_count(), 1);
    }

    #[test]
    fn test_streams_count_reads() {
        let fs = camera_fs();
        let mut out = Vec::new();
        assert_eq!(fs.copy_to_writer("img1", &mut out).unwrap(), 4);
        assert_eq!(out, vec![0xFF, 0xD8, 0xFF, 0xD9]);
        assert_eq!(fs.read_head("img1", 2).unwrap(), vec![0xFF, 0xD8]);
        assert!(fs.read_head("dcim", 2).is_err());
        assert_eq!(fs.read_count(), 3);
    }

    #[test]
    fn test_disconnect_after_reads() {
        let mut fs = camera_fs();
        fs.set_config(MockDeviceConfig {
            disconnect_after_reads: Some(1),
            ..Default::default()
        });
        assert!(fs.read_head("img1", 16).is_ok());
        assert!(matches!(
            fs.copy_to_writer("img1", &mut Vec::new()),
            Err(OrganizeError::DeviceError(_))
        ));
    }

    #[test]
    fn test_read_error_objects() {
        let mut fs = camera_fs();
        fs.set_config(MockDeviceConfig {
            read_error_objects: vec!["img1".to_string()],
            ..Default::default()
        });
        assert!(matches!(
            fs.copy_to_writer("img1", &mut Vec::new()),
            Err(OrganizeError::TransferError { .. })
        ));
    }

    #[test]
    fn test_short_and_interrupted_streams() {
        let mut fs = camera_fs();
        fs.set_config(MockDeviceConfig {
            short_read_objects: vec!["img1".to_string()],
            ..Default::default()
        });
        let mut out = Vec::new();
        assert_eq!(fs.copy_to_writer("img1", &mut out).unwrap(), 2);
        assert_eq!(out, vec![0xFF, 0xD8]);

        fs.set_config(MockDeviceConfig {
            interrupted_objects: vec!["img1".to_string()],
            ..Default::default()
        });
        let mut out = Vec::new();
        assert!(fs.copy_to_writer("img1", &mut out).is_err());
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_mock_device_manager() {
        let mut manager = MockDeviceManager::new();
        manager.add_device(DeviceInfo::new("cam-1", "Stylus", "Olympus", "Stylus1"), camera_fs());

        assert_eq!(manager.device_count(), 1);
        assert_eq!(manager.enumerate_devices().unwrap().len(), 1);
        assert_eq!(
            manager.get_device_info("cam-1").map(|d| d.friendly_name),
            Some("Stylus".to_string())
        );
        let content = manager.open_device("cam-1").unwrap();
        assert_eq!(content.enumerate_objects().unwrap().len(), 1);
        assert!(manager.open_device("cam-2").is_err());
    }

    #[test]
    fn test_locked_device() {
        let mut manager = MockDeviceManager::new();
        manager.add_device(
            DeviceInfo::new("cam-1", "Stylus", "Olympus", "Stylus1"),
            MockFileSystem::with_config(MockDeviceConfig {
                simulate_locked: true,
                ..Default::default()
            }),
        );
        assert!(matches!(
            manager.open_device("cam-1"),
            Err(OrganizeError::AccessDenied)
        ));
    }
}
