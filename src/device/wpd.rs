//! Windows Portable Devices backend
//!
//! Implements the device traits on top of the WPD COM API so a camera or
//! phone connected over MTP can be organized like a local folder.

use crate::core::error::{OrganizeError, Result};
use crate::device::keys::{
    is_container, OBJECT_PROPERTY_KEYS, WPD_OBJECT_CONTENT_TYPE, WPD_OBJECT_DATE_CREATED,
    WPD_OBJECT_DATE_MODIFIED, WPD_OBJECT_NAME, WPD_OBJECT_ORIGINAL_FILE_NAME,
    WPD_OBJECT_PARENT_ID, WPD_OBJECT_SIZE, WPD_RESOURCE_DEFAULT,
};
use crate::device::traits::{
    DeviceContentTrait, DeviceInfo, DeviceManagerTrait, DeviceObject, ROOT_OBJECT_ID,
};
use log::{debug, info, trace, warn};
use std::io::Write;
use std::ptr::null_mut;
use windows::{
    core::{PCWSTR, PWSTR},
    Win32::{
        Devices::PortableDevices::{
            IEnumPortableDeviceObjectIDs, IPortableDevice, IPortableDeviceContent,
            IPortableDeviceKeyCollection, IPortableDeviceManager, IPortableDeviceProperties,
            IPortableDeviceValues, PortableDeviceFTM, PortableDeviceKeyCollection,
            PortableDeviceManager, PortableDeviceValues, WPD_CLIENT_MAJOR_VERSION,
            WPD_CLIENT_MINOR_VERSION, WPD_CLIENT_NAME, WPD_CLIENT_REVISION,
            WPD_CLIENT_SECURITY_QUALITY_OF_SERVICE,
        },
        System::Com::{
            CoCreateInstance, CoInitializeEx, CoTaskMemFree, CoUninitialize, IStream,
            CLSCTX_INPROC_SERVER, COINIT_MULTITHREADED,
        },
        UI::Shell::PropertiesSystem::PROPERTYKEY,
    },
};

const CLIENT_NAME: &str = "Media Organizer";

/// E_ACCESSDENIED, returned by Open while the device is locked
const E_ACCESS_DENIED: u32 = 0x8007_0005;

/// Object ids fetched per enumeration call
const ENUM_BATCH: usize = 100;

const DEFAULT_READ_BUFFER: usize = 256 * 1024;
const MAX_READ_BUFFER: usize = 1024 * 1024;

/// NUL-terminated UTF-16 copy of `s`
fn wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

/// Takes ownership of a COM-allocated string
unsafe fn take_pwstr(value: PWSTR) -> String {
    let text = value.to_string().unwrap_or_default();
    CoTaskMemFree(Some(value.0 as *const _));
    text
}

/// Enumerates and opens portable devices (COM must already be initialized)
pub struct DeviceManager {
    manager: IPortableDeviceManager,
}

impl DeviceManager {
    pub fn new() -> Result<Self> {
        let manager: IPortableDeviceManager =
            unsafe { CoCreateInstance(&PortableDeviceManager, None, CLSCTX_INPROC_SERVER) }
                .map_err(|e| {
                    OrganizeError::DeviceError(format!("Failed to create device manager: {}", e))
                })?;
        Ok(Self { manager })
    }

    /// Reads one of the manager's per-device strings using the two-call
    /// length/fill protocol shared by all of them.
    fn device_string<F>(&self, device_id: &str, getter: F) -> Option<String>
    where
        F: Fn(&IPortableDeviceManager, PCWSTR, PWSTR, &mut u32) -> windows::core::Result<()>,
    {
        let id = wide(device_id);
        let mut length: u32 = 0;
        let _ = getter(&self.manager, PCWSTR(id.as_ptr()), PWSTR::null(), &mut length);
        if length == 0 {
            return None;
        }

        let mut buffer: Vec<u16> = vec![0; length as usize];
        getter(
            &self.manager,
            PCWSTR(id.as_ptr()),
            PWSTR(buffer.as_mut_ptr()),
            &mut length,
        )
        .ok()?;

        let end = (length as usize).saturating_sub(1).min(buffer.len());
        Some(String::from_utf16_lossy(&buffer[..end]))
    }

    fn describe(&self, device_id: &str) -> DeviceInfo {
        let friendly_name = self
            .device_string(device_id, |m, id, buf, len| unsafe {
                m.GetDeviceFriendlyName(id, buf, len)
            })
            .unwrap_or_else(|| "Unknown Device".to_string());
        let manufacturer = self
            .device_string(device_id, |m, id, buf, len| unsafe {
                m.GetDeviceManufacturer(id, buf, len)
            })
            .unwrap_or_else(|| "Unknown".to_string());
        let model = self
            .device_string(device_id, |m, id, buf, len| unsafe {
                m.GetDeviceDescription(id, buf, len)
            })
            .unwrap_or_else(|| "Unknown".to_string());

        DeviceInfo::new(device_id, &friendly_name, &manufacturer, &model)
    }

    fn client_info() -> Result<IPortableDeviceValues> {
        unsafe {
            let values: IPortableDeviceValues =
                CoCreateInstance(&PortableDeviceValues, None, CLSCTX_INPROC_SERVER).map_err(
                    |e| OrganizeError::DeviceError(format!("Failed to create client info: {}", e)),
                )?;

            let name = wide(CLIENT_NAME);
            values.SetStringValue(&WPD_CLIENT_NAME, PCWSTR(name.as_ptr()))?;
            values.SetUnsignedIntegerValue(&WPD_CLIENT_MAJOR_VERSION, 1)?;
            values.SetUnsignedIntegerValue(&WPD_CLIENT_MINOR_VERSION, 0)?;
            values.SetUnsignedIntegerValue(&WPD_CLIENT_REVISION, 0)?;
            // SECURITY_IMPERSONATION
            values.SetUnsignedIntegerValue(&WPD_CLIENT_SECURITY_QUALITY_OF_SERVICE, 0x0002_0000)?;
            Ok(values)
        }
    }
}

impl DeviceManagerTrait for DeviceManager {
    type Content = DeviceContent;

    fn enumerate_devices(&self) -> Result<Vec<DeviceInfo>> {
        unsafe {
            let _ = self.manager.RefreshDeviceList();

            let mut count: u32 = 0;
            self.manager.GetDevices(null_mut(), &mut count).map_err(|e| {
                OrganizeError::DeviceError(format!("Failed to get device count: {}", e))
            })?;
            if count == 0 {
                return Ok(Vec::new());
            }

            let mut ids: Vec<PWSTR> = vec![PWSTR::null(); count as usize];
            self.manager
                .GetDevices(ids.as_mut_ptr(), &mut count)
                .map_err(|e| {
                    OrganizeError::DeviceError(format!("Failed to enumerate devices: {}", e))
                })?;

            let mut devices = Vec::with_capacity(count as usize);
            for id in ids.into_iter().take(count as usize) {
                if id.is_null() {
                    continue;
                }
                let device_id = take_pwstr(id);
                let info = self.describe(&device_id);
                debug!("Found device: {}", info);
                devices.push(info);
            }
            Ok(devices)
        }
    }

    fn open_device(&self, device_id: &str) -> Result<DeviceContent> {
        let device: IPortableDevice =
            unsafe { CoCreateInstance(&PortableDeviceFTM, None, CLSCTX_INPROC_SERVER) }.map_err(
                |e| OrganizeError::DeviceError(format!("Failed to create device object: {}", e)),
            )?;
        let client_info = Self::client_info()?;

        let id = wide(device_id);
        unsafe { device.Open(PCWSTR(id.as_ptr()), &client_info) }.map_err(|e| {
            if e.code().0 as u32 == E_ACCESS_DENIED {
                OrganizeError::AccessDenied
            } else {
                OrganizeError::DeviceError(format!("Failed to open device: {}", e))
            }
        })?;
        info!("Opened device: {}", device_id);

        let content = unsafe { device.Content() }.map_err(|e| {
            OrganizeError::ContentError(format!("Failed to get device content: {}", e))
        })?;
        let properties = unsafe { content.Properties() }.map_err(|e| {
            OrganizeError::ContentError(format!("Failed to get properties: {}", e))
        })?;

        Ok(DeviceContent {
            device,
            content,
            properties,
        })
    }
}

/// Open connection to one device's object store; closes the device on drop
pub struct DeviceContent {
    device: IPortableDevice,
    content: IPortableDeviceContent,
    properties: IPortableDeviceProperties,
}

// SAFETY: the device is created from PortableDeviceFTM (free-threaded
// marshaler) while the process is in the multithreaded apartment, so the
// interfaces may be called from any worker thread.
unsafe impl Send for DeviceContent {}
unsafe impl Sync for DeviceContent {}

impl DeviceContent {
    fn property_keys() -> Result<IPortableDeviceKeyCollection> {
        unsafe {
            let keys: IPortableDeviceKeyCollection =
                CoCreateInstance(&PortableDeviceKeyCollection, None, CLSCTX_INPROC_SERVER)
                    .map_err(|e| {
                        OrganizeError::ContentError(format!(
                            "Failed to create key collection: {}",
                            e
                        ))
                    })?;
            for key in OBJECT_PROPERTY_KEYS.iter() {
                keys.Add(key)?;
            }
            Ok(keys)
        }
    }

    fn read_object(
        &self,
        object_id: &str,
        keys: &IPortableDeviceKeyCollection,
    ) -> Result<DeviceObject> {
        let id = wide(object_id);
        let values = unsafe { self.properties.GetValues(PCWSTR(id.as_ptr()), keys) }.map_err(
            |e| OrganizeError::ContentError(format!("Failed to read '{}': {}", object_id, e)),
        )?;
        Ok(Self::parse_object(object_id, &values))
    }

    fn parse_object(object_id: &str, values: &IPortableDeviceValues) -> DeviceObject {
        let name = string_value(values, &WPD_OBJECT_ORIGINAL_FILE_NAME)
            .or_else(|| string_value(values, &WPD_OBJECT_NAME))
            .unwrap_or_else(|| "Unknown".to_string());

        let is_folder = match unsafe { values.GetGuidValue(&WPD_OBJECT_CONTENT_TYPE) } {
            Ok(content_type) => is_container(&content_type),
            Err(_) => false,
        };
        let size = unsafe { values.GetUnsignedLargeIntegerValue(&WPD_OBJECT_SIZE) }.unwrap_or(0);

        DeviceObject {
            object_id: object_id.to_string(),
            parent_id: string_value(values, &WPD_OBJECT_PARENT_ID).unwrap_or_default(),
            name,
            is_folder,
            size: if is_folder { 0 } else { size },
            date_created: string_value(values, &WPD_OBJECT_DATE_CREATED),
            date_modified: string_value(values, &WPD_OBJECT_DATE_MODIFIED),
            content_type: None,
        }
    }

    fn open_stream(&self, object_id: &str) -> Result<(IStream, usize)> {
        unsafe {
            let resources = self.content.Transfer().map_err(|e| {
                OrganizeError::ContentError(format!("Failed to get transfer interface: {}", e))
            })?;

            let id = wide(object_id);
            let mut optimal: u32 = 0;
            let mut stream: Option<IStream> = None;
            // STGM_READ
            resources
                .GetStream(
                    PCWSTR(id.as_ptr()),
                    &WPD_RESOURCE_DEFAULT,
                    0,
                    &mut optimal,
                    &mut stream,
                )
                .map_err(|e| {
                    OrganizeError::ContentError(format!("Failed to open '{}': {}", object_id, e))
                })?;

            let stream = stream.ok_or_else(|| {
                OrganizeError::ContentError(format!("No data stream for '{}'", object_id))
            })?;
            let buffer_size = match optimal as usize {
                n if n > 0 && n <= MAX_READ_BUFFER => n,
                _ => DEFAULT_READ_BUFFER,
            };
            Ok((stream, buffer_size))
        }
    }
}

impl DeviceContent {
    /// Copy an object's stream into `writer` block by block, stopping after
    /// `limit` bytes when one is given
    fn stream_into(
        &self,
        object_id: &str,
        writer: &mut dyn Write,
        limit: Option<u64>,
    ) -> Result<u64> {
        let (stream, buffer_size) = self.open_stream(object_id)?;
        let read_error = |e: windows::core::Error| {
            OrganizeError::ContentError(format!("Read of '{}' failed: {}", object_id, e))
        };

        let mut buffer = vec![0u8; buffer_size];
        let mut total: u64 = 0;
        loop {
            let want = match limit {
                Some(limit) if total >= limit => break,
                Some(limit) => (limit - total).min(buffer_size as u64) as usize,
                None => buffer_size,
            };

            let mut read: u32 = 0;
            let hr = unsafe {
                stream.Read(
                    buffer.as_mut_ptr() as *mut _,
                    want as u32,
                    Some(&mut read),
                )
            };
            // a failed read is an error even when it delivered some bytes
            hr.ok().map_err(read_error)?;
            if read == 0 {
                break;
            }

            writer.write_all(&buffer[..read as usize]).map_err(|e| {
                OrganizeError::ContentError(format!("Write of '{}' failed: {}", object_id, e))
            })?;
            total += read as u64;
        }
        trace!("Streamed {} bytes of '{}'", total, object_id);
        Ok(total)
    }
}

fn string_value(values: &IPortableDeviceValues, key: &PROPERTYKEY) -> Option<String> {
    unsafe {
        let value = values.GetStringValue(key).ok()?;
        let text = take_pwstr(value);
        (!text.is_empty()).then_some(text)
    }
}

impl DeviceContentTrait for DeviceContent {
    fn enumerate_children(&self, parent_id: &str) -> Result<Vec<DeviceObject>> {
        trace!("Enumerating children of: {}", parent_id);

        let parent = wide(parent_id);
        let enum_ids: IEnumPortableDeviceObjectIDs =
            unsafe { self.content.EnumObjects(0, PCWSTR(parent.as_ptr()), None) }.map_err(
                |e| {
                    OrganizeError::ContentError(format!(
                        "Failed to enumerate '{}': {}",
                        parent_id, e
                    ))
                },
            )?;
        let keys = Self::property_keys()?;

        let mut objects = Vec::new();
        loop {
            let mut batch = [PWSTR::null(); ENUM_BATCH];
            let mut fetched: u32 = 0;
            let hr = unsafe { enum_ids.Next(&mut batch, &mut fetched) };
            if fetched == 0 {
                break;
            }

            for id in batch.iter().take(fetched as usize) {
                if id.is_null() {
                    continue;
                }
                let object_id = unsafe { take_pwstr(*id) };
                match self.read_object(&object_id, &keys) {
                    Ok(object) => objects.push(object),
                    Err(e) => warn!("Skipping object '{}': {}", object_id, e),
                }
            }

            if hr.is_err() || (fetched as usize) < ENUM_BATCH {
                break;
            }
        }

        debug!("Found {} objects in '{}'", objects.len(), parent_id);
        if objects.is_empty() && parent_id == ROOT_OBJECT_ID {
            warn!("No storage visible on the device; it may be locked or not trusted yet");
        }
        Ok(objects)
    }

    fn copy_to_writer(&self, object_id: &str, writer: &mut dyn Write) -> Result<u64> {
        self.stream_into(object_id, writer, None)
    }

    fn read_head(&self, object_id: &str, limit: usize) -> Result<Vec<u8>> {
        let mut head = Vec::with_capacity(limit.min(DEFAULT_READ_BUFFER));
        self.stream_into(object_id, &mut head, Some(limit as u64))?;
        Ok(head)
    }

    fn get_object(&self, object_id: &str) -> Result<Option<DeviceObject>> {
        let keys = Self::property_keys()?;
        match self.read_object(object_id, &keys) {
            Ok(object) => Ok(Some(object)),
            Err(e) => {
                debug!("Object lookup failed: {}", e);
                Ok(None)
            }
        }
    }
}

impl Drop for DeviceContent {
    fn drop(&mut self) {
        unsafe {
            let _ = self.device.Close();
        }
    }
}

/// RAII guard for COM initialization
pub struct ComGuard {
    _private: (),
}

impl ComGuard {
    pub fn new() -> Result<Self> {
        unsafe { CoInitializeEx(None, COINIT_MULTITHREADED) }
            .ok()
            .map_err(|e| OrganizeError::DeviceError(format!("Failed to initialize COM: {}", e)))?;
        Ok(Self { _private: () })
    }
}

impl Drop for ComGuard {
    fn drop(&mut self) {
        unsafe {
            CoUninitialize();
        }
    }
}

/// Initialize COM for this thread; uninitialized when the guard drops
pub fn initialize_com() -> Result<ComGuard> {
    ComGuard::new()
}
