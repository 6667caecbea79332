//! Media sources
//!
//! The organize pipeline is written once against [`MediaSource`]. A source
//! knows how to list its files, classify one file, and copy one file to a
//! local path. [`LocalSource`] walks a directory tree; [`DeviceSource`] walks
//! a portable device's object tree.

use crate::core::error::{OrganizeError, Result};
use crate::core::metadata;
use crate::core::record::{DateModelKey, FileRecord};
use crate::device::traits::{DeviceContentTrait, DeviceInfo, DeviceObject};
use crate::device::tree::{resolve_path, ContentNode};
use chrono::Local;
use log::{debug, info};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use walkdir::WalkDir;

/// A place media files are read from
pub trait MediaSource: Send + Sync {
    /// Human-readable location for logs and reports
    fn describe(&self) -> String;

    /// Check the source is usable before anything is enumerated
    fn validate(&self) -> Result<()>;

    /// Every file under the source, in a stable traversal order
    fn list_files(&self) -> Result<Vec<FileRecord>>;

    /// Capture date and camera model of one listed file
    fn capture_context(&self, file: &FileRecord) -> Result<DateModelKey>;

    /// Copy one listed file to `target`, returning the bytes written
    fn copy_to(&self, file: &FileRecord, target: &Path) -> Result<u64>;
}

// ============================================================================
// Local filesystem
// ============================================================================

/// A directory tree on a local filesystem
#[derive(Debug, Clone)]
pub struct LocalSource {
    root: PathBuf,
    /// Subtree skipped while listing, usually the destination of the run
    excluded: Option<PathBuf>,
}

impl LocalSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            excluded: None,
        }
    }

    /// Skip `path` and everything below it when listing files
    ///
    /// An organized destination placed inside the source would otherwise be
    /// listed again on the next run.
    pub fn excluding(mut self, path: impl Into<PathBuf>) -> Self {
        self.excluded = Some(path.into());
        self
    }

    fn is_excluded(excluded: Option<&Path>, entry: &walkdir::DirEntry) -> bool {
        match excluded {
            Some(excluded) if entry.file_type().is_dir() => fs::canonicalize(entry.path())
                .map(|p| p == excluded)
                .unwrap_or(false),
            _ => false,
        }
    }
}

/// True when `a` and `b` name the same existing file
fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

impl MediaSource for LocalSource {
    fn describe(&self) -> String {
        self.root.display().to_string()
    }

    fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| OrganizeError::InvalidSource {
            path: self.root.clone(),
            reason: reason.to_string(),
        };

        let meta = fs::metadata(&self.root).map_err(|e| invalid(&e.to_string()))?;
        if !meta.is_dir() {
            return Err(invalid("not a directory"));
        }
        fs::read_dir(&self.root).map_err(|e| invalid(&e.to_string()))?;
        Ok(())
    }

    fn list_files(&self) -> Result<Vec<FileRecord>> {
        // a destination that does not exist yet cannot hold anything to skip
        let excluded = self
            .excluded
            .as_ref()
            .and_then(|path| fs::canonicalize(path).ok());
        if let Some(ref path) = excluded {
            debug!("Skipping {} while listing", path.display());
        }

        let mut files = Vec::new();
        let walker = WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !Self::is_excluded(excluded.as_deref(), entry));
        for entry in walker {
            let entry = entry?;
            if entry.file_type().is_file() {
                files.push(FileRecord::new(entry.into_path()));
            }
        }
        debug!("Found {} files under {}", files.len(), self.root.display());
        Ok(files)
    }

    fn capture_context(&self, file: &FileRecord) -> Result<DateModelKey> {
        metadata::capture_context(file.path())
    }

    fn copy_to(&self, file: &FileRecord, target: &Path) -> Result<u64> {
        let transfer_error = |message: String| OrganizeError::TransferError {
            filename: file.name.clone(),
            message,
        };

        // fs::copy truncates the target before reading the source
        if same_file(file.path(), target) {
            return Err(transfer_error(format!(
                "source and target are the same file: {}",
                target.display()
            )));
        }
        fs::copy(file.path(), target).map_err(|e| transfer_error(e.to_string()))
    }
}

// ============================================================================
// Portable device
// ============================================================================

/// Bytes read from the start of a device file to find its EXIF block
pub const METADATA_PREFIX_BYTES: usize = 256 * 1024;

/// A folder on a portable device, read through the device content contract
pub struct DeviceSource<C: DeviceContentTrait> {
    content: C,
    device: DeviceInfo,
    /// Folder inside the device to organize from; empty for the whole device
    base_path: String,
    /// Objects seen by `list_files`, keyed by file id
    index: RwLock<HashMap<String, DeviceObject>>,
}

impl<C: DeviceContentTrait> DeviceSource<C> {
    pub fn new(content: C, device: DeviceInfo, base_path: impl Into<String>) -> Self {
        Self {
            content,
            device,
            base_path: base_path.into(),
            index: RwLock::new(HashMap::new()),
        }
    }

    fn base_node(&self) -> Result<ContentNode> {
        resolve_path(
            &self.content,
            ContentNode::device_root(self.device.display_name()),
            &self.base_path,
        )
    }

    fn base_prefix(&self) -> String {
        let trimmed = self.base_path.trim_matches(|c| c == '/' || c == '\\');
        if trimmed.is_empty() {
            self.device.display_name().to_string()
        } else {
            format!("{}/{}", self.device.display_name(), trimmed)
        }
    }

    fn lookup(&self, file: &FileRecord) -> Result<DeviceObject> {
        let index = self
            .index
            .read()
            .map_err(|_| OrganizeError::ContentError("device index poisoned".to_string()))?;
        index.get(&file.id).cloned().ok_or_else(|| {
            OrganizeError::ContentError(format!("'{}' was not listed on the device", file.name))
        })
    }

    /// Stream `object` into `out`, failing when fewer bytes arrive than the
    /// device reported
    fn stream_object(&self, object: &DeviceObject, out: File) -> Result<u64> {
        let mut out = BufWriter::new(out);
        let written = self.content.copy_to_writer(&object.object_id, &mut out)?;
        out.flush()?;

        // size 0 means the device did not report one
        if object.size > 0 && written != object.size {
            return Err(OrganizeError::ContentError(format!(
                "short transfer: {} of {} bytes",
                written, object.size
            )));
        }
        Ok(written)
    }
}

impl<C: DeviceContentTrait> MediaSource for DeviceSource<C> {
    fn describe(&self) -> String {
        self.base_prefix()
    }

    fn validate(&self) -> Result<()> {
        let node = self.base_node()?;
        if !node.is_folder() {
            return Err(OrganizeError::InvalidSource {
                path: PathBuf::from(self.base_prefix()),
                reason: "not a folder".to_string(),
            });
        }
        Ok(())
    }

    fn list_files(&self) -> Result<Vec<FileRecord>> {
        let files = self.base_node()?.walk_files(&self.content, &self.base_prefix())?;

        let mut index = self
            .index
            .write()
            .map_err(|_| OrganizeError::ContentError("device index poisoned".to_string()))?;
        index.clear();

        let records = files
            .into_iter()
            .map(|(path, object)| {
                let record = FileRecord::new(path);
                index.insert(record.id.clone(), object);
                record
            })
            .collect::<Vec<_>>();
        info!("Found {} files on {}", records.len(), self.device);
        Ok(records)
    }

    fn capture_context(&self, file: &FileRecord) -> Result<DateModelKey> {
        let object = self.lookup(file)?;
        let fallback = ContentNode::from_object(object.clone())
            .capture_date()
            .unwrap_or_else(|| Local::now().naive_local());

        let key = match self
            .content
            .read_head(&object.object_id, METADATA_PREFIX_BYTES)
        {
            Ok(bytes) => metadata::capture_context_from_bytes(&bytes, fallback),
            Err(e) => {
                debug!("Cannot read {} for metadata: {}", file.name, e);
                DateModelKey::new(fallback.date(), None)
            }
        };
        Ok(key)
    }

    fn copy_to(&self, file: &FileRecord, target: &Path) -> Result<u64> {
        let listed = self.lookup(file)?;
        let transfer_error = |message: String| OrganizeError::TransferError {
            filename: file.name.clone(),
            message,
        };

        let object = self
            .content
            .get_object(&listed.object_id)
            .map_err(|e| transfer_error(e.to_string()))?
            .ok_or_else(|| transfer_error("no longer on the device".to_string()))?;

        let out = File::create(target).map_err(|e| transfer_error(e.to_string()))?;
        self.stream_object(&object, out).map_err(|e| {
            if let Err(remove) = fs::remove_file(target) {
                debug!("Cannot remove partial {}: {}", target.display(), remove);
            }
            transfer_error(e.to_string())
        })
    }
}
