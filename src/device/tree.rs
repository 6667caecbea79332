//! Device content tree
//!
//! A device exposes a hierarchy of objects. [`ContentNode`] wraps each object
//! as either a folder or a file so traversal never branches on raw flags.

use crate::core::error::{OrganizeError, Result};
use crate::device::traits::{DeviceContentTrait, DeviceObject, ROOT_OBJECT_ID};
use chrono::{DateTime, NaiveDateTime};
use log::debug;

/// Date layouts reported by portable devices
const DEVICE_DATE_FORMATS: &[&str] = &[
    "%Y/%m/%d:%H:%M:%S%.f",
    "%Y/%m/%d:%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
];

/// A node of the device object tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentNode {
    Folder(DeviceObject),
    File(DeviceObject),
}

impl ContentNode {
    pub fn from_object(object: DeviceObject) -> Self {
        if object.is_folder {
            ContentNode::Folder(object)
        } else {
            ContentNode::File(object)
        }
    }

    /// The synthetic folder above every top-level object
    pub fn device_root(name: &str) -> Self {
        ContentNode::Folder(DeviceObject::folder(ROOT_OBJECT_ID, "", name))
    }

    pub fn object(&self) -> &DeviceObject {
        match self {
            ContentNode::Folder(obj) | ContentNode::File(obj) => obj,
        }
    }

    pub fn id(&self) -> &str {
        &self.object().object_id
    }

    pub fn name(&self) -> &str {
        &self.object().name
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, ContentNode::Folder(_))
    }

    /// Size in bytes; folders have none
    pub fn size(&self) -> Option<u64> {
        match self {
            ContentNode::Folder(_) => None,
            ContentNode::File(obj) => Some(obj.size),
        }
    }

    /// Modification date, else creation date
    pub fn capture_date(&self) -> Option<NaiveDateTime> {
        let obj = self.object();
        obj.date_modified
            .as_deref()
            .and_then(parse_device_date)
            .or_else(|| obj.date_created.as_deref().and_then(parse_device_date))
    }

    /// Direct children; a file has none
    pub fn children<C: DeviceContentTrait + ?Sized>(&self, content: &C) -> Result<Vec<ContentNode>> {
        match self {
            ContentNode::File(_) => Ok(Vec::new()),
            ContentNode::Folder(obj) => Ok(content
                .enumerate_children(&obj.object_id)?
                .into_iter()
                .map(ContentNode::from_object)
                .collect()),
        }
    }

    /// Every file below this node, paired with its path under `prefix`.
    ///
    /// Depth-first, children in the order the device reports them.
    pub fn walk_files<C: DeviceContentTrait + ?Sized>(
        &self,
        content: &C,
        prefix: &str,
    ) -> Result<Vec<(String, DeviceObject)>> {
        let mut files = Vec::new();
        self.walk_into(content, prefix, &mut files)?;
        Ok(files)
    }

    fn walk_into<C: DeviceContentTrait + ?Sized>(
        &self,
        content: &C,
        path: &str,
        files: &mut Vec<(String, DeviceObject)>,
    ) -> Result<()> {
        match self {
            ContentNode::File(obj) => {
                files.push((path.to_string(), obj.clone()));
            }
            ContentNode::Folder(_) => {
                for child in self.children(content)? {
                    let child_path = format!("{}/{}", path, child.name());
                    child.walk_into(content, &child_path, files)?;
                }
            }
        }
        Ok(())
    }
}

/// Find the node at `path` (`"Internal Storage/DCIM"`), starting at `root`.
///
/// Segments are matched by name, case-insensitively. An empty path is the
/// root itself.
pub fn resolve_path<C: DeviceContentTrait + ?Sized>(
    content: &C,
    root: ContentNode,
    path: &str,
) -> Result<ContentNode> {
    let mut current = root;
    for segment in path.split(['/', '\\']).filter(|s| !s.is_empty()) {
        let next = current
            .children(content)?
            .into_iter()
            .find(|child| child.name().eq_ignore_ascii_case(segment));
        current = match next {
            Some(node) => node,
            None => {
                return Err(OrganizeError::ContentError(format!(
                    "'{}' not found under '{}'",
                    segment,
                    current.name()
                )))
            }
        };
    }
    debug!("Resolved device path '{}' to object {}", path, current.id());
    Ok(current)
}

/// Parse a device-reported date, e.g. `2015/03/01:10:22:31.000`
pub fn parse_device_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }
    DEVICE_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}
