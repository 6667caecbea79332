//! Capture date and camera model extraction
//!
//! The filesystem modification time is always read first and serves as the
//! fallback date. Embedded EXIF data, when the file is a recognized image,
//! supplies the capture date and the camera model. A file that cannot be
//! decoded is classified by its timestamp alone; decode failures are never
//! returned as errors.

use crate::core::error::Result;
use crate::core::record::DateModelKey;
use chrono::{DateTime, Local, NaiveDateTime};
use exif::{In, Tag, Value};
use log::debug;
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor, Seek};
use std::path::Path;
use std::time::SystemTime;

/// EXIF date layout, e.g. `2021:01:01 10:00:00`
const EXIF_DATE_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// Name the tag table uses for the camera model field
const MODEL_TAG_NAME: &str = "Model";

/// What could be read from a file's embedded metadata
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmbeddedMetadata {
    pub taken: Option<NaiveDateTime>,
    pub model: Option<String>,
}

/// Capture context of a local file.
///
/// Fails only when the file's modification time cannot be read.
pub fn capture_context(path: &Path) -> Result<DateModelKey> {
    let modified = std::fs::metadata(path)?.modified()?;
    let fallback = local_naive(modified);

    let embedded = match File::open(path) {
        Ok(file) => read_embedded(&mut BufReader::new(file)),
        Err(e) => {
            debug!("Cannot open {} for metadata: {}", path.display(), e);
            EmbeddedMetadata::default()
        }
    };

    Ok(resolve(embedded, fallback))
}

/// Capture context of an in-memory file, e.g. bytes streamed from a device
pub fn capture_context_from_bytes(bytes: &[u8], fallback: NaiveDateTime) -> DateModelKey {
    let embedded = read_embedded(&mut Cursor::new(bytes));
    resolve(embedded, fallback)
}

fn resolve(embedded: EmbeddedMetadata, fallback: NaiveDateTime) -> DateModelKey {
    let taken = embedded.taken.unwrap_or(fallback);
    DateModelKey::new(taken.date(), embedded.model)
}

/// Read the EXIF tag table, yielding empty metadata when there is none
pub fn read_embedded<R: BufRead + Seek>(reader: &mut R) -> EmbeddedMetadata {
    let exif = match exif::Reader::new().read_from_container(reader) {
        Ok(exif) => exif,
        Err(e) => {
            debug!("No embedded metadata: {}", e);
            return EmbeddedMetadata::default();
        }
    };

    let model = exif
        .fields()
        .filter(|field| field.ifd_num == In::PRIMARY)
        .find(|field| field.tag.to_string() == MODEL_TAG_NAME)
        .and_then(|field| ascii_value(&field.value))
        .and_then(|raw| normalize_model(&raw));

    let taken = [Tag::DateTimeOriginal, Tag::DateTime]
        .iter()
        .filter_map(|tag| exif.get_field(*tag, In::PRIMARY))
        .filter_map(|field| ascii_value(&field.value))
        .find_map(|raw| parse_exif_datetime(&raw));

    EmbeddedMetadata { taken, model }
}

/// Remove every space and lower-case: `"Canon 60D"` becomes `"canon60d"`.
///
/// Path separators are replaced so the model is always a single folder name.
/// An empty result means the file has no usable model.
pub fn normalize_model(raw: &str) -> Option<String> {
    let normalized: String = raw
        .trim_matches(char::from(0))
        .chars()
        .filter(|c| *c != ' ' && *c != '\0')
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect::<String>()
        .to_lowercase();

    if normalized.is_empty() || normalized.chars().all(|c| c == '.') {
        None
    } else {
        Some(normalized)
    }
}

fn ascii_value(value: &Value) -> Option<String> {
    match value {
        Value::Ascii(parts) => parts
            .first()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned()),
        _ => None,
    }
}

fn parse_exif_datetime(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim_matches(char::from(0)).trim();
    NaiveDateTime::parse_from_str(trimmed, EXIF_DATE_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S"))
        .ok()
}

/// Convert a filesystem timestamp to local wall-clock time
pub fn local_naive(time: SystemTime) -> NaiveDateTime {
    DateTime::<Local>::from(time).naive_local()
}
