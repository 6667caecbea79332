//! Builders for on-disk and in-memory test media
//!
//! JPEG files carry a minimal little-endian EXIF block with optional
//! `Model` and `DateTime` entries, which is enough for the metadata
//! extractor to classify them.

use chrono::{Local, NaiveDate, TimeZone};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;
use std::time::SystemTime;

// ============================================================================
// JPEG generation
// ============================================================================

/// A JPEG stream with an APP1 EXIF segment.
///
/// `date` uses the EXIF layout `YYYY:MM:DD HH:MM:SS`.
pub fn jpeg_with_exif(model: Option<&str>, date: Option<&str>) -> Vec<u8> {
    let mut entries: Vec<(u16, Vec<u8>)> = Vec::new();
    if let Some(model) = model {
        entries.push((0x0110, ascii(model)));
    }
    if let Some(date) = date {
        entries.push((0x0132, ascii(date)));
    }

    let tiff = tiff_block(&entries);

    let mut data = Vec::with_capacity(tiff.len() + 32);
    data.extend_from_slice(&[0xFF, 0xD8]); // SOI
    data.extend_from_slice(&[0xFF, 0xE1]); // APP1
    let segment_len = (2 + 6 + tiff.len()) as u16;
    data.extend_from_slice(&segment_len.to_be_bytes());
    data.extend_from_slice(b"Exif\0\0");
    data.extend_from_slice(&tiff);
    data.extend_from_slice(&[0xFF, 0xD9]); // EOI
    data
}

/// A JPEG stream with no metadata at all
pub fn plain_jpeg(seed: u8) -> Vec<u8> {
    let mut data = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];
    data.extend_from_slice(b"JFIF\0");
    data.extend_from_slice(&[0x01, 0x01, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00]);
    data.extend(std::iter::repeat(seed).take(64));
    data.extend_from_slice(&[0xFF, 0xD9]);
    data
}

fn ascii(value: &str) -> Vec<u8> {
    let mut bytes = value.as_bytes().to_vec();
    bytes.push(0);
    bytes
}

/// IFD0 with ASCII entries, values stored after the directory
fn tiff_block(entries: &[(u16, Vec<u8>)]) -> Vec<u8> {
    let mut tiff = Vec::new();
    tiff.extend_from_slice(b"II");
    tiff.extend_from_slice(&[0x2A, 0x00]);
    tiff.extend_from_slice(&8u32.to_le_bytes());

    let ifd_len = 2 + entries.len() * 12 + 4;
    let mut value_offset = (8 + ifd_len) as u32;
    let mut values = Vec::new();

    tiff.extend_from_slice(&(entries.len() as u16).to_le_bytes());
    for (tag, value) in entries {
        tiff.extend_from_slice(&tag.to_le_bytes());
        tiff.extend_from_slice(&2u16.to_le_bytes()); // ASCII
        tiff.extend_from_slice(&(value.len() as u32).to_le_bytes());
        if value.len() <= 4 {
            let mut inline = value.clone();
            inline.resize(4, 0);
            tiff.extend_from_slice(&inline);
        } else {
            tiff.extend_from_slice(&value_offset.to_le_bytes());
            values.extend_from_slice(value);
            value_offset += value.len() as u32;
        }
    }
    tiff.extend_from_slice(&0u32.to_le_bytes()); // no next IFD
    tiff.extend_from_slice(&values);
    tiff
}

// ============================================================================
// Filesystem helpers
// ============================================================================

/// Write `bytes` to `path`, creating parent folders
pub fn write_file(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(bytes)
}

/// Set the modification time to local noon of the given day
pub fn set_mtime(path: &Path, year: i32, month: u32, day: u32) -> io::Result<()> {
    let noon = NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(12, 0, 0))
        .and_then(|dt| Local.from_local_datetime(&dt).single())
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "invalid date"))?;
    let file = File::options().write(true).open(path)?;
    file.set_modified(SystemTime::from(noon))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jpeg_markers() {
        let data = jpeg_with_exif(Some("Canon 60D"), Some("2021:01:01 10:00:00"));
        assert_eq!(&data[..4], &[0xFF, 0xD8, 0xFF, 0xE1]);
        assert_eq!(&data[6..12], b"Exif\0\0");
        assert_eq!(&data[data.len() - 2..], &[0xFF, 0xD9]);
    }

    #[test]
    fn test_segment_length_covers_payload() {
        let data = jpeg_with_exif(None, Some("2021:01:01 10:00:00"));
        let declared = u16::from_be_bytes([data[4], data[5]]) as usize;
        // SOI + marker + declared length + EOI
        assert_eq!(data.len(), 2 + 2 + declared + 2);
    }

    #[test]
    fn test_plain_jpeg_differs_by_seed() {
        assert_ne!(plain_jpeg(1), plain_jpeg(2));
    }
}
