//! Distinct (date, model) keys over a file set

use crate::core::error::Result;
use crate::core::record::{DateModelKey, FileRecord};
use crate::core::source::MediaSource;
use log::debug;
use std::collections::HashSet;

/// Classify each file once, keeping input order
pub fn classify(
    source: &dyn MediaSource,
    files: &[FileRecord],
) -> Result<Vec<(FileRecord, DateModelKey)>> {
    files
        .iter()
        .map(|file| {
            let key = source.capture_context(file)?;
            debug!("{} -> {}", file.name, key.relative_dir().display());
            Ok((file.clone(), key))
        })
        .collect()
}

/// Distinct keys of an already classified file set
pub fn distinct_keys(classified: &[(FileRecord, DateModelKey)]) -> HashSet<DateModelKey> {
    classified.iter().map(|(_, key)| key.clone()).collect()
}

/// Classify each file once and collect the distinct keys
pub fn group(source: &dyn MediaSource, files: &[FileRecord]) -> Result<HashSet<DateModelKey>> {
    Ok(distinct_keys(&classify(source, files)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::source::LocalSource;
    use crate::testdb::fixtures;
    use tempfile::TempDir;

    #[test]
    fn test_group_deduplicates_keys() {
        let dir = TempDir::new().unwrap();
        let exif = fixtures::jpeg_with_exif(Some("Canon 60D"), Some("2021:01:01 10:00:00"));
        for name in ["a.jpg", "b.jpg"] {
            fixtures::write_file(&dir.path().join(name), &exif).unwrap();
        }
        for name in ["c.png", "d.png"] {
            let path = dir.path().join(name);
            fixtures::write_file(&path, b"plain").unwrap();
            fixtures::set_mtime(&path, 2022, 6, 15).unwrap();
        }

        let source = LocalSource::new(dir.path());
        let files = source.list_files().unwrap();
        let keys = group(&source, &files).unwrap();

        assert_eq!(keys.len(), 2);
        let dirs: HashSet<String> = keys
            .iter()
            .map(|k| k.relative_dir().to_string_lossy().replace('\\', "/"))
            .collect();
        assert!(dirs.contains("2021-01-01/canon60d"));
        assert!(dirs.contains("2022-06-15"));
    }

    #[test]
    fn test_classify_keeps_order() {
        let dir = TempDir::new().unwrap();
        for (name, day) in [("x.png", 3), ("a.png", 1)] {
            let path = dir.path().join(name);
            fixtures::write_file(&path, b"plain").unwrap();
            fixtures::set_mtime(&path, 2020, 2, day).unwrap();
        }
        let source = LocalSource::new(dir.path());
        let files = vec![
            FileRecord::new(dir.path().join("x.png")),
            FileRecord::new(dir.path().join("a.png")),
        ];
        let classified = classify(&source, &files).unwrap();
        assert_eq!(classified[0].1.date_folder(), "2020-02-03");
        assert_eq!(classified[1].1.date_folder(), "2020-02-01");
    }

    #[test]
    fn test_group_empty() {
        let dir = TempDir::new().unwrap();
        let keys = group(&LocalSource::new(dir.path()), &[]).unwrap();
        assert!(keys.is_empty());
    }
}
