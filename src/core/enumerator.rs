//! File discovery and extension filtering
//!
//! Produces the [`RunResult`] for a source: every discovered file, the files
//! whose extension is recognized, and the complement of the two.

use crate::core::error::Result;
use crate::core::extensions::ExtensionSet;
use crate::core::record::{FileRecord, RunResult};
use crate::core::source::MediaSource;
use log::debug;
use std::collections::HashSet;

/// All files under `source`, de-duplicated by their lower-cased identifier.
///
/// Traversal errors abort enumeration.
pub fn enumerate(source: &dyn MediaSource) -> Result<Vec<FileRecord>> {
    let mut seen = HashSet::new();
    let mut files = Vec::new();
    for file in source.list_files()? {
        if seen.insert(file.id.clone()) {
            files.push(file);
        } else {
            debug!("Skipping case-duplicate {}", file.path.display());
        }
    }
    Ok(files)
}

/// Files of `all` whose extension is in `extensions`, in the order of `all`
pub fn filter(all: &[FileRecord], extensions: &ExtensionSet) -> Vec<FileRecord> {
    all.iter()
        .filter(|f| extensions.matches(&f.name))
        .cloned()
        .collect()
}

/// Files of `all` that are not in `selected`, in the order of `all`
pub fn missing(all: &[FileRecord], selected: &[FileRecord]) -> Vec<FileRecord> {
    let chosen: HashSet<&str> = selected.iter().map(|f| f.id.as_str()).collect();
    all.iter()
        .filter(|f| !chosen.contains(f.id.as_str()))
        .cloned()
        .collect()
}

/// Enumerate `source` and split it by `extensions`
pub fn scan(source: &dyn MediaSource, extensions: &ExtensionSet) -> Result<RunResult> {
    let all = enumerate(source)?;
    let selected = filter(&all, extensions);
    let missing = missing(&all, &selected);
    Ok(RunResult {
        all,
        selected,
        missing,
    })
}
