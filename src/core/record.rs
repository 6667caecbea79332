//! Per-run data model: discovered files, grouping keys and the run result

use chrono::NaiveDate;
use std::path::{Path, PathBuf};

/// A discovered file. Lives for one run only.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileRecord {
    /// Lower-cased identifier used for set membership and de-duplication
    pub id: String,
    /// File name as found on the source, used for the destination name
    pub name: String,
    /// Location on the source: a filesystem path or a device path
    pub path: PathBuf,
}

impl FileRecord {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let id = path.to_string_lossy().to_lowercase();
        Self { id, name, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Grouping key and destination fragment: `YYYY-MM-DD[/model]`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DateModelKey {
    pub date: NaiveDate,
    pub model: Option<String>,
}

impl DateModelKey {
    pub fn new(date: NaiveDate, model: Option<String>) -> Self {
        Self { date, model }
    }

    /// Zero-padded `YYYY-MM-DD`
    pub fn date_folder(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    /// `date` or `date/model`, relative to the destination root
    pub fn relative_dir(&self) -> PathBuf {
        let mut dir = PathBuf::from(self.date_folder());
        if let Some(model) = &self.model {
            dir.push(model);
        }
        dir
    }
}

/// The three file collections produced by enumeration.
///
/// `selected` is a subset of `all`; `missing` is `all` minus `selected`
/// in the order of `all`.
#[derive(Debug, Clone, Default)]
pub struct RunResult {
    pub all: Vec<FileRecord>,
    pub selected: Vec<FileRecord>,
    pub missing: Vec<FileRecord>,
}
