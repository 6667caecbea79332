//! Run summaries
//!
//! [`summarize`] is a pure function of the enumeration result. Presentation
//! goes through `log` so the same text lands in the console and the log file.

use crate::core::copier::CopyReport;
use crate::core::extensions::extension_of;
use crate::core::record::FileRecord;
use log::{info, warn};
use std::collections::BTreeSet;
use std::fmt;

/// Counts over one enumeration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub total: usize,
    pub processed: usize,
    pub missing: usize,
    /// Distinct lower-cased extensions among missing files (`""` for none)
    pub missing_extensions: BTreeSet<String>,
}

/// Summarize the three collections of a run
pub fn summarize(all: &[FileRecord], selected: &[FileRecord], missing: &[FileRecord]) -> Summary {
    Summary {
        total: all.len(),
        processed: selected.len(),
        missing: missing.len(),
        missing_extensions: missing.iter().map(|f| extension_of(&f.name)).collect(),
    }
}

impl Summary {
    pub fn nothing_to_copy(&self) -> bool {
        self.processed == 0
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "-".repeat(24);
        writeln!(f, "{}", rule)?;
        writeln!(f, "  Summary Files Report")?;
        writeln!(f, "{}", rule)?;
        writeln!(f, " Processed files : {}/{}", self.processed, self.total)?;
        write!(f, " Missing files   : {}/{}", self.missing, self.total)?;
        if !self.missing_extensions.is_empty() {
            let exts: Vec<&str> = self
                .missing_extensions
                .iter()
                .map(|e| if e.is_empty() { "(none)" } else { e.as_str() })
                .collect();
            write!(f, "\n Missing types   : {}", exts.join(", "))?;
        }
        Ok(())
    }
}

/// Lines listing every file that was left out, empty when none were
pub fn missed_files_listing(missing: &[FileRecord]) -> Vec<String> {
    if missing.is_empty() {
        return Vec::new();
    }
    std::iter::once(" Missed files:".to_string())
        .chain(missing.iter().map(|file| format!("  {}", file.path.display())))
        .collect()
}

/// Log the summary followed by each missed file
pub fn log_summary(summary: &Summary, missing: &[FileRecord]) {
    for line in summary.to_string().lines() {
        info!("{}", line);
    }
    for line in missed_files_listing(missing) {
        info!("{}", line);
    }
}

/// Log the final copy outcome, listing failed files separately from missing ones
pub fn log_copy_report(report: &CopyReport) {
    info!(" Copied files    : {}", report.copied);
    if !report.failed.is_empty() {
        warn!(" Failed copies   : {}", report.failed.len());
        for failed in &report.failed {
            warn!("  {}: {}", failed.file.path.display(), failed.reason);
        }
    }
}
