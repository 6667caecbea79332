//! Copy engine
//!
//! Three phases, each finished before the next starts:
//!
//! 1. ensure the destination root exists
//! 2. classify every selected file and create `date/` and `date/model/`
//!    folders for each distinct key
//! 3. copy the files on a bounded worker pool
//!
//! Because every folder exists before the first copy, workers never create
//! directories. The only state workers share is the progress counter.
//! A file that fails to copy is recorded in [`CopyReport::failed`] and the
//! remaining copies go on.

use crate::core::error::{OrganizeError, Result};
use crate::core::grouper;
use crate::core::record::{DateModelKey, FileRecord};
use crate::core::source::MediaSource;
use log::{debug, info, warn};
use rayon::prelude::*;
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Worker pool width used unless configured otherwise
pub const DEFAULT_WORKERS: usize = 10;

// =============================================================================
// Progress and results
// =============================================================================

/// Sent after each file finishes, successfully or not
#[derive(Debug, Clone)]
pub struct CopyProgress {
    /// Name of the file that just finished
    pub file: String,
    /// Files finished so far, including this one
    pub completed: usize,
    pub total: usize,
    /// Bytes written for this file
    pub bytes: u64,
    pub succeeded: bool,
}

/// A file that could not be copied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedCopy {
    pub file: FileRecord,
    pub reason: String,
}

/// Outcome of the copy phase
#[derive(Debug, Clone, Default)]
pub struct CopyReport {
    /// Files written to the destination
    pub copied: usize,
    pub bytes: u64,
    /// Distinct folders that were ensured under the destination root
    pub directories: usize,
    pub failed: Vec<FailedCopy>,
    pub duration_ms: u64,
}

impl CopyReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

impl fmt::Display for CopyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Copied: {}, Failed: {}, Folders: {}, Size: {:.2} MB, Duration: {:.2}s",
            self.copied,
            self.failed.len(),
            self.directories,
            self.bytes as f64 / (1024.0 * 1024.0),
            self.duration_ms as f64 / 1000.0
        )
    }
}

// =============================================================================
// Engine
// =============================================================================

pub struct CopyEngine {
    workers: usize,
    progress_callback: Option<Arc<dyn Fn(CopyProgress) + Send + Sync>>,
}

impl fmt::Debug for CopyEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CopyEngine")
            .field("workers", &self.workers)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for CopyEngine {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            progress_callback: None,
        }
    }
}

impl CopyEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the worker pool width (at least one)
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Set progress callback
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(CopyProgress) + Send + Sync + 'static,
    {
        self.progress_callback = Some(Arc::new(callback));
        self
    }

    /// Copy `files` from `source` into `destination/date/[model/]name`
    pub fn process(
        &self,
        source: &dyn MediaSource,
        files: &[FileRecord],
        destination: &Path,
    ) -> Result<CopyReport> {
        let start = Instant::now();

        ensure_root(destination)?;

        let classified = grouper::classify(source, files)?;
        let keys = grouper::distinct_keys(&classified);
        let directories = create_directories(destination, &keys)?;
        info!(
            "Prepared {} folders for {} files under {}",
            directories,
            files.len(),
            destination.display()
        );

        let mut report = self.copy_all(source, &classified, destination)?;
        report.directories = directories;
        report.duration_ms = start.elapsed().as_millis() as u64;
        info!("{}", report);
        Ok(report)
    }

    fn copy_all(
        &self,
        source: &dyn MediaSource,
        classified: &[(FileRecord, DateModelKey)],
        destination: &Path,
    ) -> Result<CopyReport> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()
            .map_err(|e| OrganizeError::WorkerPool(e.to_string()))?;

        let total = classified.len();
        let completed = AtomicUsize::new(0);

        let outcomes: Vec<std::result::Result<u64, FailedCopy>> = pool.install(|| {
            classified
                .par_iter()
                .map(|(file, key)| {
                    let target = destination_for(destination, key, &file.name);
                    let outcome = source.copy_to(file, &target);
                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;

                    let outcome = match outcome {
                        Ok(bytes) => {
                            debug!("{} -> {}", file.path.display(), target.display());
                            Ok(bytes)
                        }
                        Err(e) => {
                            warn!("Failed to copy {}: {}", file.path.display(), e);
                            Err(FailedCopy {
                                file: file.clone(),
                                reason: e.to_string(),
                            })
                        }
                    };
                    self.report_progress(CopyProgress {
                        file: file.name.clone(),
                        completed: done,
                        total,
                        bytes: *outcome.as_ref().unwrap_or(&0),
                        succeeded: outcome.is_ok(),
                    });
                    outcome
                })
                .collect()
        });

        let mut report = CopyReport::default();
        for outcome in outcomes {
            match outcome {
                Ok(bytes) => {
                    report.copied += 1;
                    report.bytes += bytes;
                }
                Err(failed) => report.failed.push(failed),
            }
        }
        Ok(report)
    }

    fn report_progress(&self, update: CopyProgress) {
        if let Some(ref callback) = self.progress_callback {
            callback(update);
        }
    }
}

// =============================================================================
// Destination layout
// =============================================================================

/// `destination/date/[model/]name`
pub fn destination_for(destination: &Path, key: &DateModelKey, name: &str) -> PathBuf {
    destination.join(key.relative_dir()).join(name)
}

/// Create the destination root; an existing root is only logged
pub fn ensure_root(destination: &Path) -> Result<()> {
    if destination.is_dir() {
        warn!("Destination {} already exists", destination.display());
        return Ok(());
    }
    fs::create_dir_all(destination)?;
    info!("Created destination {}", destination.display());
    Ok(())
}

/// Ensure `date/` and, when a model is known, `date/model/` for every key.
///
/// Idempotent. Returns the number of distinct folders ensured.
pub fn create_directories(destination: &Path, keys: &HashSet<DateModelKey>) -> Result<usize> {
    let mut ensured: HashSet<PathBuf> = HashSet::new();
    for key in keys {
        let date_dir = destination.join(key.date_folder());
        if ensured.insert(date_dir.clone()) {
            ensure_dir(&date_dir)?;
        }
        if key.model.is_some() {
            let model_dir = destination.join(key.relative_dir());
            if ensured.insert(model_dir.clone()) {
                ensure_dir(&model_dir)?;
            }
        }
    }
    Ok(ensured.len())
}

fn ensure_dir(dir: &Path) -> Result<()> {
    if dir.is_dir() {
        debug!("Folder exists: {}", dir.display());
        return Ok(());
    }
    match fs::create_dir(dir) {
        Ok(()) => {
            debug!("Created folder {}", dir.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists && dir.is_dir() => Ok(()),
        Err(e) => Err(e.into()),
    }
}
