//! Run orchestration
//!
//! Drives one organize run through its states:
//!
//! ```text
//! Idle -> Validating -> Enumerating -> Reporting -> ConfirmIfDestinationExists -> Copying -> Done
//! ```
//!
//! `Reporting` goes straight to `Done` when nothing matched. `Aborted` is
//! reached when the source is invalid, the destination exists but is not a
//! folder, or the user declines to write into an existing destination; a
//! declined run has touched nothing on disk.

use crate::core::copier::{CopyEngine, CopyProgress, CopyReport, DEFAULT_WORKERS};
use crate::core::enumerator;
use crate::core::error::{OrganizeError, Result};
use crate::core::extensions::ExtensionSet;
use crate::core::prompt::ContinuePrompt;
use crate::core::record::RunResult;
use crate::core::report::{self, Summary};
use crate::core::source::MediaSource;
use log::{debug, error, info};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// States of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Validating,
    Enumerating,
    Reporting,
    ConfirmIfDestinationExists,
    Copying,
    Done,
    Aborted,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Idle => "idle",
            RunState::Validating => "validating",
            RunState::Enumerating => "enumerating",
            RunState::Reporting => "reporting",
            RunState::ConfirmIfDestinationExists => "confirming",
            RunState::Copying => "copying",
            RunState::Done => "done",
            RunState::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// How a run that did not fail ended
#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// Files were copied (some may have failed, see the report)
    Completed { summary: Summary, copy: CopyReport },
    /// No file matched the extension filter
    NothingToCopy { summary: Summary },
    /// The user chose not to write into the existing destination
    Declined { summary: Summary },
}

impl RunOutcome {
    pub fn summary(&self) -> &Summary {
        match self {
            RunOutcome::Completed { summary, .. }
            | RunOutcome::NothingToCopy { summary }
            | RunOutcome::Declined { summary } => summary,
        }
    }
}

/// Sequences validation, enumeration, reporting, confirmation and copying
pub struct Organizer<'a> {
    source: &'a dyn MediaSource,
    destination: PathBuf,
    extensions: ExtensionSet,
    workers: usize,
    progress_callback: Option<Arc<dyn Fn(CopyProgress) + Send + Sync>>,
    state: RunState,
    result: RunResult,
}

impl<'a> Organizer<'a> {
    pub fn new(source: &'a dyn MediaSource, destination: impl Into<PathBuf>) -> Self {
        Self {
            source,
            destination: destination.into(),
            extensions: ExtensionSet::default(),
            workers: DEFAULT_WORKERS,
            progress_callback: None,
            state: RunState::Idle,
            result: RunResult::default(),
        }
    }

    pub fn extensions(mut self, extensions: ExtensionSet) -> Self {
        self.extensions = extensions;
        self
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Set progress callback for the copy phase
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(CopyProgress) + Send + Sync + 'static,
    {
        self.progress_callback = Some(Arc::new(callback));
        self
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Files discovered by the last run
    pub fn result(&self) -> &RunResult {
        &self.result
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// The destination may be missing but must not be something other than a folder
    fn validate_destination(&self) -> Result<()> {
        if self.destination.exists() && !self.destination.is_dir() {
            return Err(OrganizeError::Config(format!(
                "destination {} is not a directory",
                self.destination.display()
            )));
        }
        Ok(())
    }

    fn transition(&mut self, next: RunState) {
        debug!("Run state: {} -> {}", self.state, next);
        self.state = next;
    }

    /// Execute the run. `on_summary` sees the pre-copy summary before any
    /// confirmation is asked.
    pub fn run(
        &mut self,
        prompt: &dyn ContinuePrompt,
        on_summary: &mut dyn FnMut(&Summary),
    ) -> Result<RunOutcome> {
        self.transition(RunState::Validating);
        if let Err(e) = self.source.validate().and_then(|_| self.validate_destination()) {
            error!("{}", e);
            self.transition(RunState::Aborted);
            return Err(e);
        }

        self.transition(RunState::Enumerating);
        info!("Scanning {} for {}", self.source.describe(), self.extensions);
        self.result = match enumerator::scan(self.source, &self.extensions) {
            Ok(result) => result,
            Err(e) => {
                error!("{}", e);
                self.transition(RunState::Aborted);
                return Err(e);
            }
        };

        self.transition(RunState::Reporting);
        let summary = report::summarize(&self.result.all, &self.result.selected, &self.result.missing);
        report::log_summary(&summary, &self.result.missing);
        on_summary(&summary);

        if summary.nothing_to_copy() {
            info!("No files matched {}; nothing to copy", self.extensions);
            self.transition(RunState::Done);
            return Ok(RunOutcome::NothingToCopy { summary });
        }

        self.transition(RunState::ConfirmIfDestinationExists);
        if self.destination.exists() && !prompt.confirm_existing(&self.destination)? {
            info!("Declined to continue into {}", self.destination.display());
            self.transition(RunState::Aborted);
            return Ok(RunOutcome::Declined { summary });
        }

        self.transition(RunState::Copying);
        let mut engine = CopyEngine::new().workers(self.workers);
        if let Some(callback) = self.progress_callback.clone() {
            engine = engine.with_progress(move |p| callback(p));
        }
        let copy = match engine.process(self.source, &self.result.selected, &self.destination) {
            Ok(copy) => copy,
            Err(e) => {
                error!("{}", e);
                self.transition(RunState::Aborted);
                return Err(e);
            }
        };
        report::log_copy_report(&copy);

        self.transition(RunState::Done);
        Ok(RunOutcome::Completed { summary, copy })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::prompt::AssumeYes;
    use crate::core::source::{DeviceSource, LocalSource};
    use crate::device::traits::{DeviceInfo, DeviceObject, ROOT_OBJECT_ID};
    use crate::testdb::{fixtures, MockDeviceConfig, MockFileSystem};
    use std::cell::Cell;
    use std::fs;
    use tempfile::TempDir;
    use walkdir::WalkDir;

    /// a.jpg (EXIF Canon 60D, 2021-01-01), b.txt, c.png (mtime 2022-06-15)
    fn scenario_source() -> TempDir {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.jpg");
        fixtures::write_file(
            &a,
            &fixtures::jpeg_with_exif(Some("Canon 60D"), Some("2021:01:01 10:00:00")),
        )
        .unwrap();
        fixtures::write_file(&dir.path().join("b.txt"), b"notes").unwrap();
        let c = dir.path().join("c.png");
        fixtures::write_file(&c, b"no metadata here").unwrap();
        fixtures::set_mtime(&c, 2022, 6, 15).unwrap();
        dir
    }

    fn tree(root: &Path) -> Vec<String> {
        let mut entries: Vec<String> = WalkDir::new(root)
            .min_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .map(|e| {
                e.path()
                    .strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect();
        entries.sort();
        entries
    }

    #[test]
    fn test_scenario_layout() {
        let src = scenario_source();
        let out = TempDir::new().unwrap();
        let dest = out.path().join("dest");

        let source = LocalSource::new(src.path());
        let mut organizer = Organizer::new(&source, &dest);
        let outcome = organizer.run(&AssumeYes, &mut |_| {}).unwrap();

        let names = |files: &[crate::core::record::FileRecord]| {
            files.iter().map(|f| f.name.clone()).collect::<Vec<_>>()
        };
        assert_eq!(names(&organizer.result().all), vec!["a.jpg", "b.txt", "c.png"]);
        assert_eq!(names(&organizer.result().selected), vec!["a.jpg", "c.png"]);
        assert_eq!(names(&organizer.result().missing), vec!["b.txt"]);

        assert_eq!(
            tree(&dest),
            vec![
                "2021-01-01",
                "2021-01-01/canon60d",
                "2021-01-01/canon60d/a.jpg",
                "2022-06-15",
                "2022-06-15/c.png",
            ]
        );
        assert_eq!(
            fs::read(dest.join("2022-06-15/c.png")).unwrap(),
            b"no metadata here"
        );
        assert!(matches!(outcome, RunOutcome::Completed { ref copy, .. } if copy.copied == 2));
        assert_eq!(organizer.state(), RunState::Done);
    }

    #[test]
    fn test_declined_existing_destination_touches_nothing() {
        let src = scenario_source();
        let dest = TempDir::new().unwrap();

        let source = LocalSource::new(src.path());
        let mut organizer = Organizer::new(&source, dest.path());
        let asked = Cell::new(0);
        let decline = |_: &Path| {
            asked.set(asked.get() + 1);
            false
        };
        let outcome = organizer.run(&decline, &mut |_| {}).unwrap();

        assert!(matches!(outcome, RunOutcome::Declined { .. }));
        assert_eq!(asked.get(), 1);
        assert_eq!(organizer.state(), RunState::Aborted);
        assert!(tree(dest.path()).is_empty());
    }

    #[test]
    fn test_no_matches_skips_copy() {
        let src = TempDir::new().unwrap();
        fixtures::write_file(&src.path().join("readme.txt"), b"x").unwrap();
        fixtures::write_file(&src.path().join("data.csv"), b"y").unwrap();
        let out = TempDir::new().unwrap();
        let dest = out.path().join("dest");

        let source = LocalSource::new(src.path());
        let mut organizer = Organizer::new(&source, &dest);
        let mut reported = None;
        let never = |_: &Path| -> bool { panic!("prompt must not be asked") };
        let outcome = organizer
            .run(&never, &mut |s| reported = Some(s.clone()))
            .unwrap();

        let summary = reported.unwrap();
        assert_eq!(summary.processed, 0);
        assert_eq!(summary.total, 2);
        assert!(matches!(outcome, RunOutcome::NothingToCopy { .. }));
        assert_eq!(organizer.state(), RunState::Done);
        assert!(!dest.exists());
    }

    #[test]
    fn test_invalid_source_aborts() {
        let out = TempDir::new().unwrap();
        let source = LocalSource::new(out.path().join("missing"));
        let mut organizer = Organizer::new(&source, out.path().join("dest"));

        let err = organizer.run(&AssumeYes, &mut |_| {}).unwrap_err();
        assert!(matches!(err, OrganizeError::InvalidSource { .. }));
        assert_eq!(organizer.state(), RunState::Aborted);
        assert!(!out.path().join("dest").exists());
    }

    #[test]
    fn test_destination_that_is_a_file_aborts() {
        let src = scenario_source();
        let out = TempDir::new().unwrap();
        let dest = out.path().join("dest");
        fs::write(&dest, b"not a folder").unwrap();

        let source = LocalSource::new(src.path());
        let mut organizer = Organizer::new(&source, &dest);
        let never = |_: &Path| -> bool { panic!("prompt must not be asked") };
        let err = organizer.run(&never, &mut |_| {}).unwrap_err();

        assert!(matches!(err, OrganizeError::Config(_)));
        assert_eq!(organizer.state(), RunState::Aborted);
        assert_eq!(fs::read(&dest).unwrap(), b"not a folder");
    }

    #[test]
    fn test_rerun_into_nested_destination_keeps_organized_files() {
        let src = TempDir::new().unwrap();
        let photo = src.path().join("a.jpg");
        let bytes = fixtures::jpeg_with_exif(Some("Canon 60D"), Some("2021:01:01 10:00:00"));
        fixtures::write_file(&photo, &bytes).unwrap();
        let dest = src.path().join("sorted");
        let organized = dest.join("2021-01-01/canon60d/a.jpg");

        let source = LocalSource::new(src.path());
        Organizer::new(&source, &dest).run(&AssumeYes, &mut |_| {}).unwrap();
        assert_eq!(fs::read(&organized).unwrap(), bytes);

        // without exclusion the organized copy is listed and maps onto itself
        fs::remove_file(&photo).unwrap();
        let outcome = Organizer::new(&source, &dest)
            .run(&AssumeYes, &mut |_| {})
            .unwrap();

        let copy = match outcome {
            RunOutcome::Completed { copy, .. } => copy,
            other => panic!("unexpected outcome {:?}", other),
        };
        assert_eq!(copy.copied, 0);
        assert_eq!(copy.failed.len(), 1);
        assert_eq!(fs::read(&organized).unwrap(), bytes);
    }

    #[test]
    fn test_device_short_transfer_is_reported() {
        let device = stylus_storage(MockDeviceConfig {
            short_read_objects: vec!["P1".to_string()],
            ..Default::default()
        });
        let out = TempDir::new().unwrap();
        let dest = out.path().join("dest");
        let mut organizer = Organizer::new(&device, &dest);
        let outcome = organizer.run(&AssumeYes, &mut |_| {}).unwrap();

        let copy = match outcome {
            RunOutcome::Completed { copy, .. } => copy,
            other => panic!("unexpected outcome {:?}", other),
        };
        assert_eq!(copy.copied, 1);
        assert_eq!(copy.failed.len(), 1);
        assert_eq!(copy.failed[0].file.name, "P3010001.JPG");
        assert!(!dest.join("2015-03-01/stylus1/P3010001.JPG").exists());
    }

    #[test]
    fn test_custom_extensions() {
        let src = scenario_source();
        let out = TempDir::new().unwrap();
        let dest = out.path().join("dest");

        let source = LocalSource::new(src.path());
        let mut organizer = Organizer::new(&source, &dest).extensions(ExtensionSet::parse("PNG"));
        organizer.run(&AssumeYes, &mut |_| {}).unwrap();

        assert_eq!(tree(&dest), vec!["2022-06-15", "2022-06-15/c.png"]);
        assert_eq!(organizer.result().missing.len(), 2);
    }

    fn stylus_storage(config: MockDeviceConfig) -> DeviceSource<MockFileSystem> {
        let mut storage = MockFileSystem::with_config(config);
        storage.add_folder("D1", ROOT_OBJECT_ID, "DCIM");
        storage.add_file(
            DeviceObject::file("P1", "D1", "P3010001.JPG", 0).with_modified("2015/03/01:10:00:00.000"),
            fixtures::jpeg_with_exif(Some("Stylus 1"), None),
        );
        storage.add_file(
            DeviceObject::file("P2", "D1", "P3010002.JPG", 0).with_modified("2015/03/01:11:00:00.000"),
            fixtures::plain_jpeg(2),
        );
        DeviceSource::new(
            storage,
            DeviceInfo::new("usb#stylus", "Stylus1", "OLYMPUS", "Stylus1"),
            "DCIM",
        )
    }

    #[test]
    fn test_device_source_end_to_end() {
        let device = stylus_storage(MockDeviceConfig::default());
        let out = TempDir::new().unwrap();
        let dest = out.path().join("dest");
        let mut organizer = Organizer::new(&device, &dest).workers(2);
        let outcome = organizer.run(&AssumeYes, &mut |_| {}).unwrap();

        assert!(matches!(outcome, RunOutcome::Completed { ref copy, .. } if copy.is_success()));
        assert!(dest.join("2015-03-01/stylus1/P3010001.JPG").is_file());
        assert!(dest.join("2015-03-01/P3010002.JPG").is_file());
    }

    #[test]
    fn test_device_read_failure_is_reported_not_fatal() {
        let device = stylus_storage(MockDeviceConfig {
            read_error_objects: vec!["P2".to_string()],
            ..Default::default()
        });
        let out = TempDir::new().unwrap();
        let dest = out.path().join("dest");
        let mut organizer = Organizer::new(&device, &dest);
        let outcome = organizer.run(&AssumeYes, &mut |_| {}).unwrap();

        let copy = match outcome {
            RunOutcome::Completed { copy, .. } => copy,
            other => panic!("unexpected outcome {:?}", other),
        };
        assert_eq!(copy.copied, 1);
        assert_eq!(copy.failed.len(), 1);
        assert_eq!(copy.failed[0].file.name, "P3010002.JPG");
        // the unreadable file was still classified by its device date
        assert!(dest.join("2015-03-01").is_dir());
        assert!(!dest.join("2015-03-01/P3010002.JPG").exists());
    }
}
