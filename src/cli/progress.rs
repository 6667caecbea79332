//! Progress bar utilities for CLI output
//!
//! Key features:
//! - Progress bars that suspend cleanly when logging
//! - Consistent visual styling across all operations

use crate::core::copier::CopyProgress;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

// ============================================================================
// Styles
// ============================================================================

fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars("⣾⣽⣻⢿⡿⣟⣯⣷")
}

fn copy_bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("  {spinner:.green} [{bar:40.cyan/dim}] {pos}/{len} ({percent}%) {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("━━╾─")
}

fn completed_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("  ✓ [{bar:40.green/dim}] {pos}/{len} ({percent}%) {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("━━━")
}

// ============================================================================
// Console output helpers
// ============================================================================

/// Print a header section with a box
pub fn print_header(title: &str) {
    let width = 60;
    println!();
    println!("╔{}╗", "═".repeat(width - 2));
    println!("║{:^w$}║", title, w = width - 2);
    println!("╚{}╝", "═".repeat(width - 2));
    println!();
}

pub fn print_success(msg: &str) {
    println!("  ✓ {}", msg);
}

pub fn print_info(msg: &str) {
    println!("  • {}", msg);
}

pub fn print_warning(msg: &str) {
    println!("  ⚠ {}", msg);
}

// ============================================================================
// Scan spinner
// ============================================================================

/// Spinner shown while a source is walked; device listings can take minutes
pub struct ScanSpinner {
    spinner: ProgressBar,
    start_time: Instant,
}

impl ScanSpinner {
    pub fn new(message: &str) -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(spinner_style());
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner.set_message(message.to_string());
        Self {
            spinner,
            start_time: Instant::now(),
        }
    }

    /// Stop and clear the spinner, returning the time it ran
    pub fn finish(self) -> Duration {
        self.spinner.finish_and_clear();
        self.start_time.elapsed()
    }
}

// ============================================================================
// Copy progress bar
// ============================================================================

/// Progress bar fed from the copy engine's per-file callback
///
/// The bar stays hidden until the first event, which also carries its length,
/// so it can be created before the number of selected files is known.
pub struct CopyProgressBar {
    bar: ProgressBar,
    started: AtomicBool,
    start_time: Instant,
    bytes: AtomicU64,
    failed: AtomicUsize,
}

impl CopyProgressBar {
    pub fn new() -> Self {
        let bar = ProgressBar::with_draw_target(Some(0), ProgressDrawTarget::hidden());
        bar.set_style(copy_bar_style());
        Self {
            bar,
            started: AtomicBool::new(false),
            start_time: Instant::now(),
            bytes: AtomicU64::new(0),
            failed: AtomicUsize::new(0),
        }
    }

    /// Record one finished file
    pub fn update(&self, progress: &CopyProgress) {
        if !self.started.swap(true, Ordering::SeqCst) {
            self.bar.set_draw_target(ProgressDrawTarget::stderr());
            self.bar.enable_steady_tick(Duration::from_millis(100));
        }
        if self.bar.length() != Some(progress.total as u64) {
            self.bar.set_length(progress.total as u64);
        }

        let bytes = self.bytes.fetch_add(progress.bytes, Ordering::Relaxed) + progress.bytes;
        if !progress.succeeded {
            self.failed.fetch_add(1, Ordering::Relaxed);
            self.log_warning(&format!("Failed: {}", progress.file));
        }
        self.bar.set_position(progress.completed as u64);

        let elapsed = self.start_time.elapsed().as_secs_f64();
        let rate = if elapsed > 0.0 {
            bytes as f64 / elapsed / 1024.0 / 1024.0
        } else {
            0.0
        };
        self.bar.set_message(format!("{:.1} MB/s", rate));
    }

    /// Log a warning while suspending the progress display
    pub fn log_warning(&self, msg: &str) {
        self.bar.suspend(|| {
            println!("  ⚠ {}", msg);
        });
    }

    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::Relaxed)
    }

    /// Finish the progress display; a bar that never started is just cleared
    pub fn finish(&self) {
        if !self.started.load(Ordering::SeqCst) {
            self.bar.finish_and_clear();
            return;
        }
        self.bar.set_style(completed_style());
        self.bar.finish_with_message(format!(
            "Complete ({} in {})",
            format_bytes(self.bytes.load(Ordering::Relaxed)),
            format_duration(self.start_time.elapsed())
        ));
    }
}

impl Default for CopyProgressBar {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Utility functions
// ============================================================================

/// Format bytes as human-readable string
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    match bytes {
        b if b >= GB => format!("{:.2} GB", b as f64 / GB as f64),
        b if b >= MB => format!("{:.2} MB", b as f64 / MB as f64),
        b if b >= KB => format!("{:.1} KB", b as f64 / KB as f64),
        b => format!("{} bytes", b),
    }
}

/// Format duration as human-readable string
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 3600 {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    } else if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{:.1}s", duration.as_secs_f64())
    }
}

// ============================================================================
// Dual writer for file + console logging
// ============================================================================

/// Writes log records to stderr and a log file at once
pub struct DualWriter {
    pub console: std::io::Stderr,
    pub file: std::fs::File,
}

impl Write for DualWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let _ = self.console.write(buf);
        self.file.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        let _ = self.console.flush();
        self.file.flush()
    }
}
