//! Command-line argument definitions
//!
//! This module defines all CLI arguments and subcommands using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Sort photos and videos into a date/camera-model folder tree
#[derive(Parser, Debug)]
#[command(name = "media-organizer")]
#[command(author = "Vihaan Reddy M")]
#[command(version = "1.0.0")]
#[command(
    about = "Copy photos and videos into DESTINATION/YYYY-MM-DD/[model/] folders using their capture date",
    long_about = None
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Source folder to organize (omit to pick a portable device on Windows)
    #[arg(short, long)]
    pub source: Option<PathBuf>,

    /// Destination root for the date folders
    #[arg(short, long)]
    pub destination: Option<PathBuf>,

    /// Comma-separated extensions to organize, e.g. "jpg, png, mp4"
    #[arg(short, long)]
    pub extensions: Option<String>,

    /// Number of parallel copy workers (overrides config)
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Continue without asking when the destination already exists
    #[arg(short = 'y', long = "yes")]
    pub assume_yes: bool,

    /// Device ID to organize from (overrides config)
    #[arg(long)]
    pub device_id: Option<String>,

    /// Folder inside the device, e.g. "Internal Storage/DCIM" (overrides config)
    #[arg(long)]
    pub device_path: Option<String>,

    /// Verbose output (same as --log-level debug)
    #[arg(long)]
    pub debug: bool,

    /// Log level: error, warn, info, debug, trace (overrides config)
    #[arg(short, long)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List connected portable devices
    ListDevices,

    /// Show current configuration
    ShowConfig,

    /// Generate a configuration file at a specific location
    GenerateConfig {
        /// Output path for the config file (defaults to standard location)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}
