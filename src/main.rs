//! Media Organizer - CLI Entry Point
//!
//! Copies photos and videos into `DESTINATION/YYYY-MM-DD/[model/]` folders
//! using the capture date and camera model found in each file.
//!
//! This binary is a thin wrapper around the library, handling argument parsing,
//! logging setup, and command dispatch.

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Builder;
use log::{debug, info, LevelFilter};
use media_organizer::cli::{self, Args, DualWriter};
use media_organizer::core::config::Config;
use std::fs::OpenOptions;
use std::io::Write;

fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = match args.config {
        Some(ref config_path) => Config::load(config_path).unwrap_or_else(|e| {
            eprintln!("Warning: Failed to load config file: {}", e);
            Config::default()
        }),
        None => Config::load_default().unwrap_or_else(|e| {
            eprintln!("Warning: {}", e);
            Config::default()
        }),
    };

    // Apply CLI overrides to config
    if let Some(ref extensions) = args.extensions {
        config.organize.extensions = extensions
            .split(',')
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .collect();
    }
    if let Some(workers) = args.workers {
        config.organize.workers = workers;
    }
    if args.assume_yes {
        config.organize.assume_yes = true;
    }
    if let Some(ref device_id) = args.device_id {
        config.device.device_id = Some(device_id.clone());
    }
    if let Some(ref device_path) = args.device_path {
        config.device.device_path = Some(device_path.clone());
    }
    if let Some(ref level) = args.log_level {
        config.logging.level = level.clone();
    }
    if args.debug {
        config.logging.level = "debug".to_string();
    }

    init_logging(&config)?;

    debug!("{} v{}", media_organizer::NAME, media_organizer::VERSION);
    cli::run_command(&args, &config)
}

fn init_logging(config: &Config) -> Result<()> {
    let log_level = match config.logging.level.to_lowercase().as_str() {
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    };
    let verbose = log_level >= LevelFilter::Debug;

    if config.logging.log_to_file {
        let log_file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.logging.log_file)
            .with_context(|| {
                format!("Failed to open log file {}", config.logging.log_file.display())
            })?;

        Builder::new()
            .filter_level(log_level)
            .format(|buf, record| {
                writeln!(
                    buf,
                    "[{} {} {}] {}",
                    chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                    record.level(),
                    record.target(),
                    record.args()
                )
            })
            .target(env_logger::Target::Pipe(Box::new(DualWriter {
                console: std::io::stderr(),
                file: log_file,
            })))
            .init();

        info!("Logging to file: {}", config.logging.log_file.display());
    } else if verbose {
        Builder::new()
            .filter_level(log_level)
            .format(|buf, record| writeln!(buf, "{}\t : {}", record.level(), record.args()))
            .init();
    } else {
        Builder::new()
            .filter_level(log_level)
            .format(|buf, record| writeln!(buf, "{}", record.args()))
            .init();
    }

    Ok(())
}
