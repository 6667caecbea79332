//! Command handler implementations
//!
//! This module contains the implementation of all CLI commands.

use crate::cli::progress::{
    format_bytes, print_header, print_info, print_success, print_warning, CopyProgressBar,
    ScanSpinner,
};
use crate::cli::{Args, Commands};
use crate::core::config::{get_config_path, Config};
use crate::core::extensions::ExtensionSet;
use crate::core::organizer::{Organizer, RunOutcome};
use crate::core::prompt::{AssumeYes, ContinuePrompt, TerminalPrompt};
use crate::core::report::Summary;
use crate::core::source::{DeviceSource, LocalSource, MediaSource};
use crate::device::{DeviceInfo, DeviceManagerTrait};
use anyhow::{bail, Context, Result};
use dialoguer::theme::ColorfulTheme;
use dialoguer::Select;
use log::{debug, info, warn};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

/// Everything an organize run needs once flags and config are merged
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub destination: PathBuf,
    pub extensions: ExtensionSet,
    pub workers: usize,
    pub assume_yes: bool,
}

/// Dispatch to the selected command; no subcommand means organize
pub fn run_command(args: &Args, config: &Config) -> Result<()> {
    match &args.command {
        Some(Commands::ListDevices) => list_devices(),
        Some(Commands::ShowConfig) => show_config(config),
        Some(Commands::GenerateConfig { output }) => generate_config_file(output.clone()),
        None => organize(args, config),
    }
}

/// Merge the destination flag with the (already overridden) config
pub fn resolve_settings(args: &Args, config: &Config) -> Result<RunSettings> {
    let destination = match &args.destination {
        Some(path) => path.clone(),
        None => bail!("--destination is required to organize files"),
    };

    Ok(RunSettings {
        destination,
        extensions: config.organize.extension_set(),
        workers: config.organize.workers.max(1),
        assume_yes: config.organize.assume_yes || args.assume_yes,
    })
}

/// Organize from `--source`, or from a portable device when it is omitted
pub fn organize(args: &Args, config: &Config) -> Result<()> {
    let settings = resolve_settings(args, config)?;
    let prompt: Box<dyn ContinuePrompt> = if settings.assume_yes {
        Box::new(AssumeYes)
    } else {
        Box::new(TerminalPrompt)
    };

    match &args.source {
        Some(root) => {
            let source = LocalSource::new(root.clone()).excluding(&settings.destination);
            run_organizer(&source, &settings, prompt.as_ref())
        }
        None => organize_from_device(config, &settings, prompt.as_ref()),
    }
}

#[cfg(windows)]
fn organize_from_device(
    config: &Config,
    settings: &RunSettings,
    prompt: &dyn ContinuePrompt,
) -> Result<()> {
    let _com_guard = crate::device::initialize_com()?;
    let manager = crate::device::DeviceManager::new()?;
    organize_from_manager(&manager, config, settings, prompt)
}

#[cfg(not(windows))]
fn organize_from_device(
    _config: &Config,
    _settings: &RunSettings,
    _prompt: &dyn ContinuePrompt,
) -> Result<()> {
    bail!("--source is required; portable devices are only supported on Windows")
}

/// Pick a device from `manager`, open it and organize its configured folder
pub fn organize_from_manager<M: DeviceManagerTrait>(
    manager: &M,
    config: &Config,
    settings: &RunSettings,
    prompt: &dyn ContinuePrompt,
) -> Result<()> {
    let devices = manager.enumerate_devices()?;
    if devices.is_empty() {
        return Err(crate::core::error::OrganizeError::NoDevicesFound.into());
    }

    let device = select_device(&devices, config.device.device_id.as_deref())?;
    info!("Using device: {}", device);

    let content = manager.open_device(&device.device_id)?;
    let base_path = config.device.device_path.clone().unwrap_or_default();
    let source = DeviceSource::new(content, device, base_path);
    run_organizer(&source, settings, prompt)
}

/// Resolve the device to use: by id or name, the only one, or ask
fn select_device(devices: &[DeviceInfo], device_id: Option<&str>) -> Result<DeviceInfo> {
    if let Some(id) = device_id {
        return devices
            .iter()
            .find(|d| d.device_id == id || d.friendly_name.contains(id))
            .cloned()
            .with_context(|| format!("Device '{}' not found", id));
    }

    if let [only] = devices {
        return Ok(only.clone());
    }

    let names: Vec<String> = devices.iter().map(|d| d.to_string()).collect();
    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Select a device")
        .items(&names)
        .default(0)
        .interact_opt()?;

    match selection {
        Some(index) => Ok(devices[index].clone()),
        None => bail!("No device selected"),
    }
}

/// Run one organize pass over `source` and print the outcome
pub fn run_organizer(
    source: &dyn MediaSource,
    settings: &RunSettings,
    prompt: &dyn ContinuePrompt,
) -> Result<()> {
    let mut spinner = Some(ScanSpinner::new(&format!("Scanning {}...", source.describe())));
    let progress = Arc::new(CopyProgressBar::new());
    let bar = Arc::clone(&progress);

    let mut organizer = Organizer::new(source, &settings.destination)
        .extensions(settings.extensions.clone())
        .workers(settings.workers)
        .with_progress(move |p| bar.update(&p));

    let mut on_summary = |summary: &Summary| {
        if let Some(spinner) = spinner.take() {
            let elapsed = spinner.finish();
            debug!("Scan took {:.1}s", elapsed.as_secs_f64());
        }
        println!("{}", summary);
    };

    let outcome = organizer.run(prompt, &mut on_summary);
    if let Some(spinner) = spinner.take() {
        spinner.finish();
    }
    progress.finish();
    let outcome = outcome?;

    match outcome {
        RunOutcome::NothingToCopy { .. } => {
            print_warning(&format!(
                "No files with extensions {} were found",
                settings.extensions
            ));
        }
        RunOutcome::Declined { .. } => {
            print_info("Nothing was copied");
        }
        RunOutcome::Completed { copy, .. } => {
            print_header("Organize Complete");
            print_success(&format!(
                "{} files copied into {} folders ({})",
                copy.copied,
                copy.directories,
                format_bytes(copy.bytes)
            ));
            print_info(&format!("Destination: {}", organizer.destination().display()));
            if !copy.is_success() {
                for failed in &copy.failed {
                    print_warning(&format!("{}: {}", failed.file.path().display(), failed.reason));
                }
                bail!("{} file(s) could not be copied", copy.failed.len());
            }
        }
    }

    Ok(())
}

/// List connected portable devices
#[cfg(windows)]
pub fn list_devices() -> Result<()> {
    let _com_guard = crate::device::initialize_com()?;
    let manager = crate::device::DeviceManager::new()?;
    print_devices(&manager)
}

#[cfg(not(windows))]
pub fn list_devices() -> Result<()> {
    bail!("Portable devices are only supported on Windows")
}

fn print_devices<M: DeviceManagerTrait>(manager: &M) -> Result<()> {
    info!("Scanning for connected devices...");
    let devices = manager.enumerate_devices()?;

    if devices.is_empty() {
        info!("No portable devices found.");
        info!("Make sure the device is connected, unlocked and set to file transfer (MTP).");
        return Ok(());
    }

    info!("Found {} device(s):", devices.len());
    info!("");
    for (i, device) in devices.iter().enumerate() {
        info!("[{}] {}", i + 1, device.friendly_name);
        info!("    Manufacturer: {}", device.manufacturer);
        info!("    Model: {}", device.model);
        info!("    Device ID: {}", device.device_id);
        info!("");
    }
    Ok(())
}

/// Show the effective configuration
pub fn show_config(config: &Config) -> Result<()> {
    match Config::find_config_file() {
        Some(path) => info!("Configuration file: {}", path.display()),
        None => info!("(Using default settings - no config file found)"),
    }
    info!("");
    for line in config.to_toml()?.lines() {
        info!("{}", line);
    }
    Ok(())
}

/// Write the commented example config to `output` or the standard location
pub fn generate_config_file(output: Option<PathBuf>) -> Result<()> {
    let path = match output {
        Some(path) => path,
        None => get_config_path().context("Could not determine the config directory")?,
    };

    if path.exists() {
        warn!("Overwriting existing config file: {}", path.display());
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(&path, Config::generate_default_config())
        .with_context(|| format!("Failed to write {}", path.display()))?;

    info!("Configuration file: {}", path.display());
    info!("Edit this file to change the default extensions, workers and device.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::OrganizeError;
    use crate::device::traits::{DeviceObject, ROOT_OBJECT_ID};
    use crate::testdb::{fixtures, MockDeviceConfig, MockDeviceManager, MockFileSystem};
    use clap::Parser;
    use std::path::Path;
    use tempfile::TempDir;

    fn settings(destination: &Path) -> RunSettings {
        RunSettings {
            destination: destination.to_path_buf(),
            extensions: ExtensionSet::default(),
            workers: 2,
            assume_yes: true,
        }
    }

    fn camera(id: &str, name: &str) -> (DeviceInfo, MockFileSystem) {
        let mut storage = MockFileSystem::new();
        storage.add_folder("S1", ROOT_OBJECT_ID, "Card");
        storage.add_folder("D1", "S1", "DCIM");
        storage.add_file(
            DeviceObject::file("F1", "D1", "IMG_0001.JPG", 0).with_modified("2019/07/04:12:00:00"),
            fixtures::jpeg_with_exif(Some("EOS M50"), Some("2019:07:04 12:00:00")),
        );
        storage.add_file(
            DeviceObject::file("F2", "D1", "notes.txt", 0),
            b"not a photo".to_vec(),
        );
        (DeviceInfo::new(id, name, "Canon", name), storage)
    }

    #[test]
    fn test_resolve_settings_requires_destination() {
        let args = Args::try_parse_from(["media-organizer", "-s", "/photos"]).unwrap();
        assert!(resolve_settings(&args, &Config::default()).is_err());
    }

    #[test]
    fn test_resolve_settings_uses_config() {
        let args = Args::try_parse_from(["media-organizer", "-d", "/sorted", "-y"]).unwrap();
        let mut config = Config::default();
        config.organize.workers = 0;
        config.organize.extensions = vec!["heic".to_string()];

        let settings = resolve_settings(&args, &config).unwrap();
        assert_eq!(settings.destination, PathBuf::from("/sorted"));
        assert_eq!(settings.workers, 1);
        assert!(settings.assume_yes);
        assert!(settings.extensions.matches("IMG_1.HEIC"));
    }

    #[test]
    fn test_run_organizer_local() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let dest = out.path().join("sorted");
        fixtures::write_file(
            &src.path().join("trip/a.jpg"),
            &fixtures::jpeg_with_exif(Some("Canon 60D"), Some("2021:01:01 10:00:00")),
        )
        .unwrap();

        let source = LocalSource::new(src.path());
        run_organizer(&source, &settings(&dest), &AssumeYes).unwrap();
        assert!(dest.join("2021-01-01/canon60d/a.jpg").is_file());
    }

    #[test]
    fn test_run_organizer_reports_copy_failures() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let dest = out.path().join("sorted");
        let photo = src.path().join("a.jpg");
        fixtures::write_file(
            &photo,
            &fixtures::jpeg_with_exif(Some("Canon 60D"), Some("2021:01:01 10:00:00")),
        )
        .unwrap();
        // A directory squatting on the target name makes the copy fail
        fs::create_dir_all(dest.join("2021-01-01/canon60d/a.jpg")).unwrap();

        let source = LocalSource::new(src.path());
        let err = run_organizer(&source, &settings(&dest), &AssumeYes).unwrap_err();
        assert!(err.to_string().contains("could not be copied"));
    }

    #[test]
    fn test_organize_again_into_destination_inside_source() {
        let src = TempDir::new().unwrap();
        let photo = src.path().join("a.jpg");
        let bytes = fixtures::jpeg_with_exif(Some("Canon 60D"), Some("2021:01:01 10:00:00"));
        fixtures::write_file(&photo, &bytes).unwrap();
        let dest = src.path().join("sorted");

        let args = Args::try_parse_from([
            "media-organizer",
            "-s",
            src.path().to_str().unwrap(),
            "-d",
            dest.to_str().unwrap(),
            "-y",
        ])
        .unwrap();
        organize(&args, &Config::default()).unwrap();
        let organized = dest.join("2021-01-01/canon60d/a.jpg");
        assert_eq!(fs::read(&organized).unwrap(), bytes);

        // the second run must not list the organized copy again
        fs::remove_file(&photo).unwrap();
        organize(&args, &Config::default()).unwrap();
        assert_eq!(fs::read(&organized).unwrap(), bytes);
    }

    #[test]
    fn test_organize_from_manager_single_device() {
        let mut manager = MockDeviceManager::new();
        let (info, storage) = camera("usb#m50", "EOS M50");
        manager.add_device(info, storage);

        let out = TempDir::new().unwrap();
        let dest = out.path().join("sorted");
        let mut config = Config::default();
        config.device.device_path = Some("Card/DCIM".to_string());

        organize_from_manager(&manager, &config, &settings(&dest), &AssumeYes).unwrap();
        assert!(dest.join("2019-07-04/eosm50/IMG_0001.JPG").is_file());
        assert!(!dest.join("2019-07-04/eosm50/notes.txt").exists());
    }

    #[test]
    fn test_organize_from_manager_by_device_id() {
        let mut manager = MockDeviceManager::new();
        let (first, first_storage) = camera("usb#a", "Camera A");
        let (second, second_storage) = camera("usb#b", "Camera B");
        manager.add_device(first, first_storage);
        manager.add_device(second, second_storage);

        let out = TempDir::new().unwrap();
        let dest = out.path().join("sorted");
        let mut config = Config::default();
        config.device.device_id = Some("Camera B".to_string());

        organize_from_manager(&manager, &config, &settings(&dest), &AssumeYes).unwrap();
        assert!(dest.join("2019-07-04/eosm50/IMG_0001.JPG").is_file());
    }

    #[test]
    fn test_organize_from_manager_no_devices() {
        let manager = MockDeviceManager::new();
        let out = TempDir::new().unwrap();
        let err = organize_from_manager(
            &manager,
            &Config::default(),
            &settings(&out.path().join("sorted")),
            &AssumeYes,
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<OrganizeError>(),
            Some(OrganizeError::NoDevicesFound)
        ));
    }

    #[test]
    fn test_organize_from_manager_locked_device() {
        let mut manager = MockDeviceManager::new();
        let (info, mut storage) = camera("usb#m50", "EOS M50");
        storage.set_config(MockDeviceConfig {
            simulate_locked: true,
            ..Default::default()
        });
        manager.add_device(info, storage);

        let out = TempDir::new().unwrap();
        let err = organize_from_manager(
            &manager,
            &Config::default(),
            &settings(&out.path().join("sorted")),
            &AssumeYes,
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<OrganizeError>(),
            Some(OrganizeError::AccessDenied)
        ));
    }

    #[test]
    fn test_select_device_unknown_id() {
        let devices = vec![DeviceInfo::new("usb#a", "Camera A", "Canon", "A")];
        assert!(select_device(&devices, Some("Phone")).is_err());
        assert_eq!(
            select_device(&devices, None).unwrap().device_id,
            "usb#a"
        );
    }

    #[test]
    fn test_print_devices_empty_is_ok() {
        assert!(print_devices(&MockDeviceManager::new()).is_ok());
    }

    #[test]
    fn test_generate_config_file_writes_example() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("conf/media.toml");
        generate_config_file(Some(path.clone())).unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config, Config::default());
    }
}
