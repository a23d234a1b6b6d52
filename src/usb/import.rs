//! Copying new ROMs from a mounted USB drive
//!
//! Duplicates are decided against the ROM directory on disk, never against
//! the UI's in-memory library, so the worker shares no state with the UI.

use crate::config::{Config, UsbConfig};
use crate::error::{GalleryError, Result};
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// Result of one import run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub mount_point: PathBuf,
    /// ROMs on the drive that were not yet in the ROM directory
    pub found: usize,
    /// Names copied into the ROM directory
    pub copied: Vec<String>,
    /// Names that failed to copy, with the reason
    pub failed: Vec<(String, String)>,
    pub unmounted: bool,
}

impl ImportReport {
    pub fn copied_count(&self) -> usize {
        self.copied.len()
    }

    /// Message shown once the import is over. Copy failures only reach the log.
    pub fn summary(&self) -> String {
        if self.found == 0 {
            "No new games were found on the USB drive.".to_string()
        } else {
            format!(
                "Copied {} new game(s) from the USB drive. You can now safely remove it.",
                self.copied_count()
            )
        }
    }
}

/// ROM files at the top of `mount_point` that are not yet in the ROM directory
pub fn find_new_roms(mount_point: &Path, config: &Config) -> Result<Vec<String>> {
    let entries = fs::read_dir(mount_point).map_err(|e| GalleryError::io(mount_point, e))?;

    let mut names: Vec<String> = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter_map(|e| e.file_name().into_string().ok())
        .filter(|name| config.is_rom_name(name))
        .filter(|name| !config.rom_path(name).exists())
        .collect();
    names.sort();
    Ok(names)
}

/// Copy one file, keeping its modification time
pub fn copy_rom(source: &Path, destination: &Path) -> std::io::Result<()> {
    fs::copy(source, destination)?;
    let modified = fs::metadata(source)?.modified()?;
    File::options()
        .write(true)
        .open(destination)?
        .set_modified(modified)?;
    Ok(())
}

/// Copy each name from `mount_point` into the ROM directory.
/// Failures are logged and skipped.
pub fn copy_roms(mount_point: &Path, names: &[String], roms_dir: &Path) -> ImportReport {
    let mut report = ImportReport {
        mount_point: mount_point.to_path_buf(),
        found: names.len(),
        ..ImportReport::default()
    };

    for name in names {
        let source = mount_point.join(name);
        let destination = roms_dir.join(name);
        match copy_rom(&source, &destination) {
            Ok(()) => {
                log::info!("Copied {} to {}", name, roms_dir.display());
                report.copied.push(name.clone());
            }
            Err(e) => {
                log::error!("Failed to copy {}: {}", name, e);
                report.failed.push((name.clone(), e.to_string()));
            }
        }
    }

    report
}

/// Parse `lsblk -o MOUNTPOINT -nr` output: first non-empty line, `\xHH` unescaped
pub fn parse_mount_point(output: &str) -> Option<PathBuf> {
    output
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(|line| PathBuf::from(unescape_lsblk(line)))
}

fn unescape_lsblk(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 3 < bytes.len() && bytes[i + 1] == b'x' {
            let hex = std::str::from_utf8(&bytes[i + 2..i + 4]).ok();
            if let Some(byte) = hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                out.push(byte);
                i += 4;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Ask the system where a device is mounted. `None` when unmounted or on error.
pub fn resolve_mount_point(usb: &UsbConfig, devnode: &Path) -> Option<PathBuf> {
    let vars = [("device", devnode)];
    let command_line = usb.mount_query.display(&vars);
    match usb.mount_query.command(&vars).output() {
        Ok(output) if output.status.success() => {
            let mount = parse_mount_point(&String::from_utf8_lossy(&output.stdout));
            if mount.is_none() {
                log::info!("{} is not mounted", devnode.display());
            }
            mount
        }
        Ok(output) => {
            log::warn!("`{}` exited with {}", command_line, output.status);
            None
        }
        Err(e) => {
            log::warn!("Failed to run `{}`: {}", command_line, e);
            None
        }
    }
}

pub fn unmount(usb: &UsbConfig, mount_point: &Path) -> Result<()> {
    let vars = [("mount", mount_point)];
    let command = usb.unmount.display(&vars);
    log::info!("Unmounting: {}", command);
    let status = usb
        .unmount
        .command(&vars)
        .status()
        .map_err(|source| GalleryError::Spawn {
            program: usb.unmount.program.clone(),
            source,
        })?;
    if status.success() {
        Ok(())
    } else {
        Err(GalleryError::CommandFailed { command, status })
    }
}
