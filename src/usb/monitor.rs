//! USB disk detection through sysfs
//!
//! `/sys/block/<disk>` is a symlink into `/sys/devices`; a disk behind a USB
//! host controller resolves to a path with a `usbN` bus component. New disks
//! are found by diffing the directory listing between polls.

use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// A whole-disk block device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockDevice {
    pub name: String,
    pub devnode: PathBuf,
}

impl BlockDevice {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            devnode: Path::new("/dev").join(name),
        }
    }
}

/// Reports USB disks that appeared since the previous poll
pub struct UsbDiskScanner {
    sys_block: PathBuf,
    known: HashSet<String>,
}

impl UsbDiskScanner {
    /// Create a scanner; disks already present are treated as known
    pub fn new(sys_block: impl Into<PathBuf>) -> Self {
        let sys_block = sys_block.into();
        let known = list_disks(&sys_block);
        log::debug!("{} block device(s) present at startup", known.len());
        Self { sys_block, known }
    }

    pub fn poll(&mut self) -> Vec<BlockDevice> {
        let current = list_disks(&self.sys_block);

        let mut inserted: Vec<BlockDevice> = current
            .difference(&self.known)
            .filter(|name| is_usb_disk(&self.sys_block, name))
            .map(|name| BlockDevice::new(name))
            .collect();
        inserted.sort_by(|a, b| a.name.cmp(&b.name));

        for device in &inserted {
            log::info!("USB disk inserted: {}", device.devnode.display());
        }
        for removed in self.known.difference(&current) {
            log::debug!("Block device removed: {}", removed);
        }

        self.known = current;
        inserted
    }
}

fn list_disks(sys_block: &Path) -> HashSet<String> {
    match fs::read_dir(sys_block) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .filter_map(|e| e.file_name().into_string().ok())
            .collect(),
        Err(e) => {
            log::warn!("Cannot list {}: {}", sys_block.display(), e);
            HashSet::new()
        }
    }
}

/// Whether the disk's device path runs through a USB bus
pub fn is_usb_disk(sys_block: &Path, name: &str) -> bool {
    let Ok(real) = fs::canonicalize(sys_block.join(name)) else {
        return false;
    };
    real.components().any(|c| match c {
        Component::Normal(part) => part
            .to_str()
            .and_then(|s| s.strip_prefix("usb"))
            .is_some_and(|bus| !bus.is_empty() && bus.bytes().all(|b| b.is_ascii_digit())),
        _ => false,
    })
}
