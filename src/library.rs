//! ROM library - scan, order and navigate the kiosk's ROM collection
//!
//! This module provides:
//! - Non-recursive ROM directory scanning filtered by extension
//! - The sorted, duplicate-free in-memory library with a wrapping cursor
//! - Artwork lookup by ROM stem with placeholder fallback

use crate::config::Config;
use crate::error::{GalleryError, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Scan a directory for ROM files, returning their sorted file names
pub fn scan_roms(dir: &Path, config: &Config) -> Result<Vec<String>> {
    if !dir.is_dir() {
        return Err(GalleryError::io(
            dir,
            std::io::Error::new(std::io::ErrorKind::NotFound, "ROM directory does not exist"),
        ));
    }

    let mut roms = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            log::warn!("Skipping non UTF-8 file name: {}", entry.path().display());
            continue;
        };
        if config.is_rom_name(name) {
            roms.push(name.to_string());
        }
    }

    roms.sort();
    log::debug!("Found {} ROMs in {}", roms.len(), dir.display());
    Ok(roms)
}

/// Find the artwork for a ROM, falling back to the placeholder artwork
pub fn artwork_for(config: &Config, rom_name: &str) -> Option<PathBuf> {
    find_image(config, rom_stem(rom_name)).or_else(|| find_image(config, &config.placeholder_stem))
}

fn find_image(config: &Config, stem: &str) -> Option<PathBuf> {
    config
        .image_extensions
        .iter()
        .map(|ext| config.images_dir.join(format!("{}.{}", stem, ext)))
        .find(|path| path.exists())
}

/// File name without its final extension
pub fn rom_stem(rom_name: &str) -> &str {
    match rom_name.rfind('.') {
        Some(dot) if dot > 0 => &rom_name[..dot],
        _ => rom_name,
    }
}

/// Sorted ROM names plus the carousel cursor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RomLibrary {
    roms: Vec<String>,
    index: usize,
}

impl RomLibrary {
    pub fn new(mut roms: Vec<String>) -> Self {
        roms.sort();
        roms.dedup();
        Self { roms, index: 0 }
    }

    /// Build the library from the configured ROM directory
    pub fn load(config: &Config) -> Self {
        match scan_roms(&config.roms_dir, config) {
            Ok(roms) => {
                log::info!("Loaded {} ROMs from {}", roms.len(), config.roms_dir.display());
                Self::new(roms)
            }
            Err(e) => {
                log::error!("Failed to scan ROM directory: {}", e);
                Self::default()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.roms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roms.is_empty()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn names(&self) -> &[String] {
        &self.roms
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.roms.get(index).map(String::as_str)
    }

    /// Currently selected ROM name
    pub fn selected(&self) -> Option<&str> {
        self.get(self.index)
    }

    /// Index `offset` steps away from the cursor, wrapped
    pub fn wrapped(&self, offset: isize) -> Option<usize> {
        if self.roms.is_empty() {
            return None;
        }
        let len = self.roms.len() as isize;
        Some((self.index as isize + offset).rem_euclid(len) as usize)
    }

    pub fn move_left(&mut self) {
        if let Some(index) = self.wrapped(-1) {
            self.index = index;
        }
    }

    pub fn move_right(&mut self) {
        if let Some(index) = self.wrapped(1) {
            self.index = index;
        }
    }

    /// Progress indicator as (value, maximum); value is 1-based
    pub fn progress(&self) -> (usize, usize) {
        if self.roms.is_empty() {
            (0, 0)
        } else {
            (self.index + 1, self.roms.len())
        }
    }

    /// Add names, keeping the list sorted and duplicate-free.
    /// Returns how many names were actually new.
    pub fn merge<I>(&mut self, names: I) -> usize
    where
        I: IntoIterator<Item = String>,
    {
        let before = self.roms.len();
        self.roms.extend(names);
        self.roms.sort();
        self.roms.dedup();
        if self.index >= self.roms.len() {
            self.index = 0;
        }
        self.roms.len() - before
    }
}
