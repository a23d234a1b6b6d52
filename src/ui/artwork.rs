//! Artwork textures
//!
//! Images are decoded and resized exactly to the pane size, then uploaded
//! once and cached per (path, size). The cache is dropped when the library
//! changes so replaced artwork is picked up.

use crate::error::Result;
use egui::{ColorImage, TextureHandle, TextureOptions};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Decode an image file and resize it to `size`
pub fn load_resized(path: &Path, size: [u32; 2]) -> Result<ColorImage> {
    let img = image::open(path)?;
    let resized = img.resize_exact(size[0], size[1], image::imageops::FilterType::Lanczos3);
    let rgba = resized.to_rgba8();
    Ok(ColorImage::from_rgba_unmultiplied(
        [size[0] as usize, size[1] as usize],
        rgba.as_raw(),
    ))
}

#[derive(Default)]
pub struct TextureCache {
    textures: HashMap<(PathBuf, [u32; 2]), Option<TextureHandle>>,
}

impl TextureCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the texture; failed loads are remembered as `None`
    pub fn get(&mut self, ctx: &egui::Context, path: &Path, size: [u32; 2]) -> Option<TextureHandle> {
        let key = (path.to_path_buf(), size);
        if let Some(texture) = self.textures.get(&key) {
            return texture.clone();
        }

        let texture = match load_resized(path, size) {
            Ok(image) => Some(ctx.load_texture(
                format!("artwork_{}_{}x{}", path.display(), size[0], size[1]),
                image,
                TextureOptions::LINEAR,
            )),
            Err(e) => {
                log::warn!("Failed to load artwork {}: {}", path.display(), e);
                None
            }
        };
        self.textures.insert(key, texture.clone());
        texture
    }

    pub fn clear(&mut self) {
        self.textures.clear();
    }
}
