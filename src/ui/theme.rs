//! Kiosk look: palette, visuals and optional custom font

use egui::{Color32, FontData, FontDefinitions, FontFamily};
use std::path::Path;
use std::sync::Arc;

/// Window background
pub const BACKGROUND: Color32 = Color32::from_rgb(0x1E, 0x19, 0x40);
/// Header and message text
pub const TEXT: Color32 = Color32::from_rgb(0xF2, 0xAE, 0xE0);
/// Title of the selected game
pub const SELECTED: Color32 = Color32::from_rgb(0x44, 0xF2, 0xE1);
/// Titles of the neighbouring games
pub const UNSELECTED: Color32 = Color32::WHITE;
/// Pane drawn when no artwork is available
pub const PLACEHOLDER: Color32 = Color32::from_rgb(30, 30, 40);

pub const CONTROLS_SIZE: f32 = 14.0;
pub const MESSAGE_SIZE: f32 = 24.0;
pub const SIDE_TITLE_SIZE: f32 = 16.0;
pub const CENTER_TITLE_SIZE: f32 = 22.0;

/// Apply the kiosk visuals to egui
pub fn apply(ctx: &egui::Context) {
    let mut visuals = egui::Visuals::dark();

    visuals.panel_fill = BACKGROUND;
    visuals.window_fill = BACKGROUND;
    visuals.extreme_bg_color = Color32::from_rgb(0x14, 0x10, 0x2C);
    visuals.override_text_color = Some(TEXT);

    // Progress bar fill
    visuals.selection.bg_fill = SELECTED;

    ctx.set_visuals(visuals);
}

/// Register a font file as the first choice for every text style
pub fn install_font(ctx: &egui::Context, path: &Path) {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            log::warn!("Failed to read font {}: {}", path.display(), e);
            return;
        }
    };

    let mut fonts = FontDefinitions::default();
    fonts
        .font_data
        .insert("kiosk".to_owned(), Arc::new(FontData::from_owned(bytes)));
    for family in [FontFamily::Proportional, FontFamily::Monospace] {
        fonts
            .families
            .entry(family)
            .or_default()
            .insert(0, "kiosk".to_owned());
    }
    ctx.set_fonts(fonts);
    log::info!("Using font: {}", path.display());
}
