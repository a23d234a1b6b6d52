//! romgallery UI - fullscreen egui carousel for the kiosk
//!
//! This module draws the header, message line, three-pane carousel and
//! progress bar, and turns key presses into navigation, play and
//! return-to-gallery actions.

mod app;
mod artwork;
mod theme;

pub use app::GalleryApp;
