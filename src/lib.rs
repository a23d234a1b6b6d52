//! romgallery - a fullscreen ROM carousel for retro-gaming kiosks
//!
//! The core modules (library, carousel layout, emulator control, USB import,
//! notifications, configuration) have no UI dependency. The egui front end
//! lives in [`ui`] behind the `desktop` feature.

pub mod carousel;
pub mod config;
pub mod emulator;
pub mod error;
pub mod library;
pub mod notification;
pub mod usb;

#[cfg(feature = "desktop")]
pub mod ui;

pub use config::Config;
pub use error::{GalleryError, Result};
pub use library::RomLibrary;
