//! Configuration management for romgallery
//!
//! Handles loading and saving of the kiosk configuration: ROM and artwork
//! directories, external command templates, USB import timing and UI
//! preferences. Every field has a default matching the stock kiosk layout,
//! so a partial (or missing) config file is always usable.

use crate::error::{GalleryError, Result};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the ROM library (scanned non-recursively)
    pub roms_dir: PathBuf,

    /// Flat directory of artwork named after ROM stems
    pub images_dir: PathBuf,

    /// Logo shown in the header
    pub logo_path: PathBuf,

    /// Artwork stem used when a ROM has no artwork of its own
    pub placeholder_stem: String,

    /// Recognized ROM extensions (without the dot, case-sensitive)
    pub rom_extensions: Vec<String>,

    /// Artwork extensions, probed in order
    pub image_extensions: Vec<String>,

    /// Emulator command; `{rom}` is replaced by the ROM path
    pub emulator: CommandTemplate,

    /// USB import settings
    pub usb: UsbConfig,

    /// UI preferences
    pub ui: UiConfig,
}

/// USB import configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UsbConfig {
    /// Delay between insertion and mount point lookup
    pub settle_secs: u64,

    /// sysfs polling period
    pub poll_interval_ms: u64,

    /// Where block devices are listed
    pub sys_block_dir: PathBuf,

    /// Mount point query; `{device}` is the device node
    pub mount_query: CommandTemplate,

    /// Unmount command; `{mount}` is the mount point
    pub unmount: CommandTemplate,
}

/// UI configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub fullscreen: bool,

    /// Optional TTF/OTF used for every label
    pub font_path: Option<PathBuf>,

    /// Controls legend shown in the header
    pub controls_text: String,

    /// Text shown whenever no notification is active
    pub welcome_text: String,

    /// Default notification lifetime
    pub notification_ms: u64,

    /// Lifetime of the USB import result notification
    pub import_notification_ms: u64,

    pub key_bindings: KeyBindings,
}

/// Key names as understood by `egui::Key::from_name`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    pub left: String,
    pub right: String,
    pub play: String,
    pub back: String,
}

/// An external command with `{placeholder}` arguments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandTemplate {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl CommandTemplate {
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// Expand placeholders into a full argument list
    pub fn expand_args(&self, vars: &[(&str, &Path)]) -> Vec<OsString> {
        self.args
            .iter()
            .map(|arg| {
                for (name, value) in vars {
                    let placeholder = format!("{{{}}}", name);
                    if arg == &placeholder {
                        return value.as_os_str().to_os_string();
                    }
                    if arg.contains(&placeholder) {
                        return OsString::from(arg.replace(&placeholder, &value.to_string_lossy()));
                    }
                }
                OsString::from(arg)
            })
            .collect()
    }

    /// Whether any argument references `{name}`
    pub fn uses(&self, name: &str) -> bool {
        let placeholder = format!("{{{}}}", name);
        self.args.iter().any(|a| a.contains(&placeholder))
    }

    pub fn command(&self, vars: &[(&str, &Path)]) -> Command {
        let mut command = Command::new(&self.program);
        command.args(self.expand_args(vars));
        command
    }

    /// Human-readable form for logs
    pub fn display(&self, vars: &[(&str, &Path)]) -> String {
        let mut parts = vec![self.program.clone()];
        parts.extend(
            self.expand_args(vars)
                .iter()
                .map(|a| a.to_string_lossy().into_owned()),
        );
        parts.join(" ")
    }
}

impl Default for UsbConfig {
    fn default() -> Self {
        Self {
            settle_secs: 2,
            poll_interval_ms: 500,
            sys_block_dir: PathBuf::from("/sys/block"),
            mount_query: CommandTemplate::new("lsblk", &["-o", "MOUNTPOINT", "-nr", "{device}"]),
            unmount: CommandTemplate::new("sudo", &["umount", "{mount}"]),
        }
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            left: "ArrowLeft".to_string(),
            right: "ArrowRight".to_string(),
            play: "Enter".to_string(),
            back: "Escape".to_string(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            fullscreen: true,
            font_path: None,
            controls_text: "Yellow 1 - Quit the game\nYellow 2 - Select a game\nWhite - Controller setup"
                .to_string(),
            welcome_text: "Welcome!\n\nSelect a game:\n".to_string(),
            notification_ms: 3000,
            import_notification_ms: 5000,
            key_bindings: KeyBindings::default(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            roms_dir: PathBuf::from("/home/admin/Games"),
            images_dir: PathBuf::from("/home/admin/Games/images"),
            logo_path: PathBuf::from("/home/admin/proyecto_final/Logo2.png"),
            placeholder_stem: "logo".to_string(),
            rom_extensions: vec!["gba".to_string(), "sfc".to_string()],
            image_extensions: vec!["png".to_string(), "jpg".to_string(), "jpeg".to_string()],
            emulator: CommandTemplate::new("mednafen", &["-fs", "1", "{rom}"]),
            usb: UsbConfig::default(),
            ui: UiConfig::default(),
        }
    }
}

impl UsbConfig {
    pub fn settle_time(&self) -> Duration {
        Duration::from_secs(self.settle_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

impl UiConfig {
    pub fn notification_duration(&self) -> Duration {
        Duration::from_millis(self.notification_ms)
    }

    pub fn import_notification_duration(&self) -> Duration {
        Duration::from_millis(self.import_notification_ms)
    }
}

impl Config {
    /// Get the default configuration file path
    pub fn config_path() -> PathBuf {
        if let Some(config_dir) = dirs::config_dir() {
            config_dir.join("romgallery").join("config.toml")
        } else {
            PathBuf::from("config.toml")
        }
    }

    /// Parse a configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| GalleryError::io(path, e))?;
        Ok(toml::from_str(&contents)?)
    }

    /// Load configuration, falling back to defaults on any problem
    pub fn load(path: Option<&Path>) -> Self {
        let path = path.map(Path::to_path_buf).unwrap_or_else(Self::config_path);

        if path.exists() {
            match Self::from_file(&path) {
                Ok(config) => {
                    log::info!("Loaded configuration from: {}", path.display());
                    return config;
                }
                Err(e) => {
                    log::error!("Failed to load config file: {}", e);
                }
            }
        }

        log::info!("Using default configuration");
        Self::default()
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> std::result::Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        log::info!("Saved configuration to: {}", path.display());
        Ok(())
    }

    /// Whether a file name carries one of the ROM extensions
    pub fn is_rom_name(&self, name: &str) -> bool {
        self.rom_extensions
            .iter()
            .any(|ext| name.len() > ext.len() + 1 && name.ends_with(&format!(".{}", ext)))
    }

    pub fn rom_path(&self, name: &str) -> PathBuf {
        self.roms_dir.join(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            roms_dir = "/srv/roms"

            [usb]
            settle_secs = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.roms_dir, PathBuf::from("/srv/roms"));
        assert_eq!(config.usb.settle_secs, 5);
        assert_eq!(config.usb.poll_interval_ms, 500);
        assert_eq!(config.emulator.program, "mednafen");
        assert_eq!(config.ui.key_bindings.play, "Enter");
    }

    #[test]
    fn config_roundtrips_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.placeholder_stem = "missing".to_string();
        config.save(&path).unwrap();

        assert_eq!(Config::from_file(&path).unwrap(), config);
    }

    #[test]
    fn invalid_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "roms_dir = [").unwrap();

        assert!(matches!(Config::from_file(&path), Err(GalleryError::Config(_))));
        assert_eq!(Config::load(Some(&path)), Config::default());
    }

    #[test]
    fn rom_names_match_exact_extensions() {
        let config = Config::default();
        assert!(config.is_rom_name("zelda.gba"));
        assert!(config.is_rom_name("mario world.sfc"));
        assert!(!config.is_rom_name("zelda.GBA"));
        assert!(!config.is_rom_name("notes.txt"));
        assert!(!config.is_rom_name(".gba"));
        assert!(!config.is_rom_name("agba"));
    }

    #[test]
    fn templates_expand_placeholders() {
        let template = CommandTemplate::new("mednafen", &["-fs", "1", "{rom}"]);
        let args = template.expand_args(&[("rom", Path::new("/games/a b.gba"))]);
        assert_eq!(args, vec![OsString::from("-fs"), OsString::from("1"), OsString::from("/games/a b.gba")]);
        assert!(template.uses("rom"));
        assert!(!template.uses("mount"));

        let inline = CommandTemplate::new("sh", &["-c", "umount {mount}"]);
        assert_eq!(
            inline.display(&[("mount", Path::new("/media/usb"))]),
            "sh -c umount /media/usb"
        );
    }
}
