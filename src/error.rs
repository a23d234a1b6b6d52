use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GalleryError {
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Command `{command}` exited with {status}")]
    CommandFailed { command: String, status: ExitStatus },
    #[error("Failed to signal process {pid}: {reason}")]
    Signal { pid: u32, reason: String },
    #[cfg(feature = "desktop")]
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

impl GalleryError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GalleryError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, GalleryError>;
