use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("failed to read GPIO line {line}: {reason}")]
    Pin { line: u32, reason: String },

    #[error("HID gadget write failed: {0}")]
    Hid(#[from] io::Error),

    #[error("more than 6 keys held, cannot report key 0x{0:02X}")]
    RolloverExceeded(u8),
}
