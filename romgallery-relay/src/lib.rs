//! Mirrors a bank of arcade buttons onto a USB HID gadget keyboard.

pub mod error;
#[cfg(feature = "gpio")]
pub mod gpio;
pub mod keycode;
pub mod relay;
pub mod report;

pub use error::RelayError;
pub use keycode::{KeyboardUsage, Keycode, DEFAULT_BINDINGS};
pub use relay::{Binding, Relay};
pub use report::{HidKeyboard, KeySink, KeyboardReport};
