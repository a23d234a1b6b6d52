//! USB HID keyboard report (boot protocol) and the gadget writer.
//!
//! Layout (8 bytes):
//! ```text
//! Byte 0: Modifier keys (bitfield, Left Ctrl = bit 0 .. Right GUI = bit 7)
//! Byte 1: Reserved (0x00)
//! Byte 2-7: Up to 6 simultaneous key codes
//! ```

use crate::error::RelayError;
use crate::keycode::Keycode;
use std::io::Write;

/// Keyboard report size in bytes.
pub const KEYBOARD_REPORT_SIZE: usize = 8;

/// Standard USB HID boot-protocol keyboard report.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct KeyboardReport {
    pub modifier: u8,
    pub reserved: u8,
    pub keycodes: [u8; 6],
}

impl KeyboardReport {
    pub const fn empty() -> Self {
        Self {
            modifier: 0,
            reserved: 0,
            keycodes: [0; 6],
        }
    }

    pub fn is_pressed(&self, key: Keycode) -> bool {
        match key.modifier_bit() {
            Some(bit) => self.modifier & bit != 0,
            None => self.keycodes.contains(&key.code()),
        }
    }

    /// Mark `key` as held. Pressing a held key leaves the report unchanged.
    pub fn press(&mut self, key: Keycode) -> Result<(), RelayError> {
        if let Some(bit) = key.modifier_bit() {
            self.modifier |= bit;
            return Ok(());
        }
        if self.keycodes.contains(&key.code()) {
            return Ok(());
        }
        match self.keycodes.iter_mut().find(|slot| **slot == 0) {
            Some(slot) => {
                *slot = key.code();
                Ok(())
            }
            None => Err(RelayError::RolloverExceeded(key.code())),
        }
    }

    /// Mark `key` as released. Releasing an idle key is a no-op.
    pub fn release(&mut self, key: Keycode) {
        if let Some(bit) = key.modifier_bit() {
            self.modifier &= !bit;
            return;
        }
        for slot in self.keycodes.iter_mut().filter(|slot| **slot == key.code()) {
            *slot = 0;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.modifier == 0 && self.keycodes.iter().all(|&k| k == 0)
    }

    /// Serialise into a byte slice for USB HID transmission.
    /// Returns the number of bytes written (always 8).
    pub fn serialize(&self, buf: &mut [u8]) -> usize {
        if buf.len() < KEYBOARD_REPORT_SIZE {
            return 0;
        }
        buf[0] = self.modifier;
        buf[1] = self.reserved;
        buf[2..8].copy_from_slice(&self.keycodes);
        KEYBOARD_REPORT_SIZE
    }
}

/// Receives key transitions from the relay loop.
pub trait KeySink {
    fn press(&mut self, key: Keycode) -> Result<(), RelayError>;
    fn release(&mut self, key: Keycode) -> Result<(), RelayError>;
}

/// Keyboard backed by a HID gadget endpoint such as `/dev/hidg0`.
///
/// Every press and release writes the complete report, so the host sees the
/// state of all held keys on each transition.
pub struct HidKeyboard<W: Write> {
    writer: W,
    report: KeyboardReport,
}

impl<W: Write> HidKeyboard<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            report: KeyboardReport::empty(),
        }
    }

    pub fn report(&self) -> &KeyboardReport {
        &self.report
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn send(&mut self) -> Result<(), RelayError> {
        let mut buf = [0u8; KEYBOARD_REPORT_SIZE];
        let len = self.report.serialize(&mut buf);
        self.writer.write_all(&buf[..len])?;
        self.writer.flush()?;
        Ok(())
    }
}

impl<W: Write> KeySink for HidKeyboard<W> {
    fn press(&mut self, key: Keycode) -> Result<(), RelayError> {
        self.report.press(key)?;
        self.send()
    }

    fn release(&mut self, key: Keycode) -> Result<(), RelayError> {
        self.report.release(key);
        self.send()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keycode::KeyboardUsage;

    #[test]
    fn press_fills_first_free_slot() {
        let mut report = KeyboardReport::empty();
        report.press(Keycode::of(KeyboardUsage::KeyboardEnter)).unwrap();
        report.press(Keycode::of(KeyboardUsage::KeyboardTab)).unwrap();
        assert_eq!(report.keycodes, [0x28, 0x2B, 0, 0, 0, 0]);

        report.release(Keycode::of(KeyboardUsage::KeyboardEnter));
        report.press(Keycode::of(KeyboardUsage::KeyboardSpacebar)).unwrap();
        assert_eq!(report.keycodes, [0x2C, 0x2B, 0, 0, 0, 0]);
    }

    #[test]
    fn repeated_press_keeps_one_slot() {
        let mut report = KeyboardReport::empty();
        report.press(Keycode::of(KeyboardUsage::KeyboardAa)).unwrap();
        report.press(Keycode::of(KeyboardUsage::KeyboardAa)).unwrap();
        assert_eq!(report.keycodes, [0x04, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn seventh_key_is_rejected() {
        let mut report = KeyboardReport::empty();
        for key in [
            Keycode::of(KeyboardUsage::KeyboardAa),
            Keycode::of(KeyboardUsage::KeyboardCc),
            Keycode::of(KeyboardUsage::KeyboardDd),
            Keycode::of(KeyboardUsage::KeyboardSs),
            Keycode::of(KeyboardUsage::KeyboardWw),
            Keycode::of(KeyboardUsage::KeyboardTab),
        ] {
            report.press(key).unwrap();
        }
        let before = report;
        let err = report.press(Keycode::of(KeyboardUsage::KeyboardEnter)).unwrap_err();
        assert!(matches!(err, RelayError::RolloverExceeded(0x28)));
        assert_eq!(report, before);
    }

    #[test]
    fn modifiers_use_the_bitfield() {
        let mut report = KeyboardReport::empty();
        report.press(Keycode::of(KeyboardUsage::KeyboardLeftShift)).unwrap();
        assert_eq!(report.modifier, 0x02);
        assert_eq!(report.keycodes, [0; 6]);
        assert!(report.is_pressed(Keycode::of(KeyboardUsage::KeyboardLeftShift)));
        report.release(Keycode::of(KeyboardUsage::KeyboardLeftShift));
        assert!(report.is_empty());
    }

    #[test]
    fn serialize_layout() {
        let report = KeyboardReport {
            modifier: 0x05,
            reserved: 0x00,
            keycodes: [0x04, 0x05, 0x06, 0x00, 0x00, 0x00],
        };
        let mut buf = [0u8; 8];
        assert_eq!(report.serialize(&mut buf), 8);
        assert_eq!(buf, [0x05, 0x00, 0x04, 0x05, 0x06, 0x00, 0x00, 0x00]);

        let mut short = [0u8; 4];
        assert_eq!(report.serialize(&mut short), 0);
    }

    #[test]
    fn gadget_receives_full_report_per_transition() {
        let mut keyboard = HidKeyboard::new(Vec::new());
        keyboard.press(Keycode::of(KeyboardUsage::KeyboardEnter)).unwrap();
        keyboard.press(Keycode::of(KeyboardUsage::KeyboardEscape)).unwrap();
        keyboard.release(Keycode::of(KeyboardUsage::KeyboardEnter)).unwrap();

        let written = keyboard.into_inner();
        assert_eq!(written.len(), 3 * KEYBOARD_REPORT_SIZE);
        assert_eq!(&written[0..8], &[0, 0, 0x28, 0, 0, 0, 0, 0]);
        assert_eq!(&written[8..16], &[0, 0, 0x28, 0x29, 0, 0, 0, 0]);
        assert_eq!(&written[16..24], &[0, 0, 0, 0x29, 0, 0, 0, 0]);
    }
}
