//! HID key identities and the kiosk's button wiring.

pub use usbd_hid::descriptor::KeyboardUsage;

/// Wire value of a Keyboard/Keypad page usage, as it appears in a report slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Keycode(u8);

impl Keycode {
    pub const fn of(usage: KeyboardUsage) -> Self {
        Self(usage as u8)
    }

    pub const fn code(self) -> u8 {
        self.0
    }

    /// Modifier keys are reported as bits in byte 0, not in the key slots.
    pub fn modifier_bit(self) -> Option<u8> {
        let first = KeyboardUsage::KeyboardLeftControl as u8;
        let last = KeyboardUsage::KeyboardRightGUI as u8;
        (first..=last).contains(&self.0).then(|| 1 << (self.0 - first))
    }
}

/// Button wiring: (GPIO line offset, key).
///
/// Buttons connect the line to ground; lines use the internal pull-up.
pub const DEFAULT_BINDINGS: [(u32, Keycode); 14] = [
    (6, Keycode::of(KeyboardUsage::KeyboardTab)),
    (7, Keycode::of(KeyboardUsage::KeyboardSpacebar)),
    (10, Keycode::of(KeyboardUsage::KeyboardWw)),
    (12, Keycode::of(KeyboardUsage::KeyboardCc)),
    (13, Keycode::of(KeyboardUsage::KeyboardDd)),
    (14, Keycode::of(KeyboardUsage::KeyboardAa)),
    (15, Keycode::of(KeyboardUsage::KeyboardSs)),
    (27, Keycode::of(KeyboardUsage::KeyboardBackspace)),
    (26, Keycode::of(KeyboardUsage::KeyboardEnter)),
    (21, Keycode::of(KeyboardUsage::Keypad8UpArrow)),
    (19, Keycode::of(KeyboardUsage::KeyboardEscape)),
    (18, Keycode::of(KeyboardUsage::Keypad6RightArrow)),
    (17, Keycode::of(KeyboardUsage::Keypad4LeftArrow)),
    (16, Keycode::of(KeyboardUsage::Keypad2DownArrow)),
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn default_wiring_is_unique() {
        let pins: HashSet<u32> = DEFAULT_BINDINGS.iter().map(|(p, _)| *p).collect();
        let keys: HashSet<Keycode> = DEFAULT_BINDINGS.iter().map(|(_, k)| *k).collect();
        assert_eq!(pins.len(), DEFAULT_BINDINGS.len());
        assert_eq!(keys.len(), DEFAULT_BINDINGS.len());
    }

    #[test]
    fn wiring_uses_boot_keyboard_codes() {
        let codes: Vec<u8> = DEFAULT_BINDINGS.iter().map(|(_, k)| k.code()).collect();
        assert_eq!(
            codes,
            [0x2B, 0x2C, 0x1A, 0x06, 0x07, 0x04, 0x16, 0x2A, 0x28, 0x60, 0x29, 0x5E, 0x5C, 0x5A]
        );
    }

    #[test]
    fn modifier_bits() {
        assert_eq!(Keycode::of(KeyboardUsage::KeyboardLeftControl).modifier_bit(), Some(0x01));
        assert_eq!(Keycode::of(KeyboardUsage::KeyboardLeftShift).modifier_bit(), Some(0x02));
        assert_eq!(Keycode::of(KeyboardUsage::KeyboardRightGUI).modifier_bit(), Some(0x80));
        assert_eq!(Keycode::of(KeyboardUsage::KeyboardEnter).modifier_bit(), None);
    }
}
