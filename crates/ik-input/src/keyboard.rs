//! Keyboard translation
//!
//! Decodes boot protocol keyboard reports into the ST key table. Every report
//! is a complete snapshot, so the table is recomputed from scratch each poll
//! instead of tracking press and release events.

use bitflags::bitflags;

use crate::mapping::st_scan_code;
use crate::state::{InputState, ST_ALT, ST_CTRL, ST_KEY_COUNT, ST_LSHIFT, ST_RSHIFT};

/// Boot protocol keyboard report length
pub const KEYBOARD_REPORT_LEN: usize = 8;

/// Number of simultaneous keys in a boot protocol report
pub const KEY_SLOTS: usize = 6;

bitflags! {
    /// Keyboard modifier byte
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct KeyModifiers: u8 {
        const LEFT_CTRL   = 0b0000_0001;
        const LEFT_SHIFT  = 0b0000_0010;
        const LEFT_ALT    = 0b0000_0100;
        const LEFT_GUI    = 0b0000_1000;
        const RIGHT_CTRL  = 0b0001_0000;
        const RIGHT_SHIFT = 0b0010_0000;
        const RIGHT_ALT   = 0b0100_0000;
        const RIGHT_GUI   = 0b1000_0000;
    }
}

impl KeyModifiers {
    pub fn ctrl(&self) -> bool {
        self.intersects(Self::LEFT_CTRL | Self::RIGHT_CTRL)
    }

    pub fn alt(&self) -> bool {
        self.intersects(Self::LEFT_ALT | Self::RIGHT_ALT)
    }
}

/// Boot protocol keyboard report
///
/// Byte 0 holds the modifiers, byte 1 is reserved and bytes 2..8 carry up to
/// six key usages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyboardReport {
    pub modifiers: KeyModifiers,
    pub keycodes: [u8; KEY_SLOTS],
}

impl KeyboardReport {
    /// Parse a raw report. Missing trailing bytes read as "no key".
    pub fn parse(data: &[u8]) -> Self {
        let mut keycodes = [0u8; KEY_SLOTS];
        for (slot, &code) in keycodes.iter_mut().zip(data.iter().skip(2)) {
            *slot = code;
        }
        Self {
            modifiers: KeyModifiers::from_bits_retain(data.first().copied().unwrap_or(0)),
            keycodes,
        }
    }

    /// Whether a HID usage is held in this report
    pub fn is_key_pressed(&self, usage: u8) -> bool {
        usage != 0 && self.keycodes.contains(&usage)
    }

    /// ST scan codes for the six key slots, 0 where there is no mapping
    pub fn st_codes(&self) -> [u8; KEY_SLOTS] {
        let mut codes = [0u8; KEY_SLOTS];
        for (st, &usage) in codes.iter_mut().zip(self.keycodes.iter()) {
            *st = st_scan_code(usage).unwrap_or(0);
        }
        codes
    }
}

/// Keyboard pipeline
#[derive(Debug, Clone)]
pub struct KeyboardTranslator {
    toggle_key: u8,
    toggle_held: bool,
}

impl KeyboardTranslator {
    /// `toggle_key` is the HID usage that flips mouse mode, 0 for none.
    pub fn new(toggle_key: u8) -> Self {
        Self {
            toggle_key,
            toggle_held: false,
        }
    }

    /// Rewrite the key table from a raw keyboard report.
    pub fn decode(&mut self, data: &[u8], state: &mut InputState) {
        let report = KeyboardReport::parse(data);
        let st_codes = report.st_codes();

        for code in 1..ST_KEY_COUNT as u8 {
            state.set_key(code, st_codes.contains(&code));
        }

        let mods = report.modifiers;
        state.set_key(ST_LSHIFT, mods.contains(KeyModifiers::LEFT_SHIFT));
        state.set_key(ST_RSHIFT, mods.contains(KeyModifiers::RIGHT_SHIFT));
        state.set_key(ST_CTRL, mods.ctrl());
        state.set_key(ST_ALT, mods.alt());

        self.update_toggle(&report, state);

        ik_core::kbd_trace!(
            "keys {:02x?} mods {:#04x} -> st {:02x?}",
            report.keycodes,
            mods.bits(),
            st_codes
        );
    }

    fn update_toggle(&mut self, report: &KeyboardReport, state: &mut InputState) {
        if self.toggle_key == 0 {
            return;
        }
        let held = report.is_key_pressed(self.toggle_key);
        if held && !self.toggle_held {
            let enabled = !state.mouse_enabled();
            state.set_mouse_enabled(enabled);
            tracing::info!("Mouse emulation {}", if enabled { "enabled" } else { "disabled" });
        }
        self.toggle_held = held;
    }
}

impl Default for KeyboardTranslator {
    fn default() -> Self {
        Self::new(ik_core::config::DEFAULT_MOUSE_TOGGLE_KEY)
    }
}
