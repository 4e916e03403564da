//! HID usage to ST scan code mapping
//!
//! Layout matches a UK keyboard on a UK ST. Keys the ST has no equivalent for
//! (Page Up, End, Print Screen, ...) map to 0 and are ignored.

use crate::state::ST_KEY_COUNT;

/// Keyboard page usages 0..128 translated to ST scan codes, 0 = no mapping
pub static SCAN_CODE_MAP: [u8; ST_KEY_COUNT] = build_gb_map();

/// Translate a HID keyboard usage into an ST scan code
pub fn st_scan_code(usage: u8) -> Option<u8> {
    match SCAN_CODE_MAP.get(usage as usize) {
        Some(&code) if code != 0 => Some(code),
        _ => None,
    }
}

const fn build_gb_map() -> [u8; ST_KEY_COUNT] {
    let mut map = [0u8; ST_KEY_COUNT];

    // Letters a..z
    let letters: [u8; 26] = [
        0x1E, 0x30, 0x2E, 0x20, 0x12, 0x21, 0x22, 0x23, 0x17, 0x24, 0x25, 0x26, 0x32, 0x31,
        0x18, 0x19, 0x10, 0x13, 0x1F, 0x14, 0x16, 0x2F, 0x11, 0x2D, 0x15, 0x2C,
    ];
    let mut i = 0;
    while i < letters.len() {
        map[0x04 + i] = letters[i];
        i += 1;
    }

    // Digits 1..9, 0 run contiguously on both sides
    let mut i = 0;
    while i < 10 {
        map[0x1E + i] = 0x02 + i as u8;
        i += 1;
    }

    map[0x28] = 0x1C; // Return
    map[0x29] = 0x01; // Esc
    map[0x2A] = 0x0E; // Backspace
    map[0x2B] = 0x0F; // Tab
    map[0x2C] = 0x39; // Space
    map[0x2D] = 0x0C; // - _
    map[0x2E] = 0x0D; // = +
    map[0x2F] = 0x1A; // [ {
    map[0x30] = 0x1B; // ] }
    map[0x31] = 0x2B; // \ |
    map[0x32] = 0x2B; // # ~
    map[0x33] = 0x27; // ; :
    map[0x34] = 0x28; // ' @
    map[0x35] = 0x29; // ` ¬
    map[0x36] = 0x33; // , <
    map[0x37] = 0x34; // . >
    map[0x38] = 0x35; // / ?
    map[0x39] = 0x3A; // Caps Lock

    // F1..F10
    let mut i = 0;
    while i < 10 {
        map[0x3A + i] = 0x3B + i as u8;
        i += 1;
    }
    map[0x44] = 0x61; // F11 -> Undo
    map[0x45] = 0x62; // F12 -> Help

    map[0x49] = 0x52; // Insert
    map[0x4A] = 0x47; // Home -> Clr/Home
    map[0x4C] = 0x53; // Delete
    map[0x4F] = 0x4D; // Right
    map[0x50] = 0x4B; // Left
    map[0x51] = 0x50; // Down
    map[0x52] = 0x48; // Up

    // Keypad
    map[0x53] = 0x63; // Num Lock -> (
    map[0x54] = 0x65; // /
    map[0x55] = 0x66; // *
    map[0x56] = 0x4A; // -
    map[0x57] = 0x4E; // +
    map[0x58] = 0x72; // Enter
    map[0x59] = 0x6D; // 1
    map[0x5A] = 0x6E; // 2
    map[0x5B] = 0x6F; // 3
    map[0x5C] = 0x6A; // 4
    map[0x5D] = 0x6B; // 5
    map[0x5E] = 0x6C; // 6
    map[0x5F] = 0x67; // 7
    map[0x60] = 0x68; // 8
    map[0x61] = 0x69; // 9
    map[0x62] = 0x70; // 0
    map[0x63] = 0x71; // .
    map[0x64] = 0x60; // ISO \ |
    map[0x67] = 0x64; // Keypad = -> )

    map
}
