//! Joystick translation
//!
//! Generic HID controllers are reduced to the ST's digital joystick: one fire
//! button and two bits per axis. Field locations come from the device's own
//! report descriptor.

use crate::descriptor::{
    ReportInfo, ReportItem, USAGE_PAGE_BUTTON, USAGE_PAGE_GENERIC_DESKTOP, USAGE_X, USAGE_Y,
};
use crate::state::{fire_button, InputState, JoystickMask};

/// Number of joystick ports on the ST
pub const JOYSTICK_PORTS: u8 = 2;

/// Bit offset of an axis pair in the joystick mask. The low bit of the pair
/// means up/left, the high bit down/right.
pub fn axis_offset(port: u8, usage: u16) -> Option<u8> {
    let base = match usage {
        USAGE_X => 2,
        USAGE_Y => 0,
        _ => return None,
    };
    Some(if port == 1 { base + 4 } else { base })
}

/// Update one axis pair from a raw value
fn apply_axis(mask: &mut JoystickMask, offset: u8, value: i32, midpoint: i64) {
    let pair = JoystickMask::from_bits_retain(0x3 << offset);
    mask.remove(pair);
    let value = i64::from(value);
    if value < midpoint {
        mask.insert(JoystickMask::from_bits_retain(1 << offset));
    } else if value > midpoint {
        mask.insert(JoystickMask::from_bits_retain(1 << (offset + 1)));
    }
}

/// Decode one report item for a port. Items absent from this report are
/// ignored.
pub fn apply_item(port: u8, item: &ReportItem, report: &[u8], state: &mut InputState) {
    if !item.is_input() {
        return;
    }
    let Some(value) = item.read(report) else {
        return;
    };

    match item.usage.page {
        USAGE_PAGE_BUTTON => state.set_button(fire_button(port), value != 0),
        USAGE_PAGE_GENERIC_DESKTOP => {
            if let Some(offset) = axis_offset(port, item.usage.id) {
                apply_axis(state.joystick_mut(), offset, value, item.midpoint());
            }
        }
        _ => {}
    }
}

/// Decode a full report from the controller on `port`.
pub fn decode(port: u8, info: &ReportInfo, report: &[u8], state: &mut InputState) {
    for item in info.input_items() {
        apply_item(port, item, report, state);
    }
    ik_core::joy_trace!(
        "port {} buttons {:#04x} joystick {:#04x}",
        port,
        state.buttons().bits(),
        state.joystick().bits()
    );
}
