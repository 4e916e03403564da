//! Shared IKBD input state
//!
//! The button and joystick masks mirror the IKBD register layout bit for bit
//! and are read directly by the downstream controller emulation.

use bitflags::bitflags;

/// Size of the ST scan code space
pub const ST_KEY_COUNT: usize = 128;

/// ST scan code for left shift
pub const ST_LSHIFT: u8 = 42;
/// ST scan code for right shift
pub const ST_RSHIFT: u8 = 54;
/// ST scan code for alternate
pub const ST_ALT: u8 = 56;
/// ST scan code for control
pub const ST_CTRL: u8 = 29;

bitflags! {
    /// Mouse button / joystick fire register
    ///
    /// The mouse and both joystick ports share this register: port 0 fire
    /// shares the left button bit and port 1 fire the right button bit.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ButtonMask: u8 {
        const RIGHT = 0x01;
        const LEFT  = 0x02;
        const PORT1_FIRE = Self::RIGHT.bits();
        const PORT0_FIRE = Self::LEFT.bits();
    }
}

bitflags! {
    /// Digital joystick directions, two bits per axis per port
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct JoystickMask: u8 {
        const PORT0_UP    = 0x01;
        const PORT0_DOWN  = 0x02;
        const PORT0_LEFT  = 0x04;
        const PORT0_RIGHT = 0x08;
        const PORT1_UP    = 0x10;
        const PORT1_DOWN  = 0x20;
        const PORT1_LEFT  = 0x40;
        const PORT1_RIGHT = 0x80;
    }
}

/// Joystick port button bit for a port (0 or 1)
pub fn fire_button(port: u8) -> ButtonMask {
    if port == 0 {
        ButtonMask::PORT0_FIRE
    } else {
        ButtonMask::PORT1_FIRE
    }
}

/// State polled by the IKBD emulation
#[derive(Debug, Clone)]
pub struct InputState {
    keys: [bool; ST_KEY_COUNT],
    buttons: ButtonMask,
    joystick: JoystickMask,
    mouse_enabled: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self {
            keys: [false; ST_KEY_COUNT],
            buttons: ButtonMask::empty(),
            joystick: JoystickMask::empty(),
            mouse_enabled: true,
        }
    }

    /// Whether an ST scan code is currently held. Out of range codes read as up.
    pub fn keydown(&self, code: u8) -> bool {
        self.keys.get(code as usize).copied().unwrap_or(false)
    }

    /// Set a key slot. Slot 0 is reserved and stays up.
    pub fn set_key(&mut self, code: u8, down: bool) {
        if code == 0 {
            return;
        }
        if let Some(slot) = self.keys.get_mut(code as usize) {
            *slot = down;
        }
    }

    /// ST scan codes currently held, in ascending order
    pub fn keys_down(&self) -> impl Iterator<Item = u8> + '_ {
        self.keys
            .iter()
            .enumerate()
            .filter(|(_, down)| **down)
            .map(|(code, _)| code as u8)
    }

    /// Release every key. Mouse and joystick state are left alone.
    pub fn reset_keys(&mut self) {
        self.keys.fill(false);
    }

    pub fn buttons(&self) -> ButtonMask {
        self.buttons
    }

    /// Update a single button bit without disturbing the others
    pub fn set_button(&mut self, button: ButtonMask, pressed: bool) {
        self.buttons.set(button, pressed);
    }

    pub fn joystick(&self) -> JoystickMask {
        self.joystick
    }

    pub fn joystick_mut(&mut self) -> &mut JoystickMask {
        &mut self.joystick
    }

    pub fn mouse_enabled(&self) -> bool {
        self.mouse_enabled
    }

    pub fn set_mouse_enabled(&mut self, enabled: bool) {
        self.mouse_enabled = enabled;
    }
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}
