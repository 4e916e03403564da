//! Mouse translation
//!
//! Relative motion from boot protocol reports is accumulated between IKBD
//! timing ticks and handed to a [`MotionSink`] when a tick arrives.

use bitflags::bitflags;

use crate::state::{ButtonMask, InputState};

/// A delta this large followed by a sign flip is treated as a wrapped counter
pub const GLITCH_THRESHOLD: i8 = 45;

/// Value a wrapped delta is clamped to
pub const GLITCH_CLAMP: i8 = 127;

bitflags! {
    /// Boot protocol mouse buttons
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct MouseButtons: u8 {
        const LEFT   = 0x01;
        const RIGHT  = 0x02;
        const MIDDLE = 0x04;
    }
}

/// Boot protocol mouse report: buttons, x, y and an optional wheel byte
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MouseReport {
    pub buttons: MouseButtons,
    pub x: i8,
    pub y: i8,
}

impl MouseReport {
    /// Parse a raw report. Missing bytes read as zero.
    pub fn parse(data: &[u8]) -> Self {
        let byte = |idx: usize| data.get(idx).copied().unwrap_or(0);
        Self {
            buttons: MouseButtons::from_bits_retain(byte(0)),
            x: byte(1) as i8,
            y: byte(2) as i8,
        }
    }
}

/// Receives accumulated motion once per timing tick
pub trait MotionSink {
    fn set_speed(&mut self, x: i32, y: i32);
}

/// Sink that discards motion
#[derive(Debug, Default)]
pub struct NullMotionSink;

impl MotionSink for NullMotionSink {
    fn set_speed(&mut self, _x: i32, _y: i32) {}
}

/// Some mice wrap their delta counter instead of clamping it when using the
/// boot protocol, so a fast movement shows up as a sudden reversal. Snap such
/// reversals to the extreme of the new direction.
pub fn correct_glitch(current: i8, last: i8) -> i8 {
    if current < 0 && last > GLITCH_THRESHOLD {
        GLITCH_CLAMP
    } else if current > 0 && last < -GLITCH_THRESHOLD {
        -GLITCH_CLAMP
    } else {
        current
    }
}

/// Mouse pipeline
#[derive(Debug, Clone, Default)]
pub struct MouseTranslator {
    /// Motion accumulated since the last tick
    acc_x: i32,
    acc_y: i32,
    /// Corrected deltas from the previous report
    last_x: i8,
    last_y: i8,
}

impl MouseTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode one report into the button register and the motion accumulator.
    pub fn decode(&mut self, data: &[u8], state: &mut InputState) {
        let report = MouseReport::parse(data);

        state.set_button(ButtonMask::LEFT, report.buttons.contains(MouseButtons::LEFT));
        state.set_button(ButtonMask::RIGHT, report.buttons.contains(MouseButtons::RIGHT));

        let x = correct_glitch(report.x, self.last_x);
        let y = correct_glitch(report.y, self.last_y);
        if x != report.x || y != report.y {
            ik_core::mouse_trace!(
                "wrapped delta ({}, {}) corrected to ({}, {})",
                report.x,
                report.y,
                x,
                y
            );
        }
        self.last_x = x;
        self.last_y = y;

        self.acc_x = self.acc_x.saturating_add(i32::from(x));
        self.acc_y = self.acc_y.saturating_add(i32::from(y));
    }

    /// Motion accumulated since the last tick
    pub fn pending(&self) -> (i32, i32) {
        (self.acc_x, self.acc_y)
    }

    /// Corrected deltas of the most recent report
    pub fn last_delta(&self) -> (i8, i8) {
        (self.last_x, self.last_y)
    }

    /// Hand accumulated motion to the sink and start over.
    pub fn tick(&mut self, sink: &mut dyn MotionSink) {
        sink.set_speed(self.acc_x, self.acc_y);
        self.acc_x = 0;
        self.acc_y = 0;
    }
}
