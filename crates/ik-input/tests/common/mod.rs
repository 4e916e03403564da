//! Test doubles for the USB transport and the motion consumer

#![allow(dead_code)]

use std::collections::HashSet;

use ik_input::{DeviceAddress, HidHost, MotionSink};

/// Transport where every device is mounted and idle unless told otherwise
#[derive(Default)]
pub struct MockHost {
    pub unmounted: HashSet<DeviceAddress>,
    pub busy: HashSet<DeviceAddress>,
    pub requests: Vec<DeviceAddress>,
}

impl MockHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests_for(&self, addr: DeviceAddress) -> usize {
        self.requests.iter().filter(|&&a| a == addr).count()
    }
}

impl HidHost for MockHost {
    fn is_mounted(&self, addr: DeviceAddress) -> bool {
        !self.unmounted.contains(&addr)
    }

    fn is_busy(&self, addr: DeviceAddress) -> bool {
        self.busy.contains(&addr)
    }

    fn request_report(&mut self, addr: DeviceAddress) {
        self.requests.push(addr);
    }
}

/// Records every motion delivery
#[derive(Default)]
pub struct RecordingSink {
    pub speeds: Vec<(i32, i32)>,
}

impl MotionSink for RecordingSink {
    fn set_speed(&mut self, x: i32, y: i32) {
        self.speeds.push((x, y));
    }
}

/// Boot keyboard report
pub fn keyboard_report(modifiers: u8, keys: &[u8]) -> Vec<u8> {
    let mut data = vec![0u8; 8];
    data[0] = modifiers;
    data[2..2 + keys.len()].copy_from_slice(keys);
    data
}

/// Boot mouse report
pub fn mouse_report(buttons: u8, x: i8, y: i8) -> Vec<u8> {
    vec![buttons, x as u8, y as u8, 0]
}

/// One fire button and 8-bit X/Y axes, logical range 0..255
pub const JOYSTICK_DESCRIPTOR: &[u8] = &[
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x04, // Usage (Joystick)
    0xA1, 0x01, // Collection (Application)
    0x05, 0x09, //   Usage Page (Button)
    0x09, 0x01, //   Usage (Button 1)
    0x15, 0x00, //   Logical Minimum (0)
    0x25, 0x01, //   Logical Maximum (1)
    0x75, 0x01, //   Report Size (1)
    0x95, 0x01, //   Report Count (1)
    0x81, 0x02, //   Input (Data, Var, Abs)
    0x75, 0x07, //   Report Size (7)
    0x81, 0x03, //   Input (Const)
    0x05, 0x01, //   Usage Page (Generic Desktop)
    0x09, 0x30, //   Usage (X)
    0x09, 0x31, //   Usage (Y)
    0x15, 0x00, //   Logical Minimum (0)
    0x26, 0xFF, 0x00, //   Logical Maximum (255)
    0x75, 0x08, //   Report Size (8)
    0x95, 0x02, //   Report Count (2)
    0x81, 0x02, //   Input (Data, Var, Abs)
    0xC0, // End Collection
];

/// Joystick report: fire, x, y
pub fn joystick_report(fire: bool, x: u8, y: u8) -> Vec<u8> {
    vec![u8::from(fire), x, y]
}
