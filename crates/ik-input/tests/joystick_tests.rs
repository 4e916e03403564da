//! Joystick port assignment and axis decoding through the translator

mod common;

use common::{joystick_report, MockHost, JOYSTICK_DESCRIPTOR};
use ik_core::error::{DescriptorError, IkbdError};
use ik_input::{ButtonMask, HidInput, JoystickMask};

fn with_joysticks(addrs: &[u8]) -> (HidInput, MockHost) {
    let mut host = MockHost::new();
    let mut hid = HidInput::default();
    for &addr in addrs {
        hid.mount_generic(addr, JOYSTICK_DESCRIPTOR, &mut host).unwrap();
    }
    (hid, host)
}

#[test]
fn test_first_device_is_port_1() {
    let (mut hid, mut host) = with_joysticks(&[3, 4]);

    hid.complete_report(3, &joystick_report(true, 0x00, 0x80));
    hid.complete_report(4, &joystick_report(false, 0xFF, 0x80));
    hid.handle_joystick(&mut host);

    assert_eq!(
        hid.joystick(),
        JoystickMask::PORT1_LEFT | JoystickMask::PORT0_RIGHT
    );
    assert_eq!(hid.mouse_buttons(), ButtonMask::PORT1_FIRE);
}

#[test]
fn test_third_device_is_ignored() {
    let (mut hid, mut host) = with_joysticks(&[3, 4, 5]);

    hid.complete_report(3, &joystick_report(false, 0x80, 0x80));
    hid.complete_report(4, &joystick_report(false, 0x80, 0x80));
    hid.complete_report(5, &joystick_report(true, 0x00, 0x00));
    let mount_requests = host.requests_for(5);
    hid.handle_joystick(&mut host);

    assert_eq!(hid.joystick(), JoystickMask::empty());
    assert_eq!(hid.mouse_buttons(), ButtonMask::empty());
    assert_eq!(host.requests_for(3), 2);
    assert_eq!(host.requests_for(4), 2);
    assert_eq!(host.requests_for(5), mount_requests);
}

#[test]
fn test_busy_device_still_takes_its_port() {
    let (mut hid, mut host) = with_joysticks(&[3, 4]);
    host.busy.insert(3);

    hid.complete_report(3, &joystick_report(false, 0x00, 0x00));
    hid.complete_report(4, &joystick_report(false, 0x80, 0x00));
    hid.handle_joystick(&mut host);

    assert_eq!(hid.joystick(), JoystickMask::PORT0_UP);
}

#[test]
fn test_axis_midpoint_on_port_0() {
    let (mut hid, mut host) = with_joysticks(&[3, 4]);

    hid.complete_report(4, &joystick_report(false, 0x10, 0x80));
    hid.handle_joystick(&mut host);
    assert!(hid.joystick().contains(JoystickMask::PORT0_LEFT));
    assert!(!hid.joystick().contains(JoystickMask::PORT0_RIGHT));

    hid.complete_report(4, &joystick_report(false, 0xF0, 0x80));
    hid.handle_joystick(&mut host);
    assert!(!hid.joystick().contains(JoystickMask::PORT0_LEFT));
    assert!(hid.joystick().contains(JoystickMask::PORT0_RIGHT));

    hid.complete_report(4, &joystick_report(false, 0x80, 0x80));
    hid.handle_joystick(&mut host);
    let x_pair = JoystickMask::PORT0_LEFT | JoystickMask::PORT0_RIGHT;
    assert_eq!(hid.joystick() & x_pair, JoystickMask::empty());
}

#[test]
fn test_unplugging_promotes_next_device() {
    let (mut hid, mut host) = with_joysticks(&[3, 4]);
    hid.unmount(3);

    hid.complete_report(4, &joystick_report(true, 0x80, 0xFF));
    hid.handle_joystick(&mut host);

    assert_eq!(hid.joystick(), JoystickMask::PORT1_DOWN);
    assert_eq!(hid.mouse_buttons(), ButtonMask::PORT1_FIRE);
}

#[test]
fn test_reset_leaves_joystick_alone() {
    let (mut hid, mut host) = with_joysticks(&[3]);
    hid.complete_report(3, &joystick_report(true, 0x00, 0x00));
    hid.handle_joystick(&mut host);

    hid.reset();

    assert_eq!(hid.joystick(), JoystickMask::PORT1_UP | JoystickMask::PORT1_LEFT);
    assert_eq!(hid.mouse_buttons(), ButtonMask::PORT1_FIRE);
}

#[test]
fn test_bad_descriptor_is_not_mounted() {
    let mut host = MockHost::new();
    let mut hid = HidInput::default();

    let err = hid.mount_generic(3, &[0xA1, 0x01], &mut host).unwrap_err();

    assert!(matches!(
        err,
        IkbdError::Descriptor(DescriptorError::UnclosedCollection(1))
    ));
    assert!(hid.devices().is_empty());
    assert!(host.requests.is_empty());
}
