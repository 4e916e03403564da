//! HID to IKBD translator
//!
//! Owns the device registry and the input state. The host calls the three
//! `handle_*` routines from its poll loop; each one decodes every idle device
//! of its class and immediately asks the transport for the next report.

use ik_core::config::InputConfig;
use ik_core::Result;

use crate::device::{DeviceAddress, DeviceKind, DeviceRegistry, HidHost};
use crate::joystick::{self, JOYSTICK_PORTS};
use crate::keyboard::KeyboardTranslator;
use crate::mouse::{MotionSink, MouseTranslator};
use crate::state::{ButtonMask, InputState, JoystickMask};

/// Translates USB HID reports into IKBD keyboard, mouse and joystick state
#[derive(Debug, Clone)]
pub struct HidInput {
    devices: DeviceRegistry,
    state: InputState,
    keyboard: KeyboardTranslator,
    mouse: MouseTranslator,
    mouse_report_len: usize,
}

impl HidInput {
    pub fn new(config: &InputConfig) -> Self {
        let mut state = InputState::new();
        state.set_mouse_enabled(config.mouse_enabled);
        Self {
            devices: DeviceRegistry::new(),
            state,
            keyboard: KeyboardTranslator::new(config.mouse_toggle_key),
            mouse: MouseTranslator::new(),
            mouse_report_len: config.mouse_report_len,
        }
    }

    // Device lifecycle

    pub fn mount_keyboard(&mut self, addr: DeviceAddress, host: &mut dyn HidHost) -> Result<()> {
        self.devices.mount_keyboard(addr)?;
        tracing::info!("Keyboard mounted at address {}", addr);
        host.request_report(addr);
        Ok(())
    }

    pub fn mount_mouse(&mut self, addr: DeviceAddress, host: &mut dyn HidHost) -> Result<()> {
        self.devices.mount_mouse(addr, self.mouse_report_len)?;
        tracing::info!("Mouse mounted at address {}", addr);
        host.request_report(addr);
        Ok(())
    }

    /// Mount a joystick or other generic device from its report descriptor.
    pub fn mount_generic(
        &mut self,
        addr: DeviceAddress,
        descriptor: &[u8],
        host: &mut dyn HidHost,
    ) -> Result<()> {
        if let Err(err) = self.devices.mount_generic(addr, descriptor) {
            tracing::warn!("Ignoring generic device at address {}: {}", addr, err);
            return Err(err);
        }
        if let Some(device) = self.devices.get(addr) {
            tracing::info!(
                "Joystick mounted at address {} ({} byte reports, {} fields)",
                addr,
                device.report().len(),
                device.report_info().map_or(0, |info| info.items().len())
            );
        }
        host.request_report(addr);
        Ok(())
    }

    pub fn unmount(&mut self, addr: DeviceAddress) {
        match self.devices.unmount(addr) {
            Some(device) => tracing::info!("{:?} at address {} unmounted", device.kind(), addr),
            None => ik_core::usb_debug!("Unmount for unknown address {}", addr),
        }
    }

    /// Transfer completion from the transport
    pub fn complete_report(&mut self, addr: DeviceAddress, data: &[u8]) {
        if !self.devices.complete_report(addr, data) {
            ik_core::usb_debug!("Dropping report for unknown address {}", addr);
        }
    }

    // Polling

    /// Rebuild the key table from every idle keyboard.
    pub fn handle_keyboard(&mut self, host: &mut dyn HidHost) {
        for (addr, device) in self.devices.of_kind(DeviceKind::Keyboard) {
            if !host.is_mounted(addr) || host.is_busy(addr) {
                continue;
            }
            self.keyboard.decode(device.report(), &mut self.state);
            host.request_report(addr);
        }
    }

    /// Decode every idle mouse. A non-zero `cpu_cycles` marks an IKBD timing
    /// tick: accumulated motion goes to `sink` and the accumulator is cleared.
    pub fn handle_mouse(
        &mut self,
        cpu_cycles: i64,
        host: &mut dyn HidHost,
        sink: &mut dyn MotionSink,
    ) {
        for (addr, device) in self.devices.of_kind(DeviceKind::Mouse) {
            if !host.is_mounted(addr) || host.is_busy(addr) {
                continue;
            }
            self.mouse.decode(device.report(), &mut self.state);
            host.request_report(addr);
        }

        if cpu_cycles != 0 {
            let (x, y) = self.mouse.pending();
            if x != 0 || y != 0 {
                ik_core::mouse_trace!("tick after {} cycles: ({}, {})", cpu_cycles, x, y);
            }
            self.mouse.tick(sink);
        }
    }

    /// Decode the first two generic devices. The first one found drives
    /// port 1, the second port 0, matching how the ST numbers its ports.
    pub fn handle_joystick(&mut self, host: &mut dyn HidHost) {
        let mut port = JOYSTICK_PORTS;

        for (addr, device) in self.devices.of_kind(DeviceKind::Generic) {
            if port == 0 {
                break;
            }
            port -= 1;

            if !host.is_mounted(addr) || host.is_busy(addr) {
                continue;
            }
            if let Some(info) = device.report_info() {
                joystick::decode(port, info, device.report(), &mut self.state);
            }
            host.request_report(addr);
        }
    }

    // State queries

    /// Release every key, e.g. when the emulated machine resets
    pub fn reset(&mut self) {
        self.state.reset_keys();
    }

    /// Whether an ST scan code is held
    pub fn keydown(&self, code: u8) -> bool {
        self.state.keydown(code)
    }

    /// Combined mouse button / joystick fire register
    pub fn mouse_buttons(&self) -> ButtonMask {
        self.state.buttons()
    }

    pub fn joystick(&self) -> JoystickMask {
        self.state.joystick()
    }

    pub fn mouse_enabled(&self) -> bool {
        self.state.mouse_enabled()
    }

    pub fn set_mouse_enabled(&mut self, enabled: bool) {
        self.state.set_mouse_enabled(enabled);
    }

    /// Mouse motion waiting for the next tick
    pub fn pending_motion(&self) -> (i32, i32) {
        self.mouse.pending()
    }

    pub fn state(&self) -> &InputState {
        &self.state
    }

    pub fn devices(&self) -> &DeviceRegistry {
        &self.devices
    }
}

impl Default for HidInput {
    fn default() -> Self {
        Self::new(&InputConfig::default())
    }
}
