//! Scripted report replay
//!
//! Feeds a recorded or hand written device trace through the translator, one
//! frame per poll cycle, standing in for the USB host stack.

use anyhow::{Context, Result};
use ik_input::{DeviceAddress, HidHost, HidInput, MotionSink};
use serde::Deserialize;

/// Device classes a trace can declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceDeviceKind {
    Keyboard,
    Mouse,
    Generic,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TraceDevice {
    pub address: DeviceAddress,
    pub kind: TraceDeviceKind,
    /// Report descriptor, generic devices only
    #[serde(default)]
    pub descriptor: Vec<u8>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TraceReport {
    pub address: DeviceAddress,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TraceFrame {
    /// CPU cycles elapsed since the previous frame, 0 for no mouse tick
    #[serde(default)]
    pub cycles: i64,
    #[serde(default)]
    pub reports: Vec<TraceReport>,
    /// Devices that stay busy for this frame
    #[serde(default)]
    pub busy: Vec<DeviceAddress>,
    #[serde(default)]
    pub unmount: Vec<DeviceAddress>,
}

/// A complete trace file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Trace {
    #[serde(default, rename = "device")]
    pub devices: Vec<TraceDevice>,
    #[serde(default, rename = "frame")]
    pub frames: Vec<TraceFrame>,
}

impl Trace {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("Failed to parse trace")
    }
}

/// Host stand in: every device is mounted, busy only when a frame says so
#[derive(Debug, Default)]
pub struct ReplayHost {
    busy: Vec<DeviceAddress>,
    pub requests: usize,
}

impl HidHost for ReplayHost {
    fn is_mounted(&self, _addr: DeviceAddress) -> bool {
        true
    }

    fn is_busy(&self, addr: DeviceAddress) -> bool {
        self.busy.contains(&addr)
    }

    fn request_report(&mut self, _addr: DeviceAddress) {
        self.requests += 1;
    }
}

/// Collects delivered mouse motion
#[derive(Debug, Default)]
pub struct MotionLog {
    pub speeds: Vec<(i32, i32)>,
}

impl MotionSink for MotionLog {
    fn set_speed(&mut self, x: i32, y: i32) {
        if x != 0 || y != 0 {
            tracing::info!("mouse motion ({}, {})", x, y);
        }
        self.speeds.push((x, y));
    }
}

/// Snapshot of the translator output after a frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameOutput {
    pub keys: Vec<u8>,
    pub buttons: u8,
    pub joystick: u8,
    pub mouse_enabled: bool,
}

/// Mount the trace's devices and play every frame.
pub fn run(trace: &Trace, hid: &mut HidInput) -> Result<Vec<FrameOutput>> {
    let mut host = ReplayHost::default();
    let mut motion = MotionLog::default();

    for device in &trace.devices {
        let mounted = match device.kind {
            TraceDeviceKind::Keyboard => hid.mount_keyboard(device.address, &mut host),
            TraceDeviceKind::Mouse => hid.mount_mouse(device.address, &mut host),
            TraceDeviceKind::Generic => {
                hid.mount_generic(device.address, &device.descriptor, &mut host)
            }
        };
        mounted.with_context(|| format!("Failed to mount device {}", device.address))?;
    }

    let mut outputs = Vec::with_capacity(trace.frames.len());
    for (index, frame) in trace.frames.iter().enumerate() {
        for addr in &frame.unmount {
            hid.unmount(*addr);
        }
        for report in &frame.reports {
            hid.complete_report(report.address, &report.data);
        }
        host.busy.clone_from(&frame.busy);

        hid.handle_keyboard(&mut host);
        hid.handle_mouse(frame.cycles, &mut host, &mut motion);
        hid.handle_joystick(&mut host);

        let output = FrameOutput {
            keys: hid.state().keys_down().collect(),
            buttons: hid.mouse_buttons().bits(),
            joystick: hid.joystick().bits(),
            mouse_enabled: hid.mouse_enabled(),
        };
        tracing::info!(
            "frame {}: keys {:02x?} buttons {:#04x} joystick {:#04x}{}",
            index,
            output.keys,
            output.buttons,
            output.joystick,
            if output.mouse_enabled { "" } else { " (mouse off)" }
        );
        outputs.push(output);
    }

    tracing::debug!("{} report requests issued", host.requests);
    Ok(outputs)
}
