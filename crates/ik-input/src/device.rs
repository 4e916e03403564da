//! Connected HID devices and their report buffers

use std::collections::BTreeMap;

use ik_core::error::{DeviceError, IkbdError};

use crate::descriptor::ReportInfo;
use crate::keyboard::KEYBOARD_REPORT_LEN;

/// USB device address assigned by the host stack
pub type DeviceAddress = u8;

/// Report classification of a device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    Keyboard,
    Mouse,
    /// Anything else, treated as a joystick
    Generic,
}

/// USB transport the translator polls through.
///
/// Report requests are fire and forget; the transport hands the finished
/// report back through [`crate::HidInput::complete_report`] and reports the
/// device as busy until then.
pub trait HidHost {
    fn is_mounted(&self, addr: DeviceAddress) -> bool;
    fn is_busy(&self, addr: DeviceAddress) -> bool;
    fn request_report(&mut self, addr: DeviceAddress);
}

/// A mounted device and its most recent report
#[derive(Debug, Clone)]
pub struct Device {
    kind: DeviceKind,
    report: Vec<u8>,
    info: Option<ReportInfo>,
}

impl Device {
    pub fn kind(&self) -> DeviceKind {
        self.kind
    }

    /// Most recent report. Zeroed until the first transfer completes.
    pub fn report(&self) -> &[u8] {
        &self.report
    }

    /// Parsed report descriptor, present for generic devices
    pub fn report_info(&self) -> Option<&ReportInfo> {
        self.info.as_ref()
    }
}

/// Devices keyed by address, iterated in address order
#[derive(Debug, Clone, Default)]
pub struct DeviceRegistry {
    devices: BTreeMap<DeviceAddress, Device>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, addr: DeviceAddress, device: Device) -> Result<(), DeviceError> {
        if self.devices.contains_key(&addr) {
            return Err(DeviceError::AlreadyMounted(addr));
        }
        self.devices.insert(addr, device);
        Ok(())
    }

    pub fn mount_keyboard(&mut self, addr: DeviceAddress) -> Result<(), DeviceError> {
        self.insert(
            addr,
            Device {
                kind: DeviceKind::Keyboard,
                report: vec![0; KEYBOARD_REPORT_LEN],
                info: None,
            },
        )
    }

    pub fn mount_mouse(
        &mut self,
        addr: DeviceAddress,
        report_len: usize,
    ) -> Result<(), DeviceError> {
        if report_len == 0 {
            return Err(DeviceError::EmptyReport(addr));
        }
        self.insert(
            addr,
            Device {
                kind: DeviceKind::Mouse,
                report: vec![0; report_len],
                info: None,
            },
        )
    }

    /// Mount a generic device, sizing its buffer from the report descriptor.
    pub fn mount_generic(
        &mut self,
        addr: DeviceAddress,
        descriptor: &[u8],
    ) -> Result<(), IkbdError> {
        if self.devices.contains_key(&addr) {
            return Err(DeviceError::AlreadyMounted(addr).into());
        }
        let info = ReportInfo::parse(descriptor)?;
        if info.report_size() == 0 {
            return Err(DeviceError::EmptyReport(addr).into());
        }
        self.insert(
            addr,
            Device {
                kind: DeviceKind::Generic,
                report: vec![0; info.report_size()],
                info: Some(info),
            },
        )?;
        Ok(())
    }

    /// Drop a device and its buffer
    pub fn unmount(&mut self, addr: DeviceAddress) -> Option<Device> {
        self.devices.remove(&addr)
    }

    /// Store a finished transfer. Bytes beyond the buffer are dropped and a
    /// short transfer leaves the tail of the previous report in place.
    pub fn complete_report(&mut self, addr: DeviceAddress, data: &[u8]) -> bool {
        match self.devices.get_mut(&addr) {
            Some(device) => {
                let len = data.len().min(device.report.len());
                device.report[..len].copy_from_slice(&data[..len]);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, addr: DeviceAddress) -> Option<&Device> {
        self.devices.get(&addr)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Devices in address order
    pub fn iter(&self) -> impl Iterator<Item = (DeviceAddress, &Device)> {
        self.devices.iter().map(|(addr, device)| (*addr, device))
    }

    /// Devices of one kind in address order
    pub fn of_kind(&self, kind: DeviceKind) -> impl Iterator<Item = (DeviceAddress, &Device)> {
        self.iter().filter(move |(_, device)| device.kind == kind)
    }
}
