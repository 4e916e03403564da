//! USB HID input for Atari ST IKBD emulation
//!
//! This crate turns reports from USB keyboards, mice and generic game
//! controllers into the state an IKBD emulation polls:
//! - a 128 entry ST scan code table
//! - accumulated mouse motion and the shared button register
//! - the digital joystick mask for both ports

pub mod descriptor;
pub mod device;
pub mod joystick;
pub mod keyboard;
pub mod mapping;
pub mod mouse;
pub mod state;
pub mod translator;

// Re-exports for convenient access
pub use descriptor::{ReportInfo, ReportItem, Usage};
pub use device::{DeviceAddress, DeviceKind, DeviceRegistry, HidHost};
pub use mouse::{MotionSink, NullMotionSink};
pub use state::{ButtonMask, InputState, JoystickMask, ST_KEY_COUNT};
pub use translator::HidInput;
