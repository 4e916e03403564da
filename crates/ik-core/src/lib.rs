//! Core support for the st-ikbd HID translator
//!
//! Shared configuration, error types and logging setup used by the input
//! crate and the replay host.

pub mod config;
pub mod error;
pub mod logging;

pub use error::{IkbdError, Result};
