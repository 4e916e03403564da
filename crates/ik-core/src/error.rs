//! Error types

use thiserror::Error;

/// Errors raised while loading or storing the configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("No configuration directory available on this platform")]
    NoConfigDir,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Errors raised while parsing an HID report descriptor
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DescriptorError {
    #[error("Truncated item at offset {0}")]
    Truncated(usize),
    #[error("End Collection without matching Collection at offset {0}")]
    UnbalancedCollection(usize),
    #[error("Pop without matching Push at offset {0}")]
    EmptyStack(usize),
    #[error("{0} collection(s) left open at end of descriptor")]
    UnclosedCollection(usize),
    #[error("Descriptor declares more than {0} report items")]
    TooManyItems(usize),
    #[error("Report field wider than 32 bits at offset {0}")]
    FieldTooWide(usize),
    #[error("Report longer than {0} bytes")]
    ReportTooLong(usize),
}

/// Device registry errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    #[error("Device {0} is already mounted")]
    AlreadyMounted(u8),
    #[error("Device {0} declares an empty input report")]
    EmptyReport(u8),
}

/// Top level error type
#[derive(Error, Debug)]
pub enum IkbdError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Report descriptor error: {0}")]
    Descriptor(#[from] DescriptorError),
    #[error("Device error: {0}")]
    Device(#[from] DeviceError),
}

pub type Result<T> = std::result::Result<T, IkbdError>;
