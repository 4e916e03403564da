//! Logging infrastructure for the translator

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{Config, LogLevel};

/// Map a configured log level to a tracing level, `None` when logging is off
pub fn level_for(log_level: LogLevel) -> Option<Level> {
    match log_level {
        LogLevel::Off => None,
        LogLevel::Error => Some(Level::ERROR),
        LogLevel::Warn => Some(Level::WARN),
        LogLevel::Info => Some(Level::INFO),
        LogLevel::Debug => Some(Level::DEBUG),
        LogLevel::Trace => Some(Level::TRACE),
    }
}

/// Initialize the logging system based on configuration
pub fn init(config: &Config) {
    let Some(level) = level_for(config.debug.log_level) else {
        return;
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    let subscriber = tracing_subscriber::registry().with(filter).with(
        fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true),
    );

    if config.debug.log_to_file {
        if let Ok(file) = std::fs::File::create(&config.debug.log_path) {
            let file_layer = fmt::layer().with_writer(file).with_ansi(false);
            let _ = subscriber.with(file_layer).try_init();
        } else {
            let _ = subscriber.try_init();
        }
    } else {
        let _ = subscriber.try_init();
    }
}

/// Initialize logging with default settings (for tests and quick starts)
pub fn init_default() {
    let filter = EnvFilter::from_default_env().add_directive(Level::INFO.into());

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .try_init();
}

// Per-pipeline logging macros

/// Log a keyboard trace message
#[macro_export]
macro_rules! kbd_trace {
    ($($arg:tt)*) => {
        tracing::trace!(target: "kbd", $($arg)*)
    };
}

/// Log a mouse trace message
#[macro_export]
macro_rules! mouse_trace {
    ($($arg:tt)*) => {
        tracing::trace!(target: "mouse", $($arg)*)
    };
}

/// Log a joystick trace message
#[macro_export]
macro_rules! joy_trace {
    ($($arg:tt)*) => {
        tracing::trace!(target: "joy", $($arg)*)
    };
}

/// Log a device lifecycle debug message
#[macro_export]
macro_rules! usb_debug {
    ($($arg:tt)*) => {
        tracing::debug!(target: "usb", $($arg)*)
    };
}
