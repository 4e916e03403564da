//! st-ikbd - USB HID to Atari ST IKBD translator
//!
//! Replays a device trace through the translator and logs the state the IKBD
//! emulation would see after every frame.

mod replay;

use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use ik_core::config::Config;
use ik_input::HidInput;

use crate::replay::Trace;

fn main() -> Result<()> {
    let config = Config::load().unwrap_or_default();
    ik_core::logging::init(&config);

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <trace.toml>", args[0]);
        std::process::exit(1);
    }

    let path = PathBuf::from(&args[1]);
    let contents = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let trace = Trace::from_toml_str(&contents)?;

    tracing::info!(
        "Replaying {} with {} device(s), {} frame(s)",
        path.display(),
        trace.devices.len(),
        trace.frames.len()
    );

    let mut hid = HidInput::new(&config.input);
    let outputs = replay::run(&trace, &mut hid)?;

    if let Some(last) = outputs.last() {
        println!(
            "keys {:02x?} buttons {:#04x} joystick {:#04x} mouse {}",
            last.keys,
            last.buttons,
            last.joystick,
            if last.mouse_enabled { "on" } else { "off" }
        );
    }
    Ok(())
}
