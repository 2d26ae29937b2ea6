//! Joystick diagnostics for troubleshooting detection and key naming

use std::time::{Duration, Instant};

use anyhow::Result;
use tracing::info;

use super::calibration_table::CalibrationTable;
use super::gilrs_driver::GilrsDriver;
use super::pipeline::JoystickPipeline;
use super::sink::InputSignal;
use crate::host::MemoryKeyRegistry;

/// Scan for `wait` then log every tracked joystick with its synthesized keys
pub fn print_joystick_diagnostics(skip_game_controllers: bool, wait: Duration) -> Result<()> {
    info!("=== Joystick Diagnostics ===");
    info!("Platform: {}", std::env::consts::OS);

    let driver = GilrsDriver::new(skip_game_controllers)?;
    let mut pipeline =
        JoystickPipeline::new(driver, MemoryKeyRegistry::default(), CalibrationTable::empty());

    info!("Waiting {:?} for devices to connect...", wait);
    let start = Instant::now();
    let mut discard: Vec<InputSignal> = Vec::new();
    while start.elapsed() < wait {
        for event in pipeline.driver_mut().poll() {
            pipeline.handle_event(event, &mut discard);
        }
        discard.clear();
        std::thread::sleep(Duration::from_millis(100));
    }
    pipeline.enumerate();

    if pipeline.devices().is_empty() {
        info!("No joysticks detected");
        if skip_game_controllers {
            info!("Devices with a standard controller mapping are skipped");
        }
        return Ok(());
    }

    info!("Found {} joystick(s):", pipeline.devices().len());
    for device in pipeline.devices() {
        info!("");
        info!("Instance {}: \"{}\"", device.instance_id, device.name);
        info!(
            "   {} buttons, {} axes, {} hats",
            device.button_keys.len(),
            device.axis_keys.len(),
            device.hat_keys.len()
        );
        for details in device.key_details() {
            info!("   {:<48} {}", details.key.as_str(), details.label);
        }
    }
    info!("");
    info!("{} key(s) registered", pipeline.key_registry().len());

    Ok(())
}
