//! Background joystick provider with hot-plug support
//!
//! gilrs is not `Send`, so the driver and pipeline live on a dedicated
//! thread. Signals are forwarded to the async world over an unbounded
//! channel; device list changes go to the registered observers.

use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::calibration_table::CalibrationTable;
use super::event::DeviceObserver;
use super::gilrs_driver::GilrsDriver;
use super::pipeline::JoystickPipeline;
use super::sink::InputSignal;
use crate::host::MemoryKeyRegistry;

/// Provider startup options
#[derive(Clone)]
pub struct ProviderOptions {
    pub poll_interval: Duration,
    pub skip_game_controllers: bool,
    pub calibration: CalibrationTable,
    pub observers: Vec<DeviceObserver>,
}

impl Default for ProviderOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(4),
            skip_game_controllers: true,
            calibration: CalibrationTable::empty(),
            observers: Vec::new(),
        }
    }
}

/// Running joystick provider. Dropping it stops the polling thread.
pub struct JoystickProvider {
    shutdown_tx: Option<std::sync::mpsc::Sender<()>>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl JoystickProvider {
    /// Start polling. Returns the provider and the signal receiver.
    pub fn start(options: ProviderOptions) -> Result<(Self, mpsc::UnboundedReceiver<InputSignal>)> {
        let (shutdown_tx, shutdown_rx) = std::sync::mpsc::channel::<()>();
        let (signal_tx, signal_rx) = mpsc::unbounded_channel::<InputSignal>();
        let (ready_tx, ready_rx) = std::sync::mpsc::channel::<Result<()>>();

        let thread = std::thread::Builder::new()
            .name("joystick-poll".to_string())
            .spawn(move || Self::event_loop_blocking(options, signal_tx, shutdown_rx, ready_tx))?;

        // Surface gilrs init failures to the caller
        match ready_rx.recv() {
            Ok(Ok(())) => {},
            Ok(Err(e)) => {
                let _ = thread.join();
                return Err(e);
            },
            Err(_) => anyhow::bail!("Joystick thread exited before startup"),
        }

        Ok((
            Self {
                shutdown_tx: Some(shutdown_tx),
                thread: Some(thread),
            },
            signal_rx,
        ))
    }

    fn event_loop_blocking(
        options: ProviderOptions,
        mut signal_tx: mpsc::UnboundedSender<InputSignal>,
        shutdown_rx: std::sync::mpsc::Receiver<()>,
        ready_tx: std::sync::mpsc::Sender<Result<()>>,
    ) {
        let driver = match GilrsDriver::new(options.skip_game_controllers) {
            Ok(driver) => driver,
            Err(e) => {
                let _ = ready_tx.send(Err(e));
                return;
            },
        };
        let _ = ready_tx.send(Ok(()));

        let mut pipeline =
            JoystickPipeline::new(driver, MemoryKeyRegistry::default(), options.calibration);
        for observer in options.observers {
            pipeline.subscribe(observer);
        }

        pipeline.enumerate();
        if pipeline.devices().is_empty() {
            warn!("No joysticks detected yet, waiting for hot-plug");
        } else {
            info!("Tracking {} joystick(s)", pipeline.devices().len());
        }

        loop {
            match shutdown_rx.try_recv() {
                Ok(()) | Err(std::sync::mpsc::TryRecvError::Disconnected) => {
                    info!("Joystick provider shutting down");
                    break;
                },
                Err(std::sync::mpsc::TryRecvError::Empty) => {},
            }

            for event in pipeline.driver_mut().poll() {
                pipeline.handle_event(event, &mut signal_tx);
            }

            std::thread::sleep(options.poll_interval);
        }

        pipeline.shutdown();
    }

    /// Stop the polling thread and wait for it to release every handle
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("Joystick thread panicked");
            }
        }
    }
}

impl Drop for JoystickProvider {
    fn drop(&mut self) {
        self.shutdown();
    }
}
