//! Joystick input
//!
//! Raw hot-plug and control events from a [`JoystickDriver`] flow through a
//! [`JoystickPipeline`], which synthesizes per-device keys, applies axis
//! calibration and emits [`InputSignal`]s.

pub mod calibration_table;
pub mod diagnostics;
pub mod driver;
pub mod event;
pub mod gilrs_driver;
pub mod normalize;
pub mod pipeline;
pub mod provider;
pub mod sink;
pub mod tracked;

pub use calibration_table::CalibrationTable;
pub use diagnostics::print_joystick_diagnostics;
pub use driver::{JoystickDriver, JoystickHandle};
pub use event::{DeviceChange, DeviceObserver, InstanceId, JoystickEvent};
pub use gilrs_driver::GilrsDriver;
pub use normalize::{denormalize_axis, normalize_axis, HatDirection};
pub use pipeline::JoystickPipeline;
pub use provider::{JoystickProvider, ProviderOptions};
pub use sink::{InputSignal, InputSink};
pub use tracked::TrackedJoystick;
