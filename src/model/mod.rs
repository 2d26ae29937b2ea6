//! Device, binding and calibration data model

pub mod calibration;
pub mod device;
pub mod keys;
pub mod registry;
pub mod types;

pub use calibration::{interpolate, CurvePoint, InputRange, PhysicalAxis};
pub use device::{compactify_names, fill_missing_bindings, sort_alphabetically, Device};
pub use registry::{DeviceRegistry, DeviceSummary, ReconcileReport};
pub use types::{ActionBinding, AxisBinding, DeviceKind, Key, Modifiers};
