//! InputMap - input remapping layer
//!
//! Discovers physical input devices, keeps a user-editable mapping from
//! physical keys/axes to named actions and axes, persists that mapping, and
//! translates raw joystick events into calibrated abstract key/axis signals.

pub mod config;
pub mod error;
pub mod host;
pub mod input;
pub mod manager;
pub mod model;
pub mod paths;
pub mod persistence;

pub use error::{RemapError, Result};
pub use manager::{LoadSource, ManagerState, MappingManager};
pub use model::{
    ActionBinding, AxisBinding, Device, DeviceKind, DeviceRegistry, InputRange, Key, Modifiers,
    PhysicalAxis,
};
