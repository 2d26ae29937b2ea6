//! Raw joystick events and device change notifications

use std::sync::Arc;

/// Stable per-connection identifier assigned by the driver
pub type InstanceId = u32;

/// Raw event from the hot-plug/event source
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JoystickEvent {
    /// Device appeared at enumeration index `which` (reused after removal)
    DeviceAdded { which: usize },
    DeviceRemoved { instance_id: InstanceId },
    Button {
        instance_id: InstanceId,
        button: usize,
        pressed: bool,
    },
    Axis {
        instance_id: InstanceId,
        axis: usize,
        value: i16,
    },
    /// Raw 8-way hat code
    Hat {
        instance_id: InstanceId,
        hat: usize,
        value: u8,
    },
}

/// Tracked device list change
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceChange {
    Added { instance_id: InstanceId, name: String },
    Removed { instance_id: InstanceId, name: String },
}

/// Observer invoked synchronously after each add/remove
pub type DeviceObserver = Arc<dyn Fn(&DeviceChange) + Send + Sync>;
