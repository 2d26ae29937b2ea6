//! Joystick driver collaborator
//!
//! The driver exposes enumerable, hot-pluggable devices with a fixed
//! capability surface. Handles close themselves when dropped.

use super::event::InstanceId;

/// An open device
pub trait JoystickHandle: Send {
    fn instance_id(&self) -> InstanceId;

    /// Hardware product name
    fn name(&self) -> String;

    fn num_buttons(&self) -> usize;

    fn num_axes(&self) -> usize;

    fn num_hats(&self) -> usize;
}

/// Device enumeration and opening
pub trait JoystickDriver {
    /// Enumeration indices of currently connected devices
    fn enumerate(&self) -> Vec<usize>;

    /// Whether the device at `which` is a game controller handled elsewhere
    fn is_game_controller(&self, which: usize) -> bool;

    /// Instance id of the device at `which`, without opening it
    fn instance_id(&self, which: usize) -> Option<InstanceId>;

    fn open(&mut self, which: usize) -> Option<Box<dyn JoystickHandle>>;
}
