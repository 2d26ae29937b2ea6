//! Hardware input sources

pub mod joystick;
