//! Key identifier conventions
//!
//! Classifies host key identifiers into device kinds, synthesizes the stable
//! key identifiers used for raw joystick controls, and shortens key names
//! for display.
//!
//! Joystick keys follow the pattern `Joystick_{device}_{control}`:
//! - `Joystick_{device}_Button_{i}`
//! - `Joystick_{device}_Axis_{i}`
//! - `Joystick_{device}_Hat_{i}_{direction}`
//! - `Joystick_{device}_Hat_{i}_{X|Y}-Axis`

use super::types::{DeviceKind, Key};

/// Prefix of every synthesized joystick key
pub const JOYSTICK_KEY_PREFIX: &str = "Joystick_";

/// Key prefixes that belong to motion controllers
const MOTION_CONTROLLER_PREFIXES: &[&str] = &[
    "MotionController_",
    "OculusTouch_",
    "Vive_",
    "ValveIndex_",
    "MixedReality_",
];

/// Prefixes stripped by [`compactify_key_name`]
const COMPACT_PREFIXES: &[&str] = &["Gamepad_", "MotionController_"];

/// Control markers inside a joystick key, after the device name
const JOYSTICK_MARKERS: &[&str] = &["_Button_", "_Axis_", "_Hat_"];

/// Classify a key identifier into the kind of device that produces it
pub fn resolve_device_kind(key: &str) -> DeviceKind {
    if key.is_empty() {
        DeviceKind::Unknown
    } else if key.starts_with(JOYSTICK_KEY_PREFIX) {
        DeviceKind::Unique
    } else if key.starts_with("Gamepad") {
        DeviceKind::Gamepad
    } else if MOTION_CONTROLLER_PREFIXES.iter().any(|p| key.starts_with(p)) {
        DeviceKind::MotionController
    } else if key.contains("Mouse") {
        DeviceKind::Mouse
    } else {
        DeviceKind::Keyboard
    }
}

/// Display string of the device that owns `key`.
///
/// Standard kinds use the kind name; joystick keys yield the hardware name
/// embedded in the key.
pub fn device_display_string(key: &str) -> String {
    match resolve_device_kind(key) {
        DeviceKind::Unique => joystick_device_name(key)
            .unwrap_or(DeviceKind::Unique.as_str())
            .to_string(),
        kind => kind.default_display_string().to_string(),
    }
}

/// Extract the device name from a synthesized joystick key
pub fn joystick_device_name(key: &str) -> Option<&str> {
    let rest = key.strip_prefix(JOYSTICK_KEY_PREFIX)?;
    let end = JOYSTICK_MARKERS
        .iter()
        .filter_map(|marker| rest.rfind(marker))
        .max()?;
    if end == 0 {
        return None;
    }
    Some(&rest[..end])
}

/// Sanitize a hardware product name for use inside key identifiers
pub fn sanitize_device_name(name: &str) -> String {
    name.replace('.', "").trim().to_string()
}

pub fn joystick_button_key(device: &str, button: usize) -> Key {
    Key::new(format!("{JOYSTICK_KEY_PREFIX}{device}_Button_{button}"))
}

pub fn joystick_axis_key(device: &str, axis: usize) -> Key {
    Key::new(format!("{JOYSTICK_KEY_PREFIX}{device}_Axis_{axis}"))
}

pub fn joystick_hat_key(device: &str, hat: usize, direction: &str) -> Key {
    Key::new(format!("{JOYSTICK_KEY_PREFIX}{device}_Hat_{hat}_{direction}"))
}

pub fn joystick_hat_axis_key(device: &str, hat: usize, axis: &str) -> Key {
    Key::new(format!("{JOYSTICK_KEY_PREFIX}{device}_Hat_{hat}_{axis}-Axis"))
}

/// Shorten a key name into a compact human label.
///
/// `Joystick_X52_Hat_0_Up` becomes `Hat 0 Up`, `Gamepad_FaceButton_Bottom`
/// becomes `FaceButton Bottom`. Other names are returned unchanged.
pub fn compactify_key_name(name: &str) -> String {
    if let Some(device) = joystick_device_name(name) {
        let control = &name[JOYSTICK_KEY_PREFIX.len() + device.len() + 1..];
        return control.replace('_', " ");
    }

    for prefix in COMPACT_PREFIXES {
        if let Some(rest) = name.strip_prefix(prefix) {
            if !rest.is_empty() {
                return rest.replace('_', " ");
            }
        }
    }

    name.to_string()
}
