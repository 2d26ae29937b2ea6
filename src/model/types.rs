//! Binding type definitions
//!
//! Defines device kinds, key identifiers and the action/axis binding records
//! that every device carries.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::RemapError;

/// Classification of the hardware a binding comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DeviceKind {
    #[default]
    Unknown,
    Keyboard,
    Mouse,
    Gamepad,
    MotionController,
    /// Non-standard joystick/HID device, identified by hardware name
    Unique,
}

/// Enum <-> string table used by presets, saves and the CLI
const KIND_NAMES: [(DeviceKind, &str); 6] = [
    (DeviceKind::Unknown, "Unknown"),
    (DeviceKind::Keyboard, "Keyboard"),
    (DeviceKind::Mouse, "Mouse"),
    (DeviceKind::Gamepad, "Gamepad"),
    (DeviceKind::MotionController, "MotionController"),
    (DeviceKind::Unique, "Unique"),
];

impl DeviceKind {
    /// All device kinds
    pub fn all() -> impl Iterator<Item = DeviceKind> {
        KIND_NAMES.iter().map(|(kind, _)| *kind)
    }

    /// Stable name of this kind
    pub fn as_str(&self) -> &'static str {
        KIND_NAMES
            .iter()
            .find(|(kind, _)| kind == self)
            .map(|(_, name)| *name)
            .unwrap_or("Unknown")
    }

    /// Default display string for devices of this kind.
    ///
    /// Unique devices are named after their hardware instead.
    pub fn default_display_string(&self) -> &'static str {
        self.as_str()
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceKind {
    type Err = RemapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        KIND_NAMES
            .iter()
            .find(|(_, name)| name.eq_ignore_ascii_case(s))
            .map(|(kind, _)| *kind)
            .ok_or_else(|| RemapError::UnknownDeviceKind(s.to_string()))
    }
}

impl Serialize for DeviceKind {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DeviceKind {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let name = String::deserialize(d)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

/// Opaque key identifier understood by the host (e.g. `"SpaceBar"`,
/// `"Gamepad_LeftX"`, `"Joystick_X52_Button_3"`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Key(String);

impl Key {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Modifier flags of an action binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Modifiers {
    #[serde(default)]
    pub shift: bool,
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub alt: bool,
    #[serde(default)]
    pub cmd: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        cmd: false,
    };
}

/// Named on/off control bound to one key plus modifiers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionBinding {
    /// Identity of the binding
    pub action_name: String,
    /// Bound key, `None` when unbound
    pub key: Option<Key>,
    /// Human label of the bound key (cosmetic)
    #[serde(default)]
    pub key_label: String,
    #[serde(default)]
    pub modifiers: Modifiers,
}

impl ActionBinding {
    /// Unbound slot for `action_name`
    pub fn unbound(action_name: impl Into<String>) -> Self {
        Self {
            action_name: action_name.into(),
            key: None,
            key_label: String::new(),
            modifiers: Modifiers::NONE,
        }
    }

    pub fn bound(action_name: impl Into<String>, key: Key, modifiers: Modifiers) -> Self {
        Self {
            action_name: action_name.into(),
            key_label: key.as_str().to_string(),
            key: Some(key),
            modifiers,
        }
    }

    pub fn is_bound(&self) -> bool {
        self.key.is_some()
    }
}

/// Named analog control bound to one key/axis plus a scale factor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisBinding {
    /// Identity of the binding
    pub axis_name: String,
    /// Bound key, `None` when unbound
    pub key: Option<Key>,
    /// Human label of the bound key (cosmetic)
    #[serde(default)]
    pub key_label: String,
    #[serde(default = "default_scale")]
    pub scale: f32,
}

impl AxisBinding {
    /// Unbound slot for `axis_name`
    pub fn unbound(axis_name: impl Into<String>) -> Self {
        Self {
            axis_name: axis_name.into(),
            key: None,
            key_label: String::new(),
            scale: default_scale(),
        }
    }

    pub fn bound(axis_name: impl Into<String>, key: Key, scale: f32) -> Self {
        Self {
            axis_name: axis_name.into(),
            key_label: key.as_str().to_string(),
            key: Some(key),
            scale,
        }
    }

    pub fn is_bound(&self) -> bool {
        self.key.is_some()
    }
}

fn default_scale() -> f32 {
    1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names_round_trip() {
        for kind in DeviceKind::all() {
            assert_eq!(kind.as_str().parse::<DeviceKind>().unwrap(), kind);
        }
        assert!("Joystick".parse::<DeviceKind>().is_err());
    }

    #[test]
    fn test_kind_serializes_as_name() {
        let json = serde_json::to_string(&DeviceKind::MotionController).unwrap();
        assert_eq!(json, "\"MotionController\"");
        let kind: DeviceKind = serde_json::from_str("\"gamepad\"").unwrap();
        assert_eq!(kind, DeviceKind::Gamepad);
    }

    #[test]
    fn test_unbound_defaults() {
        let action = ActionBinding::unbound("Jump");
        assert!(!action.is_bound());
        assert_eq!(action.modifiers, Modifiers::NONE);

        let axis = AxisBinding::unbound("MoveX");
        assert!(!axis.is_bound());
        assert_eq!(axis.scale, 1.0);
    }
}
