//! Human-editable device presets
//!
//! One JSON file per exported device, named `<DeviceString>_<timestamp>.json`.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{RemapError, Result};
use crate::model::keys::compactify_key_name;
use crate::model::{ActionBinding, AxisBinding, Device, DeviceKind, Key, Modifiers};

/// File extension of preset files
pub const PRESET_EXTENSION: &str = "json";

/// Timestamp layout used in preset file names
const TIMESTAMP_FORMAT: &str = "%Y.%m.%d-%H.%M.%S";

/// Key text meaning "unbound"
const UNBOUND_KEY: &str = "None";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresetAction {
    #[serde(rename = "ActionName")]
    pub action_name: String,
    #[serde(rename = "KeyString", default)]
    pub key_string: String,
    #[serde(rename = "Key", default)]
    pub key: String,
    #[serde(rename = "bShift", default)]
    pub shift: bool,
    #[serde(rename = "bCtrl", default)]
    pub ctrl: bool,
    #[serde(rename = "bAlt", default)]
    pub alt: bool,
    #[serde(rename = "bCmd", default)]
    pub cmd: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresetAxis {
    #[serde(rename = "AxisName")]
    pub axis_name: String,
    #[serde(rename = "KeyString", default)]
    pub key_string: String,
    #[serde(rename = "Key", default)]
    pub key: String,
    #[serde(rename = "Scale", default = "default_scale")]
    pub scale: f32,
}

fn default_scale() -> f32 {
    1.0
}

/// Preset file contents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresetDocument {
    #[serde(rename = "DeviceType")]
    pub device_type: String,
    #[serde(rename = "DeviceName")]
    pub device_name: String,
    #[serde(rename = "DeviceString")]
    pub device_string: String,
    #[serde(rename = "Actions", default)]
    pub actions: Vec<PresetAction>,
    #[serde(rename = "Axises", default)]
    pub axes: Vec<PresetAxis>,
}

fn key_text(key: &Option<Key>) -> String {
    key.as_ref().map(|k| k.as_str().to_string()).unwrap_or_default()
}

fn parse_key(text: &str) -> Option<Key> {
    let text = text.trim();
    if text.is_empty() || text == UNBOUND_KEY {
        None
    } else {
        Some(Key::new(text))
    }
}

impl PresetDocument {
    pub fn from_device(device: &Device) -> Self {
        Self {
            device_type: device.kind.as_str().to_string(),
            device_name: device.display_name.clone(),
            device_string: device.display_string.clone(),
            actions: device
                .actions
                .iter()
                .map(|a| PresetAction {
                    action_name: a.action_name.clone(),
                    key_string: a.key_label.clone(),
                    key: key_text(&a.key),
                    shift: a.modifiers.shift,
                    ctrl: a.modifiers.ctrl,
                    alt: a.modifiers.alt,
                    cmd: a.modifiers.cmd,
                })
                .collect(),
            axes: device
                .axes
                .iter()
                .map(|a| PresetAxis {
                    axis_name: a.axis_name.clone(),
                    key_string: a.key_label.clone(),
                    key: key_text(&a.key),
                    scale: a.scale,
                })
                .collect(),
        }
    }

    /// Reconstruct a device, off to the side of any registry
    pub fn to_device(&self) -> Result<Device> {
        let kind: DeviceKind = self
            .device_type
            .parse()
            .map_err(|_| RemapError::Malformed(format!("unknown DeviceType '{}'", self.device_type)))?;
        if kind == DeviceKind::Unknown {
            return Err(RemapError::Malformed("DeviceType is Unknown".to_string()));
        }

        let display_string = if self.device_string.is_empty() {
            kind.default_display_string().to_string()
        } else {
            self.device_string.clone()
        };

        let mut device = Device::new(kind, display_string);
        if !self.device_name.is_empty() {
            device.display_name = self.device_name.clone();
        }

        for action in &self.actions {
            if action.action_name.is_empty() {
                return Err(RemapError::Malformed("action without ActionName".to_string()));
            }
            let binding = match parse_key(&action.key) {
                Some(key) => ActionBinding {
                    action_name: action.action_name.clone(),
                    key_label: label_or_compact(&action.key_string, &key),
                    key: Some(key),
                    modifiers: Modifiers {
                        shift: action.shift,
                        ctrl: action.ctrl,
                        alt: action.alt,
                        cmd: action.cmd,
                    },
                },
                None => ActionBinding::unbound(action.action_name.as_str()),
            };
            device.add_action(binding);
        }

        for axis in &self.axes {
            if axis.axis_name.is_empty() {
                return Err(RemapError::Malformed("axis without AxisName".to_string()));
            }
            let binding = match parse_key(&axis.key) {
                Some(key) => AxisBinding {
                    axis_name: axis.axis_name.clone(),
                    key_label: label_or_compact(&axis.key_string, &key),
                    key: Some(key),
                    scale: axis.scale,
                },
                None => AxisBinding {
                    scale: axis.scale,
                    ..AxisBinding::unbound(axis.axis_name.as_str())
                },
            };
            device.add_axis(binding);
        }

        Ok(device)
    }
}

fn label_or_compact(label: &str, key: &Key) -> String {
    if label.is_empty() {
        compactify_key_name(key.as_str())
    } else {
        label.to_string()
    }
}

/// Make a device string safe to use as a file name stem
fn sanitize_file_stem(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect::<String>()
        .trim()
        .to_string()
}

/// File name of a preset exported at `when`
pub fn preset_file_name(device_string: &str, when: &DateTime<Local>) -> String {
    format!(
        "{}_{}.{}",
        sanitize_file_stem(device_string),
        when.format(TIMESTAMP_FORMAT),
        PRESET_EXTENSION
    )
}

/// Write `device` as a preset into `dir`, creating the directory tree.
///
/// Returns the written path.
pub fn export_device(device: &Device, dir: &Path, allow_overwrite: bool) -> Result<PathBuf> {
    let path = dir.join(preset_file_name(&device.display_string, &Local::now()));
    export_device_to(device, &path, allow_overwrite)?;
    Ok(path)
}

/// Write `device` as a preset to an explicit path
pub fn export_device_to(device: &Device, path: &Path, allow_overwrite: bool) -> Result<()> {
    if path.exists() && !allow_overwrite {
        return Err(RemapError::PresetExists(path.to_path_buf()));
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let document = PresetDocument::from_device(device);
    let json = serde_json::to_string_pretty(&document)?;
    fs::write(path, json)?;

    info!("Exported device {} to {}", device.display_string, path.display());
    Ok(())
}

/// Read and parse a preset into a standalone device
pub fn import_device(path: &Path) -> Result<Device> {
    let text = fs::read_to_string(path)?;
    let document: PresetDocument = serde_json::from_str(&text)
        .map_err(|e| RemapError::Malformed(format!("{}: {}", path.display(), e)))?;
    let device = document.to_device()?;
    debug!(
        "Parsed preset {} ({} actions, {} axes)",
        path.display(),
        device.actions.len(),
        device.axes.len()
    );
    Ok(device)
}

/// Sorted file names of every preset in `dir`; a missing directory has none
pub fn list_importable_device_presets(dir: &Path) -> Result<Vec<String>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let is_preset = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(PRESET_EXTENSION));
        if let (true, Some(name)) = (is_preset, path.file_name().and_then(|n| n.to_str())) {
            names.push(name.to_string());
        }
    }
    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn gamepad() -> Device {
        let mut device = Device::new(DeviceKind::Gamepad, "Gamepad");
        device.display_name = "Pad".to_string();
        device.add_action(ActionBinding::bound(
            "Jump",
            Key::from("Gamepad_FaceButton_Bottom"),
            Modifiers {
                ctrl: true,
                ..Modifiers::NONE
            },
        ));
        device.add_action(ActionBinding::unbound("Fire"));
        device.add_axis(AxisBinding::bound("MoveX", Key::from("Gamepad_LeftX"), 0.5));
        device
    }

    #[test]
    fn test_document_field_names() {
        let json = serde_json::to_value(PresetDocument::from_device(&gamepad())).unwrap();
        assert_eq!(json["DeviceType"], "Gamepad");
        assert_eq!(json["DeviceName"], "Pad");
        assert_eq!(json["DeviceString"], "Gamepad");
        assert_eq!(json["Actions"][0]["ActionName"], "Jump");
        assert_eq!(json["Actions"][0]["Key"], "Gamepad_FaceButton_Bottom");
        assert_eq!(json["Actions"][0]["bCtrl"], true);
        assert_eq!(json["Actions"][0]["bCmd"], false);
        assert_eq!(json["Actions"][1]["Key"], "");
        assert_eq!(json["Axises"][0]["AxisName"], "MoveX");
        assert_eq!(json["Axises"][0]["Scale"], 0.5);
    }

    #[test]
    fn test_ctrl_modifier_survives() {
        let device = PresetDocument::from_device(&gamepad()).to_device().unwrap();
        let jump = device.action("Jump").unwrap();
        assert!(jump.modifiers.ctrl);
        assert!(!jump.modifiers.cmd);
    }

    #[test]
    fn test_none_key_is_unbound() {
        let json = r#"{
            "DeviceType": "Keyboard",
            "DeviceName": "Keys",
            "DeviceString": "Keyboard",
            "Actions": [{"ActionName": "Jump", "KeyString": "None", "Key": "None"}],
            "Axises": []
        }"#;
        let document: PresetDocument = serde_json::from_str(json).unwrap();
        let device = document.to_device().unwrap();
        assert!(device.has_action("Jump", false));
        assert!(!device.has_action("Jump", true));
    }

    #[test]
    fn test_unknown_device_type_is_malformed() {
        let mut document = PresetDocument::from_device(&gamepad());
        document.device_type = "Steering".to_string();
        assert!(matches!(document.to_device(), Err(RemapError::Malformed(_))));

        document.device_type = "Unknown".to_string();
        assert!(matches!(document.to_device(), Err(RemapError::Malformed(_))));
    }

    #[test]
    fn test_preset_file_name() {
        let when = Local.with_ymd_and_hms(2024, 3, 7, 9, 5, 1).unwrap();
        assert_eq!(
            preset_file_name("Saitek X52", &when),
            "Saitek X52_2024.03.07-09.05.01.json"
        );
        assert_eq!(preset_file_name("a/b", &when), "a_b_2024.03.07-09.05.01.json");
    }

    #[test]
    fn test_export_import_round_trip() {
        let temp = tempdir().unwrap();
        let dir = temp.path().join("presets").join("nested");

        let path = export_device(&gamepad(), &dir, true).unwrap();
        assert!(path.starts_with(&dir));
        assert!(path.exists());

        let imported = import_device(&path).unwrap();
        assert_eq!(imported.kind, DeviceKind::Gamepad);
        assert_eq!(imported.display_name, "Pad");
        assert_eq!(imported.actions, gamepad().actions);
        assert_eq!(imported.axes, gamepad().axes);
    }

    #[test]
    fn test_overwrite_policy() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("Gamepad_fixed.json");

        export_device_to(&gamepad(), &path, false).unwrap();
        export_device_to(&gamepad(), &path, true).unwrap();
        let err = export_device_to(&gamepad(), &path, false).unwrap_err();
        assert!(matches!(err, RemapError::PresetExists(_)));
    }

    #[test]
    fn test_import_missing_field_fails() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("broken.json");
        fs::write(&path, r#"{"DeviceName": "x"}"#).unwrap();
        assert!(matches!(import_device(&path), Err(RemapError::Malformed(_))));
    }

    #[test]
    fn test_list_presets() {
        let temp = tempdir().unwrap();
        assert!(list_importable_device_presets(&temp.path().join("missing"))
            .unwrap()
            .is_empty());

        fs::write(temp.path().join("b.json"), "{}").unwrap();
        fs::write(temp.path().join("a.JSON"), "{}").unwrap();
        fs::write(temp.path().join("notes.txt"), "").unwrap();
        fs::create_dir(temp.path().join("dir.json")).unwrap();

        assert_eq!(
            list_importable_device_presets(temp.path()).unwrap(),
            vec!["a.JSON".to_string(), "b.json".to_string()]
        );
    }
}
