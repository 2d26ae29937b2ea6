//! Versioned save format
//!
//! The registry is lowered into plain records and serialized as JSON bytes.
//! Calibration is always stored in half-curve form.

use serde::{Deserialize, Serialize};

use crate::error::{RemapError, Result};
use crate::model::{ActionBinding, AxisBinding, Device, DeviceKind, DeviceRegistry, PhysicalAxis};

/// Version written into every save
pub const SAVE_VERSION: u32 = 1;

/// Persisted form of one device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedDevice {
    pub kind: DeviceKind,
    pub display_name: String,
    pub display_string: String,
    #[serde(default)]
    pub actions: Vec<ActionBinding>,
    #[serde(default)]
    pub axes: Vec<AxisBinding>,
    #[serde(default)]
    pub physical_buttons: Vec<String>,
    #[serde(default)]
    pub physical_axes: Vec<PhysicalAxis>,
}

impl SavedDevice {
    pub fn from_device(device: &Device) -> Self {
        Self {
            kind: device.kind,
            display_name: device.display_name.clone(),
            display_string: device.display_string.clone(),
            actions: device.actions.clone(),
            axes: device.axes.clone(),
            physical_buttons: device.physical_buttons.clone(),
            physical_axes: device
                .physical_axes
                .iter()
                .map(PhysicalAxis::without_cache)
                .collect(),
        }
    }

    /// Build a fresh, clean device from this record
    pub fn to_device(&self) -> Result<Device> {
        if self.display_string.is_empty() {
            return Err(RemapError::Malformed(
                "saved device has no display string".to_string(),
            ));
        }

        let mut device = Device::new(self.kind, self.display_string.as_str());
        device.display_name = self.display_name.clone();
        device.actions = self.actions.clone();
        device.axes = self.axes.clone();
        device.physical_buttons = self.physical_buttons.clone();
        device.physical_axes = self
            .physical_axes
            .iter()
            .map(PhysicalAxis::without_cache)
            .collect();
        Ok(device)
    }
}

/// Persisted registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveFile {
    pub version: u32,
    #[serde(default)]
    pub devices: Vec<SavedDevice>,
    #[serde(default)]
    pub action_names: Vec<String>,
    #[serde(default)]
    pub axis_names: Vec<String>,
}

impl SaveFile {
    pub fn from_registry(registry: &DeviceRegistry) -> Self {
        Self {
            version: SAVE_VERSION,
            devices: registry
                .devices()
                .iter()
                .map(SavedDevice::from_device)
                .collect(),
            action_names: registry.action_names().to_vec(),
            axis_names: registry.axis_names().to_vec(),
        }
    }

    pub fn is_current_version(&self) -> bool {
        self.version == SAVE_VERSION
    }

    /// Rebuild a registry verbatim.
    ///
    /// Every device is constructed before anything is returned, so a bad
    /// record leaves the caller's registry untouched.
    pub fn to_registry(&self) -> Result<DeviceRegistry> {
        let devices = self
            .devices
            .iter()
            .map(SavedDevice::to_device)
            .collect::<Result<Vec<_>>>()?;
        Ok(DeviceRegistry::from_parts(
            devices,
            self.action_names.clone(),
            self.axis_names.clone(),
        ))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes)
            .map_err(|e| RemapError::Malformed(format!("save data: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CurvePoint, InputRange, Key, Modifiers};

    fn joystick_record() -> SavedDevice {
        SavedDevice {
            kind: DeviceKind::Unique,
            display_name: "Flight stick".to_string(),
            display_string: "X52".to_string(),
            actions: vec![
                ActionBinding::bound(
                    "Fire",
                    Key::from("Joystick_X52_Button_0"),
                    Modifiers {
                        shift: true,
                        ..Modifiers::NONE
                    },
                ),
                ActionBinding::unbound("Jump"),
            ],
            axes: vec![AxisBinding::bound("Pitch", Key::from("Joystick_X52_Axis_1"), -1.0)],
            physical_buttons: vec!["Trigger".to_string()],
            physical_axes: vec![PhysicalAxis::new("1")
                .with_points(vec![CurvePoint::new(0.5, 0.8)])
                .with_input_range(InputRange::Halved)],
        }
    }

    #[test]
    fn test_device_record_round_trip() {
        let record = joystick_record();
        let device = record.to_device().unwrap();
        assert!(!device.is_dirty());
        assert_eq!(SavedDevice::from_device(&device), record);
    }

    #[test]
    fn test_precached_axis_saved_as_half_curve() {
        let mut device = joystick_record().to_device().unwrap();
        device.physical_axes[0].precache();

        let record = SavedDevice::from_device(&device);
        assert!(!record.physical_axes[0].is_precached());
        assert_eq!(record, joystick_record());

        let restored = record.to_device().unwrap();
        assert!(!restored.physical_axes[0].is_precached());
    }

    #[test]
    fn test_save_file_bytes_round_trip() {
        let save = SaveFile {
            version: SAVE_VERSION,
            devices: vec![joystick_record()],
            action_names: vec!["Fire".to_string(), "Jump".to_string()],
            axis_names: vec!["Pitch".to_string()],
        };

        let bytes = save.to_bytes().unwrap();
        let restored = SaveFile::from_bytes(&bytes).unwrap();
        assert_eq!(restored, save);

        let registry = restored.to_registry().unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(SaveFile::from_registry(&registry), save);
    }

    #[test]
    fn test_malformed_bytes() {
        let err = SaveFile::from_bytes(b"{\"devices\": 3}").unwrap_err();
        assert!(matches!(err, RemapError::Malformed(_)));
    }

    #[test]
    fn test_bad_device_fails_whole_registry() {
        let mut broken = joystick_record();
        broken.display_string.clear();
        let save = SaveFile {
            version: SAVE_VERSION,
            devices: vec![joystick_record(), broken],
            action_names: Vec::new(),
            axis_names: Vec::new(),
        };
        assert!(save.to_registry().is_err());
    }
}
