//! Per-device axis calibration loaded from the save store

use tracing::{debug, info, warn};

use crate::model::{DeviceKind, PhysicalAxis};
use crate::persistence::{SaveFile, SaveSlot, SaveStore};

#[derive(Debug, Clone)]
struct CalibratedDevice {
    display_string: String,
    axes: Vec<PhysicalAxis>,
}

/// Precached calibration of every unique device
#[derive(Debug, Clone, Default)]
pub struct CalibrationTable {
    devices: Vec<CalibratedDevice>,
}

impl CalibrationTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Keep unique devices only and precache their curves.
    ///
    /// A save from another format version yields an empty table.
    pub fn from_save(save: &SaveFile) -> Self {
        if !save.is_current_version() {
            warn!(
                "Calibration data has version {}, ignoring it",
                save.version
            );
            return Self::empty();
        }

        let devices = save
            .devices
            .iter()
            .filter(|d| d.kind == DeviceKind::Unique)
            .map(|d| CalibratedDevice {
                display_string: d.display_string.clone(),
                axes: d
                    .physical_axes
                    .iter()
                    .map(|axis| {
                        let mut axis = axis.without_cache();
                        axis.precache();
                        axis
                    })
                    .collect(),
            })
            .collect();

        Self { devices }
    }

    /// Load from the save slot; any failure yields an empty table
    pub fn load(store: &dyn SaveStore, slot: &SaveSlot) -> Self {
        let bytes = match store.load(slot) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                debug!("No save in slot {}, joysticks run uncalibrated", slot);
                return Self::empty();
            },
            Err(e) => {
                warn!("Failed to read calibration from slot {}: {}", slot, e);
                return Self::empty();
            },
        };

        match SaveFile::from_bytes(&bytes) {
            Ok(save) => {
                let table = Self::from_save(&save);
                info!(
                    "Loaded calibration for {} joystick(s)",
                    table.devices.len()
                );
                table
            },
            Err(e) => {
                warn!("Ignoring calibration data: {}", e);
                Self::empty()
            },
        }
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Calibration of axis `axis` on the device named `device`.
    ///
    /// An axis index beyond the stored list has no calibration.
    pub fn lookup(&self, device: &str, axis: usize) -> Option<&PhysicalAxis> {
        self.devices
            .iter()
            .find(|d| d.display_string == device)
            .and_then(|d| d.axes.get(axis))
    }
}
