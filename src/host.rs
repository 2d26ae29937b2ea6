//! Host-side collaborators
//!
//! The host owns the native key-binding table and the key registry used by
//! its input dispatch. This crate only reads and writes them through the
//! traits below.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{RemapError, Result};
use crate::model::{Key, Modifiers};

/// Native action entry: name, key, modifiers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionMapping {
    pub action_name: String,
    /// Empty when the host lists the name without a key
    #[serde(default)]
    pub key: String,
    #[serde(flatten)]
    pub modifiers: Modifiers,
}

impl ActionMapping {
    pub fn new(action_name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            action_name: action_name.into(),
            key: key.into(),
            modifiers: Modifiers::NONE,
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

/// Native axis entry: name, key, scale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisMapping {
    pub axis_name: String,
    #[serde(default)]
    pub key: String,
    #[serde(default = "default_scale")]
    pub scale: f32,
}

fn default_scale() -> f32 {
    1.0
}

impl AxisMapping {
    pub fn new(axis_name: impl Into<String>, key: impl Into<String>, scale: f32) -> Self {
        Self {
            axis_name: axis_name.into(),
            key: key.into(),
            scale,
        }
    }
}

/// The host's native mapping table
pub trait HostMappingTable {
    /// Current action entries; fails when the table is unavailable
    fn action_mappings(&self) -> Result<Vec<ActionMapping>>;

    /// Current axis entries; fails when the table is unavailable
    fn axis_mappings(&self) -> Result<Vec<AxisMapping>>;

    /// Clear both native tables and write the given entries
    fn replace_mappings(&mut self, actions: Vec<ActionMapping>, axes: Vec<AxisMapping>) -> Result<()>;

    /// Flush the native tables to host storage
    fn persist(&mut self) -> Result<()>;

    /// Rebuild runtime key maps of every active input consumer
    fn rebuild_key_maps(&mut self);
}

/// Registration details of a synthesized key
#[derive(Debug, Clone, PartialEq)]
pub struct KeyDetails {
    pub key: Key,
    /// Human label, e.g. `Joystick X52 Button 3`
    pub label: String,
    /// Float-valued key
    pub is_axis: bool,
}

/// The host's registry of known keys
pub trait KeyRegistry {
    fn contains(&self, key: &Key) -> bool;

    fn add(&mut self, details: KeyDetails);
}

/// Key registry kept in memory
#[derive(Debug, Default)]
pub struct MemoryKeyRegistry {
    keys: HashMap<Key, KeyDetails>,
}

impl MemoryKeyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &Key) -> Option<&KeyDetails> {
        self.keys.get(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl KeyRegistry for MemoryKeyRegistry {
    fn contains(&self, key: &Key) -> bool {
        self.keys.contains_key(key)
    }

    fn add(&mut self, details: KeyDetails) {
        self.keys.insert(details.key.clone(), details);
    }
}

/// Mapping table held in memory
#[derive(Debug, Clone)]
pub struct MemoryHost {
    pub actions: Vec<ActionMapping>,
    pub axes: Vec<AxisMapping>,
    pub available: bool,
    pub persist_count: usize,
    pub rebuild_count: usize,
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self {
            actions: Vec::new(),
            axes: Vec::new(),
            available: true,
            persist_count: 0,
            rebuild_count: 0,
        }
    }
}

impl MemoryHost {
    pub fn new(actions: Vec<ActionMapping>, axes: Vec<AxisMapping>) -> Self {
        Self {
            actions,
            axes,
            ..Self::default()
        }
    }

    /// A host whose table cannot be reached
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::default()
        }
    }
}

impl HostMappingTable for MemoryHost {
    fn action_mappings(&self) -> Result<Vec<ActionMapping>> {
        if !self.available {
            return Err(RemapError::HostUnavailable);
        }
        Ok(self.actions.clone())
    }

    fn axis_mappings(&self) -> Result<Vec<AxisMapping>> {
        if !self.available {
            return Err(RemapError::HostUnavailable);
        }
        Ok(self.axes.clone())
    }

    fn replace_mappings(&mut self, actions: Vec<ActionMapping>, axes: Vec<AxisMapping>) -> Result<()> {
        if !self.available {
            return Err(RemapError::HostUnavailable);
        }
        self.actions = actions;
        self.axes = axes;
        Ok(())
    }

    fn persist(&mut self) -> Result<()> {
        if !self.available {
            return Err(RemapError::HostUnavailable);
        }
        self.persist_count += 1;
        Ok(())
    }

    fn rebuild_key_maps(&mut self) {
        self.rebuild_count += 1;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct HostFile {
    #[serde(default)]
    actions: Vec<ActionMapping>,
    #[serde(default)]
    axes: Vec<AxisMapping>,
}

/// Mapping table stored as a YAML file
///
/// ```yaml
/// actions:
///   - action_name: Jump
///     key: SpaceBar
///     ctrl: true
/// axes:
///   - axis_name: MoveX
///     key: Gamepad_LeftX
///     scale: 1.0
/// ```
#[derive(Debug)]
pub struct FileHost {
    path: PathBuf,
    table: HostFile,
}

impl FileHost {
    /// Open the table at `path`; a missing file is an empty table
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let table = if path.exists() {
            let text = fs::read_to_string(&path)?;
            serde_yaml::from_str(&text)
                .map_err(|e| RemapError::Malformed(format!("{}: {}", path.display(), e)))?
        } else {
            debug!("Host mapping file {} not found, starting empty", path.display());
            HostFile::default()
        };
        Ok(Self { path, table })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HostMappingTable for FileHost {
    fn action_mappings(&self) -> Result<Vec<ActionMapping>> {
        Ok(self.table.actions.clone())
    }

    fn axis_mappings(&self) -> Result<Vec<AxisMapping>> {
        Ok(self.table.axes.clone())
    }

    fn replace_mappings(&mut self, actions: Vec<ActionMapping>, axes: Vec<AxisMapping>) -> Result<()> {
        self.table = HostFile { actions, axes };
        Ok(())
    }

    fn persist(&mut self) -> Result<()> {
        let yaml = serde_yaml::to_string(&self.table)
            .map_err(|e| RemapError::Malformed(format!("host table: {}", e)))?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, yaml)?;
        info!("Host mapping table written to {}", self.path.display());
        Ok(())
    }

    fn rebuild_key_maps(&mut self) {
        debug!(
            "Key maps rebuilt ({} actions, {} axes)",
            self.table.actions.len(),
            self.table.axes.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_unavailable_host_fails() {
        let mut host = MemoryHost::unavailable();
        assert!(matches!(host.action_mappings(), Err(RemapError::HostUnavailable)));
        assert!(host.replace_mappings(Vec::new(), Vec::new()).is_err());
        assert!(host.persist().is_err());
    }

    #[test]
    fn test_file_host_round_trip() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("host").join("mappings.yaml");

        let mut host = FileHost::open(&path).unwrap();
        assert!(host.action_mappings().unwrap().is_empty());

        let jump = ActionMapping::new("Jump", "SpaceBar").with_modifiers(Modifiers {
            ctrl: true,
            ..Modifiers::NONE
        });
        host.replace_mappings(vec![jump.clone()], vec![AxisMapping::new("MoveX", "Gamepad_LeftX", -1.0)])
            .unwrap();
        host.persist().unwrap();

        let reopened = FileHost::open(&path).unwrap();
        assert_eq!(reopened.action_mappings().unwrap(), vec![jump]);
        assert_eq!(reopened.axis_mappings().unwrap()[0].scale, -1.0);
    }

    #[test]
    fn test_file_host_yaml_defaults() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("mappings.yaml");
        fs::write(
            &path,
            "actions:\n  - action_name: Jump\n    key: SpaceBar\n    shift: true\naxes:\n  - axis_name: Look\n",
        )
        .unwrap();

        let host = FileHost::open(&path).unwrap();
        let actions = host.action_mappings().unwrap();
        assert!(actions[0].modifiers.shift);
        assert!(!actions[0].modifiers.alt);

        let axes = host.axis_mappings().unwrap();
        assert_eq!(axes[0].key, "");
        assert_eq!(axes[0].scale, 1.0);
    }

    #[test]
    fn test_file_host_malformed() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("mappings.yaml");
        fs::write(&path, "actions: 12").unwrap();
        assert!(matches!(FileHost::open(&path), Err(RemapError::Malformed(_))));
    }

    #[test]
    fn test_key_registry() {
        let mut registry = MemoryKeyRegistry::new();
        let key = Key::from("Joystick_X52_Axis_0");
        assert!(!registry.contains(&key));
        registry.add(KeyDetails {
            key: key.clone(),
            label: "Joystick X52 Axis 0".to_string(),
            is_axis: true,
        });
        assert!(registry.contains(&key));
        assert!(registry.get(&key).unwrap().is_axis);
    }
}
