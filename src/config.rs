//! Configuration for the inputmap binary
//!
//! A single YAML file; every section is optional and falls back to defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::manager::ManagerSettings;
use crate::persistence::SaveSlot;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub presets: PresetConfig,
    pub host: HostConfig,
    pub joystick: JoystickConfig,
}

/// Save slot configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    pub slot_name: String,
    pub user_index: u32,
    /// Explicit sled database path; defaults to the state directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            slot_name: "input_mapping".to_string(),
            user_index: 0,
            path: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PresetConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
    pub allow_overwrite: bool,
}

impl Default for PresetConfig {
    fn default() -> Self {
        Self {
            dir: None,
            allow_overwrite: true,
        }
    }
}

/// Host-native mapping table file
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct HostConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mappings: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct JoystickConfig {
    pub enabled: bool,
    pub skip_game_controllers: bool,
    pub poll_interval_ms: u64,
}

impl Default for JoystickConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            skip_game_controllers: true,
            poll_interval_ms: 4,
        }
    }
}

impl JoystickConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

impl AppConfig {
    /// Load configuration from file. A missing file yields defaults.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !fs::try_exists(path).await.unwrap_or(false) {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: AppConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse YAML config: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let yaml = serde_yaml::to_string(self).context("Failed to serialize config to YAML")?;

        fs::write(path, yaml)
            .await
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.store.slot_name.trim().is_empty() {
            anyhow::bail!("store.slot_name cannot be empty");
        }
        if self.joystick.poll_interval_ms == 0 {
            anyhow::bail!("joystick.poll_interval_ms must be at least 1");
        }
        Ok(())
    }

    pub fn save_slot(&self) -> SaveSlot {
        SaveSlot::new(&self.store.slot_name, self.store.user_index)
    }

    /// Manager settings, with `default_presets_dir` used when none is configured
    pub fn manager_settings(&self, default_presets_dir: &Path) -> ManagerSettings {
        ManagerSettings {
            slot: self.save_slot(),
            preset_dir: self
                .presets
                .dir
                .clone()
                .unwrap_or_else(|| default_presets_dir.to_path_buf()),
            allow_overwrite: self.presets.allow_overwrite,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(dir.path().join("config.yaml")).await.unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.store.slot_name, "input_mapping");
        assert!(config.presets.allow_overwrite);
        assert!(config.joystick.skip_game_controllers);
    }

    #[tokio::test]
    async fn test_partial_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        tokio::fs::write(
            &path,
            "store:\n  user_index: 2\njoystick:\n  poll_interval_ms: 10\n",
        )
        .await
        .unwrap();

        let config = AppConfig::load(&path).await.unwrap();
        assert_eq!(config.store.slot_name, "input_mapping");
        assert_eq!(config.store.user_index, 2);
        assert_eq!(config.joystick.poll_interval(), Duration::from_millis(10));
        assert!(config.joystick.enabled);
        assert_eq!(config.save_slot(), SaveSlot::new("input_mapping", 2));
    }

    #[tokio::test]
    async fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");

        let mut config = AppConfig::default();
        config.presets.dir = Some(PathBuf::from("my-presets"));
        config.presets.allow_overwrite = false;
        config.save(&path).await.unwrap();

        let loaded = AppConfig::load(&path).await.unwrap();
        assert_eq!(loaded, config);

        let settings = loaded.manager_settings(Path::new("unused"));
        assert_eq!(settings.preset_dir, PathBuf::from("my-presets"));
        assert!(!settings.allow_overwrite);
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        tokio::fs::write(&path, "store:\n  slot_name: \"  \"\n")
            .await
            .unwrap();
        assert!(AppConfig::load(&path).await.is_err());

        tokio::fs::write(&path, "joystick: nope\n").await.unwrap();
        assert!(AppConfig::load(&path).await.is_err());
    }
}
