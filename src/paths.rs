//! Application paths for portable and installed modes.
//!
//! - **Portable mode**: a `.portable` marker next to the executable keeps
//!   config, save store and presets in that directory.
//! - **Installed mode** (default): everything lives under the platform data
//!   directory (`dirs::data_dir()`), in an `inputmap` folder.

use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::debug;

/// Directory name used in installed mode
const APP_NAME: &str = "inputmap";

/// Marker file enabling portable mode
const PORTABLE_MARKER: &str = ".portable";

#[derive(Debug, Clone, PartialEq)]
pub struct AppPaths {
    /// Configuration file
    pub config: PathBuf,
    /// State directory holding the sled save store
    pub state_dir: PathBuf,
    /// Default preset export/import directory
    pub presets_dir: PathBuf,
    pub is_portable: bool,
}

impl AppPaths {
    /// Detect paths from the executable location.
    ///
    /// Called before logging is initialized.
    pub fn detect() -> Self {
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."));

        if exe_dir.join(PORTABLE_MARKER).exists() {
            return Self::portable(&exe_dir);
        }

        let base = dirs::data_dir()
            .unwrap_or_else(|| {
                eprintln!("[paths] WARNING: no platform data dir, falling back to exe dir");
                exe_dir.clone()
            })
            .join(APP_NAME);
        Self::installed(&base)
    }

    /// Everything in `dir`, with a hidden state directory
    pub fn portable(dir: &Path) -> Self {
        Self {
            config: dir.join("config.yaml"),
            state_dir: dir.join(".state"),
            presets_dir: dir.join("presets"),
            is_portable: true,
        }
    }

    pub fn installed(base: &Path) -> Self {
        Self {
            config: base.join("config.yaml"),
            state_dir: base.join("state"),
            presets_dir: base.join("presets"),
            is_portable: false,
        }
    }

    /// Same layout with the config file replaced
    pub fn with_config(mut self, config: impl Into<PathBuf>) -> Self {
        self.config = config.into();
        self
    }

    /// Base directory (for displaying in logs)
    pub fn base_dir(&self) -> PathBuf {
        self.config
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Create every directory that does not exist yet
    pub fn ensure_directories(&self) -> anyhow::Result<()> {
        let config_dir = self.base_dir();
        for dir in [&self.state_dir, &self.presets_dir, &config_dir] {
            if !dir.exists() {
                debug!("Creating directory: {}", dir.display());
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create {}", dir.display()))?;
            }
        }
        Ok(())
    }

    /// sled database path (within `state_dir`)
    pub fn sled_db_path(&self) -> PathBuf {
        self.state_dir.join("sled")
    }

    /// Default host mapping table file
    pub fn host_mappings(&self) -> PathBuf {
        self.base_dir().join("mappings.yaml")
    }
}
