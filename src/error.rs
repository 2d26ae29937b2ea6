//! Error types for the remapping layer

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the registry, persistence and host plumbing
///
/// Lookups that simply find nothing return `Option` instead; these variants
/// are reserved for operations that had to be aborted.
#[derive(Error, Debug)]
pub enum RemapError {
    #[error("Host mapping table is unavailable")]
    HostUnavailable,

    #[error("Nothing to save: the registry holds no devices")]
    NothingToSave,

    #[error("No saved mapping in slot {0}")]
    SaveMissing(String),

    #[error("Malformed data: {0}")]
    Malformed(String),

    #[error("Unknown device kind: {0}")]
    UnknownDeviceKind(String),

    #[error("Preset already exists: {}", .0.display())]
    PresetExists(PathBuf),

    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Binding not found: {0}")]
    BindingNotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Store error: {0}")]
    Store(#[from] sled::Error),
}

pub type Result<T> = std::result::Result<T, RemapError>;
