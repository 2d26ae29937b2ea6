//! Save format, slot storage and preset files

pub mod preset;
pub mod record;
pub mod store;

pub use preset::{
    export_device, export_device_to, import_device, list_importable_device_presets,
    preset_file_name, PresetDocument,
};
pub use record::{SaveFile, SavedDevice, SAVE_VERSION};
pub use store::{MemoryStore, SaveSlot, SaveStore, SledStore};
