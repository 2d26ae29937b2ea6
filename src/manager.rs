//! Mapping manager - load/save/apply orchestration
//!
//! Owns the device registry and moves it between three places:
//! - the host's native mapping table (load from host, apply to host)
//! - the save store (load from save, save)
//! - preset files (export, import)
//!
//! State machine: `Uninitialized -> Loaded(Host | Save) -> Applied`, with
//! edits moving `Applied` back to `Loaded`.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{RemapError, Result};
use crate::host::{ActionMapping, AxisMapping, HostMappingTable};
use crate::model::{
    compactify_names, fill_missing_bindings, sort_alphabetically, ActionBinding, AxisBinding,
    Device, DeviceRegistry, Key, Modifiers, ReconcileReport,
};
use crate::persistence::{self, SaveFile, SaveSlot, SaveStore};

/// Where the registry was last loaded from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    Host,
    Save,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerState {
    Uninitialized,
    Loaded(LoadSource),
    Applied,
}

/// Manager settings
#[derive(Debug, Clone)]
pub struct ManagerSettings {
    pub slot: SaveSlot,
    pub preset_dir: PathBuf,
    pub allow_overwrite: bool,
}

impl Default for ManagerSettings {
    fn default() -> Self {
        Self {
            slot: SaveSlot::new("input_mapping", 0),
            preset_dir: PathBuf::from("presets"),
            allow_overwrite: true,
        }
    }
}

/// Lower every bound binding of every device into native host entries.
///
/// Shared by the direct apply path and the save, load, apply path so both
/// produce identical host tables.
pub fn lower_bindings(registry: &DeviceRegistry) -> (Vec<ActionMapping>, Vec<AxisMapping>) {
    let mut actions = Vec::new();
    let mut axes = Vec::new();

    for device in registry.devices() {
        for action in &device.actions {
            if let Some(key) = &action.key {
                actions.push(ActionMapping {
                    action_name: action.action_name.clone(),
                    key: key.as_str().to_string(),
                    modifiers: action.modifiers,
                });
            }
        }
        for axis in &device.axes {
            if let Some(key) = &axis.key {
                axes.push(AxisMapping {
                    axis_name: axis.axis_name.clone(),
                    key: key.as_str().to_string(),
                    scale: axis.scale,
                });
            }
        }
    }

    (actions, axes)
}

pub struct MappingManager<H, S> {
    host: H,
    store: S,
    settings: ManagerSettings,
    registry: DeviceRegistry,
    state: ManagerState,
    source: Option<LoadSource>,
}

impl<H: HostMappingTable, S: SaveStore> MappingManager<H, S> {
    pub fn new(host: H, store: S, settings: ManagerSettings) -> Self {
        Self {
            host,
            store,
            settings,
            registry: DeviceRegistry::new(),
            state: ManagerState::Uninitialized,
            source: None,
        }
    }

    pub fn state(&self) -> ManagerState {
        self.state
    }

    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn settings(&self) -> &ManagerSettings {
        &self.settings
    }

    fn loaded(&mut self, source: LoadSource) {
        self.source = Some(source);
        self.state = ManagerState::Loaded(source);
    }

    /// Registry changed after a load: leave `Applied`
    fn edited(&mut self) {
        if self.state == ManagerState::Applied {
            self.state = ManagerState::Loaded(self.source.unwrap_or(LoadSource::Host));
        }
    }

    /// Rebuild the registry from the host's native mapping table.
    ///
    /// Fails only when the table is unavailable; the registry is left
    /// untouched in that case.
    pub fn load_from_host(&mut self) -> Result<()> {
        let actions = self.host.action_mappings()?;
        let axes = self.host.axis_mappings()?;

        self.registry.clear();

        for mapping in actions {
            self.registry.note_action_name(&mapping.action_name);
            if mapping.key.is_empty() {
                self.registry
                    .record_ungrouped_action(ActionBinding::unbound(mapping.action_name.as_str()));
                continue;
            }

            let binding = ActionBinding::bound(
                mapping.action_name.as_str(),
                Key::new(mapping.key.as_str()),
                mapping.modifiers,
            );
            self.registry.record_ungrouped_action(binding.clone());

            match self.registry.device_for_key(&mapping.key) {
                Some(device) => {
                    if !device.add_action(binding) {
                        debug!(
                            "Action {} already bound on {}, ignoring {}",
                            mapping.action_name, device.display_string, mapping.key
                        );
                    }
                },
                None => debug!("No device for key {}", mapping.key),
            }
        }

        for mapping in axes {
            self.registry.note_axis_name(&mapping.axis_name);
            if mapping.key.is_empty() {
                self.registry
                    .record_ungrouped_axis(AxisBinding::unbound(mapping.axis_name.as_str()));
                continue;
            }

            let binding = AxisBinding::bound(
                mapping.axis_name.as_str(),
                Key::new(mapping.key.as_str()),
                mapping.scale,
            );
            self.registry.record_ungrouped_axis(binding.clone());

            match self.registry.device_for_key(&mapping.key) {
                Some(device) => {
                    if !device.add_axis(binding) {
                        debug!(
                            "Axis {} already bound on {}, ignoring {}",
                            mapping.axis_name, device.display_string, mapping.key
                        );
                    }
                },
                None => debug!("No device for key {}", mapping.key),
            }
        }

        self.registry.normalize_all();
        self.loaded(LoadSource::Host);

        info!(
            "Loaded {} device(s) from host ({} actions, {} axes)",
            self.registry.len(),
            self.registry.action_names().len(),
            self.registry.axis_names().len()
        );
        Ok(())
    }

    /// Load the registry from the save slot.
    ///
    /// Without a save, with `force_default`, or with a save from another
    /// format version, the registry is bootstrapped from the host and
    /// immediately persisted.
    pub fn load_from_save(&mut self, force_default: bool) -> Result<LoadSource> {
        let slot = self.settings.slot.clone();

        if force_default || !self.store.exists(&slot)? {
            debug!("Bootstrapping slot {} from host", slot);
            return self.bootstrap_from_host();
        }

        let bytes = self
            .store
            .load(&slot)?
            .ok_or_else(|| RemapError::SaveMissing(slot.to_string()))?;
        let save = SaveFile::from_bytes(&bytes)?;

        if !save.is_current_version() {
            warn!(
                "Save in slot {} has version {}, expected {}; reloading from host",
                slot,
                save.version,
                persistence::SAVE_VERSION
            );
            return self.bootstrap_from_host();
        }

        if save.devices.is_empty() {
            return Err(RemapError::Malformed(format!(
                "save in slot {} holds no devices",
                slot
            )));
        }

        // Built aside; only committed once every device parsed
        let registry = save.to_registry()?;
        self.registry = registry;
        self.loaded(LoadSource::Save);

        info!(
            "Loaded {} device(s) from slot {}",
            self.registry.len(),
            slot
        );
        Ok(LoadSource::Save)
    }

    fn bootstrap_from_host(&mut self) -> Result<LoadSource> {
        self.load_from_host()?;
        if let Err(e) = self.save() {
            warn!("Could not persist bootstrapped mapping: {}", e);
        }
        Ok(LoadSource::Host)
    }

    /// Persist the full registry to the save slot
    pub fn save(&self) -> Result<()> {
        if self.registry.is_empty() {
            return Err(RemapError::NothingToSave);
        }

        let bytes = SaveFile::from_registry(&self.registry).to_bytes()?;
        self.store.save(&self.settings.slot, &bytes)?;

        info!(
            "Saved {} device(s) to slot {}",
            self.registry.len(),
            self.settings.slot
        );
        Ok(())
    }

    /// Push bindings into the host's native tables.
    ///
    /// Returns `Ok(false)` without touching the host when nothing is dirty
    /// and `force` is not set.
    pub fn apply_to_host(&mut self, force: bool) -> Result<bool> {
        if !force && !self.registry.is_dirty() {
            debug!("Nothing changed, skipping apply");
            return Ok(false);
        }

        let (actions, axes) = lower_bindings(&self.registry);
        let counts = (actions.len(), axes.len());
        self.host.replace_mappings(actions, axes)?;
        self.host.rebuild_key_maps();

        self.registry.clear_dirty();
        self.state = ManagerState::Applied;

        info!(
            "Applied {} action(s) and {} axis binding(s) to host",
            counts.0, counts.1
        );
        Ok(true)
    }

    /// Apply, then flush the host table to its own storage
    pub fn apply_and_persist(&mut self, force: bool) -> Result<bool> {
        let applied = self.apply_to_host(force)?;
        if applied {
            self.host.persist()?;
        }
        Ok(applied)
    }

    /// Load from save (or bootstrap) then force-apply. Never aborts.
    ///
    /// The host table is left alone when the load fails.
    pub fn startup(&mut self) -> ManagerState {
        match self.load_from_save(false) {
            Ok(source) => info!("Input mapping loaded from {:?}", source),
            Err(e) => {
                warn!("Failed to load input mapping, host table left untouched: {}", e);
                return self.state;
            },
        }

        match self.apply_to_host(true) {
            Ok(_) => info!("Input mapping applied to host"),
            Err(e) => warn!("Failed to apply input mapping: {}", e),
        }

        self.state
    }

    /// Make the global name lists match the host table exactly
    pub fn reconcile_with_host(&mut self) -> Result<ReconcileReport> {
        let mut action_names: Vec<String> = Vec::new();
        for mapping in self.host.action_mappings()? {
            if !action_names.contains(&mapping.action_name) {
                action_names.push(mapping.action_name);
            }
        }
        let mut axis_names: Vec<String> = Vec::new();
        for mapping in self.host.axis_mappings()? {
            if !axis_names.contains(&mapping.axis_name) {
                axis_names.push(mapping.axis_name);
            }
        }

        let report = self.registry.reconcile(&action_names, &axis_names);
        if !report.is_empty() {
            info!(
                "Reconciled with host: +{} -{} actions, +{} -{} axes",
                report.added_actions.len(),
                report.removed_actions.len(),
                report.added_axes.len(),
                report.removed_axes.len()
            );
            self.edited();
        }
        Ok(report)
    }

    fn device_mut(&mut self, device: &str) -> Result<&mut Device> {
        self.registry
            .lookup_mut(device)
            .ok_or_else(|| RemapError::DeviceNotFound(device.to_string()))
    }

    pub fn rebind_action(
        &mut self,
        device: &str,
        action: &str,
        key: Key,
        modifiers: Modifiers,
    ) -> Result<()> {
        if !self.device_mut(device)?.rebind_action(action, key, modifiers) {
            return Err(RemapError::BindingNotFound(action.to_string()));
        }
        self.edited();
        Ok(())
    }

    pub fn rebind_axis(&mut self, device: &str, axis: &str, key: Key, scale: f32) -> Result<()> {
        if !self.device_mut(device)?.rebind_axis(axis, key, scale) {
            return Err(RemapError::BindingNotFound(axis.to_string()));
        }
        self.edited();
        Ok(())
    }

    pub fn unbind_action(&mut self, device: &str, action: &str) -> Result<()> {
        if !self.device_mut(device)?.unbind_action(action) {
            return Err(RemapError::BindingNotFound(action.to_string()));
        }
        self.edited();
        Ok(())
    }

    pub fn unbind_axis(&mut self, device: &str, axis: &str) -> Result<()> {
        if !self.device_mut(device)?.unbind_axis(axis) {
            return Err(RemapError::BindingNotFound(axis.to_string()));
        }
        self.edited();
        Ok(())
    }

    /// Export one device into the preset directory
    pub fn export_device(&self, device: &str) -> Result<PathBuf> {
        let device = self
            .registry
            .lookup(device)
            .ok_or_else(|| RemapError::DeviceNotFound(device.to_string()))?;
        persistence::export_device(device, &self.settings.preset_dir, self.settings.allow_overwrite)
    }

    /// Import a preset, replacing any device with the same identity.
    ///
    /// Binding names carried by the preset join the global name lists and are
    /// backfilled into every other device.
    ///
    /// Returns the replaced device. A preset that fails to parse leaves the
    /// registry untouched.
    pub fn import_preset(&mut self, path: &Path) -> Result<Option<Device>> {
        let mut device = persistence::import_device(path)?;

        self.registry.adopt_names_from(&device);
        fill_missing_bindings(
            &mut device,
            self.registry.action_names(),
            self.registry.axis_names(),
        );
        sort_alphabetically(&mut device);
        compactify_names(&mut device);
        device.mark_dirty();

        info!(
            "Imported {} device {} from {}",
            device.kind,
            device.display_string,
            path.display()
        );
        let replaced = self.registry.replace_device(device);
        self.edited();
        Ok(replaced)
    }

    /// Import a preset from the preset directory by file name
    pub fn import_preset_named(&mut self, file_name: &str) -> Result<Option<Device>> {
        let path = self.settings.preset_dir.join(file_name);
        self.import_preset(&path)
    }

    /// Preset files available in the preset directory
    pub fn list_presets(&self) -> Result<Vec<String>> {
        persistence::list_importable_device_presets(&self.settings.preset_dir)
    }
}
