//! In-memory device registry
//!
//! Holds every known device plus the global action and axis name lists.
//! Entries are rebuilt wholesale on every load pass; [`DeviceRegistry::clear`]
//! runs first so no stale state survives.

use std::fmt;

use tracing::debug;

use super::device::{compactify_names, fill_missing_bindings, sort_alphabetically, Device};
use super::types::{ActionBinding, AxisBinding, DeviceKind};

#[derive(Debug, Clone, Default)]
pub struct DeviceRegistry {
    devices: Vec<Device>,
    action_names: Vec<String>,
    axis_names: Vec<String>,
    /// Every host action entry seen during the last load pass
    ungrouped_actions: Vec<ActionBinding>,
    /// Every host axis entry seen during the last load pass
    ungrouped_axes: Vec<AxisBinding>,
}

/// Outcome of an explicit reconciliation pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcileReport {
    pub added_actions: Vec<String>,
    pub removed_actions: Vec<String>,
    pub added_axes: Vec<String>,
    pub removed_axes: Vec<String>,
    /// Display strings of devices that lost bindings
    pub pruned_devices: Vec<String>,
}

impl ReconcileReport {
    pub fn is_empty(&self) -> bool {
        self.added_actions.is_empty()
            && self.removed_actions.is_empty()
            && self.added_axes.is_empty()
            && self.removed_axes.is_empty()
    }
}

/// Per-device binding counts for debug listings
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceSummary {
    pub kind: DeviceKind,
    pub display_string: String,
    pub display_name: String,
    pub bound_actions: usize,
    pub total_actions: usize,
    pub bound_axes: usize,
    pub total_axes: usize,
    pub dirty: bool,
}

impl fmt::Display for DeviceSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] actions {}/{} axes {}/{}{}",
            self.display_name,
            self.kind,
            self.bound_actions,
            self.total_actions,
            self.bound_axes,
            self.total_axes,
            if self.dirty { " *" } else { "" }
        )
    }
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a registry from already-constructed parts
    pub fn from_parts(devices: Vec<Device>, action_names: Vec<String>, axis_names: Vec<String>) -> Self {
        Self {
            devices,
            action_names,
            axis_names,
            ungrouped_actions: Vec::new(),
            ungrouped_axes: Vec::new(),
        }
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn devices_mut(&mut self) -> impl Iterator<Item = &mut Device> {
        self.devices.iter_mut()
    }

    pub fn action_names(&self) -> &[String] {
        &self.action_names
    }

    pub fn axis_names(&self) -> &[String] {
        &self.axis_names
    }

    pub fn ungrouped_actions(&self) -> &[ActionBinding] {
        &self.ungrouped_actions
    }

    pub fn ungrouped_axes(&self) -> &[AxisBinding] {
        &self.ungrouped_axes
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn find_by_kind(&self, kind: DeviceKind) -> Option<&Device> {
        self.devices.iter().find(|d| d.kind == kind)
    }

    pub fn find_by_display_string(&self, name: &str) -> Option<&Device> {
        self.devices.iter().find(|d| d.display_string == name)
    }

    pub fn find_by_display_string_mut(&mut self, name: &str) -> Option<&mut Device> {
        self.devices.iter_mut().find(|d| d.display_string == name)
    }

    /// Look a device up by display string, falling back to a case-insensitive
    /// match on the display string or the user label
    pub fn lookup(&self, name: &str) -> Option<&Device> {
        self.find_by_display_string(name).or_else(|| {
            self.devices.iter().find(|d| {
                d.display_string.eq_ignore_ascii_case(name)
                    || d.display_name.eq_ignore_ascii_case(name)
            })
        })
    }

    pub fn lookup_mut(&mut self, name: &str) -> Option<&mut Device> {
        let index = self
            .lookup(name)
            .and_then(|found| {
                self.devices
                    .iter()
                    .position(|d| d.display_string == found.display_string)
            })?;
        self.devices.get_mut(index)
    }

    /// The device that would own `key`, if registered
    pub fn find_for_key_mut(&mut self, key: &str) -> Option<&mut Device> {
        self.devices.iter_mut().find(|d| d.owns_key(key))
    }

    /// Create a device for the hardware that produces `key`.
    ///
    /// Returns `None` when the key cannot be classified or a device with the
    /// same identity already exists. Standard kinds are unique per kind,
    /// unique devices per display string.
    pub fn create_device(&mut self, key: &str) -> Option<&mut Device> {
        let device = Device::from_key(key)?;
        if self.find_same(&device).is_some() {
            return None;
        }
        debug!("Creating device {} ({})", device.display_string, device.kind);
        self.devices.push(device);
        self.devices.last_mut()
    }

    /// Existing owner of `key`, or a newly created one
    pub fn device_for_key(&mut self, key: &str) -> Option<&mut Device> {
        if let Some(index) = self.devices.iter().position(|d| d.owns_key(key)) {
            return self.devices.get_mut(index);
        }
        self.create_device(key)
    }

    fn find_same(&self, device: &Device) -> Option<usize> {
        self.devices.iter().position(|d| {
            d.kind == device.kind
                && (d.kind != DeviceKind::Unique || d.display_string == device.display_string)
        })
    }

    /// Insert `device`, replacing any device with the same identity.
    ///
    /// Returns the replaced device.
    pub fn replace_device(&mut self, device: Device) -> Option<Device> {
        let previous = self.find_same(&device).map(|i| self.devices.remove(i));
        self.devices.push(device);
        previous
    }

    pub fn remove_device(&mut self, display_string: &str) -> Option<Device> {
        let index = self
            .devices
            .iter()
            .position(|d| d.display_string == display_string)?;
        Some(self.devices.remove(index))
    }

    /// Record an action name; returns whether it was new
    pub fn note_action_name(&mut self, name: &str) -> bool {
        if name.is_empty() || self.action_names.iter().any(|n| n == name) {
            return false;
        }
        self.action_names.push(name.to_string());
        true
    }

    /// Record an axis name; returns whether it was new
    pub fn note_axis_name(&mut self, name: &str) -> bool {
        if name.is_empty() || self.axis_names.iter().any(|n| n == name) {
            return false;
        }
        self.axis_names.push(name.to_string());
        true
    }

    pub fn record_ungrouped_action(&mut self, binding: ActionBinding) {
        self.ungrouped_actions.push(binding);
    }

    pub fn record_ungrouped_axis(&mut self, binding: AxisBinding) {
        self.ungrouped_axes.push(binding);
    }

    /// Adopt every binding name of `device` into the global lists, then
    /// backfill the new names into all registered devices.
    ///
    /// Returns whether any name was new.
    pub fn adopt_names_from(&mut self, device: &Device) -> bool {
        let mut grew = false;
        for action in &device.actions {
            grew |= self.note_action_name(&action.action_name);
        }
        for axis in &device.axes {
            grew |= self.note_axis_name(&axis.axis_name);
        }
        if grew {
            self.fill_all();
        }
        grew
    }

    /// Fill missing bindings on every device
    pub fn fill_all(&mut self) {
        for device in &mut self.devices {
            fill_missing_bindings(device, &self.action_names, &self.axis_names);
        }
    }

    /// Fill, sort and compact every device
    pub fn normalize_all(&mut self) {
        for device in &mut self.devices {
            fill_missing_bindings(device, &self.action_names, &self.axis_names);
            sort_alphabetically(device);
            compactify_names(device);
        }
    }

    /// Drop every device, name and cached entry
    pub fn clear(&mut self) {
        self.devices.clear();
        self.action_names.clear();
        self.axis_names.clear();
        self.ungrouped_actions.clear();
        self.ungrouped_axes.clear();
    }

    pub fn is_dirty(&self) -> bool {
        self.devices.iter().any(Device::is_dirty)
    }

    pub fn clear_dirty(&mut self) {
        self.devices.iter_mut().for_each(Device::clear_dirty);
    }

    /// Make the global name lists match `action_names` and `axis_names`
    /// exactly, pruning stale bindings from every device and adding slots
    /// for new names.
    pub fn reconcile(&mut self, action_names: &[String], axis_names: &[String]) -> ReconcileReport {
        let mut report = ReconcileReport {
            added_actions: missing_from(action_names, &self.action_names),
            removed_actions: missing_from(&self.action_names, action_names),
            added_axes: missing_from(axis_names, &self.axis_names),
            removed_axes: missing_from(&self.axis_names, axis_names),
            pruned_devices: Vec::new(),
        };

        self.action_names = dedup(action_names);
        self.axis_names = dedup(axis_names);

        for device in &mut self.devices {
            if device.retain_known(&self.action_names, &self.axis_names) {
                report.pruned_devices.push(device.display_string.clone());
            }
            let before = (device.actions.len(), device.axes.len());
            fill_missing_bindings(device, &self.action_names, &self.axis_names);
            if before != (device.actions.len(), device.axes.len()) {
                device.mark_dirty();
            }
            sort_alphabetically(device);
        }

        report
    }

    pub fn summary(&self) -> Vec<DeviceSummary> {
        self.devices
            .iter()
            .map(|d| DeviceSummary {
                kind: d.kind,
                display_string: d.display_string.clone(),
                display_name: d.display_name.clone(),
                bound_actions: d.bound_action_count(),
                total_actions: d.actions.len(),
                bound_axes: d.bound_axis_count(),
                total_axes: d.axes.len(),
                dirty: d.is_dirty(),
            })
            .collect()
    }
}

fn missing_from(wanted: &[String], present: &[String]) -> Vec<String> {
    dedup(wanted)
        .into_iter()
        .filter(|name| !present.contains(name))
        .collect()
}

fn dedup(names: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        if !name.is_empty() && !out.contains(name) {
            out.push(name.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::types::{Key, Modifiers};

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_create_device_unique_per_kind() {
        let mut registry = DeviceRegistry::new();
        assert!(registry.create_device("SpaceBar").is_some());
        assert!(registry.create_device("LeftShift").is_none());
        assert!(registry.create_device("Gamepad_LeftX").is_some());
        assert!(registry.create_device("").is_none());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_create_device_unique_by_display_string() {
        let mut registry = DeviceRegistry::new();
        assert!(registry.create_device("Joystick_X52_Button_0").is_some());
        assert!(registry.create_device("Joystick_T16000M_Button_0").is_some());
        assert!(registry.create_device("Joystick_X52_Axis_1").is_none());
        assert_eq!(registry.len(), 2);
        assert!(registry.find_by_display_string("T16000M").is_some());
    }

    #[test]
    fn test_lookups_return_none_when_absent() {
        let registry = DeviceRegistry::new();
        assert!(registry.find_by_kind(DeviceKind::Mouse).is_none());
        assert!(registry.find_by_display_string("Mouse").is_none());
        assert!(registry.lookup("mouse").is_none());
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let mut registry = DeviceRegistry::new();
        registry.create_device("MouseX");
        assert!(registry.lookup("mouse").is_some());
        assert!(registry.lookup_mut("MOUSE").is_some());
    }

    #[test]
    fn test_device_for_key_reuses_owner() {
        let mut registry = DeviceRegistry::new();
        registry
            .device_for_key("SpaceBar")
            .unwrap()
            .add_action(ActionBinding::bound("Jump", Key::from("SpaceBar"), Modifiers::NONE));
        registry
            .device_for_key("E")
            .unwrap()
            .add_action(ActionBinding::bound("Use", Key::from("E"), Modifiers::NONE));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.devices()[0].actions.len(), 2);
    }

    #[test]
    fn test_replace_device() {
        let mut registry = DeviceRegistry::new();
        registry.create_device("SpaceBar");
        let mut keyboard = Device::new(DeviceKind::Keyboard, "Keyboard");
        keyboard.display_name = "My keys".into();

        let previous = registry.replace_device(keyboard).unwrap();
        assert_eq!(previous.display_name, "Keyboard");
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.devices()[0].display_name, "My keys");
    }

    #[test]
    fn test_note_names_grow_monotonically() {
        let mut registry = DeviceRegistry::new();
        assert!(registry.note_action_name("Jump"));
        assert!(!registry.note_action_name("Jump"));
        assert!(!registry.note_action_name(""));
        assert!(registry.note_axis_name("MoveX"));
        assert_eq!(registry.action_names(), &names(&["Jump"])[..]);
    }

    #[test]
    fn test_clear_drops_everything() {
        let mut registry = DeviceRegistry::new();
        registry.create_device("SpaceBar");
        registry.note_action_name("Jump");
        registry.note_axis_name("MoveX");
        registry.record_ungrouped_action(ActionBinding::unbound("Jump"));
        registry.record_ungrouped_axis(AxisBinding::unbound("MoveX"));

        registry.clear();
        assert!(registry.is_empty());
        assert!(registry.action_names().is_empty());
        assert!(registry.axis_names().is_empty());
        assert!(registry.ungrouped_actions().is_empty());
        assert!(registry.ungrouped_axes().is_empty());
    }

    #[test]
    fn test_adopt_names_backfills() {
        let mut registry = DeviceRegistry::new();
        registry.create_device("SpaceBar");
        registry.note_action_name("Jump");
        registry.normalize_all();

        let mut imported = Device::new(DeviceKind::Mouse, "Mouse");
        imported.add_action(ActionBinding::unbound("Fire"));
        assert!(registry.adopt_names_from(&imported));

        let keyboard = registry.find_by_kind(DeviceKind::Keyboard).unwrap();
        assert!(keyboard.has_action("Fire", false));
        assert!(!registry.adopt_names_from(&imported));
    }

    #[test]
    fn test_reconcile_prunes_and_adds() {
        let mut registry = DeviceRegistry::new();
        registry.create_device("SpaceBar");
        registry.note_action_name("Jump");
        registry.note_action_name("Old");
        registry.note_axis_name("MoveX");
        registry.normalize_all();

        let report = registry.reconcile(&names(&["Jump", "Fire"]), &names(&["MoveX"]));
        assert_eq!(report.added_actions, names(&["Fire"]));
        assert_eq!(report.removed_actions, names(&["Old"]));
        assert!(report.added_axes.is_empty());
        assert_eq!(report.pruned_devices, names(&["Keyboard"]));

        let keyboard = registry.find_by_kind(DeviceKind::Keyboard).unwrap();
        let order: Vec<_> = keyboard.actions.iter().map(|a| a.action_name.as_str()).collect();
        assert_eq!(order, vec!["Fire", "Jump"]);
        assert!(keyboard.is_dirty());
    }

    #[test]
    fn test_reconcile_unchanged_is_empty() {
        let mut registry = DeviceRegistry::new();
        registry.create_device("SpaceBar");
        registry.note_action_name("Jump");
        registry.normalize_all();

        let report = registry.reconcile(&names(&["Jump"]), &[]);
        assert!(report.is_empty());
        assert!(!registry.is_dirty());
    }

    #[test]
    fn test_summary() {
        let mut registry = DeviceRegistry::new();
        registry
            .create_device("SpaceBar")
            .unwrap()
            .add_action(ActionBinding::bound("Jump", Key::from("SpaceBar"), Modifiers::NONE));
        registry.note_action_name("Jump");
        registry.note_action_name("Fire");
        registry.normalize_all();

        let summary = registry.summary();
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].bound_actions, 1);
        assert_eq!(summary[0].total_actions, 2);
        assert_eq!(summary[0].to_string(), "Keyboard [Keyboard] actions 1/2 axes 0/0");
    }
}
