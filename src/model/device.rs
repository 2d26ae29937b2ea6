//! Device records and the free functions that keep them consistent

use super::calibration::PhysicalAxis;
use super::keys::{self, compactify_key_name};
use super::types::{ActionBinding, AxisBinding, DeviceKind, Key, Modifiers};

/// One input device and its bindings
///
/// Every device holds one action binding per known action name and one axis
/// binding per known axis name, bound or not, so remapping UIs can offer a
/// slot for everything.
#[derive(Debug, Clone, PartialEq)]
pub struct Device {
    pub kind: DeviceKind,
    /// Stable identifier: the kind name, or the hardware name for unique devices
    pub display_string: String,
    /// User-editable label
    pub display_name: String,
    pub actions: Vec<ActionBinding>,
    pub axes: Vec<AxisBinding>,
    /// Physical button names (unique devices only)
    pub physical_buttons: Vec<String>,
    /// Per-axis calibration (unique devices only)
    pub physical_axes: Vec<PhysicalAxis>,
    dirty: bool,
}

impl Device {
    pub fn new(kind: DeviceKind, display_string: impl Into<String>) -> Self {
        let display_string = display_string.into();
        Self {
            kind,
            display_name: display_string.clone(),
            display_string,
            actions: Vec::new(),
            axes: Vec::new(),
            physical_buttons: Vec::new(),
            physical_axes: Vec::new(),
            dirty: false,
        }
    }

    /// Build an empty device for the hardware that produces `key`.
    ///
    /// Returns `None` for keys that cannot be classified.
    pub fn from_key(key: &str) -> Option<Self> {
        match keys::resolve_device_kind(key) {
            DeviceKind::Unknown => None,
            kind => Some(Self::new(kind, keys::device_display_string(key))),
        }
    }

    /// Whether this device is the one `key` belongs to
    pub fn owns_key(&self, key: &str) -> bool {
        let kind = keys::resolve_device_kind(key);
        if kind != self.kind {
            return false;
        }
        kind != DeviceKind::Unique || keys::device_display_string(key) == self.display_string
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    pub fn action(&self, name: &str) -> Option<&ActionBinding> {
        self.actions.iter().find(|a| a.action_name == name)
    }

    pub fn axis(&self, name: &str) -> Option<&AxisBinding> {
        self.axes.iter().find(|a| a.axis_name == name)
    }

    /// Whether an action named `name` exists, optionally requiring a bound key
    pub fn has_action(&self, name: &str, must_be_bound: bool) -> bool {
        self.action(name)
            .is_some_and(|a| !must_be_bound || a.is_bound())
    }

    pub fn has_axis(&self, name: &str, must_be_bound: bool) -> bool {
        self.axis(name).is_some_and(|a| !must_be_bound || a.is_bound())
    }

    /// Add an action binding; rejected when the name is already present
    pub fn add_action(&mut self, binding: ActionBinding) -> bool {
        if self.has_action(&binding.action_name, false) {
            return false;
        }
        self.actions.push(binding);
        true
    }

    /// Add an axis binding; rejected when the name is already present
    pub fn add_axis(&mut self, binding: AxisBinding) -> bool {
        if self.has_axis(&binding.axis_name, false) {
            return false;
        }
        self.axes.push(binding);
        true
    }

    /// Point an existing action at a new key
    pub fn rebind_action(&mut self, name: &str, key: Key, modifiers: Modifiers) -> bool {
        let Some(action) = self.actions.iter_mut().find(|a| a.action_name == name) else {
            return false;
        };
        action.key_label = compactify_key_name(key.as_str());
        action.key = Some(key);
        action.modifiers = modifiers;
        self.dirty = true;
        true
    }

    /// Point an existing axis at a new key
    pub fn rebind_axis(&mut self, name: &str, key: Key, scale: f32) -> bool {
        let Some(axis) = self.axes.iter_mut().find(|a| a.axis_name == name) else {
            return false;
        };
        axis.key_label = compactify_key_name(key.as_str());
        axis.key = Some(key);
        axis.scale = scale;
        self.dirty = true;
        true
    }

    /// Clear the key of an action, keeping its slot
    pub fn unbind_action(&mut self, name: &str) -> bool {
        let Some(action) = self.actions.iter_mut().find(|a| a.action_name == name) else {
            return false;
        };
        *action = ActionBinding::unbound(name);
        self.dirty = true;
        true
    }

    /// Clear the key of an axis, keeping its slot
    pub fn unbind_axis(&mut self, name: &str) -> bool {
        let Some(axis) = self.axes.iter_mut().find(|a| a.axis_name == name) else {
            return false;
        };
        *axis = AxisBinding::unbound(name);
        self.dirty = true;
        true
    }

    /// Drop bindings whose names are no longer known.
    ///
    /// Returns whether anything was removed.
    pub fn retain_known(&mut self, action_names: &[String], axis_names: &[String]) -> bool {
        let before = (self.actions.len(), self.axes.len());
        self.actions
            .retain(|a| action_names.iter().any(|n| *n == a.action_name));
        self.axes.retain(|a| axis_names.iter().any(|n| *n == a.axis_name));

        let removed = before != (self.actions.len(), self.axes.len());
        if removed {
            self.dirty = true;
        }
        removed
    }

    pub fn bound_action_count(&self) -> usize {
        self.actions.iter().filter(|a| a.is_bound()).count()
    }

    pub fn bound_axis_count(&self) -> usize {
        self.axes.iter().filter(|a| a.is_bound()).count()
    }
}

/// Insert an unbound slot for every known name the device lacks
pub fn fill_missing_bindings(device: &mut Device, action_names: &[String], axis_names: &[String]) {
    for name in action_names {
        if !device.has_action(name, false) {
            device.actions.push(ActionBinding::unbound(name.as_str()));
        }
    }
    for name in axis_names {
        if !device.has_axis(name, false) {
            device.axes.push(AxisBinding::unbound(name.as_str()));
        }
    }
}

/// Stable lexicographic sort of both binding lists by name
pub fn sort_alphabetically(device: &mut Device) {
    device.actions.sort_by(|a, b| a.action_name.cmp(&b.action_name));
    device.axes.sort_by(|a, b| a.axis_name.cmp(&b.axis_name));
}

/// Rewrite every key label into its compact form
pub fn compactify_names(device: &mut Device) {
    for action in &mut device.actions {
        if let Some(key) = &action.key {
            action.key_label = compactify_key_name(key.as_str());
        }
    }
    for axis in &mut device.axes {
        if let Some(key) = &axis.key {
            axis.key_label = compactify_key_name(key.as_str());
        }
    }
}
