//! Runtime state of one tracked joystick
//!
//! Each tracked joystick owns its driver handle plus:
//! - the synthesized key for every button, axis, hat direction and hat axis
//! - the last observed button/axis/hat state for edge detection

use tracing::warn;

use super::driver::JoystickHandle;
use super::event::InstanceId;
use super::normalize::HatDirection;
use crate::host::KeyDetails;
use crate::model::keys::{
    joystick_axis_key, joystick_button_key, joystick_hat_axis_key, joystick_hat_key,
    sanitize_device_name,
};
use crate::model::Key;

/// Synthesized keys of one hat
#[derive(Debug, Clone)]
pub struct HatKeys {
    /// One key per non-centered direction, indexed like [`HatDirection::ALL`]
    pub directions: Vec<Key>,
    pub x_axis: Key,
    pub y_axis: Key,
}

impl HatKeys {
    pub fn direction(&self, direction: HatDirection) -> Option<&Key> {
        direction.index().and_then(|i| self.directions.get(i))
    }
}

pub struct TrackedJoystick {
    handle: Option<Box<dyn JoystickHandle>>,
    pub instance_id: InstanceId,
    /// Sanitized hardware name, also the registry display string
    pub name: String,
    pub button_keys: Vec<Key>,
    pub axis_keys: Vec<Key>,
    pub hat_keys: Vec<HatKeys>,
    pub buttons: Vec<bool>,
    pub axes: Vec<f32>,
    pub hats: Vec<HatDirection>,
}

impl TrackedJoystick {
    /// Take ownership of an open handle and synthesize its keys
    pub fn new(handle: Box<dyn JoystickHandle>) -> Self {
        let name = sanitize_device_name(&handle.name());
        let instance_id = handle.instance_id();
        let (num_buttons, num_axes, num_hats) =
            (handle.num_buttons(), handle.num_axes(), handle.num_hats());

        let button_keys = (0..num_buttons)
            .map(|i| joystick_button_key(&name, i))
            .collect();
        let axis_keys = (0..num_axes).map(|i| joystick_axis_key(&name, i)).collect();
        let hat_keys = (0..num_hats)
            .map(|h| HatKeys {
                directions: HatDirection::ALL
                    .iter()
                    .map(|d| joystick_hat_key(&name, h, d.name()))
                    .collect(),
                x_axis: joystick_hat_axis_key(&name, h, "X"),
                y_axis: joystick_hat_axis_key(&name, h, "Y"),
            })
            .collect();

        Self {
            handle: Some(handle),
            instance_id,
            name,
            button_keys,
            axis_keys,
            hat_keys,
            buttons: vec![false; num_buttons],
            axes: vec![0.0; num_axes],
            hats: vec![HatDirection::Centered; num_hats],
        }
    }

    /// Registration details of every synthesized key
    pub fn key_details(&self) -> Vec<KeyDetails> {
        let label = |key: &Key, control: String, is_axis: bool| KeyDetails {
            key: key.clone(),
            label: format!("Joystick {} {}", self.name, control),
            is_axis,
        };

        let mut details = Vec::new();
        for (i, key) in self.button_keys.iter().enumerate() {
            details.push(label(key, format!("Button {}", i), false));
        }
        for (i, key) in self.axis_keys.iter().enumerate() {
            details.push(label(key, format!("Axis {}", i), true));
        }
        for (h, hat) in self.hat_keys.iter().enumerate() {
            for (direction, key) in HatDirection::ALL.iter().zip(&hat.directions) {
                details.push(label(key, format!("Hat {} {}", h, direction.name()), false));
            }
            details.push(label(&hat.x_axis, format!("Hat {} X-Axis", h), true));
            details.push(label(&hat.y_axis, format!("Hat {} Y-Axis", h), true));
        }
        details
    }

    pub fn has_handle(&self) -> bool {
        self.handle.is_some()
    }

    /// Close the handle. Returns `false` (and warns) when already released.
    pub fn release(&mut self) -> bool {
        match self.handle.take() {
            Some(handle) => {
                drop(handle);
                true
            },
            None => {
                warn!("Joystick {} ({}) has no open handle", self.name, self.instance_id);
                false
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fake;

    impl JoystickHandle for Fake {
        fn instance_id(&self) -> InstanceId {
            7
        }

        fn name(&self) -> String {
            "Saitek X.52".to_string()
        }

        fn num_buttons(&self) -> usize {
            2
        }

        fn num_axes(&self) -> usize {
            1
        }

        fn num_hats(&self) -> usize {
            1
        }
    }

    #[test]
    fn test_keys_synthesized() {
        let tracked = TrackedJoystick::new(Box::new(Fake));
        assert_eq!(tracked.name, "Saitek X52");
        assert_eq!(tracked.instance_id, 7);
        assert_eq!(tracked.button_keys[1].as_str(), "Joystick_Saitek X52_Button_1");
        assert_eq!(tracked.axis_keys[0].as_str(), "Joystick_Saitek X52_Axis_0");

        let hat = &tracked.hat_keys[0];
        assert_eq!(hat.directions.len(), 8);
        assert_eq!(
            hat.direction(HatDirection::LeftUp).unwrap().as_str(),
            "Joystick_Saitek X52_Hat_0_LeftUp"
        );
        assert!(hat.direction(HatDirection::Centered).is_none());
        assert_eq!(hat.y_axis.as_str(), "Joystick_Saitek X52_Hat_0_Y-Axis");
    }

    #[test]
    fn test_key_details() {
        let tracked = TrackedJoystick::new(Box::new(Fake));
        let details = tracked.key_details();
        // 2 buttons + 1 axis + 8 hat directions + 2 hat axes
        assert_eq!(details.len(), 13);
        assert_eq!(details[0].label, "Joystick Saitek X52 Button 0");
        assert!(!details[0].is_axis);
        assert!(details[2].is_axis);
        assert_eq!(details[3].label, "Joystick Saitek X52 Hat 0 Up");
        assert_eq!(details[11].label, "Joystick Saitek X52 Hat 0 X-Axis");
        assert!(details[12].is_axis);
    }

    #[test]
    fn test_release_once() {
        let mut tracked = TrackedJoystick::new(Box::new(Fake));
        assert!(tracked.release());
        assert!(!tracked.has_handle());
        assert!(!tracked.release());
    }
}
