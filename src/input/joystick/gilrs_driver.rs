//! gilrs backend for the joystick pipeline
//!
//! gilrs exposes every device through the same gamepad model, so the
//! capability surface of a device is derived from the controls it actually
//! reports codes for. The d-pad becomes hat 0.

use std::collections::HashMap;

use anyhow::{anyhow, Result};
use gilrs::{Axis, Button, Event, EventType, Gamepad, GamepadId, Gilrs, MappingSource};
use tracing::{debug, info, trace};

use super::driver::{JoystickDriver, JoystickHandle};
use super::event::{InstanceId, JoystickEvent};
use super::normalize::{denormalize_axis, HatDirection};

const BUTTONS: [Button; 15] = [
    Button::South,
    Button::East,
    Button::North,
    Button::West,
    Button::C,
    Button::Z,
    Button::LeftTrigger,
    Button::LeftTrigger2,
    Button::RightTrigger,
    Button::RightTrigger2,
    Button::Select,
    Button::Start,
    Button::Mode,
    Button::LeftThumb,
    Button::RightThumb,
];

const AXES: [Axis; 6] = [
    Axis::LeftStickX,
    Axis::LeftStickY,
    Axis::LeftZ,
    Axis::RightStickX,
    Axis::RightStickY,
    Axis::RightZ,
];

const DPAD_BUTTONS: [Button; 4] = [
    Button::DPadUp,
    Button::DPadDown,
    Button::DPadLeft,
    Button::DPadRight,
];

/// Controls a device reports, in index order
#[derive(Debug, Clone, Default)]
struct Layout {
    buttons: Vec<Button>,
    axes: Vec<Axis>,
    has_hat: bool,
}

impl Layout {
    fn of(gamepad: &Gamepad<'_>) -> Self {
        let buttons = BUTTONS
            .iter()
            .copied()
            .filter(|b| gamepad.button_code(*b).is_some())
            .collect();
        let axes = AXES
            .iter()
            .copied()
            .filter(|a| gamepad.axis_code(*a).is_some())
            .collect();
        let has_hat = DPAD_BUTTONS.iter().any(|b| gamepad.button_code(*b).is_some())
            || gamepad.axis_code(Axis::DPadX).is_some()
            || gamepad.axis_code(Axis::DPadY).is_some();

        Self {
            buttons,
            axes,
            has_hat,
        }
    }
}

struct GilrsHandle {
    instance_id: InstanceId,
    name: String,
    num_buttons: usize,
    num_axes: usize,
    num_hats: usize,
}

impl JoystickHandle for GilrsHandle {
    fn instance_id(&self) -> InstanceId {
        self.instance_id
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn num_buttons(&self) -> usize {
        self.num_buttons
    }

    fn num_axes(&self) -> usize {
        self.num_axes
    }

    fn num_hats(&self) -> usize {
        self.num_hats
    }
}

impl Drop for GilrsHandle {
    fn drop(&mut self) {
        trace!("Closed gilrs handle {}", self.instance_id);
    }
}

/// Joystick driver over gilrs. Not `Send`: create it on the polling thread.
pub struct GilrsDriver {
    gilrs: Gilrs,
    skip_game_controllers: bool,
    layouts: HashMap<usize, Layout>,
}

impl GilrsDriver {
    pub fn new(skip_game_controllers: bool) -> Result<Self> {
        let gilrs = Gilrs::new().map_err(|e| anyhow!("Failed to initialize gilrs: {:?}", e))?;
        info!("gilrs initialized");
        Ok(Self {
            gilrs,
            skip_game_controllers,
            layouts: HashMap::new(),
        })
    }

    fn gamepad(&self, which: usize) -> Option<Gamepad<'_>> {
        self.gilrs
            .gamepads()
            .find(|(id, _)| usize::from(*id) == which)
            .map(|(_, gamepad)| gamepad)
    }

    fn hat_code(&self, id: GamepadId) -> Option<u8> {
        let gamepad = self.gilrs.connected_gamepad(id)?;
        let x = gamepad.value(Axis::DPadX);
        let y = gamepad.value(Axis::DPadY);
        Some(HatDirection::code_from_pressed(
            gamepad.is_pressed(Button::DPadUp) || y > 0.5,
            gamepad.is_pressed(Button::DPadRight) || x > 0.5,
            gamepad.is_pressed(Button::DPadDown) || y < -0.5,
            gamepad.is_pressed(Button::DPadLeft) || x < -0.5,
        ))
    }

    /// Drain pending gilrs events as raw joystick events
    pub fn poll(&mut self) -> Vec<JoystickEvent> {
        let mut events = Vec::new();

        while let Some(Event { id, event, .. }) = self.gilrs.next_event() {
            let which = usize::from(id);
            let instance_id = which as InstanceId;

            match event {
                EventType::Connected => events.push(JoystickEvent::DeviceAdded { which }),
                EventType::Disconnected => {
                    self.layouts.remove(&which);
                    events.push(JoystickEvent::DeviceRemoved { instance_id });
                },
                EventType::ButtonPressed(button, _) | EventType::ButtonReleased(button, _) => {
                    let pressed = matches!(event, EventType::ButtonPressed(_, _));
                    let Some(layout) = self.layouts.get(&which) else {
                        continue;
                    };

                    if DPAD_BUTTONS.contains(&button) {
                        if let Some(value) = self.hat_code(id) {
                            events.push(JoystickEvent::Hat {
                                instance_id,
                                hat: 0,
                                value,
                            });
                        }
                    } else if let Some(index) = layout.buttons.iter().position(|b| *b == button) {
                        events.push(JoystickEvent::Button {
                            instance_id,
                            button: index,
                            pressed,
                        });
                    }
                },
                EventType::AxisChanged(axis, value, _) => {
                    let Some(layout) = self.layouts.get(&which) else {
                        continue;
                    };

                    if matches!(axis, Axis::DPadX | Axis::DPadY) {
                        if let Some(value) = self.hat_code(id) {
                            events.push(JoystickEvent::Hat {
                                instance_id,
                                hat: 0,
                                value,
                            });
                        }
                    } else if let Some(index) = layout.axes.iter().position(|a| *a == axis) {
                        events.push(JoystickEvent::Axis {
                            instance_id,
                            axis: index,
                            value: denormalize_axis(value),
                        });
                    }
                },
                _ => {},
            }
        }

        events
    }
}

impl JoystickDriver for GilrsDriver {
    fn enumerate(&self) -> Vec<usize> {
        self.gilrs
            .gamepads()
            .map(|(id, _)| usize::from(id))
            .collect()
    }

    fn is_game_controller(&self, which: usize) -> bool {
        self.skip_game_controllers
            && self
                .gamepad(which)
                .is_some_and(|g| g.mapping_source() == MappingSource::SdlMappings)
    }

    // gilrs has no per-connection id: the `GamepadId` slot doubles as both the
    // enumeration index and the instance id. A slot is only reused after its
    // Disconnected event, so removal always precedes re-adding.
    fn instance_id(&self, which: usize) -> Option<InstanceId> {
        self.gamepad(which).map(|_| which as InstanceId)
    }

    fn open(&mut self, which: usize) -> Option<Box<dyn JoystickHandle>> {
        let (name, layout) = {
            let gamepad = self.gamepad(which)?;
            (gamepad.name().to_string(), Layout::of(&gamepad))
        };

        debug!(
            "Opened \"{}\" ({} buttons, {} axes, hat: {})",
            name,
            layout.buttons.len(),
            layout.axes.len(),
            layout.has_hat
        );

        let handle = GilrsHandle {
            instance_id: which as InstanceId,
            name,
            num_buttons: layout.buttons.len(),
            num_axes: layout.axes.len(),
            num_hats: usize::from(layout.has_hat),
        };
        self.layouts.insert(which, layout);
        Some(Box::new(handle))
    }
}
