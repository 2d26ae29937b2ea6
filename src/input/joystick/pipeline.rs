//! Joystick event pipeline
//!
//! Translates raw hot-plug, button, axis and hat events into abstract key
//! and analog signals. All state lives in the pipeline and is mutated only
//! from the thread that feeds it events.

use tracing::{debug, info, trace, warn};

use super::calibration_table::CalibrationTable;
use super::driver::JoystickDriver;
use super::event::{DeviceChange, DeviceObserver, InstanceId, JoystickEvent};
use super::normalize::{normalize_axis, HatDirection};
use super::sink::{InputSignal, InputSink};
use super::tracked::TrackedJoystick;
use crate::host::KeyRegistry;

pub struct JoystickPipeline<D: JoystickDriver, R: KeyRegistry> {
    driver: D,
    keys: R,
    calibration: CalibrationTable,
    devices: Vec<TrackedJoystick>,
    observers: Vec<DeviceObserver>,
}

impl<D: JoystickDriver, R: KeyRegistry> JoystickPipeline<D, R> {
    pub fn new(driver: D, keys: R, calibration: CalibrationTable) -> Self {
        Self {
            driver,
            keys,
            calibration,
            devices: Vec::new(),
            observers: Vec::new(),
        }
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    pub fn key_registry(&self) -> &R {
        &self.keys
    }

    pub fn devices(&self) -> &[TrackedJoystick] {
        &self.devices
    }

    pub fn device(&self, instance_id: InstanceId) -> Option<&TrackedJoystick> {
        self.devices.iter().find(|d| d.instance_id == instance_id)
    }

    /// Register an observer of device list changes
    pub fn subscribe(&mut self, observer: DeviceObserver) {
        self.observers.push(observer);
    }

    fn notify(&self, change: DeviceChange) {
        for observer in &self.observers {
            observer(&change);
        }
    }

    /// Add every device the driver currently reports
    pub fn enumerate(&mut self) {
        for which in self.driver.enumerate() {
            self.add_device(which);
        }
    }

    pub fn handle_event(&mut self, event: JoystickEvent, sink: &mut dyn InputSink) {
        trace!("Joystick event: {:?}", event);
        match event {
            JoystickEvent::DeviceAdded { which } => self.add_device(which),
            JoystickEvent::DeviceRemoved { instance_id } => self.remove_device(instance_id),
            JoystickEvent::Button {
                instance_id,
                button,
                pressed,
            } => self.on_button(instance_id, button, pressed, sink),
            JoystickEvent::Axis {
                instance_id,
                axis,
                value,
            } => self.on_axis(instance_id, axis, value, sink),
            JoystickEvent::Hat {
                instance_id,
                hat,
                value,
            } => self.on_hat(instance_id, hat, value, sink),
        }
    }

    /// Track the device at enumeration index `which`
    pub fn add_device(&mut self, which: usize) {
        if self.driver.is_game_controller(which) {
            debug!("Device {} is a game controller, skipping", which);
            return;
        }

        if let Some(id) = self.driver.instance_id(which) {
            if self.device(id).is_some() {
                debug!("Joystick {} already tracked", id);
                return;
            }
        }

        let Some(handle) = self.driver.open(which) else {
            warn!("Failed to open joystick at index {}", which);
            return;
        };

        let tracked = TrackedJoystick::new(handle);
        if self.device(tracked.instance_id).is_some() {
            debug!("Joystick {} already tracked", tracked.instance_id);
            return;
        }

        let mut registered = 0;
        for details in tracked.key_details() {
            if !self.keys.contains(&details.key) {
                self.keys.add(details);
                registered += 1;
            }
        }

        info!(
            "Joystick connected: \"{}\" (id {}, {} buttons, {} axes, {} hats, {} new keys)",
            tracked.name,
            tracked.instance_id,
            tracked.button_keys.len(),
            tracked.axis_keys.len(),
            tracked.hat_keys.len(),
            registered
        );

        let change = DeviceChange::Added {
            instance_id: tracked.instance_id,
            name: tracked.name.clone(),
        };
        self.devices.push(tracked);
        self.notify(change);
    }

    /// Stop tracking `instance_id` and release its handle
    pub fn remove_device(&mut self, instance_id: InstanceId) {
        let Some(index) = self.devices.iter().position(|d| d.instance_id == instance_id) else {
            debug!("Joystick {} not tracked, nothing to remove", instance_id);
            return;
        };

        let mut tracked = self.devices.remove(index);
        tracked.release();
        info!("Joystick disconnected: \"{}\" (id {})", tracked.name, instance_id);

        self.notify(DeviceChange::Removed {
            instance_id,
            name: tracked.name,
        });
    }

    fn on_button(&mut self, instance_id: InstanceId, button: usize, pressed: bool, sink: &mut dyn InputSink) {
        let Some(device) = self.devices.iter_mut().find(|d| d.instance_id == instance_id) else {
            return;
        };
        let Some(key) = device.button_keys.get(button) else {
            return;
        };

        sink.emit(if pressed {
            InputSignal::KeyDown(key.clone())
        } else {
            InputSignal::KeyUp(key.clone())
        });
        if let Some(state) = device.buttons.get_mut(button) {
            *state = pressed;
        }
    }

    fn on_hat(&mut self, instance_id: InstanceId, hat: usize, value: u8, sink: &mut dyn InputSink) {
        let Some(device) = self.devices.iter_mut().find(|d| d.instance_id == instance_id) else {
            return;
        };
        let (Some(keys), Some(state)) = (device.hat_keys.get(hat), device.hats.get_mut(hat)) else {
            return;
        };

        let previous = *state;
        let current = HatDirection::from_code(value);

        if let Some(key) = keys.direction(previous) {
            sink.emit(InputSignal::KeyUp(key.clone()));
        }
        if let Some(key) = keys.direction(current) {
            sink.emit(InputSignal::KeyDown(key.clone()));
        }

        let (prev_x, prev_y) = previous.vector();
        let (x, y) = current.vector();
        if x != prev_x {
            sink.emit(InputSignal::Analog {
                key: keys.x_axis.clone(),
                value: x as f32,
            });
        }
        if y != prev_y {
            sink.emit(InputSignal::Analog {
                key: keys.y_axis.clone(),
                value: y as f32,
            });
        }

        *state = current;
    }

    fn on_axis(&mut self, instance_id: InstanceId, axis: usize, raw: i16, sink: &mut dyn InputSink) {
        let Some(device) = self.devices.iter_mut().find(|d| d.instance_id == instance_id) else {
            return;
        };
        let Some(key) = device.axis_keys.get(axis) else {
            return;
        };

        let mut value = normalize_axis(raw);
        if let Some(calibration) = self.calibration.lookup(&device.name, axis) {
            value = calibration.apply(value);
        }

        sink.emit(InputSignal::Analog {
            key: key.clone(),
            value,
        });
        if let Some(state) = device.axes.get_mut(axis) {
            *state = value;
        }
    }

    /// Release every handle still open
    pub fn shutdown(&mut self) {
        for mut tracked in self.devices.drain(..) {
            if tracked.has_handle() {
                tracked.release();
            }
        }
    }
}

impl<D: JoystickDriver, R: KeyRegistry> Drop for JoystickPipeline<D, R> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryKeyRegistry;
    use crate::input::joystick::driver::JoystickHandle;
    use crate::input::joystick::normalize::hat_code;
    use crate::model::{CurvePoint, Device, DeviceKind, InputRange, Key, PhysicalAxis};
    use crate::persistence::{SaveFile, SavedDevice, SAVE_VERSION};
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Clone)]
    struct FakeDevice {
        which: usize,
        instance_id: InstanceId,
        name: &'static str,
        game_controller: bool,
        fail_open: bool,
    }

    struct FakeHandle {
        instance_id: InstanceId,
        name: &'static str,
        closed: Arc<AtomicUsize>,
    }

    impl JoystickHandle for FakeHandle {
        fn instance_id(&self) -> InstanceId {
            self.instance_id
        }

        fn name(&self) -> String {
            self.name.to_string()
        }

        fn num_buttons(&self) -> usize {
            4
        }

        fn num_axes(&self) -> usize {
            2
        }

        fn num_hats(&self) -> usize {
            1
        }
    }

    impl Drop for FakeHandle {
        fn drop(&mut self) {
            self.closed.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[derive(Default)]
    struct FakeDriver {
        devices: Vec<FakeDevice>,
        opened: usize,
        closed: Arc<AtomicUsize>,
    }

    impl FakeDriver {
        fn with(devices: Vec<FakeDevice>) -> Self {
            Self {
                devices,
                ..Self::default()
            }
        }

        fn find(&self, which: usize) -> Option<&FakeDevice> {
            self.devices.iter().find(|d| d.which == which)
        }
    }

    impl JoystickDriver for FakeDriver {
        fn enumerate(&self) -> Vec<usize> {
            self.devices.iter().map(|d| d.which).collect()
        }

        fn is_game_controller(&self, which: usize) -> bool {
            self.find(which).is_some_and(|d| d.game_controller)
        }

        fn instance_id(&self, which: usize) -> Option<InstanceId> {
            self.find(which).map(|d| d.instance_id)
        }

        fn open(&mut self, which: usize) -> Option<Box<dyn JoystickHandle>> {
            let device = self.find(which)?.clone();
            if device.fail_open {
                return None;
            }
            self.opened += 1;
            Some(Box::new(FakeHandle {
                instance_id: device.instance_id,
                name: device.name,
                closed: self.closed.clone(),
            }))
        }
    }

    fn stick(which: usize, instance_id: InstanceId, name: &'static str) -> FakeDevice {
        FakeDevice {
            which,
            instance_id,
            name,
            game_controller: false,
            fail_open: false,
        }
    }

    type Pipeline = JoystickPipeline<FakeDriver, MemoryKeyRegistry>;

    fn pipeline(devices: Vec<FakeDevice>) -> Pipeline {
        JoystickPipeline::new(
            FakeDriver::with(devices),
            MemoryKeyRegistry::new(),
            CalibrationTable::empty(),
        )
    }

    fn calibrated(name: &str, axes: Vec<PhysicalAxis>) -> CalibrationTable {
        let mut device = Device::new(DeviceKind::Unique, name);
        device.physical_axes = axes;
        CalibrationTable::from_save(&SaveFile {
            version: SAVE_VERSION,
            devices: vec![SavedDevice::from_device(&device)],
            action_names: Vec::new(),
            axis_names: Vec::new(),
        })
    }

    fn key(name: &str) -> Key {
        Key::from(name)
    }

    #[test]
    fn test_add_registers_keys_once() {
        let mut p = pipeline(vec![stick(0, 10, "X52")]);
        p.add_device(0);
        p.add_device(0);

        assert_eq!(p.devices().len(), 1);
        assert_eq!(p.driver_mut().opened, 1);
        // 4 buttons + 2 axes + 8 hat directions + 2 hat axes
        assert_eq!(p.key_registry().len(), 16);
        assert!(p.key_registry().get(&key("Joystick_X52_Axis_1")).unwrap().is_axis);
    }

    #[test]
    fn test_game_controllers_and_open_failures_skipped() {
        let mut pad = stick(0, 10, "Pad");
        pad.game_controller = true;
        let mut broken = stick(1, 11, "Broken");
        broken.fail_open = true;

        let mut p = pipeline(vec![pad, broken, stick(2, 12, "X52")]);
        p.enumerate();

        assert_eq!(p.devices().len(), 1);
        assert_eq!(p.devices()[0].name, "X52");
    }

    #[test]
    fn test_remove_releases_handle_once() {
        let mut p = pipeline(vec![stick(0, 10, "X52")]);
        let closed = p.driver_mut().closed.clone();
        p.add_device(0);

        p.handle_event(JoystickEvent::DeviceRemoved { instance_id: 10 }, &mut Vec::<InputSignal>::new());
        assert!(p.devices().is_empty());
        assert_eq!(closed.load(Ordering::SeqCst), 1);

        // Untracked id is a no-op
        p.remove_device(10);
        p.remove_device(99);
        assert_eq!(closed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_teardown_releases_remaining_handles() {
        let closed = {
            let mut p = pipeline(vec![stick(0, 10, "A"), stick(1, 11, "B")]);
            p.enumerate();
            p.driver_mut().closed.clone()
        };
        assert_eq!(closed.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_removal_uses_instance_id_not_index() {
        let mut p = pipeline(vec![stick(0, 10, "A")]);
        p.add_device(0);
        p.remove_device(10);

        // OS reuses index 0 for a different device
        p.driver_mut().devices = vec![stick(0, 20, "B")];
        p.add_device(0);
        p.remove_device(0);
        assert_eq!(p.devices().len(), 1);
        assert_eq!(p.devices()[0].instance_id, 20);
    }

    #[test]
    fn test_slot_reused_as_instance_id_after_removal() {
        // Backends like gilrs report the slot index as the instance id
        let mut p = pipeline(vec![stick(0, 0, "A")]);
        let closed = p.driver_mut().closed.clone();
        let mut out: Vec<InputSignal> = Vec::new();
        p.handle_event(JoystickEvent::DeviceAdded { which: 0 }, &mut out);
        p.handle_event(JoystickEvent::DeviceRemoved { instance_id: 0 }, &mut out);

        p.driver_mut().devices = vec![stick(0, 0, "B")];
        p.handle_event(JoystickEvent::DeviceAdded { which: 0 }, &mut out);

        assert_eq!(closed.load(Ordering::SeqCst), 1);
        assert_eq!(p.devices().len(), 1);
        assert_eq!(p.device(0).unwrap().name, "B");

        p.handle_event(
            JoystickEvent::Button {
                instance_id: 0,
                button: 1,
                pressed: true,
            },
            &mut out,
        );
        assert_eq!(out, vec![InputSignal::KeyDown(key("Joystick_B_Button_1"))]);
    }

    #[test]
    fn test_observers_notified_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut p = pipeline(vec![stick(0, 10, "X52")]);
        let sink = seen.clone();
        p.subscribe(Arc::new(move |change: &DeviceChange| sink.lock().push(change.clone())));

        p.add_device(0);
        p.remove_device(10);

        assert_eq!(
            *seen.lock(),
            vec![
                DeviceChange::Added {
                    instance_id: 10,
                    name: "X52".to_string()
                },
                DeviceChange::Removed {
                    instance_id: 10,
                    name: "X52".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_button_events() {
        let mut p = pipeline(vec![stick(0, 10, "X52")]);
        p.add_device(0);
        let mut out: Vec<InputSignal> = Vec::new();

        p.handle_event(JoystickEvent::Button { instance_id: 10, button: 3, pressed: true }, &mut out);
        p.handle_event(JoystickEvent::Button { instance_id: 10, button: 3, pressed: false }, &mut out);
        // Untracked button and device
        p.handle_event(JoystickEvent::Button { instance_id: 10, button: 9, pressed: true }, &mut out);
        p.handle_event(JoystickEvent::Button { instance_id: 77, button: 0, pressed: true }, &mut out);

        assert_eq!(
            out,
            vec![
                InputSignal::KeyDown(key("Joystick_X52_Button_3")),
                InputSignal::KeyUp(key("Joystick_X52_Button_3")),
            ]
        );
        assert!(!p.device(10).unwrap().buttons[3]);
    }

    #[test]
    fn test_hat_events() {
        let mut p = pipeline(vec![stick(0, 10, "X52")]);
        p.add_device(0);

        let mut out: Vec<InputSignal> = Vec::new();
        p.handle_event(JoystickEvent::Hat { instance_id: 10, hat: 0, value: hat_code::UP }, &mut out);
        assert_eq!(
            out,
            vec![
                InputSignal::KeyDown(key("Joystick_X52_Hat_0_Up")),
                InputSignal::Analog { key: key("Joystick_X52_Hat_0_Y-Axis"), value: 1.0 },
            ]
        );

        let mut out: Vec<InputSignal> = Vec::new();
        p.handle_event(JoystickEvent::Hat { instance_id: 10, hat: 0, value: hat_code::RIGHT_UP }, &mut out);
        assert_eq!(
            out,
            vec![
                InputSignal::KeyUp(key("Joystick_X52_Hat_0_Up")),
                InputSignal::KeyDown(key("Joystick_X52_Hat_0_RightUp")),
                InputSignal::Analog { key: key("Joystick_X52_Hat_0_X-Axis"), value: 1.0 },
            ]
        );

        let mut out: Vec<InputSignal> = Vec::new();
        p.handle_event(JoystickEvent::Hat { instance_id: 10, hat: 0, value: hat_code::CENTERED }, &mut out);
        assert_eq!(
            out,
            vec![
                InputSignal::KeyUp(key("Joystick_X52_Hat_0_RightUp")),
                InputSignal::Analog { key: key("Joystick_X52_Hat_0_X-Axis"), value: 0.0 },
                InputSignal::Analog { key: key("Joystick_X52_Hat_0_Y-Axis"), value: 0.0 },
            ]
        );

        // Centered again: nothing to release, nothing pressed
        let mut out: Vec<InputSignal> = Vec::new();
        p.handle_event(JoystickEvent::Hat { instance_id: 10, hat: 0, value: hat_code::CENTERED }, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn test_axis_uncalibrated() {
        let mut p = pipeline(vec![stick(0, 10, "X52")]);
        p.add_device(0);
        let mut out: Vec<InputSignal> = Vec::new();

        p.handle_event(JoystickEvent::Axis { instance_id: 10, axis: 1, value: i16::MIN }, &mut out);
        p.handle_event(JoystickEvent::Axis { instance_id: 10, axis: 5, value: 0 }, &mut out);

        assert_eq!(
            out,
            vec![InputSignal::Analog { key: key("Joystick_X52_Axis_1"), value: -1.0 }]
        );
        assert_eq!(p.device(10).unwrap().axes[1], -1.0);
    }

    #[test]
    fn test_axis_calibrated() {
        let table = calibrated(
            "X52",
            vec![
                PhysicalAxis::new("0").with_input_range(InputRange::Halved),
                PhysicalAxis::new("1").with_points(vec![CurvePoint::new(0.5, 0.8)]),
            ],
        );
        let mut p = JoystickPipeline::new(
            FakeDriver::with(vec![stick(0, 10, "X.52")]),
            MemoryKeyRegistry::new(),
            table,
        );
        p.add_device(0);

        let mut out: Vec<InputSignal> = Vec::new();
        p.handle_event(JoystickEvent::Axis { instance_id: 10, axis: 0, value: i16::MIN }, &mut out);
        p.handle_event(JoystickEvent::Axis { instance_id: 10, axis: 1, value: -8192 }, &mut out);

        let values: Vec<f32> = out
            .iter()
            .map(|s| match s {
                InputSignal::Analog { value, .. } => *value,
                other => panic!("unexpected {:?}", other),
            })
            .collect();
        assert_eq!(values[0], 0.0);
        assert!((values[1] - -0.4).abs() < 1e-4, "got {}", values[1]);
    }
}
