//! Abstract signals delivered to the host's input handler

use tokio::sync::mpsc;
use tracing::trace;

use crate::model::Key;

#[derive(Debug, Clone, PartialEq)]
pub enum InputSignal {
    KeyDown(Key),
    KeyUp(Key),
    Analog { key: Key, value: f32 },
}

impl InputSignal {
    pub fn key(&self) -> &Key {
        match self {
            InputSignal::KeyDown(key) | InputSignal::KeyUp(key) => key,
            InputSignal::Analog { key, .. } => key,
        }
    }
}

/// Receiver of abstract signals
pub trait InputSink {
    fn emit(&mut self, signal: InputSignal);
}

impl InputSink for Vec<InputSignal> {
    fn emit(&mut self, signal: InputSignal) {
        self.push(signal);
    }
}

impl InputSink for mpsc::UnboundedSender<InputSignal> {
    fn emit(&mut self, signal: InputSignal) {
        if self.send(signal).is_err() {
            trace!("Signal receiver dropped");
        }
    }
}
