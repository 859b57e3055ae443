use super::{Edge, Hal, Mode, Pull};
use std::thread;
use std::time::Duration;

/// Off-device default. Mirrors the source's `gpio.py` fallback: every call
/// is a no-op, `input` returns a constant, and `wait_for_edge` just parks
/// the thread since nothing ever toggles a real pin.
#[derive(Debug, Default)]
pub struct StubHal {
    input_level: bool,
}

impl StubHal {
    pub fn new() -> Self {
        Self { input_level: true }
    }
}

impl Hal for StubHal {
    fn setup(&self, _pin: u8, _mode: Mode, _pull: Pull) {}

    fn output(&self, _pin: u8, _level: bool) {}

    fn input(&self, _pin: u8) -> bool {
        self.input_level
    }

    fn wait_for_edge(&self, _pin: u8, _edge: Edge) {
        loop {
            thread::sleep(Duration::from_secs(600));
        }
    }
}
