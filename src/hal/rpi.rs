use super::{Edge, Hal, Mode, Pull};
use rppal::gpio::{Gpio, InputPin, Level, OutputPin, Trigger};
use std::collections::HashMap;
use std::sync::Mutex;

enum Pin {
    Out(OutputPin),
    In(InputPin),
}

/// Raspberry Pi backend built on `rppal`, the idiomatic Rust crate for
/// BCM2835-family GPIO. Each pin is claimed once in `setup` and kept open
/// for the process lifetime, same as the source's `RPi.GPIO.setmode` call.
pub struct RppalHal {
    gpio: Gpio,
    pins: Mutex<HashMap<u8, Pin>>,
}

impl RppalHal {
    pub fn new() -> Result<Self, rppal::gpio::Error> {
        Ok(Self {
            gpio: Gpio::new()?,
            pins: Mutex::new(HashMap::new()),
        })
    }
}

impl Hal for RppalHal {
    fn setup(&self, pin: u8, mode: Mode, pull: Pull) {
        let handle = match self.gpio.get(pin) {
            Ok(h) => h,
            Err(e) => {
                tracing::error!(pin, error = %e, "failed to claim gpio pin");
                return;
            }
        };
        let mut pins = self.pins.lock().unwrap();
        match mode {
            Mode::Out => {
                pins.insert(pin, Pin::Out(handle.into_output()));
            }
            Mode::In => {
                let input = match pull {
                    Pull::Up => handle.into_input_pullup(),
                    Pull::Down => handle.into_input_pulldown(),
                    Pull::None => handle.into_input(),
                };
                pins.insert(pin, Pin::In(input));
            }
        }
    }

    fn output(&self, pin: u8, level: bool) {
        let mut pins = self.pins.lock().unwrap();
        if let Some(Pin::Out(out)) = pins.get_mut(&pin) {
            if level {
                out.set_high();
            } else {
                out.set_low();
            }
        }
    }

    fn input(&self, pin: u8) -> bool {
        let pins = self.pins.lock().unwrap();
        match pins.get(&pin) {
            Some(Pin::In(inp)) => inp.is_high(),
            _ => false,
        }
    }

    fn wait_for_edge(&self, pin: u8, edge: Edge) {
        let trigger = match edge {
            Edge::Rising => Trigger::RisingEdge,
            Edge::Falling => Trigger::FallingEdge,
            Edge::Both => Trigger::Both,
        };
        let mut pins = self.pins.lock().unwrap();
        if let Some(Pin::In(inp)) = pins.get_mut(&pin) {
            if inp.set_interrupt(trigger, None).is_ok() {
                let _ = inp.poll_interrupt(true, None);
            }
        } else {
            drop(pins);
            std::thread::sleep(std::time::Duration::from_secs(600));
        }
    }
}

#[allow(dead_code)]
fn level_to_bool(level: Level) -> bool {
    level == Level::High
}
