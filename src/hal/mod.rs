//! GPIO hardware abstraction. Each `Motor` owns its own pin triple and talks
//! to the world only through this trait, matching the source daemon's
//! `gpio.py` facade: one writer per pin, no cross-pin locking.

mod stub;

#[cfg(feature = "rpi")]
mod rpi;

pub use stub::StubHal;

#[cfg(feature = "rpi")]
pub use rpi::RppalHal;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Mode {
    Out,
    In,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Pull {
    None,
    Up,
    Down,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Edge {
    Rising,
    Falling,
    Both,
}

/// A minimal GPIO surface. Implementations are thread-safe per pin; callers
/// serialize concurrent writes to the same pin themselves (each pin is
/// owned by exactly one `Motor` or plugin, so in practice there is never
/// more than one writer).
pub trait Hal: Send + Sync {
    fn setup(&self, pin: u8, mode: Mode, pull: Pull);
    fn output(&self, pin: u8, level: bool);
    fn input(&self, pin: u8) -> bool;
    /// Blocks the calling thread until an edge is observed. Cancellation is
    /// out of scope; callers that need to give up early spawn this on a
    /// blocking task and simply stop waiting on the join handle.
    fn wait_for_edge(&self, pin: u8, edge: Edge);
}
