//! LED controller firmware core.
//!
//! Everything here is independent of the actual board: pins, time and the serial
//! console are reached through the traits below, so the same loop runs on the
//! device, in the `led-device` emulator and in tests.

pub mod controller;
pub mod diagnostics;
pub mod line_buffer;
pub mod session;
pub mod sim;
pub mod watchdog;

pub use controller::{DeviceCommand, LedController, LineOutcome};
pub use diagnostics::{LinkStatus, StatusReport};
pub use line_buffer::{LineAccumulator, LineEvent};
pub use session::SessionState;
pub use watchdog::Watchdog;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinLevel {
    Low,
    High,
}

impl PinLevel {
    pub fn from_bool(high: bool) -> Self {
        if high {
            PinLevel::High
        } else {
            PinLevel::Low
        }
    }

    pub fn is_high(&self) -> bool {
        matches!(self, PinLevel::High)
    }
}

/// Digital output capability
pub trait Gpio {
    fn set_level(&mut self, pin: u8, level: PinLevel);

    /// Level currently driven on `pin`
    fn level(&self, pin: u8) -> PinLevel;
}

/// Monotonic millisecond time source
pub trait Clock {
    fn now_ms(&self) -> u64;

    fn delay_ms(&mut self, ms: u64);
}

/// Serial console of the board
pub trait Console {
    /// Next received byte, `None` when nothing is waiting
    fn read_byte(&mut self) -> Option<u8>;

    fn write_line(&mut self, line: &str);
}
