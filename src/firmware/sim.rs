//! Host-side stand-ins for the board: an in-memory pin bank, clocks and consoles.
//! Used by the `led-device` emulator and by tests.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::io::{Read, Write};
use std::time::{Duration, Instant};

use serialport::SerialPort;

use super::{Clock, Console, Gpio, PinLevel};

/// In-memory GPIO bank. Pins can be marked as stuck LOW to simulate a broken LED driver.
#[derive(Debug, Default, Clone)]
pub struct PinBank {
    levels: BTreeMap<u8, PinLevel>,
    stuck_low: BTreeSet<u8>,
    writes: u64,
}

impl PinBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stuck_low(pins: &[u8]) -> Self {
        Self {
            stuck_low: pins.iter().copied().collect(),
            ..Self::default()
        }
    }

    /// Number of `set_level` calls so far
    pub fn writes(&self) -> u64 {
        self.writes
    }
}

impl Gpio for PinBank {
    fn set_level(&mut self, pin: u8, level: PinLevel) {
        self.writes += 1;
        let level = if self.stuck_low.contains(&pin) { PinLevel::Low } else { level };
        let previous = self.levels.insert(pin, level).unwrap_or(PinLevel::Low);
        if previous != level {
            log::debug!("GPIO{} -> {:?}", pin, level);
        }
    }

    fn level(&self, pin: u8) -> PinLevel {
        self.levels.get(&pin).copied().unwrap_or(PinLevel::Low)
    }
}

/// Wall-clock time since construction
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self { start: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    fn delay_ms(&mut self, ms: u64) {
        std::thread::sleep(Duration::from_millis(ms));
    }
}

/// Clock that only moves when told to; `delay_ms` advances it instantly
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: u64,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self { now: start_ms }
    }

    pub fn advance(&mut self, ms: u64) {
        self.now += ms;
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now
    }

    fn delay_ms(&mut self, ms: u64) {
        self.advance(ms);
    }
}

/// Console fed from a byte queue, recording every line written
#[derive(Debug, Default)]
pub struct MemoryConsole {
    input: VecDeque<u8>,
    output: Vec<String>,
}

impl MemoryConsole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_input(&mut self, bytes: &[u8]) {
        self.input.extend(bytes);
    }

    /// Lines written since the last call
    pub fn take_output(&mut self) -> Vec<String> {
        std::mem::take(&mut self.output)
    }
}

impl Console for MemoryConsole {
    fn read_byte(&mut self) -> Option<u8> {
        self.input.pop_front()
    }

    fn write_line(&mut self, line: &str) {
        self.output.push(line.to_string());
    }
}

/// Console on a real serial port (e.g. one end of a virtual null-modem pair)
pub struct SerialConsole {
    port: Box<dyn SerialPort>,
}

impl SerialConsole {
    pub fn new(port: Box<dyn SerialPort>) -> Self {
        Self { port }
    }
}

impl Console for SerialConsole {
    fn read_byte(&mut self) -> Option<u8> {
        match self.port.bytes_to_read() {
            Ok(0) => None,
            Ok(_) => {
                let mut byte = [0u8; 1];
                match self.port.read(&mut byte) {
                    Ok(1) => Some(byte[0]),
                    Ok(_) => None,
                    Err(e) => {
                        log::error!("Serial read failed: {}", e);
                        None
                    }
                }
            }
            Err(e) => {
                log::error!("Serial status failed: {}", e);
                None
            }
        }
    }

    fn write_line(&mut self, line: &str) {
        log::debug!("> {}", line);
        let result = self
            .port
            .write_all(line.as_bytes())
            .and_then(|_| self.port.write_all(b"\r\n"))
            .and_then(|_| self.port.flush());
        if let Err(e) = result {
            log::error!("Serial write failed: {}", e);
        }
    }
}
