use super::{
    Clock, Console, Gpio, LineAccumulator, LineEvent, PinLevel, SessionState, StatusReport, Watchdog,
};
use crate::config::{self, DeviceConfig};
use crate::hand::FingerState;
use crate::link::{self, ValidationError, READY_BANNER};

/// Maintenance commands accepted in place of a finger state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceCommand {
    Status,
    SelfTest,
    Reset,
}

impl DeviceCommand {
    pub fn parse(line: &[u8]) -> Option<Self> {
        match line {
            b"STATUS" => Some(DeviceCommand::Status),
            b"TEST" => Some(DeviceCommand::SelfTest),
            b"RESET" => Some(DeviceCommand::Reset),
            _ => None,
        }
    }
}

/// What happened to one complete line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    /// LEDs updated; carries the levels read back from the pins
    Applied(FingerState),
    Rejected(ValidationError),
    Command(DeviceCommand),
}

/// Main loop state of the LED board
pub struct LedController<G: Gpio, C: Clock, S: Console> {
    gpio: G,
    clock: C,
    console: S,
    config: DeviceConfig,
    lines: LineAccumulator,
    session: SessionState,
    watchdog: Watchdog,
}

impl<G: Gpio, C: Clock, S: Console> LedController<G, C, S> {
    /// Fails when `config` does not pass [`DeviceConfig::validate`]
    pub fn new(gpio: G, clock: C, console: S, config: DeviceConfig) -> config::Result<Self> {
        config.validate()?;
        let now = clock.now_ms();
        Ok(Self {
            lines: LineAccumulator::new(config.line_capacity),
            watchdog: Watchdog::new(config.timeout_ms),
            session: SessionState::new(now),
            gpio,
            clock,
            console,
            config,
        })
    }

    /// Power-on sequence: LEDs off, light show, banner, first status block
    pub fn boot(&mut self) {
        self.write_all(PinLevel::Low);

        for pin in self.config.led_pins {
            self.gpio.set_level(pin, PinLevel::High);
            self.clock.delay_ms(self.config.boot_step_ms);
            self.gpio.set_level(pin, PinLevel::Low);
        }
        self.write_all(PinLevel::High);
        self.clock.delay_ms(self.config.boot_hold_ms);
        self.write_all(PinLevel::Low);

        self.session.reset(self.clock.now_ms());
        self.console.write_line(READY_BANNER);
        self.report_status();
        log::info!("LED controller booted, pins {:?}", self.config.led_pins);
    }

    /// One pass of the main loop
    pub fn tick(&mut self) {
        while let Some(byte) = self.console.read_byte() {
            self.feed_byte(byte);
        }
        self.check_watchdog();
    }

    /// Advance the line buffer by one byte and act on a finished line
    pub fn feed_byte(&mut self, byte: u8) -> Option<LineOutcome> {
        match self.lines.push(byte) {
            LineEvent::Continue => None,
            LineEvent::Complete(line) => Some(self.handle_line(&line)),
            LineEvent::Overflow { observed } => {
                self.session.record_error();
                self.console.write_line(&format!(
                    "Error: Message too long ({} bytes, max {}), discarded",
                    observed,
                    self.lines.capacity()
                ));
                None
            }
        }
    }

    /// Validate and apply one complete line (raw bytes, terminator stripped)
    pub fn handle_line(&mut self, line: &[u8]) -> LineOutcome {
        self.console.write_line(&format!("Received: {}", String::from_utf8_lossy(line)));

        if let Some(command) = DeviceCommand::parse(line) {
            self.run_command(command);
            return LineOutcome::Command(command);
        }

        match link::decode(line) {
            Ok(state) => LineOutcome::Applied(self.apply(&state)),
            Err(e) => {
                self.session.record_error();
                self.console.write_line(&format!("Error: {}", e));
                LineOutcome::Rejected(e)
            }
        }
    }

    fn apply(&mut self, state: &FingerState) -> FingerState {
        for (pin, on) in self.config.led_pins.into_iter().zip(state.to_array()) {
            self.gpio.set_level(pin, PinLevel::from_bool(on));
        }
        self.session.record_message(self.clock.now_ms());

        let actual = self.pin_states();
        self.console.write_line(&format!("OK: LEDs updated [{}]", link::encode(&actual)));

        if self.session.messages_received % self.config.status_interval == 0 {
            self.report_status();
        }
        actual
    }

    /// Blank the LEDs if the link has been silent too long. Returns `true` when it fired.
    pub fn check_watchdog(&mut self) -> bool {
        if !self.watchdog.check(&mut self.session, self.clock.now_ms()) {
            return false;
        }
        self.write_all(PinLevel::Low);
        self.console.write_line(&format!(
            "Warning: No data received for {} ms, LEDs turned off",
            self.watchdog.timeout_ms()
        ));
        log::warn!("Link silent, LEDs blanked");
        true
    }

    pub fn run_command(&mut self, command: DeviceCommand) {
        match command {
            DeviceCommand::Status => self.report_status(),
            DeviceCommand::SelfTest => {
                self.self_test();
            }
            DeviceCommand::Reset => self.reset(),
        }
    }

    pub fn status(&self) -> StatusReport {
        StatusReport::new(&self.session, self.pin_states())
    }

    pub fn report_status(&mut self) {
        for line in self.status().lines() {
            self.console.write_line(&line);
        }
    }

    /// Pulse each LED and read it back. Returns the pins that did not go HIGH.
    /// The LEDs are left as they were before the test.
    pub fn self_test(&mut self) -> Vec<u8> {
        self.console.write_line("Running self-test...");
        let before = self.pin_states();

        let mut failed = Vec::new();
        for pin in self.config.led_pins {
            self.gpio.set_level(pin, PinLevel::High);
            self.clock.delay_ms(self.config.self_test_pulse_ms);
            if !self.gpio.level(pin).is_high() {
                self.console.write_line(&format!("Self-test FAILED: pin {} did not go HIGH", pin));
                failed.push(pin);
            }
            self.gpio.set_level(pin, PinLevel::Low);
        }

        for (pin, on) in self.config.led_pins.into_iter().zip(before.to_array()) {
            self.gpio.set_level(pin, PinLevel::from_bool(on));
        }

        if failed.is_empty() {
            self.console.write_line("Self-test passed");
        } else {
            self.console.write_line(&format!("Self-test finished: {} pin(s) failed", failed.len()));
        }
        failed
    }

    /// Clear counters and the input buffer, LEDs off
    pub fn reset(&mut self) {
        self.lines.clear();
        self.write_all(PinLevel::Low);
        self.session.reset(self.clock.now_ms());
        self.console.write_line("Reset complete");
    }

    /// Levels read back from the LED pins, in wire order
    pub fn pin_states(&self) -> FingerState {
        let mut bits = [false; 5];
        for (bit, pin) in bits.iter_mut().zip(self.config.led_pins) {
            *bit = self.gpio.level(pin).is_high();
        }
        FingerState::from_array(bits)
    }

    fn write_all(&mut self, level: PinLevel) {
        for pin in self.config.led_pins {
            self.gpio.set_level(pin, level);
        }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    pub fn console_mut(&mut self) -> &mut S {
        &mut self.console
    }
}
