use super::SessionState;

/// Silence timer that blanks the LEDs once per silent period
#[derive(Debug, Clone, Copy)]
pub struct Watchdog {
    timeout_ms: u64,
}

impl Watchdog {
    pub fn new(timeout_ms: u64) -> Self {
        Self { timeout_ms }
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    /// Returns `true` exactly once per silent period, latching `session.timed_out`.
    /// The latch is released by [`SessionState::record_message`].
    pub fn check(&self, session: &mut SessionState, now_ms: u64) -> bool {
        if session.timed_out || session.silence_ms(now_ms) < self.timeout_ms {
            return false;
        }
        session.timed_out = true;
        true
    }
}
