/// Counters and timestamps of the current link session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub messages_received: u64,
    pub error_count: u64,
    /// Time of the last accepted message (or of boot/reset)
    pub last_message_ms: u64,
    /// Latched once the watchdog has blanked the LEDs
    pub timed_out: bool,
}

impl SessionState {
    pub fn new(now_ms: u64) -> Self {
        Self {
            messages_received: 0,
            error_count: 0,
            last_message_ms: now_ms,
            timed_out: false,
        }
    }

    /// Count an accepted message and restart the silence timer
    pub fn record_message(&mut self, now_ms: u64) {
        self.messages_received += 1;
        self.last_message_ms = now_ms;
        self.timed_out = false;
    }

    pub fn record_error(&mut self) {
        self.error_count += 1;
    }

    pub fn silence_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.last_message_ms)
    }

    /// Start over as if the board had just booted
    pub fn reset(&mut self, now_ms: u64) {
        *self = Self::new(now_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_message_clears_latch() {
        let mut session = SessionState::new(100);
        session.timed_out = true;
        session.record_message(7_000);
        assert_eq!(session.messages_received, 1);
        assert_eq!(session.last_message_ms, 7_000);
        assert!(!session.timed_out);
        assert_eq!(session.silence_ms(7_250), 250);
    }

    #[test]
    fn test_reset_clears_counters() {
        let mut session = SessionState::new(0);
        session.record_message(10);
        session.record_error();
        session.reset(500);
        assert_eq!(session, SessionState::new(500));
    }
}
