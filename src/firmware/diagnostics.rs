use super::SessionState;
use crate::hand::FingerState;
use crate::link;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    Active,
    TimedOut,
}

impl LinkStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkStatus::Active => "Active",
            LinkStatus::TimedOut => "Timed out",
        }
    }
}

/// Snapshot printed in `=== Status ===` blocks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub messages_received: u64,
    pub error_count: u64,
    pub link: LinkStatus,
    pub leds: FingerState,
}

impl StatusReport {
    pub fn new(session: &SessionState, leds: FingerState) -> Self {
        Self {
            messages_received: session.messages_received,
            error_count: session.error_count,
            link: if session.timed_out { LinkStatus::TimedOut } else { LinkStatus::Active },
            leds,
        }
    }

    pub fn lines(&self) -> Vec<String> {
        vec![
            "=== Status ===".to_string(),
            format!("Messages received: {}", self.messages_received),
            format!("Errors: {}", self.error_count),
            format!("Connection: {}", self.link.as_str()),
            format!("LED states: {}", link::encode(&self.leds)),
            "==============".to_string(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_block_layout() {
        let mut session = SessionState::new(0);
        session.record_message(1);
        session.record_error();
        session.timed_out = true;
        let report = StatusReport::new(&session, FingerState::from_array([true, false, false, false, true]));
        assert_eq!(
            report.lines(),
            vec![
                "=== Status ===",
                "Messages received: 1",
                "Errors: 1",
                "Connection: Timed out",
                "LED states: 10001",
                "==============",
            ]
        );
    }
}
