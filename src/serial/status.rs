//! Classification of the human-readable lines the LED controller writes back.
//!
//! The host never acts on these; they only choose a log level and feed the
//! "last acknowledged" field of the on-screen status.

use crate::hand::FingerState;
use crate::link::{self, READY_BANNER};

#[derive(Debug, Clone, PartialEq)]
pub enum DeviceLine {
    /// `OK: LEDs updated [XXXXX]` with the pin levels read back on the device
    Ack(FingerState),
    /// `Received: <line>` echo
    Echo(String),
    /// `Error: <reason>`
    Error(String),
    /// `Warning: <reason>`
    Warning(String),
    /// `ESP32 LED Control Ready`
    Ready,
    /// Lines inside or framing a `=== Status ===` block
    Status(String),
    Other(String),
}

/// Parse one line of device output
pub fn parse_device_line(line: &str) -> DeviceLine {
    let line = line.trim();
    if let Some(rest) = line.strip_prefix("OK: LEDs updated [") {
        if let Some(bits) = rest.strip_suffix(']') {
            if let Ok(state) = link::decode(bits.as_bytes()) {
                return DeviceLine::Ack(state);
            }
        }
        return DeviceLine::Other(line.to_string());
    }
    if let Some(rest) = line.strip_prefix("Received:") {
        return DeviceLine::Echo(rest.trim().to_string());
    }
    if let Some(rest) = line.strip_prefix("Error:") {
        return DeviceLine::Error(rest.trim().to_string());
    }
    if let Some(rest) = line.strip_prefix("Warning:") {
        return DeviceLine::Warning(rest.trim().to_string());
    }
    if line == READY_BANNER {
        return DeviceLine::Ready;
    }
    if line.starts_with("===")
        || ["Messages received:", "Errors:", "Connection:", "LED states:"]
            .iter()
            .any(|prefix| line.starts_with(prefix))
    {
        return DeviceLine::Status(line.to_string());
    }
    DeviceLine::Other(line.to_string())
}

impl DeviceLine {
    /// Log the line at a level matching its meaning
    pub fn log(&self) {
        match self {
            DeviceLine::Ack(state) => log::debug!("Device ack: [{}]", link::encode(state)),
            DeviceLine::Echo(line) => log::debug!("Device received: {}", line),
            DeviceLine::Error(reason) => log::warn!("Device error: {}", reason),
            DeviceLine::Warning(reason) => log::warn!("Device warning: {}", reason),
            DeviceLine::Ready => log::info!("Device ready"),
            DeviceLine::Status(line) => log::info!("Device: {}", line),
            DeviceLine::Other(line) => log::info!("Device: {}", line),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ack() {
        let line = parse_device_line("OK: LEDs updated [10110]\r");
        assert_eq!(line, DeviceLine::Ack(FingerState::from_array([true, false, true, true, false])));
        assert!(matches!(parse_device_line("OK: LEDs updated [10x10]"), DeviceLine::Other(_)));
    }

    #[test]
    fn test_parse_diagnostics() {
        assert_eq!(parse_device_line("Received: 11111"), DeviceLine::Echo("11111".into()));
        assert_eq!(
            parse_device_line("Error: Invalid message length. Expected 5, got 3"),
            DeviceLine::Error("Invalid message length. Expected 5, got 3".into())
        );
        assert!(matches!(parse_device_line("Warning: No data received"), DeviceLine::Warning(_)));
        assert_eq!(parse_device_line("ESP32 LED Control Ready"), DeviceLine::Ready);
        assert!(matches!(parse_device_line("=== Status ==="), DeviceLine::Status(_)));
        assert!(matches!(parse_device_line("Errors: 2"), DeviceLine::Status(_)));
        assert!(matches!(parse_device_line("Self-test passed"), DeviceLine::Other(_)));
    }
}
