use serde::{Deserialize, Serialize};

use super::{ConfigError, Result};
use crate::link::BAUD_RATE;
use crate::serial::ConnectOptions;

/// When the host writes a finger state to the link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SendPolicy {
    /// One message for every frame with a detected hand
    EveryFrame,
    /// Only when the state differs from the last message sent
    OnChange,
}

/// Host application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    pub port: String,
    pub baud_rate: u32,
    pub retry_count: u32,
    pub retry_delay_ms: u64,
    pub settle_ms: u64,
    pub reply_timeout_ms: u64,
    /// Shell command producing JSON landmark frames on stdout; stdin when unset
    pub detector: Option<String>,
    pub min_confidence: f32,
    pub send_policy: SendPolicy,
    /// Pause between the all-on and all-off halves of the test pattern
    pub test_pattern_gap_ms: u64,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            port: default_port().to_string(),
            baud_rate: BAUD_RATE,
            retry_count: 3,
            retry_delay_ms: 2000,
            settle_ms: 2000,
            reply_timeout_ms: 1000,
            detector: None,
            min_confidence: 0.7,
            send_policy: SendPolicy::EveryFrame,
            test_pattern_gap_ms: 500,
        }
    }
}

impl HostConfig {
    pub fn validate(&self) -> Result<()> {
        if self.port.trim().is_empty() {
            return Err(ConfigError::Invalid("serial port name is empty".to_string()));
        }
        if self.baud_rate == 0 {
            return Err(ConfigError::Invalid("baud rate must be positive".to_string()));
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(ConfigError::Invalid(format!(
                "min_confidence {} outside 0.0..=1.0",
                self.min_confidence
            )));
        }
        Ok(())
    }

    pub fn connect_options(&self) -> ConnectOptions {
        ConnectOptions {
            port: self.port.clone(),
            baud_rate: self.baud_rate,
            settle_ms: self.settle_ms,
            reply_timeout_ms: self.reply_timeout_ms,
        }
    }
}

#[cfg(windows)]
fn default_port() -> &'static str {
    "COM8"
}

#[cfg(not(windows))]
fn default_port() -> &'static str {
    "/dev/ttyUSB0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: HostConfig = serde_json::from_str(r#"{"port":"/dev/ttyACM0","send_policy":"on-change"}"#).unwrap();
        assert_eq!(config.port, "/dev/ttyACM0");
        assert_eq!(config.send_policy, SendPolicy::OnChange);
        assert_eq!(config.baud_rate, 115200);
        assert_eq!(config.retry_count, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = HostConfig { min_confidence: 1.5, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
        let config = HostConfig { port: " ".into(), ..Default::default() };
        assert!(config.validate().is_err());
    }
}
