use serde::{Deserialize, Serialize};

use super::{ConfigError, Result};
use crate::link::MESSAGE_LEN;

/// LED controller settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// GPIO numbers in wire order: thumb, index, middle, ring, pinky
    pub led_pins: [u8; 5],
    /// Silence after which every LED is switched off
    pub timeout_ms: u64,
    /// Longest line accepted before the input is discarded
    pub line_capacity: usize,
    /// Print a status block after this many accepted messages
    pub status_interval: u64,
    pub self_test_pulse_ms: u64,
    pub boot_step_ms: u64,
    pub boot_hold_ms: u64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            led_pins: [13, 12, 14, 27, 26],
            timeout_ms: 5000,
            line_capacity: 32,
            status_interval: 100,
            self_test_pulse_ms: 100,
            boot_step_ms: 200,
            boot_hold_ms: 500,
        }
    }
}

impl DeviceConfig {
    pub fn validate(&self) -> Result<()> {
        if self.line_capacity < MESSAGE_LEN {
            return Err(ConfigError::Invalid(format!(
                "line_capacity {} cannot hold a {}-character message",
                self.line_capacity, MESSAGE_LEN
            )));
        }
        if self.status_interval == 0 {
            return Err(ConfigError::Invalid("status_interval must be at least 1".to_string()));
        }
        let mut pins = self.led_pins.to_vec();
        pins.sort_unstable();
        pins.dedup();
        if pins.len() != self.led_pins.len() {
            return Err(ConfigError::Invalid(format!("duplicate LED pin in {:?}", self.led_pins)));
        }
        Ok(())
    }
}
