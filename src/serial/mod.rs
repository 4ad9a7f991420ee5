pub mod interface;
pub mod status;

pub use interface::{ConnectOptions, SerialInterface, SerialPortIO};
pub use status::{parse_device_line, DeviceLine};

use serde::{Deserialize, Serialize};

/// A serial port as reported by the operating system
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerialDeviceInfo {
    pub port_name: String,
    pub description: String,
    pub vid: Option<u16>,
    pub pid: Option<u16>,
    pub serial_number: Option<String>,
    pub manufacturer: Option<String>,
    pub product: Option<String>,
}

impl SerialDeviceInfo {
    /// Hardware id in the `USB VID:PID=XXXX:XXXX SER=...` form
    pub fn hardware_id(&self) -> String {
        match (self.vid, self.pid) {
            (Some(vid), Some(pid)) => match &self.serial_number {
                Some(ser) => format!("USB VID:PID={:04X}:{:04X} SER={}", vid, pid, ser),
                None => format!("USB VID:PID={:04X}:{:04X}", vid, pid),
            },
            _ => "n/a".to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SerialError {
    #[error("Port unavailable: {port}: {reason}")]
    PortUnavailable { port: String, reason: String },

    #[error("Not connected")]
    NotConnected,

    #[error("Communication timeout")]
    Timeout,

    #[error("Invalid finger state: {0}")]
    InvalidMessage(#[from] crate::link::ValidationError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialport error: {0}")]
    SerialportError(#[from] serialport::Error),
}

impl SerialError {
    pub fn port_unavailable(port: &str, reason: impl ToString) -> Self {
        SerialError::PortUnavailable {
            port: port.to_string(),
            reason: reason.to_string(),
        }
    }

    /// True when the port is held by another program (IDE serial monitor etc.)
    pub fn is_access_denied(&self) -> bool {
        match self {
            SerialError::PortUnavailable { reason, .. } => {
                let reason = reason.to_lowercase();
                reason.contains("access is denied") || reason.contains("permission denied") || reason.contains("busy")
            }
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, SerialError>;
