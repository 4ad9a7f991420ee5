pub mod device;
pub mod host;

pub use device::DeviceConfig;
pub use host::{HostConfig, SendPolicy};

use std::path::Path;

use serde::de::DeserializeOwned;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read {path}: {source}")]
    Read { path: String, source: std::io::Error },

    #[error("Invalid configuration in {path}: {source}")]
    Parse { path: String, source: serde_json::Error },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Load a JSON settings file; missing keys fall back to their defaults
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let display = path.display().to_string();
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read { path: display.clone(), source })?;
    serde_json::from_str(&text).map_err(|source| ConfigError::Parse { path: display, source })
}
