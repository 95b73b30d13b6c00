//! Session configuration
//!
//! Serializable connection settings. Every field has a default so a JSON
//! file only needs to name what differs, e.g. `{ "port_name": "COM3" }`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::protocol::{ProtocolError, DEFAULT_BAUD_RATE, DEFAULT_TIMEOUT_MS, MAX_FRAME_LEN};
use crate::registry::{DeviceFamily, DeviceTables};

/// Connection configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Serial port name (e.g. "/dev/ttyUSB0" or "COM3")
    pub port_name: String,
    /// Baud rate
    pub baud_rate: u32,
    /// Per-read timeout in milliseconds
    pub timeout_ms: u64,
    /// Built-in table set to use
    pub family: DeviceFamily,
    /// Custom JSON table file; overrides `family` when set
    pub tables_path: Option<PathBuf>,
    /// Longest reply accepted before the terminator
    pub max_frame_len: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            port_name: "/dev/ttyUSB0".to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            family: DeviceFamily::default(),
            tables_path: None,
            max_frame_len: MAX_FRAME_LEN,
        }
    }
}

impl SessionConfig {
    /// Defaults for the given port
    pub fn new(port_name: impl Into<String>) -> Self {
        Self {
            port_name: port_name.into(),
            ..Self::default()
        }
    }

    /// Per-read timeout as a duration
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Parse from JSON
    pub fn from_json_str(json: &str) -> Result<Self, ProtocolError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ProtocolError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ProtocolError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&json)
    }

    /// Reject settings no session can run with
    pub fn validate(&self) -> Result<(), ProtocolError> {
        if self.baud_rate == 0 {
            return Err(ProtocolError::ConfigError("baud_rate must be > 0".to_string()));
        }
        if self.timeout_ms == 0 {
            return Err(ProtocolError::ConfigError("timeout_ms must be > 0".to_string()));
        }
        if self.max_frame_len == 0 {
            return Err(ProtocolError::ConfigError(
                "max_frame_len must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Tables selected by this configuration
    pub fn load_tables(&self) -> Result<DeviceTables, ProtocolError> {
        match &self.tables_path {
            Some(path) => DeviceTables::from_file(path),
            None => DeviceTables::for_family(self.family),
        }
    }
}
