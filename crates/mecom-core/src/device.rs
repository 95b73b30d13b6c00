//! Device helpers
//!
//! Convenience calls on top of [`Session`] that only need the standard
//! parameters every MeCom device exposes.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::protocol::{Channel, ProtocolError, Session};

const DEVICE_ADDRESS: &str = "Device Address";
const DEVICE_STATUS: &str = "Device Status";
const SAVE_TO_FLASH: &str = "Save Data to Flash";
const FLASH_STATUS: &str = "Flash Status";

/// Instance used for device-global parameters
const GLOBAL_INSTANCE: u8 = 1;

/// Operating state reported by "Device Status"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceStatus {
    /// Starting up
    Init,
    /// Idle, output off
    Ready,
    /// Output active
    Run,
    /// Halted on an error condition
    Error,
    /// Waiting for a firmware update
    Bootloader,
    /// Device will reset within the next 200 ms
    ResetPending,
    /// Code this crate does not know
    Unknown(i32),
}

impl From<i32> for DeviceStatus {
    fn from(code: i32) -> Self {
        match code {
            0 => DeviceStatus::Init,
            1 => DeviceStatus::Ready,
            2 => DeviceStatus::Run,
            3 => DeviceStatus::Error,
            4 => DeviceStatus::Bootloader,
            5 => DeviceStatus::ResetPending,
            other => DeviceStatus::Unknown(other),
        }
    }
}

/// Timing of [`Session::write_to_flash`]
#[derive(Debug, Clone, Copy)]
pub struct FlashWriteOptions {
    /// Pause between "Flash Status" polls
    pub poll_interval: Duration,
    /// Give up after this long
    pub deadline: Duration,
}

impl Default for FlashWriteOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            deadline: Duration::from_secs(10),
        }
    }
}

impl<C: Channel> Session<C> {
    /// Read the device's own address. Addressing 0 reaches whatever device
    /// is on a point-to-point link.
    pub fn identify(&self, address: u8) -> Result<u8, ProtocolError> {
        let value = self.get_parameter(DEVICE_ADDRESS, address, GLOBAL_INSTANCE)?;
        let raw = value.as_int().ok_or_else(|| {
            ProtocolError::FormatError(format!("device address is not an integer: {}", value))
        })?;
        u8::try_from(raw)
            .map_err(|_| ProtocolError::FormatError(format!("device address out of range: {}", raw)))
    }

    /// Read the operating state
    pub fn status(&self, address: u8) -> Result<DeviceStatus, ProtocolError> {
        let value = self.get_parameter(DEVICE_STATUS, address, GLOBAL_INSTANCE)?;
        Ok(value.as_int().map_or(DeviceStatus::Unknown(-1), DeviceStatus::from))
    }

    /// Let the device persist parameter changes to flash
    pub fn enable_autosave(&self, address: u8) -> Result<bool, ProtocolError> {
        self.set_parameter(SAVE_TO_FLASH, 0i32, address, GLOBAL_INSTANCE)
    }

    /// Keep parameter changes in RAM only
    pub fn disable_autosave(&self, address: u8) -> Result<bool, ProtocolError> {
        self.set_parameter(SAVE_TO_FLASH, 1i32, address, GLOBAL_INSTANCE)
    }

    /// Persist all parameters: enable autosave, wait until "Flash Status"
    /// reports 0 (everything saved), then disable autosave again.
    pub fn write_to_flash(
        &self,
        address: u8,
        options: FlashWriteOptions,
    ) -> Result<(), ProtocolError> {
        self.enable_autosave(address)?;
        let start = Instant::now();

        loop {
            let status = self.get_parameter(FLASH_STATUS, address, GLOBAL_INSTANCE)?;
            if status.as_int() == Some(0) {
                break;
            }
            if start.elapsed() > options.deadline {
                return Err(ProtocolError::FlashTimeout(options.deadline.as_millis() as u64));
            }
            tracing::debug!(%status, "waiting for flash write");
            std::thread::sleep(options.poll_interval);
        }

        self.disable_autosave(address)?;
        tracing::info!(address, elapsed_ms = start.elapsed().as_millis() as u64, "parameters saved to flash");
        Ok(())
    }
}
