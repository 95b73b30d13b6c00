//! Protocol errors

use thiserror::Error;

use crate::registry::ErrorDescriptor;

/// Errors that can occur during MeCom communication
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Reply could not be parsed
    #[error("Malformed frame: {0}")]
    FormatError(String),

    /// Reply checksum does not match its contents
    #[error("Checksum mismatch: computed {expected:#06x}, received {actual:#06x}")]
    ChecksumError {
        /// Computed over the received bytes
        expected: u16,
        /// Carried in the reply
        actual: u16,
    },

    /// No complete reply within the read timeout
    #[error("Timeout while waiting for device response")]
    ResponseTimeout,

    /// Reply belongs to a different request
    #[error("Wrong response sequence: expected {expected:#06x}, got {actual:#06x}")]
    WrongResponseSequence {
        /// Sequence of the request just sent
        expected: u16,
        /// Sequence found in the reply
        actual: u16,
    },

    /// Device answered with a `+XX` error code
    #[error(
        "Device {address} raised error {code}: {}",
        .descriptor.as_ref().map_or("unknown error code", |d| d.description.as_str())
    )]
    DeviceError {
        /// Address of the device that rejected the request
        address: u8,
        /// Raw error code
        code: u8,
        /// Table entry for the code, if known
        descriptor: Option<ErrorDescriptor>,
    },

    /// Parameter name or id not in the registry
    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    /// Device family name not recognised
    #[error("Unknown MeCom device family: {0}")]
    UnknownMeComFamily(String),

    /// Value does not fit the parameter's wire format
    #[error("Value {value} cannot be encoded as {format}")]
    UnsupportedValue {
        /// Offending value as text
        value: String,
        /// Target wire format
        format: String,
    },

    /// No terminator within the frame length limit
    #[error("Frame exceeds {0} bytes without terminator")]
    FrameTooLong(usize),

    /// "Flash Status" never reported idle
    #[error("Flash write did not complete within {0} ms")]
    FlashTimeout(u64),

    /// Serial port could not be opened or configured
    #[error("Serial port error: {0}")]
    SerialError(String),

    /// Parameter or error table is inconsistent
    #[error("Invalid device table: {0}")]
    TableError(String),

    /// Configuration failed to load or validate
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Channel I/O failure
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ProtocolError {
    /// Whether the device itself rejected the request (as opposed to a
    /// transport or framing fault)
    pub fn is_device_error(&self) -> bool {
        matches!(self, ProtocolError::DeviceError { .. })
    }
}
