//! Device replies
//!
//! Every reply starts with `!`; the marker is stripped before
//! classification and lengths below are counted without it and without the
//! terminator:
//!
//! | reply          | layout                          | length |
//! |----------------|---------------------------------|--------|
//! | acknowledge    | address, sequence, checksum     | 10     |
//! | info           | header, 20 chars text, checksum | 30     |
//! | device error   | header, `+`, 2 hex code, checksum | 13   |
//! | value          | header, 8 hex value, checksum   | 18     |
//!
//! The classification order (ACK length, info length, `+` marker, value)
//! is fixed.

use super::frame::{
    ascii, parse_hex, verify_checksum, FieldLayout, Header, CHECKSUM_LEN, HEADER_LEN,
};
use super::{Field, Frame, ProtocolError, REPLY_MARKER};
use crate::registry::{ErrorDescriptor, ErrorTable, Value, WireFormat};

/// Header length without the marker
const STRIPPED_HEADER_LEN: usize = 6;

/// Acknowledge: header and checksum only
pub const ACK_LEN: usize = STRIPPED_HEADER_LEN + CHECKSUM_LEN;

/// Length of the identification text in an info reply
pub const INFO_TEXT_LEN: usize = 20;

/// Info reply: header, identification text, checksum
pub const INFO_LEN: usize = STRIPPED_HEADER_LEN + INFO_TEXT_LEN + CHECKSUM_LEN;

const ERROR_MARKER: u8 = b'+';

/// A classified device reply
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// Command accepted, no payload. The checksum echoes the request's.
    Ack {
        /// Reply header
        header: Header,
        /// Echoed request checksum
        checksum: u16,
    },
    /// Identification string (checksum not validated)
    Info {
        /// Reply header
        header: Header,
        /// Fixed-width identification text
        text: String,
    },
    /// Device rejected the command
    DeviceError {
        /// Reply header
        header: Header,
        /// Error code, see [`ErrorTable`]
        code: u8,
    },
    /// Parameter value
    Value {
        /// Reply header
        header: Header,
        /// Decoded value
        value: Value,
    },
}

impl Response {
    /// Classify a reply with its leading `!` already stripped.
    ///
    /// `format` is the wire format of the requested parameter; it is only
    /// needed when the reply turns out to be a value reply.
    pub fn classify(reply: &[u8], format: Option<WireFormat>) -> Result<Self, ProtocolError> {
        let mut frame = Vec::with_capacity(reply.len() + 1);
        frame.push(REPLY_MARKER as u8);
        frame.extend_from_slice(reply);

        if reply.len() == ACK_LEN {
            let header = Header::parse(&frame)?;
            let checksum = parse_hex(&reply[STRIPPED_HEADER_LEN..])? as u16;
            Ok(Response::Ack { header, checksum })
        } else if reply.len() == INFO_LEN {
            let header = Header::parse(&frame)?;
            let text = ascii(&reply[STRIPPED_HEADER_LEN..STRIPPED_HEADER_LEN + INFO_TEXT_LEN])?;
            Ok(Response::Info { header, text })
        } else if reply.contains(&ERROR_MARKER) {
            Self::decode_device_error(&frame)
        } else {
            let format = format.ok_or_else(|| {
                ProtocolError::FormatError(format!(
                    "unexpected value reply of {} bytes",
                    reply.len()
                ))
            })?;
            Self::decode_value(&frame, format)
        }
    }

    fn decode_device_error(frame: &[u8]) -> Result<Self, ProtocolError> {
        verify_checksum(frame)?;
        let header = Header::parse(frame)?;
        let payload = &frame[HEADER_LEN..frame.len() - CHECKSUM_LEN];
        match payload {
            [ERROR_MARKER, code @ ..] if code.len() == 2 => Ok(Response::DeviceError {
                header,
                code: parse_hex(code)? as u8,
            }),
            _ => Err(ProtocolError::FormatError(format!(
                "malformed error payload {:?}",
                String::from_utf8_lossy(payload)
            ))),
        }
    }

    fn decode_value(frame: &[u8], format: WireFormat) -> Result<Self, ProtocolError> {
        // Integers and floats are both carried as one 8-digit word
        let parsed = Frame::parse(frame, &[FieldLayout::Int])?;
        let raw = match parsed.payload() {
            [Field::Int(word)] => *word as u32,
            other => {
                return Err(ProtocolError::FormatError(format!(
                    "unexpected value payload {:?}",
                    other
                )))
            }
        };
        Ok(Response::Value {
            header: *parsed.header(),
            value: format.decode(raw)?,
        })
    }

    /// Header of the reply
    pub fn header(&self) -> &Header {
        match self {
            Response::Ack { header, .. }
            | Response::Info { header, .. }
            | Response::DeviceError { header, .. }
            | Response::Value { header, .. } => header,
        }
    }

    /// Sequence number of the reply
    pub fn sequence(&self) -> u16 {
        self.header().sequence
    }

    /// Whether this is an acknowledge
    pub fn is_ack(&self) -> bool {
        matches!(self, Response::Ack { .. })
    }

    /// Resolve a device error code against `table`. `None` for other
    /// replies and for codes missing from the table.
    pub fn error<'t>(&self, table: &'t ErrorTable) -> Option<&'t ErrorDescriptor> {
        match self {
            Response::DeviceError { code, .. } => table.get_by_code(*code),
            _ => None,
        }
    }

    /// Fail unless the reply carries the query's sequence number
    pub fn check_sequence(&self, expected: u16) -> Result<(), ProtocolError> {
        let actual = self.sequence();
        if actual != expected {
            return Err(ProtocolError::WrongResponseSequence { expected, actual });
        }
        Ok(())
    }

    /// Turn device error replies into [`ProtocolError::DeviceError`]
    pub fn into_result(self, table: &ErrorTable) -> Result<Self, ProtocolError> {
        match self {
            Response::DeviceError { header, code } => Err(ProtocolError::DeviceError {
                address: header.address,
                code,
                descriptor: table.get_by_code(code).cloned(),
            }),
            other => Ok(other),
        }
    }
}
