//! Frame encoding/decoding
//!
//! A MeCom frame is plain ASCII:
//!
//! ```text
//! <marker><address:2 hex><sequence:4 hex><payload...><checksum:4 hex>\r
//! ```
//!
//! Integers travel as 8 hex digits of their two's complement, floats as
//! 8 hex digits of their IEEE-754 bit pattern. All hex is uppercase and
//! zero padded. The checksum covers everything before it.

use std::fmt::Write as _;

use super::{checksum, ProtocolError, TERMINATOR};

/// Length of marker + address + sequence
pub const HEADER_LEN: usize = 7;

/// Length of the trailing checksum field
pub const CHECKSUM_LEN: usize = 4;

/// One typed payload field
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    /// Literal ASCII, written verbatim (command prefixes, short hex ids)
    Ascii(String),
    /// Signed 32-bit integer, 8 hex digits
    Int(i32),
    /// IEEE-754 single, 8 hex digits of the bit pattern
    Float(f32),
}

impl Field {
    fn write_to(&self, out: &mut String) {
        // Writing into a String cannot fail
        let _ = match self {
            Field::Ascii(text) => out.write_str(text),
            Field::Int(value) => write!(out, "{:08X}", *value as u32),
            Field::Float(value) => write!(out, "{:08X}", value.to_bits()),
        };
    }
}

/// Shape of a payload field when parsing a frame back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldLayout {
    /// ASCII run of the given length
    Ascii(usize),
    /// 8 hex digits decoded as `i32`
    Int,
    /// 8 hex digits decoded as `f32`
    Float,
}

/// Frame header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Source marker: `#` for queries, `!` for replies
    pub marker: char,
    /// Device address (0 is broadcast)
    pub address: u8,
    /// Sequence number correlating a reply with its query
    pub sequence: u16,
}

impl Header {
    /// Parse the first [`HEADER_LEN`] bytes of a frame
    pub fn parse(bytes: &[u8]) -> Result<Self, ProtocolError> {
        if bytes.len() < HEADER_LEN {
            return Err(ProtocolError::FormatError(format!(
                "header needs {} bytes, got {}",
                HEADER_LEN,
                bytes.len()
            )));
        }

        Ok(Self {
            marker: bytes[0] as char,
            address: parse_hex(&bytes[1..3])? as u8,
            sequence: parse_hex(&bytes[3..7])? as u16,
        })
    }

    fn write_to(&self, out: &mut String) {
        let _ = write!(out, "{}{:02X}{:04X}", self.marker, self.address, self.sequence);
    }
}

/// A complete protocol frame
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    header: Header,
    payload: Vec<Field>,
    checksum: Option<u16>,
}

impl Frame {
    /// Create an empty frame with the given header fields
    pub fn new(marker: char, address: u8, sequence: u16) -> Self {
        Self {
            header: Header {
                marker,
                address,
                sequence,
            },
            payload: Vec::new(),
            checksum: None,
        }
    }

    /// Append a payload field (builder style)
    ///
    /// Fields can only be added while no checksum is attached.
    pub fn field(mut self, field: Field) -> Self {
        debug_assert!(self.checksum.is_none(), "frame already sealed");
        self.payload.push(field);
        self
    }

    /// Append an ASCII field (builder style)
    pub fn ascii(self, text: impl Into<String>) -> Self {
        self.field(Field::Ascii(text.into()))
    }

    /// Header of this frame
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Payload fields in wire order
    pub fn payload(&self) -> &[Field] {
        &self.payload
    }

    /// Checksum, if computed or received
    pub fn checksum(&self) -> Option<u16> {
        self.checksum
    }

    /// Compute and attach the checksum if none is set yet. Returns the
    /// (possibly pre-existing) checksum.
    pub fn seal(&mut self) -> u16 {
        if let Some(existing) = self.checksum {
            return existing;
        }
        let computed = checksum(&self.serialize(true));
        self.checksum = Some(computed);
        computed
    }

    /// Serialize to wire bytes.
    ///
    /// With `partial` only header and payload are returned, which is the
    /// exact checksum input. Otherwise checksum and terminator follow.
    pub fn serialize(&self, partial: bool) -> Vec<u8> {
        let mut out = String::with_capacity(32);
        self.header.write_to(&mut out);
        for field in &self.payload {
            field.write_to(&mut out);
        }
        if partial {
            return out.into_bytes();
        }

        let crc = self
            .checksum
            .unwrap_or_else(|| checksum(out.as_bytes()));
        let _ = write!(out, "{:04X}", crc);
        let mut bytes = out.into_bytes();
        bytes.push(TERMINATOR);
        bytes
    }

    /// Parse wire bytes back into a frame, given the payload layout.
    ///
    /// Accepts input with or without the trailing terminator. The received
    /// checksum is verified and attached to the returned frame.
    pub fn parse(wire: &[u8], layout: &[FieldLayout]) -> Result<Self, ProtocolError> {
        let body = wire.strip_suffix(&[TERMINATOR]).unwrap_or(wire);
        let received = verify_checksum(body)?;
        let header = Header::parse(body)?;

        let content = &body[HEADER_LEN..body.len() - CHECKSUM_LEN];
        let mut offset = 0;
        let mut payload = Vec::with_capacity(layout.len());
        for part in layout {
            let width = match part {
                FieldLayout::Ascii(len) => *len,
                FieldLayout::Int | FieldLayout::Float => 8,
            };
            let chunk = content.get(offset..offset + width).ok_or_else(|| {
                ProtocolError::FormatError(format!(
                    "payload ends at {} bytes, layout needs {}",
                    content.len(),
                    offset + width
                ))
            })?;
            payload.push(match part {
                FieldLayout::Ascii(_) => Field::Ascii(ascii(chunk)?),
                FieldLayout::Int => Field::Int(parse_hex(chunk)? as i32),
                FieldLayout::Float => Field::Float(f32::from_bits(parse_hex(chunk)?)),
            });
            offset += width;
        }
        if offset != content.len() {
            return Err(ProtocolError::FormatError(format!(
                "{} trailing payload bytes",
                content.len() - offset
            )));
        }

        Ok(Self {
            header,
            payload,
            checksum: Some(received),
        })
    }
}

/// Verify the trailing checksum of a frame body (terminator removed).
///
/// Returns the received checksum on success.
pub fn verify_checksum(body: &[u8]) -> Result<u16, ProtocolError> {
    if body.len() < HEADER_LEN + CHECKSUM_LEN {
        return Err(ProtocolError::FormatError(format!(
            "frame too short for checksum: {} bytes",
            body.len()
        )));
    }
    let (content, trailer) = body.split_at(body.len() - CHECKSUM_LEN);
    let received = parse_hex(trailer)? as u16;
    let computed = checksum(content);
    if computed != received {
        return Err(ProtocolError::ChecksumError {
            expected: computed,
            actual: received,
        });
    }
    Ok(received)
}

/// Decode an uppercase or lowercase hex run of at most 8 digits
pub(crate) fn parse_hex(digits: &[u8]) -> Result<u32, ProtocolError> {
    if digits.is_empty() || digits.len() > 8 || !digits.iter().all(u8::is_ascii_hexdigit) {
        return Err(ProtocolError::FormatError(format!(
            "invalid hex field {:?}",
            String::from_utf8_lossy(digits)
        )));
    }
    // All bytes are ASCII hex digits at this point
    let text = std::str::from_utf8(digits)
        .map_err(|e| ProtocolError::FormatError(e.to_string()))?;
    u32::from_str_radix(text, 16).map_err(|e| ProtocolError::FormatError(e.to_string()))
}

/// Interpret bytes as ASCII text
pub(crate) fn ascii(bytes: &[u8]) -> Result<String, ProtocolError> {
    if !bytes.is_ascii() {
        return Err(ProtocolError::FormatError("non-ASCII payload".to_string()));
    }
    Ok(String::from_utf8_lossy(bytes).into_owned())
}
