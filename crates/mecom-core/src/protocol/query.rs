//! Protocol queries
//!
//! Defines the four request kinds the host can send to a MeCom device.

use std::fmt::Write as _;

use super::{Frame, ProtocolError, QUERY_MARKER};
use crate::registry::{Parameter, Value, WireFormat};

/// Request kinds, each with its fixed payload prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    /// Read a parameter value (`?VR`)
    GetValue,
    /// Write a parameter value (`VS`)
    SetValue,
    /// Reset the device (`RS`)
    Reset,
    /// Read the identification string (`?IF`)
    Info,
}

impl QueryKind {
    /// Payload prefix for this request kind
    pub fn prefix(&self) -> &'static str {
        match self {
            QueryKind::GetValue => "?VR",
            QueryKind::SetValue => "VS",
            QueryKind::Reset => "RS",
            QueryKind::Info => "?IF",
        }
    }
}

/// One request, built per call and serialized once
#[derive(Debug, Clone)]
pub struct Query {
    kind: QueryKind,
    address: u8,
    instance: u8,
    parameter_id: Option<u16>,
    format: Option<WireFormat>,
    value: Option<Value>,
}

impl Query {
    /// Read `parameter` from `address`, channel `instance`
    pub fn get_value(parameter: &Parameter, address: u8, instance: u8) -> Self {
        Self {
            kind: QueryKind::GetValue,
            address,
            instance,
            parameter_id: Some(parameter.id),
            format: Some(parameter.format),
            value: None,
        }
    }

    /// Write `value` to `parameter`. The value is converted to the
    /// parameter's wire format first.
    pub fn set_value(
        parameter: &Parameter,
        value: Value,
        address: u8,
        instance: u8,
    ) -> Result<Self, ProtocolError> {
        Ok(Self {
            kind: QueryKind::SetValue,
            address,
            instance,
            parameter_id: Some(parameter.id),
            format: Some(parameter.format),
            value: Some(parameter.format.coerce(value)?),
        })
    }

    /// Reset the device
    pub fn reset(address: u8, instance: u8) -> Self {
        Self::bare(QueryKind::Reset, address, instance)
    }

    /// Ask for the device identification string
    pub fn info(address: u8, instance: u8) -> Self {
        Self::bare(QueryKind::Info, address, instance)
    }

    fn bare(kind: QueryKind, address: u8, instance: u8) -> Self {
        Self {
            kind,
            address,
            instance,
            parameter_id: None,
            format: None,
            value: None,
        }
    }

    /// Request kind
    pub fn kind(&self) -> QueryKind {
        self.kind
    }

    /// Target device address
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Format a value reply must be decoded with. Only `?VR` expects one.
    pub fn response_format(&self) -> Option<WireFormat> {
        match self.kind {
            QueryKind::GetValue => self.format,
            _ => None,
        }
    }

    /// Build the wire frame for this query under `sequence`
    pub fn to_frame(&self, sequence: u16) -> Frame {
        let mut ids = String::with_capacity(6);
        if let Some(id) = self.parameter_id {
            let _ = write!(ids, "{:04X}", id);
        }
        let _ = write!(ids, "{:02X}", self.instance);

        let frame = Frame::new(QUERY_MARKER, self.address, sequence)
            .ascii(self.kind.prefix())
            .ascii(ids);
        match self.value {
            Some(value) => frame.field(value.to_field()),
            None => frame,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object_temperature() -> Parameter {
        Parameter::new(1000, "Object Temperature", WireFormat::Float32)
    }

    #[test]
    fn test_prefixes() {
        assert_eq!(QueryKind::GetValue.prefix(), "?VR");
        assert_eq!(QueryKind::SetValue.prefix(), "VS");
        assert_eq!(QueryKind::Reset.prefix(), "RS");
        assert_eq!(QueryKind::Info.prefix(), "?IF");
    }

    #[test]
    fn test_get_value_frame() {
        let query = Query::get_value(&object_temperature(), 0, 1);
        assert_eq!(query.to_frame(1).serialize(true), b"#000001?VR03E801".to_vec());
        assert_eq!(query.response_format(), Some(WireFormat::Float32));
    }

    #[test]
    fn test_set_value_frame() {
        let target = Parameter::new(3000, "Target Object Temp (Set)", WireFormat::Float32);
        let query = Query::set_value(&target, Value::Int(20), 2, 1).unwrap();
        assert_eq!(
            query.to_frame(0x10).serialize(true),
            b"#020010VS0BB80141A00000".to_vec()
        );
        assert_eq!(query.response_format(), None);
    }

    #[test]
    fn test_set_value_int_parameter() {
        let status = Parameter::new(2010, "Status", WireFormat::Int32);
        let query = Query::set_value(&status, Value::Float(1.0), 0, 1).unwrap();
        assert_eq!(
            query.to_frame(5).serialize(true),
            b"#000005VS07DA0100000001".to_vec()
        );
    }

    #[test]
    fn test_reset_and_info_frames() {
        assert_eq!(Query::reset(0, 1).to_frame(7).serialize(true), b"#000007RS01".to_vec());
        assert_eq!(Query::info(1, 1).to_frame(8).serialize(true), b"#010008?IF01".to_vec());
    }

    #[test]
    fn test_full_frame_ends_with_terminator() {
        let bytes = Query::info(0, 1).to_frame(1).serialize(false);
        assert_eq!(bytes.last(), Some(&b'\r'));
        assert_eq!(bytes.len(), "#000001?IF01".len() + 4 + 1);
    }
}
