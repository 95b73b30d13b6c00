//! Parameters, wire formats and typed values

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::protocol::{Field, ProtocolError};

/// Encoding of a parameter value on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WireFormat {
    /// Unsigned byte
    Uint8,
    /// Unsigned 16-bit word
    Uint16,
    /// Signed 32-bit integer
    Int32,
    /// IEEE-754 single precision
    Float32,
}

impl WireFormat {
    /// Decode the raw 32-bit word from a value response. Unsigned formats
    /// reject words above their maximum.
    pub fn decode(&self, raw: u32) -> Result<Value, ProtocolError> {
        let max = match self {
            WireFormat::Float32 => return Ok(Value::Float(f32::from_bits(raw))),
            WireFormat::Int32 => return Ok(Value::Int(raw as i32)),
            WireFormat::Uint8 => u8::MAX as u32,
            WireFormat::Uint16 => u16::MAX as u32,
        };
        if raw > max {
            return Err(ProtocolError::FormatError(format!(
                "value {:08X} out of range for {}",
                raw, self
            )));
        }
        Ok(Value::Int(raw as i32))
    }

    /// Convert a caller-supplied value into this format.
    ///
    /// Floats headed for an integer parameter are truncated toward zero and
    /// must fit in an `i32`; unsigned formats reject values outside their
    /// range.
    pub fn coerce(&self, value: Value) -> Result<Value, ProtocolError> {
        let coerced = match (self, value) {
            (WireFormat::Float32, Value::Float(v)) => Value::Float(v),
            (WireFormat::Float32, Value::Int(v)) => Value::Float(v as f32),
            (_, Value::Int(v)) => Value::Int(v),
            (_, Value::Float(v)) if fits_i32(v) => Value::Int(v.trunc() as i32),
            (_, Value::Float(_)) => return Err(self.unsupported(value)),
        };

        let in_range = match (self, coerced) {
            (WireFormat::Uint8, Value::Int(v)) => (0..=u8::MAX as i32).contains(&v),
            (WireFormat::Uint16, Value::Int(v)) => (0..=u16::MAX as i32).contains(&v),
            _ => true,
        };
        if !in_range {
            return Err(self.unsupported(value));
        }
        Ok(coerced)
    }

    fn unsupported(&self, value: Value) -> ProtocolError {
        ProtocolError::UnsupportedValue {
            value: value.to_string(),
            format: self.to_string(),
        }
    }
}

/// `i32::MAX as f32` rounds up to 2^31, so the upper bound is exclusive
fn fits_i32(v: f32) -> bool {
    v.is_finite() && (i32::MIN as f32..i32::MAX as f32).contains(&v.trunc())
}

impl fmt::Display for WireFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WireFormat::Uint8 => "UINT8",
            WireFormat::Uint16 => "UINT16",
            WireFormat::Int32 => "INT32",
            WireFormat::Float32 => "FLOAT32",
        };
        f.write_str(name)
    }
}

/// A decoded parameter value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Integer parameters (UINT8, UINT16, INT32)
    Int(i32),
    /// FLOAT32 parameters
    Float(f32),
}

impl Value {
    /// Get as integer, returning None for floats
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Float(_) => None,
        }
    }

    /// Get as float, returning None for integers
    pub fn as_float(&self) -> Option<f32> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Int(_) => None,
        }
    }

    pub(crate) fn to_field(self) -> Field {
        match self {
            Value::Int(v) => Field::Int(v),
            Value::Float(v) => Field::Float(v),
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
        }
    }
}

/// One entry of a device parameter table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    /// Numeric id sent on the wire
    pub id: u16,
    /// Human readable name, e.g. "Object Temperature"
    pub name: String,
    /// Wire encoding of the value
    pub format: WireFormat,
}

impl Parameter {
    /// Create a parameter entry
    pub fn new(id: u16, name: impl Into<String>, format: WireFormat) -> Self {
        Self {
            id,
            name: name.into(),
            format,
        }
    }
}

/// Caller-side reference to a parameter, by name or by id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterRef<'a> {
    /// Exact parameter name
    Name(&'a str),
    /// Numeric parameter id
    Id(u16),
}

impl<'a> From<&'a str> for ParameterRef<'a> {
    fn from(name: &'a str) -> Self {
        ParameterRef::Name(name)
    }
}

impl From<u16> for ParameterRef<'_> {
    fn from(id: u16) -> Self {
        ParameterRef::Id(id)
    }
}

impl fmt::Display for ParameterRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterRef::Name(name) => write!(f, "'{}'", name),
            ParameterRef::Id(id) => write!(f, "id {}", id),
        }
    }
}

/// Immutable lookup table of parameters for one device family
#[derive(Debug, Clone)]
pub struct ParameterRegistry {
    parameters: Vec<Parameter>,
    by_id: HashMap<u16, usize>,
    by_name: HashMap<String, usize>,
}

impl ParameterRegistry {
    /// Build a registry, rejecting duplicate ids or names
    pub fn new(parameters: Vec<Parameter>) -> Result<Self, ProtocolError> {
        let mut by_id = HashMap::with_capacity(parameters.len());
        let mut by_name = HashMap::with_capacity(parameters.len());

        for (idx, parameter) in parameters.iter().enumerate() {
            if by_id.insert(parameter.id, idx).is_some() {
                return Err(ProtocolError::TableError(format!(
                    "duplicate parameter id {}",
                    parameter.id
                )));
            }
            if by_name.insert(parameter.name.clone(), idx).is_some() {
                return Err(ProtocolError::TableError(format!(
                    "duplicate parameter name '{}'",
                    parameter.name
                )));
            }
        }

        Ok(Self {
            parameters,
            by_id,
            by_name,
        })
    }

    /// Find a parameter by its numeric id
    pub fn get_by_id(&self, id: u16) -> Result<&Parameter, ProtocolError> {
        self.by_id
            .get(&id)
            .map(|&idx| &self.parameters[idx])
            .ok_or_else(|| ProtocolError::UnknownParameter(format!("id {}", id)))
    }

    /// Find a parameter by its name (exact match)
    pub fn get_by_name(&self, name: &str) -> Result<&Parameter, ProtocolError> {
        self.by_name
            .get(name)
            .map(|&idx| &self.parameters[idx])
            .ok_or_else(|| ProtocolError::UnknownParameter(format!("'{}'", name)))
    }

    /// Resolve either kind of reference
    pub fn resolve(&self, parameter: ParameterRef<'_>) -> Result<&Parameter, ProtocolError> {
        match parameter {
            ParameterRef::Name(name) => self.get_by_name(name),
            ParameterRef::Id(id) => self.get_by_id(id),
        }
    }

    /// All parameters in table order
    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.parameters.iter()
    }

    /// Number of parameters
    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ParameterRegistry {
        ParameterRegistry::new(vec![
            Parameter::new(1000, "Object Temperature", WireFormat::Float32),
            Parameter::new(104, "Device Status", WireFormat::Int32),
        ])
        .unwrap()
    }

    #[test]
    fn test_lookup_by_id_and_name() {
        let reg = registry();
        assert_eq!(reg.get_by_id(1000).unwrap().name, "Object Temperature");
        assert_eq!(reg.get_by_name("Device Status").unwrap().id, 104);
        assert_eq!(reg.resolve(ParameterRef::from(104)).unwrap().format, WireFormat::Int32);
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn test_unknown_parameter() {
        let reg = registry();
        assert!(matches!(reg.get_by_id(1), Err(ProtocolError::UnknownParameter(_))));
        assert!(matches!(
            reg.get_by_name("object temperature"),
            Err(ProtocolError::UnknownParameter(_))
        ));
    }

    #[test]
    fn test_duplicates_rejected() {
        let dup_id = ParameterRegistry::new(vec![
            Parameter::new(1, "A", WireFormat::Int32),
            Parameter::new(1, "B", WireFormat::Int32),
        ]);
        assert!(matches!(dup_id, Err(ProtocolError::TableError(_))));

        let dup_name = ParameterRegistry::new(vec![
            Parameter::new(1, "A", WireFormat::Int32),
            Parameter::new(2, "A", WireFormat::Int32),
        ]);
        assert!(matches!(dup_name, Err(ProtocolError::TableError(_))));
    }

    #[test]
    fn test_decode_by_format() {
        assert_eq!(WireFormat::Float32.decode(0x41AC0000).unwrap(), Value::Float(21.5));
        assert_eq!(WireFormat::Int32.decode(0xFFFFFFFF).unwrap(), Value::Int(-1));
        assert_eq!(WireFormat::Uint16.decode(0x0000FFFF).unwrap(), Value::Int(65535));
        assert_eq!(WireFormat::Uint8.decode(0x000000FF).unwrap(), Value::Int(255));
    }

    #[test]
    fn test_decode_unsigned_out_of_range() {
        assert!(matches!(
            WireFormat::Uint16.decode(0xFFFFFFFF),
            Err(ProtocolError::FormatError(_))
        ));
        assert!(matches!(
            WireFormat::Uint8.decode(0x00000100),
            Err(ProtocolError::FormatError(_))
        ));
    }

    #[test]
    fn test_coerce() {
        assert_eq!(WireFormat::Float32.coerce(Value::Int(2)).unwrap(), Value::Float(2.0));
        assert_eq!(WireFormat::Int32.coerce(Value::Float(-2.7)).unwrap(), Value::Int(-2));
        assert_eq!(WireFormat::Uint8.coerce(Value::Int(255)).unwrap(), Value::Int(255));
        assert!(matches!(
            WireFormat::Uint8.coerce(Value::Int(256)),
            Err(ProtocolError::UnsupportedValue { .. })
        ));
        assert!(WireFormat::Int32.coerce(Value::Float(f32::NAN)).is_err());
    }

    #[test]
    fn test_coerce_float_beyond_i32() {
        for v in [3.0e9f32, -3.0e9, 2_147_483_648.0] {
            assert!(matches!(
                WireFormat::Int32.coerce(Value::Float(v)),
                Err(ProtocolError::UnsupportedValue { .. })
            ));
        }
        assert_eq!(
            WireFormat::Int32.coerce(Value::Float(-2_147_483_648.0)).unwrap(),
            Value::Int(i32::MIN)
        );
        assert!(WireFormat::Uint16.coerce(Value::Float(3.0e9)).is_err());
    }

    #[test]
    fn test_wire_format_serde_names() {
        let format: WireFormat = serde_json::from_str("\"FLOAT32\"").unwrap();
        assert_eq!(format, WireFormat::Float32);
        assert_eq!(serde_json::to_string(&WireFormat::Uint8).unwrap(), "\"UINT8\"");
    }
}
