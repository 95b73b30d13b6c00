//! Device tables
//!
//! Parameter and error tables are data, injected into a session at
//! construction. The built-in TEC and LDD tables cover the stock Meerstetter
//! families; anything else can be supplied as JSON.

mod errors;
mod parameter;
mod tables;

pub use errors::{ErrorDescriptor, ErrorTable};
pub use parameter::{Parameter, ParameterRef, ParameterRegistry, Value, WireFormat};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::protocol::ProtocolError;

/// Device family selecting the built-in tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DeviceFamily {
    /// Thermoelectric cooler controller (TEC-1089, TEC-1122, ...)
    #[default]
    Tec,
    /// Laser diode driver (LDD-1121, ...)
    Ldd,
}

impl FromStr for DeviceFamily {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TEC" => Ok(DeviceFamily::Tec),
            "LDD" => Ok(DeviceFamily::Ldd),
            _ => Err(ProtocolError::UnknownMeComFamily(s.to_string())),
        }
    }
}

impl fmt::Display for DeviceFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceFamily::Tec => f.write_str("TEC"),
            DeviceFamily::Ldd => f.write_str("LDD"),
        }
    }
}

/// On-disk shape of a custom table file
#[derive(Debug, Deserialize)]
struct TableFile {
    parameters: Vec<Parameter>,
    #[serde(default)]
    errors: Option<Vec<ErrorDescriptor>>,
}

/// Parameter registry plus error table for one device family
#[derive(Debug, Clone)]
pub struct DeviceTables {
    /// Parameter lookup
    pub parameters: ParameterRegistry,
    /// Error code lookup
    pub errors: ErrorTable,
}

impl DeviceTables {
    /// Built-in tables for a family
    pub fn for_family(family: DeviceFamily) -> Result<Self, ProtocolError> {
        let family_table = match family {
            DeviceFamily::Tec => tables::TEC_PARAMETERS,
            DeviceFamily::Ldd => tables::LDD_PARAMETERS,
        };
        let parameters = tables::with_common(family_table)
            .map(|&(id, name, format)| Parameter::new(id, name, format))
            .collect();

        Ok(Self {
            parameters: ParameterRegistry::new(parameters)?,
            errors: default_errors(),
        })
    }

    /// Built-in tables for a family given by name ("TEC", "LDD")
    pub fn for_family_name(name: &str) -> Result<Self, ProtocolError> {
        Self::for_family(name.parse()?)
    }

    /// Parse a custom table:
    ///
    /// ```json
    /// { "parameters": [{ "id": 1000, "name": "Object Temperature", "format": "FLOAT32" }],
    ///   "errors": [{ "code": 7, "symbol": "EER_PAR_OUT_OF_RANGE", "description": "Value is out of range" }] }
    /// ```
    ///
    /// Without an `errors` list the standard error codes are used.
    pub fn from_json_str(json: &str) -> Result<Self, ProtocolError> {
        let file: TableFile =
            serde_json::from_str(json).map_err(|e| ProtocolError::TableError(e.to_string()))?;
        Ok(Self {
            parameters: ParameterRegistry::new(file.parameters)?,
            errors: file.errors.map(ErrorTable::new).unwrap_or_else(default_errors),
        })
    }

    /// Load a custom table from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ProtocolError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&json)
    }
}

/// The standard MeCom error codes
pub fn default_errors() -> ErrorTable {
    ErrorTable::new(
        tables::ERRORS
            .iter()
            .map(|&(code, symbol, description)| ErrorDescriptor {
                code,
                symbol: symbol.to_string(),
                description: description.to_string(),
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_builtin_tables_are_consistent() {
        for family in [DeviceFamily::Tec, DeviceFamily::Ldd] {
            let tables = DeviceTables::for_family(family).unwrap();
            assert!(tables.parameters.get_by_name("Device Address").is_ok());
            assert!(tables.parameters.get_by_name("Flash Status").is_ok());
        }
    }

    #[test]
    fn test_tec_table() {
        let tables = DeviceTables::for_family(DeviceFamily::Tec).unwrap();
        let p = tables.parameters.get_by_id(1000).unwrap();
        assert_eq!(p.name, "Object Temperature");
        assert_eq!(p.format, WireFormat::Float32);
        assert!(tables.parameters.get_by_id(2001).is_err());
    }

    #[test]
    fn test_ldd_table() {
        let tables = DeviceTables::for_family_name("ldd").unwrap();
        assert_eq!(tables.parameters.get_by_name("CW Current").unwrap().id, 2001);
    }

    #[test]
    fn test_unknown_family() {
        assert!(matches!(
            DeviceTables::for_family_name("XYZ"),
            Err(ProtocolError::UnknownMeComFamily(_))
        ));
    }

    #[test]
    fn test_error_table() {
        let errors = default_errors();
        let e = errors.get_by_code(7).unwrap();
        assert_eq!(e.symbol, "EER_PAR_OUT_OF_RANGE");
        assert_eq!(e.description, "Value is out of range");
    }

    #[test]
    fn test_custom_table_from_json() {
        let json = r#"{
            "parameters": [
                { "id": 5000, "name": "Fan Speed", "format": "UINT16" }
            ]
        }"#;
        let tables = DeviceTables::from_json_str(json).unwrap();
        assert_eq!(
            tables.parameters.get_by_id(5000).unwrap(),
            &Parameter::new(5000, "Fan Speed", WireFormat::Uint16)
        );
        // Falls back to the standard error codes
        assert!(tables.errors.get_by_code(1).is_some());
    }

    #[test]
    fn test_custom_table_rejects_bad_format() {
        let json = r#"{ "parameters": [{ "id": 1, "name": "X", "format": "DOUBLE" }] }"#;
        assert!(matches!(
            DeviceTables::from_json_str(json),
            Err(ProtocolError::TableError(_))
        ));
    }
}
