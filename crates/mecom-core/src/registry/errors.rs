//! Device error codes

use serde::{Deserialize, Serialize};

/// Meaning of a device error code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDescriptor {
    /// Numeric code carried in the `+XX` reply
    pub code: u8,
    /// Symbolic name, e.g. `EER_PAR_OUT_OF_RANGE`
    pub symbol: String,
    /// Human readable description
    pub description: String,
}

/// Lookup table of device error codes
#[derive(Debug, Clone, Default)]
pub struct ErrorTable {
    errors: Vec<ErrorDescriptor>,
}

impl ErrorTable {
    /// Create a table from descriptors
    pub fn new(errors: Vec<ErrorDescriptor>) -> Self {
        Self { errors }
    }

    /// Resolve a code. Codes missing from the table are not an error.
    pub fn get_by_code(&self, code: u8) -> Option<&ErrorDescriptor> {
        self.errors.iter().find(|e| e.code == code)
    }

    /// All descriptors in table order
    pub fn iter(&self) -> impl Iterator<Item = &ErrorDescriptor> {
        self.errors.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_code_is_absent() {
        let table = ErrorTable::new(vec![ErrorDescriptor {
            code: 2,
            symbol: "EER_DEVICE_BUSY".to_string(),
            description: "Device is busy".to_string(),
        }]);
        assert_eq!(table.get_by_code(2).unwrap().symbol, "EER_DEVICE_BUSY");
        assert!(table.get_by_code(99).is_none());
    }

    #[test]
    fn test_default_table_codes() {
        let table = crate::registry::default_errors();
        let codes: Vec<u8> = table.iter().map(|e| e.code).collect();
        assert_eq!(codes, (1..=8).collect::<Vec<u8>>());
        assert!(table.iter().all(|e| e.symbol.starts_with("EER_")));
    }
}
