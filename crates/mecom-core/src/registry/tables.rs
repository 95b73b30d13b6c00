//! Built-in parameter and error tables
//!
//! Ids and names follow the Meerstetter MeCom command reference for the
//! TEC-1xxx and LDD-1xxx families. Only the commonly used subset is listed;
//! custom tables can be loaded from JSON (see [`super::DeviceTables`]).

use super::WireFormat::{self, Float32, Int32};

/// Parameters shared by every MeCom device
const COMMON_PARAMETERS: &[(u16, &str, WireFormat)] = &[
    (100, "Device Type", Int32),
    (101, "Hardware Version", Int32),
    (102, "Serial Number", Int32),
    (103, "Firmware Version", Int32),
    (104, "Device Status", Int32),
    (105, "Error Number", Int32),
    (106, "Error Instance", Int32),
    (107, "Error Parameter", Int32),
    (108, "Save Data to Flash", Int32),
    (109, "Flash Status", Int32),
    (2051, "Device Address", Int32),
];

/// Thermoelectric cooler controllers
pub(super) const TEC_PARAMETERS: &[(u16, &str, WireFormat)] = &[
    (1000, "Object Temperature", Float32),
    (1001, "Sink Temperature", Float32),
    (1010, "Target Object Temperature", Float32),
    (1011, "Ramp Object Temperature", Float32),
    (1020, "Actual Output Current", Float32),
    (1021, "Actual Output Voltage", Float32),
    (1200, "Temperature is Stable", Int32),
    (2010, "Status", Int32),
    (2030, "Current Limitation", Float32),
    (2031, "Voltage Limitation", Float32),
    (3000, "Target Object Temp (Set)", Float32),
    (3010, "Kp", Float32),
    (3011, "Ti", Float32),
    (3012, "Td", Float32),
];

/// Laser diode drivers
pub(super) const LDD_PARAMETERS: &[(u16, &str, WireFormat)] = &[
    (1015, "Device Temperature", Float32),
    (1016, "Actual Output Current", Float32),
    (2001, "CW Current", Float32),
    (2020, "Output Stage Enable", Int32),
    (3020, "Current Limit Max", Float32),
];

/// Error codes returned in `+XX` replies
pub(super) const ERRORS: &[(u8, &str, &str)] = &[
    (1, "EER_CMD_NOT_AVAILABLE", "Command not available"),
    (2, "EER_DEVICE_BUSY", "Device is busy"),
    (3, "EER_GENERAL_COM", "General communication error"),
    (4, "EER_FORMAT", "Format error"),
    (5, "EER_PAR_NOT_AVAILABLE", "Parameter is not available"),
    (6, "EER_PAR_NOT_WRITABLE", "Parameter is read only"),
    (7, "EER_PAR_OUT_OF_RANGE", "Value is out of range"),
    (8, "EER_PAR_INST_NOT_AVAILABLE", "Parameter instance is not available"),
];

/// Common parameters followed by the family specific ones
pub(super) fn with_common(
    family: &'static [(u16, &'static str, WireFormat)],
) -> impl Iterator<Item = &'static (u16, &'static str, WireFormat)> {
    COMMON_PARAMETERS.iter().chain(family.iter())
}
