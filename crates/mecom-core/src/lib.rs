//! # MeCom Core Library
//!
//! Protocol engine for Meerstetter thermoelectric (TEC) and laser diode
//! driver (LDD) controllers speaking the MeCom ASCII protocol.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//!
//! This library provides:
//! - Frame composition/parsing with CRC-16/CCITT checksums
//! - Request/response correlation by sequence number
//! - A locked, synchronous session over a serial port or TCP bridge
//! - Per-family parameter and error tables (TEC, LDD, or custom JSON)
//!
//! ## Example
//!
//! ```rust,ignore
//! use mecom_core::{config::SessionConfig, protocol::Session};
//!
//! let config = SessionConfig::new("/dev/ttyUSB0");
//! let session = Session::open_serial(&config)?;
//!
//! let temperature = session.get_parameter("Object Temperature", 0, 1)?;
//! println!("object temperature: {:?}", temperature);
//!
//! session.set_parameter(3000u16, 21.5f32, 0, 1)?;
//! ```

pub mod config;
pub mod device;
pub mod protocol;
pub mod registry;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::SessionConfig;
    pub use crate::device::{DeviceStatus, FlashWriteOptions};
    pub use crate::protocol::{Channel, ProtocolError, Response, Session};
    pub use crate::registry::{DeviceFamily, DeviceTables, Parameter, Value, WireFormat};
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
