//! MeCom Protocol Communication
//!
//! Implements the Meerstetter MeCom ASCII protocol: `#`-framed queries,
//! `!`-framed replies, CRC-16/CCITT checksums and sequence correlation.

pub mod checksum;
mod error;
pub mod frame;
pub mod query;
pub mod response;
pub mod serial;
mod session;
pub mod stream;

pub use checksum::checksum;
pub use error::ProtocolError;
pub use frame::{Field, FieldLayout, Frame, Header};
pub use query::{Query, QueryKind};
pub use response::Response;
pub use serial::{configure_port, open_port};
pub use session::Session;
pub use stream::{Channel, SerialChannel, TcpChannel};

/// Default baud rate of MeCom devices
pub const DEFAULT_BAUD_RATE: u32 = 57600;

/// Default per-read timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 1000;

/// Longest reply accepted before giving up on the terminator
pub const MAX_FRAME_LEN: usize = 256;

/// Source marker of host queries
pub const QUERY_MARKER: char = '#';

/// Source marker of device replies
pub const REPLY_MARKER: char = '!';

/// Frame terminator (carriage return)
pub const TERMINATOR: u8 = b'\r';

/// Sequence number of the first query on a fresh connection
pub const INITIAL_SEQUENCE: u16 = 1;
