//! Session management
//!
//! Owns the byte channel and the sequence counter, and runs one
//! query/reply exchange at a time.

use std::io::{ErrorKind, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{debug, info, warn};

use super::{
    open_port, Channel, ProtocolError, Query, Response, TcpChannel, INITIAL_SEQUENCE,
    MAX_FRAME_LEN, REPLY_MARKER, TERMINATOR,
};
use crate::config::SessionConfig;
use crate::registry::{DeviceTables, ParameterRef, Value};

/// Channel and sequence counter, guarded together
struct Link<C> {
    channel: C,
    sequence: u16,
}

/// A connection to one MeCom bus
///
/// Calls from several threads are serialized: each call holds the lock for
/// its whole send/receive exchange. The sequence counter advances once per
/// call, whether it succeeded or not.
pub struct Session<C: Channel = Box<dyn Channel>> {
    link: Mutex<Link<C>>,
    tables: DeviceTables,
    max_frame_len: usize,
}

impl Session<Box<dyn Channel>> {
    /// Open the serial port named in `config`
    pub fn open_serial(config: &SessionConfig) -> Result<Self, ProtocolError> {
        let channel = open_port(&config.port_name, config.baud_rate, config.timeout())?;
        Ok(Self::new(Box::new(channel), config.load_tables()?)
            .with_max_frame_len(config.max_frame_len))
    }

    /// Connect to a serial-to-Ethernet bridge
    pub fn connect_tcp(
        addr: impl ToSocketAddrs,
        config: &SessionConfig,
    ) -> Result<Self, ProtocolError> {
        let stream = TcpStream::connect(addr)?;
        let peer = stream.peer_addr()?;
        let mut channel = TcpChannel::new(stream);
        channel.set_timeout(config.timeout())?;
        info!(%peer, "connected to MeCom TCP bridge");
        Ok(Self::new(Box::new(channel), config.load_tables()?)
            .with_max_frame_len(config.max_frame_len))
    }
}

impl<C: Channel> Session<C> {
    /// Create a session over an already configured channel
    pub fn new(channel: C, tables: DeviceTables) -> Self {
        Self {
            link: Mutex::new(Link {
                channel,
                sequence: INITIAL_SEQUENCE,
            }),
            tables,
            max_frame_len: MAX_FRAME_LEN,
        }
    }

    /// Override the longest accepted reply
    pub fn with_max_frame_len(mut self, max_frame_len: usize) -> Self {
        self.max_frame_len = max_frame_len;
        self
    }

    /// Parameter and error tables in use
    pub fn tables(&self) -> &DeviceTables {
        &self.tables
    }

    /// Sequence number the next query will carry
    pub fn sequence(&self) -> u16 {
        self.lock().sequence
    }

    /// Replace the channel (after the caller reopened the port) and start
    /// counting sequences afresh
    pub fn reconnect(&self, channel: C) {
        let mut link = self.lock();
        link.channel = channel;
        link.sequence = INITIAL_SEQUENCE;
        info!("session reconnected");
    }

    /// Set the channel's per-read timeout
    pub fn set_timeout(&self, timeout: Duration) -> Result<(), ProtocolError> {
        self.lock().channel.set_timeout(timeout)?;
        Ok(())
    }

    /// Flush pending output and hand the channel back
    pub fn close(self) -> Result<C, ProtocolError> {
        let mut link = self
            .link
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        link.channel.flush()?;
        Ok(link.channel)
    }

    fn lock(&self) -> MutexGuard<'_, Link<C>> {
        // A panic mid-exchange leaves nothing half-updated that the next
        // call does not reset (buffers are cleared, sequence is a counter)
        self.link.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Send `query` and wait for its reply.
    ///
    /// Device error replies come back as [`ProtocolError::DeviceError`].
    pub fn execute(&self, query: &Query) -> Result<Response, ProtocolError> {
        let mut link = self.lock();
        let sequence = link.sequence;
        let result = self.exchange(&mut link.channel, query, sequence);
        link.sequence = sequence.wrapping_add(1);
        drop(link);

        if let Err(e) = &result {
            warn!(
                sequence,
                address = query.address(),
                kind = ?query.kind(),
                error = %e,
                "MeCom query failed"
            );
        }
        result
    }

    fn exchange(
        &self,
        channel: &mut C,
        query: &Query,
        sequence: u16,
    ) -> Result<Response, ProtocolError> {
        channel.clear_output_buffer()?;
        channel.clear_input_buffer()?;

        let mut frame = query.to_frame(sequence);
        frame.seal();
        let bytes = frame.serialize(false);
        debug!(frame = %String::from_utf8_lossy(&bytes).escape_debug(), "sending");
        channel.write_all(&bytes)?;
        channel.flush()?;

        let raw = read_reply(channel, self.max_frame_len)?;
        debug!(frame = %String::from_utf8_lossy(&raw).escape_debug(), "received");

        let reply = match raw.split_first() {
            Some((&marker, rest)) if marker == REPLY_MARKER as u8 => rest,
            _ => {
                return Err(ProtocolError::FormatError(format!(
                    "reply does not start with '{}'",
                    REPLY_MARKER
                )))
            }
        };

        let response = Response::classify(reply, query.response_format())?;
        response.check_sequence(sequence)?;
        response.into_result(&self.tables.errors)
    }

    /// Read a parameter by name or id
    pub fn get_parameter<'a>(
        &self,
        parameter: impl Into<ParameterRef<'a>>,
        address: u8,
        instance: u8,
    ) -> Result<Value, ProtocolError> {
        let parameter = self.tables.parameters.resolve(parameter.into())?;
        match self.execute(&Query::get_value(parameter, address, instance))? {
            Response::Value { value, .. } => Ok(value),
            other => Err(unexpected(&other)),
        }
    }

    /// Write a parameter by name or id.
    ///
    /// Returns whether the device acknowledged the write. The value is not
    /// read back: floats come back with rounding noise, and an out-of-range
    /// value already fails with a device error.
    pub fn set_parameter<'a>(
        &self,
        parameter: impl Into<ParameterRef<'a>>,
        value: impl Into<Value>,
        address: u8,
        instance: u8,
    ) -> Result<bool, ProtocolError> {
        let parameter = self.tables.parameters.resolve(parameter.into())?;
        let query = Query::set_value(parameter, value.into(), address, instance)?;
        Ok(self.execute(&query)?.is_ack())
    }

    /// Reset the device. Returns whether it acknowledged.
    pub fn reset_device(&self, address: u8, instance: u8) -> Result<bool, ProtocolError> {
        Ok(self.execute(&Query::reset(address, instance))?.is_ack())
    }

    /// Read the device identification string
    pub fn info(&self, address: u8, instance: u8) -> Result<String, ProtocolError> {
        match self.execute(&Query::info(address, instance))? {
            Response::Info { text, .. } => Ok(text),
            other => Err(unexpected(&other)),
        }
    }
}

fn unexpected(response: &Response) -> ProtocolError {
    ProtocolError::FormatError(format!("unexpected reply {:?}", response))
}

/// Read one byte, mapping every flavour of "nothing arrived" to a timeout
fn read_byte<C: Channel>(channel: &mut C) -> Result<u8, ProtocolError> {
    let mut buf = [0u8; 1];
    loop {
        match channel.read(&mut buf) {
            Ok(0) => return Err(ProtocolError::ResponseTimeout),
            Ok(_) => return Ok(buf[0]),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {
                return Err(ProtocolError::ResponseTimeout)
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// Read until the terminator, which is not included in the result
fn read_reply<C: Channel>(channel: &mut C, max_len: usize) -> Result<Vec<u8>, ProtocolError> {
    let mut frame = Vec::with_capacity(32);
    loop {
        let byte = read_byte(channel)?;
        if byte == TERMINATOR {
            return Ok(frame);
        }
        if frame.len() >= max_len {
            return Err(ProtocolError::FrameTooLong(max_len));
        }
        frame.push(byte);
    }
}
