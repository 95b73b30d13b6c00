#![allow(dead_code)]

use mecom_core::protocol::{checksum, Channel};
use std::collections::{HashMap, VecDeque};
use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Route session logs to the test harness; set RUST_LOG=debug to see frames
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Build a full reply frame (`!` + body + checksum + CR)
pub fn reply(body: &str) -> Vec<u8> {
    let framed = format!("!{}", body);
    let crc = checksum(framed.as_bytes());
    format!("{}{:04X}\r", framed, crc).into_bytes()
}

#[derive(Default)]
pub struct MockState {
    pub recv_buffer: VecDeque<u8>,
    pub send_buffer: Vec<u8>,
    pub timeout: Option<Duration>,
}

/// Mock serial port replaying scripted bytes. State is shared so tests can
/// inspect it after the session took ownership.
#[derive(Clone, Default)]
pub struct MockSerial {
    pub state: Arc<Mutex<MockState>>,
}

impl MockSerial {
    pub fn with_response(response: &[u8]) -> Self {
        let mock = Self::default();
        mock.push(response);
        mock
    }

    pub fn push(&self, bytes: &[u8]) {
        self.state.lock().unwrap().recv_buffer.extend(bytes);
    }

    pub fn sent(&self) -> Vec<u8> {
        self.state.lock().unwrap().send_buffer.clone()
    }
}

impl Read for MockSerial {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut state = self.state.lock().unwrap();
        match state.recv_buffer.pop_front() {
            Some(byte) => {
                buf[0] = byte;
                Ok(1)
            }
            // Behaves like serialport on an expired read timeout
            None => Err(io::Error::new(io::ErrorKind::TimedOut, "Operation timed out")),
        }
    }
}

impl Write for MockSerial {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.state.lock().unwrap().send_buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Channel for MockSerial {
    fn set_timeout(&mut self, timeout: Duration) -> io::Result<()> {
        self.state.lock().unwrap().timeout = Some(timeout);
        Ok(())
    }

    fn clear_input_buffer(&mut self) -> io::Result<()> {
        // Scripted replies are queued before the query goes out, so they
        // must survive the pre-send clear
        Ok(())
    }

    fn clear_output_buffer(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Simulated MeCom device: answers every query with the query's own
/// address and sequence.
#[derive(Default)]
pub struct SimulatedDevice {
    pub registers: HashMap<u16, u32>,
    /// Reads of "Flash Status" (109) left before it reports 0
    pub flash_busy_polls: u32,
    pub info_text: String,
    pub reject_code: Option<u8>,
    pending: VecDeque<u8>,
    rx: Vec<u8>,
    pub queries: Vec<String>,
}

impl SimulatedDevice {
    pub fn new() -> Self {
        Self {
            info_text: format!("{:<20}", "TEC-1091 SIM"),
            ..Default::default()
        }
    }

    fn answer(&mut self, query: &str) -> Vec<u8> {
        let address = &query[1..3];
        let sequence = &query[3..7];
        let payload = &query[7..query.len() - 4];
        let query_crc = &query[query.len() - 4..];

        if let Some(code) = self.reject_code {
            return reply(&format!("{}{}+{:02X}", address, sequence, code));
        }

        if let Some(rest) = payload.strip_prefix("?VR") {
            let id = u16::from_str_radix(&rest[..4], 16).unwrap();
            let raw = if id == 109 {
                let left = self.flash_busy_polls;
                self.flash_busy_polls = left.saturating_sub(1);
                left
            } else {
                match self.registers.get(&id) {
                    Some(raw) => *raw,
                    None => return reply(&format!("{}{}+05", address, sequence)),
                }
            };
            reply(&format!("{}{}{:08X}", address, sequence, raw))
        } else if let Some(rest) = payload.strip_prefix("VS") {
            let id = u16::from_str_radix(&rest[..4], 16).unwrap();
            let raw = u32::from_str_radix(&rest[6..14], 16).unwrap();
            self.registers.insert(id, raw);
            format!("!{}{}{}\r", address, sequence, query_crc).into_bytes()
        } else if payload.starts_with("RS") {
            format!("!{}{}{}\r", address, sequence, query_crc).into_bytes()
        } else if payload.starts_with("?IF") {
            // Info replies carry no valid checksum requirement
            format!("!{}{}{}0000\r", address, sequence, self.info_text).into_bytes()
        } else {
            reply(&format!("{}{}+01", address, sequence))
        }
    }
}

impl Read for SimulatedDevice {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.pending.pop_front() {
            Some(byte) => {
                buf[0] = byte;
                Ok(1)
            }
            None => Ok(0),
        }
    }
}

impl Write for SimulatedDevice {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        for &byte in buf {
            if byte == b'\r' {
                let query = String::from_utf8(std::mem::take(&mut self.rx)).unwrap();
                let answer = self.answer(&query);
                self.queries.push(query);
                self.pending.extend(answer);
            } else {
                self.rx.push(byte);
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Channel for SimulatedDevice {
    fn set_timeout(&mut self, _timeout: Duration) -> io::Result<()> {
        Ok(())
    }

    fn clear_input_buffer(&mut self) -> io::Result<()> {
        self.pending.clear();
        Ok(())
    }

    fn clear_output_buffer(&mut self) -> io::Result<()> {
        self.rx.clear();
        Ok(())
    }
}
