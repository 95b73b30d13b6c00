//! Serial port handling
//!
//! Opens and configures serial ports for MeCom devices (8N1, no flow
//! control).

use serialport::SerialPort;
use std::time::Duration;

use super::{ProtocolError, SerialChannel};

/// Open a serial port with the MeCom line settings
pub fn open_port(
    name: &str,
    baud_rate: u32,
    timeout: Duration,
) -> Result<SerialChannel, ProtocolError> {
    let mut port = serialport::new(name, baud_rate)
        .timeout(timeout)
        .open()
        .map_err(|e| ProtocolError::SerialError(format!("{}: {}", name, e)))?;
    configure_port(port.as_mut())?;
    let channel = SerialChannel::new(port);
    let port_name = channel.name().unwrap_or_else(|| name.to_string());
    tracing::info!(port = %port_name, baud_rate, ?timeout, "opened serial port");
    Ok(channel)
}

/// Configure a serial port for MeCom communication
pub fn configure_port(port: &mut dyn SerialPort) -> Result<(), ProtocolError> {
    // Standard 8N1 configuration
    port.set_data_bits(serialport::DataBits::Eight)
        .map_err(|e| ProtocolError::SerialError(e.to_string()))?;
    port.set_parity(serialport::Parity::None)
        .map_err(|e| ProtocolError::SerialError(e.to_string()))?;
    port.set_stop_bits(serialport::StopBits::One)
        .map_err(|e| ProtocolError::SerialError(e.to_string()))?;
    port.set_flow_control(serialport::FlowControl::None)
        .map_err(|e| ProtocolError::SerialError(e.to_string()))?;
    Ok(())
}
