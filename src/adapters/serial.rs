use crate::config::SerialConfig;
use crate::domain::ports::SerialLink;
use crate::utils::error::{BoardError, Result};
use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

// Reads only happen once bytes are buffered, so this bounds writes in practice.
const LINK_TIMEOUT: Duration = Duration::from_millis(500);

/// RAK811 attached over a UART, 8N1 without flow control.
pub struct SerialPortLink {
    port: Box<dyn SerialPort>,
}

impl SerialPortLink {
    pub fn open(config: &SerialConfig) -> Result<Self> {
        let port = serialport::new(config.port.as_str(), config.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(LINK_TIMEOUT)
            .open()
            .map_err(|e| BoardError::LinkOpen {
                port: config.port.clone(),
                reason: e.to_string(),
            })?;

        // Drop whatever the modem printed before we were listening.
        port.clear(ClearBuffer::All)
            .map_err(|e| BoardError::LinkIo(e.into()))?;

        tracing::info!("🔌 Opened {} at {} baud", config.port, config.baud_rate);
        Ok(Self { port })
    }
}

impl SerialLink for SerialPortLink {
    fn bytes_available(&mut self) -> Result<usize> {
        let available = self
            .port
            .bytes_to_read()
            .map_err(|e| BoardError::LinkIo(e.into()))?;
        Ok(available as usize)
    }

    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize> {
        match self.port.read(buf) {
            Ok(n) => Ok(n),
            Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        self.port.write_all(data)?;
        self.port.flush()?;
        Ok(())
    }
}
