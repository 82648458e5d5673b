//! Serial port transport for desktop using serialport crate

use crate::transport::PlayerTransport;
use std::io::ErrorKind;
use std::time::Duration;

pub struct SerialTransport {
    port: Box<dyn serialport::SerialPort>,
}

impl SerialTransport {
    /// Baud rate the DFPlayer Mini ships with
    pub const DEFAULT_BAUD_RATE: u32 = 9600;

    pub fn new(port_name: &str, baud_rate: u32) -> Result<Self, serialport::Error> {
        let port = serialport::new(port_name, baud_rate)
            .timeout(Duration::from_millis(500))
            .open()?;
        port.clear(serialport::ClearBuffer::Input)?;

        Ok(Self { port })
    }

    /// Open a port at the module's default 9600 baud
    pub fn open(port_name: &str) -> Result<Self, serialport::Error> {
        Self::new(port_name, Self::DEFAULT_BAUD_RATE)
    }
}

impl PlayerTransport for SerialTransport {
    type Error = std::io::Error;

    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error> {
        std::io::Write::write_all(&mut self.port, data)?;
        Ok(data.len())
    }

    fn read(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<usize, Self::Error> {
        self.port
            .set_timeout(Duration::from_millis(timeout_ms as u64))
            .map_err(std::io::Error::other)?;
        match std::io::Read::read(&mut self.port, buf) {
            Ok(n) => Ok(n),
            // serialport reports an elapsed timeout as an error; the trait contract is Ok(0)
            Err(e) if e.kind() == ErrorKind::TimedOut => Ok(0),
            Err(e) => Err(e),
        }
    }

    fn clear_input(&mut self) -> Result<(), Self::Error> {
        self.port
            .clear(serialport::ClearBuffer::Input)
            .map_err(std::io::Error::other)
    }
}
