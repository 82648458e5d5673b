/// Trait for DFPlayer communication backends.
/// Implement this trait for different transports (UART, serial port, etc.)
pub trait PlayerTransport {
    /// Error type for transport operations
    type Error: std::fmt::Debug;

    /// Write data to the transport
    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error>;

    /// Read available data with a timeout in milliseconds.
    ///
    /// Returns `Ok(0)` when nothing arrived before the timeout expired.
    fn read(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<usize, Self::Error>;

    /// Clear the input buffer
    fn clear_input(&mut self) -> Result<(), Self::Error>;
}
