//! Types for DFPlayer operations

/// A reply frame that passed checksum validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Response code (byte 3 of the reply)
    pub code: u8,
    /// Payload bytes following the header, possibly empty
    pub payload: Vec<u8>,
}

/// Equalizer presets accepted by `set_eq`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Equalizer {
    #[default]
    Normal = 0,
    Pop = 1,
    Rock = 2,
    Jazz = 3,
    Classic = 4,
    Bass = 5,
}

/// Settings applied at the end of the initialization sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerConfig {
    /// Initial volume, clamped to 0-30
    pub volume: i32,
    pub equalizer: Equalizer,
    /// Output device, clamped to 0-4; 3 selects the SD card
    pub output_device: i32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            volume: 10,
            equalizer: Equalizer::Normal,
            output_device: 3,
        }
    }
}

/// Errors that can occur while talking to the player
#[derive(Debug, thiserror::Error)]
pub enum DfPlayerError {
    /// Transport layer error (UART, serial, etc.)
    #[error("transport error: {0}")]
    Transport(String),
    /// Received checksum disagrees with the one computed over the frame
    #[error("checksum mismatch: expected 0x{expected:02X}, received 0x{received:02X}")]
    ChecksumMismatch { expected: u8, received: u8 },
    /// Reply frame is malformed
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Convert bytes to uppercase hex string
pub(crate) fn bytes_to_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
