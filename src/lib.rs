//! DFPlayer Mini MP3 module driver with support for multiple transport backends.
//!
//! # Features
//!
//! - `uart-esp32` - UART transport for ESP32 using esp-idf-svc
//! - `serial` - Serial port transport for desktop using serialport crate
//!
//! # Example
//!
//! ```ignore
//! use dfplayer_mini::{DfPlayerMini, SerialTransport};
//!
//! let transport = SerialTransport::open("/dev/ttyUSB0")?;
//! let mut player = DfPlayerMini::new(transport)?;
//!
//! player.set_volume(20)?;
//! player.play_folder_track(1, 3)?;
//! if let Some(response) = player.read_response()? {
//!     println!("Reply 0x{:02X}: {:02X?}", response.code, response.payload);
//! }
//! ```

mod player;
mod transport;
mod types;

#[cfg(feature = "uart-esp32")]
mod uart;

#[cfg(feature = "serial")]
mod serial;

// Re-exports
pub use player::{
    encode_command, response_checksum, verify_response, DfPlayerMini, ACK_FRAME, COMMAND_FRAME_LEN,
    MAX_RESPONSE_LEN,
};
pub use transport::PlayerTransport;
pub use types::{DfPlayerError, Equalizer, PlayerConfig, Response};

#[cfg(feature = "uart-esp32")]
pub use uart::UartTransport;

#[cfg(feature = "serial")]
pub use serial::SerialTransport;
