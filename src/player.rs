use log::{debug, error, info, warn};

use crate::transport::PlayerTransport;
use crate::types::{bytes_to_hex, DfPlayerError, Equalizer, PlayerConfig, Response};

// Frame layout constants
const START_BYTE: u8 = 0x7E;
const VERSION: u8 = 0xFF;
const LENGTH: u8 = 0x06;
const MODULE_INDEX: u8 = 0x01;
const END_BYTE: u8 = 0xEF;

/// Size of an encoded command frame
pub const COMMAND_FRAME_LEN: usize = 8;

/// Upper bound on the header block read for one reply
pub const MAX_RESPONSE_LEN: usize = 10;

/// Reply the module sends to acknowledge initialization and timeout setup
pub const ACK_FRAME: [u8; 8] = [0x7E, 0xFF, 0x06, 0x00, 0x00, 0x00, 0xFE, 0xEF];

// Reply byte offsets
const INDEX_CODE: usize = 3;
const INDEX_LENGTH: usize = 5;
const MIN_HEADER_LEN: usize = 7;

/// Build the 8-byte frame for `command` with two parameter bytes.
pub fn encode_command(command: u8, param1: u8, param2: u8) -> [u8; COMMAND_FRAME_LEN] {
    [START_BYTE, VERSION, LENGTH, command, MODULE_INDEX, param1, param2, END_BYTE]
}

/// One's-complement of the sum of header bytes 1..=6 and the payload, mod 256.
pub fn response_checksum(header: &[u8], payload: &[u8]) -> u8 {
    let sum = header
        .iter()
        .skip(1)
        .take(6)
        .chain(payload.iter())
        .fold(0u8, |acc, &b| acc.wrapping_add(b));
    !sum
}

/// Validate a reply against the checksum byte read after it.
pub fn verify_response(header: &[u8], payload: &[u8], received: u8) -> Result<Response, DfPlayerError> {
    if header.len() < MIN_HEADER_LEN {
        return Err(DfPlayerError::InvalidResponse(format!(
            "Response too short: expected at least {} bytes, got {}",
            MIN_HEADER_LEN,
            header.len()
        )));
    }

    let expected = response_checksum(header, payload);
    if expected != received {
        return Err(DfPlayerError::ChecksumMismatch { expected, received });
    }

    Ok(Response {
        code: header[INDEX_CODE],
        payload: payload.to_vec(),
    })
}

/// Driver for a DFPlayer Mini attached to a serial transport.
pub struct DfPlayerMini<T: PlayerTransport> {
    transport: T,
}

impl<T: PlayerTransport> DfPlayerMini<T> {
    /// Serial timeout the module is configured with during initialization
    const READ_TIMEOUT_MS: u32 = 500;

    // Command codes
    const INITIALIZE: u8 = 0x00;
    const NEXT: u8 = 0x01;
    const PREVIOUS: u8 = 0x02;
    const PLAY_TRACK: u8 = 0x03;
    const VOLUME_UP: u8 = 0x04;
    const VOLUME_DOWN: u8 = 0x05;
    const SET_VOLUME: u8 = 0x06;
    const SET_SERIAL_TIMEOUT: u8 = 0x06;
    const SET_EQ: u8 = 0x07;
    const LOOP_TRACK: u8 = 0x08;
    const SET_OUTPUT_DEVICE: u8 = 0x09;
    const SLEEP: u8 = 0x0A;
    const WAKE: u8 = 0x0B;
    const RESET: u8 = 0x0C;
    const START: u8 = 0x0D;
    const PAUSE: u8 = 0x0E;
    const PLAY_FOLDER_TRACK: u8 = 0x0F;
    const LOOP_ALL: u8 = 0x11;
    const PLAY_MP3_TRACK: u8 = 0x12;
    const ADVERTISE_TRACK: u8 = 0x13;
    const PLAY_LARGE_FOLDER_TRACK: u8 = 0x14;
    const STOP_ADVERTISE: u8 = 0x15;
    const STOP: u8 = 0x16;
    const LOOP_FOLDER: u8 = 0x17;
    const RANDOM_ALL: u8 = 0x18;
    const SINGLE_LOOP: u8 = 0x19;
    const READ_STATE: u8 = 0x42;
    const READ_VOLUME: u8 = 0x43;
    const READ_EQ: u8 = 0x44;
    const READ_FILE_COUNTS: u8 = 0x47;
    const READ_FILE_COUNTS_IN_FOLDER: u8 = 0x48;
    const READ_CURRENT_FILE: u8 = 0x4B;

    /// Attach to the module and run the initialization sequence with default settings.
    ///
    /// A module that does not acknowledge is logged, not reported: the returned
    /// driver is usable either way. Only transport failures are returned as errors.
    pub fn new(transport: T) -> Result<Self, DfPlayerError> {
        Self::with_config(transport, PlayerConfig::default())
    }

    /// Attach and initialize, applying `config` once the module has acknowledged.
    pub fn with_config(transport: T, config: PlayerConfig) -> Result<Self, DfPlayerError> {
        let mut player = Self::attach(transport);
        player.init(&config)?;
        Ok(player)
    }

    /// Wrap a transport without talking to the module
    pub fn attach(transport: T) -> Self {
        Self { transport }
    }

    /// Give the transport back to its owner
    pub fn release(self) -> T {
        self.transport
    }

    /// Run the initialization sequence.
    ///
    /// Returns `Ok(false)` when the module did not acknowledge the initialize or
    /// serial timeout command; the remaining steps are skipped in that case.
    pub fn init(&mut self, config: &PlayerConfig) -> Result<bool, DfPlayerError> {
        info!("Initializing DFPlayer (may take 3-5 seconds)");
        self.transport
            .clear_input()
            .map_err(|e| DfPlayerError::Transport(format!("{:?}", e)))?;

        self.send(Self::INITIALIZE)?;
        if !self.expect_ack()? {
            error!("DFPlayer initialization failed");
            return Ok(false);
        }
        info!("DFPlayer online");

        self.send_cmd(Self::SET_SERIAL_TIMEOUT, 0x00, 0x00)?;
        if !self.expect_ack()? {
            error!("Failed to set serial timeout");
            return Ok(false);
        }
        info!("DFPlayer serial timeout set to {} ms", Self::READ_TIMEOUT_MS);

        self.set_volume(config.volume)?;
        self.set_equalizer(config.equalizer)?;
        self.set_output_device(config.output_device)?;

        info!("DFPlayer initialized");
        Ok(true)
    }

    /// Set volume (0-30, out-of-range values are clamped)
    pub fn set_volume(&mut self, volume: i32) -> Result<(), DfPlayerError> {
        self.send_cmd(Self::SET_VOLUME, 0x00, clamp_byte(volume, 0, 30))
    }

    pub fn volume_up(&mut self) -> Result<(), DfPlayerError> {
        self.send(Self::VOLUME_UP)
    }

    pub fn volume_down(&mut self) -> Result<(), DfPlayerError> {
        self.send(Self::VOLUME_DOWN)
    }

    /// Set equalizer mode (0-5, clamped)
    ///
    /// 0 Normal, 1 Pop, 2 Rock, 3 Jazz, 4 Classic, 5 Bass.
    pub fn set_eq(&mut self, eq: i32) -> Result<(), DfPlayerError> {
        self.send_cmd(Self::SET_EQ, 0x00, clamp_byte(eq, 0, 5))
    }

    pub fn set_equalizer(&mut self, eq: Equalizer) -> Result<(), DfPlayerError> {
        self.set_eq(eq as i32)
    }

    /// Select the output device (0-4, clamped)
    ///
    /// 0 U-disk, 1 SD, 2 AUX, 3 sleep, 4 flash.
    pub fn set_output_device(&mut self, device: i32) -> Result<(), DfPlayerError> {
        self.send_cmd(Self::SET_OUTPUT_DEVICE, 0x00, clamp_byte(device, 0, 4))
    }

    /// Play track number `track` (0-65535, clamped)
    pub fn play_track(&mut self, track: i32) -> Result<(), DfPlayerError> {
        let [high, low] = track_bytes(track);
        self.send_cmd(Self::PLAY_TRACK, high, low)
    }

    /// Repeat track number `track` (0-65535, clamped)
    pub fn loop_track(&mut self, track: i32) -> Result<(), DfPlayerError> {
        let [high, low] = track_bytes(track);
        self.send_cmd(Self::LOOP_TRACK, high, low)
    }

    pub fn pause(&mut self) -> Result<(), DfPlayerError> {
        self.send(Self::PAUSE)
    }

    /// Start or resume playback
    pub fn start(&mut self) -> Result<(), DfPlayerError> {
        self.send(Self::START)
    }

    pub fn next_track(&mut self) -> Result<(), DfPlayerError> {
        self.send(Self::NEXT)
    }

    pub fn previous_track(&mut self) -> Result<(), DfPlayerError> {
        self.send(Self::PREVIOUS)
    }

    pub fn stop(&mut self) -> Result<(), DfPlayerError> {
        self.send(Self::STOP)
    }

    pub fn sleep(&mut self) -> Result<(), DfPlayerError> {
        self.send(Self::SLEEP)
    }

    /// Leave sleep mode
    pub fn wake(&mut self) -> Result<(), DfPlayerError> {
        self.send(Self::WAKE)
    }

    pub fn reset(&mut self) -> Result<(), DfPlayerError> {
        self.send(Self::RESET)
    }

    /// Play `track` (1-255) from folder `folder` (1-99). Values are sent as-is.
    pub fn play_folder_track(&mut self, folder: u8, track: u8) -> Result<(), DfPlayerError> {
        self.send_cmd(Self::PLAY_FOLDER_TRACK, folder, track)
    }

    pub fn enable_loop_all(&mut self) -> Result<(), DfPlayerError> {
        self.send_cmd(Self::LOOP_ALL, 0x00, 0x01)
    }

    pub fn disable_loop_all(&mut self) -> Result<(), DfPlayerError> {
        self.send_cmd(Self::LOOP_ALL, 0x00, 0x00)
    }

    /// Play a track from the `mp3` folder
    pub fn play_mp3_track(&mut self, track: u8) -> Result<(), DfPlayerError> {
        self.send_cmd(Self::PLAY_MP3_TRACK, 0x00, track)
    }

    /// Interrupt playback with a track from the `advert` folder
    pub fn advertise_track(&mut self, track: u8) -> Result<(), DfPlayerError> {
        self.send_cmd(Self::ADVERTISE_TRACK, 0x00, track)
    }

    /// Return from an advertisement to the interrupted track
    pub fn stop_advertise(&mut self) -> Result<(), DfPlayerError> {
        self.send(Self::STOP_ADVERTISE)
    }

    /// Play `track` from one of the large folders (1-10). Values are sent as-is.
    pub fn play_large_folder_track(&mut self, folder: u8, track: u8) -> Result<(), DfPlayerError> {
        self.send_cmd(Self::PLAY_LARGE_FOLDER_TRACK, folder, track)
    }

    /// Repeat every track of `folder` (1-99)
    pub fn loop_folder(&mut self, folder: u8) -> Result<(), DfPlayerError> {
        self.send_cmd(Self::LOOP_FOLDER, 0x00, folder)
    }

    /// Shuffle all tracks on the current device
    pub fn random_all(&mut self) -> Result<(), DfPlayerError> {
        self.send(Self::RANDOM_ALL)
    }

    /// Repeat the current track
    pub fn enable_loop(&mut self) -> Result<(), DfPlayerError> {
        self.send_cmd(Self::SINGLE_LOOP, 0x00, 0x01)
    }

    pub fn disable_loop(&mut self) -> Result<(), DfPlayerError> {
        self.send_cmd(Self::SINGLE_LOOP, 0x00, 0x00)
    }

    // The query commands hand back the reply exactly as received, without
    // running it through read_response.

    pub fn read_state(&mut self) -> Result<Vec<u8>, DfPlayerError> {
        self.query(Self::READ_STATE, 0x00)
    }

    pub fn read_volume(&mut self) -> Result<Vec<u8>, DfPlayerError> {
        self.query(Self::READ_VOLUME, 0x00)
    }

    pub fn read_eq(&mut self) -> Result<Vec<u8>, DfPlayerError> {
        self.query(Self::READ_EQ, 0x00)
    }

    /// Total number of files on the storage device
    pub fn read_file_counts(&mut self) -> Result<Vec<u8>, DfPlayerError> {
        self.query(Self::READ_FILE_COUNTS, 0x00)
    }

    pub fn read_current_file_number(&mut self) -> Result<Vec<u8>, DfPlayerError> {
        self.query(Self::READ_CURRENT_FILE, 0x00)
    }

    pub fn read_file_counts_in_folder(&mut self, folder: u8) -> Result<Vec<u8>, DfPlayerError> {
        self.query(Self::READ_FILE_COUNTS_IN_FOLDER, folder)
    }

    /// Send `command` with both parameters zero
    pub fn send(&mut self, command: u8) -> Result<(), DfPlayerError> {
        self.send_cmd(command, 0x00, 0x00)
    }

    /// Encode and write one command frame
    pub fn send_cmd(&mut self, command: u8, param1: u8, param2: u8) -> Result<(), DfPlayerError> {
        let frame = encode_command(command, param1, param2);
        debug!("Sending command: {:02X?}", frame);
        let written = self
            .transport
            .write(&frame)
            .map_err(|e| DfPlayerError::Transport(format!("{:?}", e)))?;
        debug!("Wrote {} bytes", written);
        Ok(())
    }

    /// Read and validate one reply.
    ///
    /// `Ok(None)` means the module sent nothing, sent a truncated frame, or the
    /// checksum did not match; the latter two are logged.
    pub fn read_response(&mut self) -> Result<Option<Response>, DfPlayerError> {
        let header = self.read_up_to(MAX_RESPONSE_LEN)?;
        if header.is_empty() {
            debug!("No response from DFPlayer");
            return Ok(None);
        }
        if header.len() < MIN_HEADER_LEN {
            warn!("Truncated response: {}", bytes_to_hex(&header));
            return Ok(None);
        }

        // Byte 5 counts the command and checksum bytes as well as the payload
        let payload_len = (header[INDEX_LENGTH] as usize).saturating_sub(2);
        let payload = if payload_len > 0 {
            self.read_up_to(payload_len)?
        } else {
            Vec::new()
        };

        let checksum = self.read_up_to(1)?;
        let Some(&received) = checksum.first() else {
            warn!("Response ended before checksum byte: {}", bytes_to_hex(&header));
            return Ok(None);
        };

        match verify_response(&header, &payload, received) {
            Ok(response) => Ok(Some(response)),
            Err(e) => {
                error!("Checksum error in response: {}", e);
                Ok(None)
            }
        }
    }

    fn query(&mut self, command: u8, param2: u8) -> Result<Vec<u8>, DfPlayerError> {
        self.send_cmd(command, 0x00, param2)?;
        self.read_up_to(MAX_RESPONSE_LEN)
    }

    fn expect_ack(&mut self) -> Result<bool, DfPlayerError> {
        let reply = self.read_up_to(MAX_RESPONSE_LEN)?;
        if reply == ACK_FRAME {
            Ok(true)
        } else {
            warn!(
                "Unexpected acknowledgement: [{}], expected [{}]",
                bytes_to_hex(&reply),
                bytes_to_hex(&ACK_FRAME)
            );
            Ok(false)
        }
    }

    /// Read until `len` bytes arrived or the transport times out
    fn read_up_to(&mut self, len: usize) -> Result<Vec<u8>, DfPlayerError> {
        let mut buf = vec![0u8; len];
        let mut filled = 0;
        while filled < len {
            match self.transport.read(&mut buf[filled..], Self::READ_TIMEOUT_MS) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) => {
                    error!("Read error: {:?}", e);
                    return Err(DfPlayerError::Transport(format!("{:?}", e)));
                }
            }
        }
        buf.truncate(filled);
        debug!("Received {} bytes: {:02X?}", filled, buf);
        Ok(buf)
    }
}

fn clamp_byte(value: i32, min: i32, max: i32) -> u8 {
    value.clamp(min, max) as u8
}

fn track_bytes(track: i32) -> [u8; 2] {
    (track.clamp(0, u16::MAX as i32) as u16).to_be_bytes()
}
