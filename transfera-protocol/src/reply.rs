//! Telemetry reply frames sent by the actuator.
//!
//! Frame format (16 bytes, little-endian, packed):
//! - SYNC (1 byte): 0xFE
//! - TYPE (1 byte): reply type, echoed as-is
//! - VOLTAGE (u16): supply voltage in mV
//! - CURRENT (i16): motor current in mA
//! - POSITION (u16): bit 15 = end-of-stroke flag, bits 0-14 = position
//! - ERROR (1 byte): actuator error code
//! - ECHO (1 byte): sequence number (3 bits), data source (1 bit), data id (4 bits)
//! - DATA (4 bytes): source-specific value
//! - CHECKSUM (u16): Fletcher-16 over the 14 bytes above

use crate::checksum::fletcher16;
use crate::frame::{read_i16, read_u16, write_u16, FrameError, FRAME_SYNC};

/// Total reply frame size
pub const REPLY_FRAME_LEN: usize = 16;

/// Bytes covered by the checksum
const CHECKED_LEN: usize = REPLY_FRAME_LEN - 2;

/// End-of-stroke flag carried in the position field
pub const POSITION_END_STROKE_FLAG: u16 = 0x8000;

/// Numeric part of the position field
pub const POSITION_VALUE_MASK: u16 = 0x7FFF;

/// Position reported before the actuator has been homed
pub const POSITION_UNINITIALIZED: u16 = 0x7FFF;

// Field offsets
const OFFSET_TYPE: usize = 1;
const OFFSET_VOLTAGE: usize = 2;
const OFFSET_CURRENT: usize = 4;
const OFFSET_POSITION: usize = 6;
const OFFSET_ERROR: usize = 8;
const OFFSET_ECHO: usize = 9;
const OFFSET_DATA: usize = 10;
const OFFSET_CHECKSUM: usize = 14;

// Command echo bit layout: [id:4 | source:1 | seq:3]
const ECHO_SEQ_MASK: u8 = 0b0000_0111;
const ECHO_SOURCE_SHIFT: u8 = 3;
const ECHO_SOURCE_MASK: u8 = 0b0000_1000;
const ECHO_ID_SHIFT: u8 = 4;
const ECHO_ID_MASK: u8 = 0b1111_0000;

/// What the four data bytes of a reply carry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataSource {
    /// Echo of a parameter read or write, `data_id` names the parameter
    Parameter,
    /// Ready-for-lifting countdown (u32)
    ReadyTimer,
}

/// Echo of the last command the actuator processed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CommandEcho {
    /// Sequence number of the last move command (0-7)
    pub seq: u8,
    /// Meaning of the data bytes
    pub source: DataSource,
    /// Data identifier (0-15)
    pub data_id: u8,
}

impl CommandEcho {
    /// Decode the packed echo byte
    pub fn from_byte(byte: u8) -> Self {
        let source = if byte & ECHO_SOURCE_MASK == 0 {
            DataSource::Parameter
        } else {
            DataSource::ReadyTimer
        };

        Self {
            seq: byte & ECHO_SEQ_MASK,
            source,
            data_id: (byte & ECHO_ID_MASK) >> ECHO_ID_SHIFT,
        }
    }

    /// Pack into the wire byte; out-of-range fields are truncated to their width
    pub fn to_byte(self) -> u8 {
        let source = match self.source {
            DataSource::Parameter => 0,
            DataSource::ReadyTimer => 1,
        };

        (self.seq & ECHO_SEQ_MASK)
            | ((source << ECHO_SOURCE_SHIFT) & ECHO_SOURCE_MASK)
            | ((self.data_id << ECHO_ID_SHIFT) & ECHO_ID_MASK)
    }
}

/// A decoded telemetry reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Reply {
    /// Reply type byte
    pub frame_type: u8,
    /// Supply voltage (mV)
    pub voltage_mv: u16,
    /// Motor current (mA)
    pub current_ma: i16,
    /// Raw position field including the end-of-stroke flag
    pub position: u16,
    /// Actuator error code (0 = none)
    pub error: u8,
    /// Command echo
    pub echo: CommandEcho,
    /// Source-specific data bytes
    pub data: [u8; 4],
}

impl Reply {
    /// Parse a reply from the first [`REPLY_FRAME_LEN`] bytes of `bytes`
    pub fn parse(bytes: &[u8]) -> Result<Self, FrameError> {
        if bytes.len() < REPLY_FRAME_LEN {
            return Err(FrameError::BufferTooSmall);
        }
        if bytes[0] != FRAME_SYNC {
            return Err(FrameError::BadSync);
        }

        let received = read_u16(bytes, OFFSET_CHECKSUM);
        if fletcher16(&bytes[..CHECKED_LEN]) != received {
            return Err(FrameError::InvalidChecksum);
        }

        let mut data = [0u8; 4];
        data.copy_from_slice(&bytes[OFFSET_DATA..OFFSET_DATA + 4]);

        Ok(Self {
            frame_type: bytes[OFFSET_TYPE],
            voltage_mv: read_u16(bytes, OFFSET_VOLTAGE),
            current_ma: read_i16(bytes, OFFSET_CURRENT),
            position: read_u16(bytes, OFFSET_POSITION),
            error: bytes[OFFSET_ERROR],
            echo: CommandEcho::from_byte(bytes[OFFSET_ECHO]),
            data,
        })
    }

    /// Encode this reply, checksum included (actuator side, simulators)
    ///
    /// Returns the number of bytes written
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, FrameError> {
        if buffer.len() < REPLY_FRAME_LEN {
            return Err(FrameError::BufferTooSmall);
        }

        buffer[0] = FRAME_SYNC;
        buffer[OFFSET_TYPE] = self.frame_type;
        write_u16(buffer, OFFSET_VOLTAGE, self.voltage_mv);
        buffer[OFFSET_CURRENT..OFFSET_CURRENT + 2].copy_from_slice(&self.current_ma.to_le_bytes());
        write_u16(buffer, OFFSET_POSITION, self.position);
        buffer[OFFSET_ERROR] = self.error;
        buffer[OFFSET_ECHO] = self.echo.to_byte();
        buffer[OFFSET_DATA..OFFSET_DATA + 4].copy_from_slice(&self.data);

        let checksum = fletcher16(&buffer[..CHECKED_LEN]);
        write_u16(buffer, OFFSET_CHECKSUM, checksum);

        Ok(REPLY_FRAME_LEN)
    }

    /// Encode into a fixed array
    pub fn to_bytes(&self) -> [u8; REPLY_FRAME_LEN] {
        let mut bytes = [0u8; REPLY_FRAME_LEN];
        // Cannot fail: the array is exactly one frame long
        let _ = self.encode(&mut bytes);
        bytes
    }

    /// Data bytes as a little-endian u32
    pub fn data_u32(&self) -> u32 {
        u32::from_le_bytes(self.data)
    }

    /// Data bytes as a little-endian i32
    pub fn data_i32(&self) -> i32 {
        i32::from_le_bytes(self.data)
    }

    /// True when the end-of-stroke flag is set
    pub fn end_stroke_flag(&self) -> bool {
        self.position & POSITION_END_STROKE_FLAG != 0
    }

    /// Position without the end-of-stroke flag
    pub fn position_value(&self) -> u16 {
        self.position & POSITION_VALUE_MASK
    }
}
