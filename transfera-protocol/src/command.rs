//! Motor commands sent from the remote to the actuator.
//!
//! Frame format (8 bytes, little-endian, packed):
//! - SYNC (1 byte): 0xFE
//! - OPCODE (1 byte): command kind; move commands add their sequence number
//! - P1, P2, P3 (i16 each): command parameters, unused ones are zero

use crate::frame::{read_i16, FrameError, FRAME_SYNC};

/// Total command frame size
pub const COMMAND_FRAME_LEN: usize = 8;

/// Number of distinct move sequence numbers (3-bit counter)
pub const SEQ_MODULO: u8 = 8;

/// Base opcodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Opcode {
    /// Move to target; the wire value is `Move + seq`
    Move = 1,
    Stop = 10,
    Eack = 11,
    Reboot = 12,
    SetParameter = 13,
    ReadParameter = 14,
    ReadyForLoading = 15,
    SetPosition = 16,
}

impl Opcode {
    /// Map a wire opcode to its base opcode and, for moves, the sequence number
    pub fn from_byte(byte: u8) -> Option<(Self, u8)> {
        let move_base = Self::Move as u8;
        match byte {
            b if (move_base..move_base + SEQ_MODULO).contains(&b) => {
                Some((Self::Move, b - move_base))
            }
            10 => Some((Self::Stop, 0)),
            11 => Some((Self::Eack, 0)),
            12 => Some((Self::Reboot, 0)),
            13 => Some((Self::SetParameter, 0)),
            14 => Some((Self::ReadParameter, 0)),
            15 => Some((Self::ReadyForLoading, 0)),
            16 => Some((Self::SetPosition, 0)),
            _ => None,
        }
    }
}

/// Actuator parameter identifiers (4-bit, echoed in the reply data id)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ParameterId {
    Kp = 1,
    Ki = 2,
    Kd = 3,
    PidScalingShift = 4,
    PidOutputMin = 5,
    PidOutputMax = 6,
    CurrentLimitValue = 7,
    /// 1 = hardware limiter, 0 = software limiter
    CurrentLimitType = 8,
    CurrentLimitAdcFilter = 9,
    /// Ignore the end-of-stroke sensor while nonzero
    IgnoreSensor = 10,
}

impl ParameterId {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Kp),
            2 => Some(Self::Ki),
            3 => Some(Self::Kd),
            4 => Some(Self::PidScalingShift),
            5 => Some(Self::PidOutputMin),
            6 => Some(Self::PidOutputMax),
            7 => Some(Self::CurrentLimitValue),
            8 => Some(Self::CurrentLimitType),
            9 => Some(Self::CurrentLimitAdcFilter),
            10 => Some(Self::IgnoreSensor),
            _ => None,
        }
    }
}

/// Motion profile for a move command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum MoveMode {
    None = 0,
    #[default]
    ConstantSpeed = 1,
}

impl MoveMode {
    pub fn from_i16(value: i16) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            1 => Some(Self::ConstantSpeed),
            _ => None,
        }
    }
}

/// One outbound motor command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotorCommand {
    Move {
        target: i16,
        speed: i16,
        mode: MoveMode,
        /// Sequence number, taken modulo 8
        seq: u8,
    },
    Stop,
    Eack,
    Reboot,
    SetParameter {
        id: ParameterId,
        value: i16,
    },
    ReadParameter {
        id: ParameterId,
    },
    ReadyForLoading,
    SetPosition {
        position: i16,
    },
}

impl MotorCommand {
    /// Wire opcode, including the sequence offset for moves
    pub fn opcode_byte(&self) -> u8 {
        match self {
            Self::Move { seq, .. } => Opcode::Move as u8 + (seq % SEQ_MODULO),
            Self::Stop => Opcode::Stop as u8,
            Self::Eack => Opcode::Eack as u8,
            Self::Reboot => Opcode::Reboot as u8,
            Self::SetParameter { .. } => Opcode::SetParameter as u8,
            Self::ReadParameter { .. } => Opcode::ReadParameter as u8,
            Self::ReadyForLoading => Opcode::ReadyForLoading as u8,
            Self::SetPosition { .. } => Opcode::SetPosition as u8,
        }
    }

    /// The three frame parameters
    pub fn params(&self) -> [i16; 3] {
        match *self {
            Self::Move {
                target,
                speed,
                mode,
                ..
            } => [target, speed, mode as i16],
            Self::SetParameter { id, value } => [id as i16, value, 0],
            Self::ReadParameter { id } => [id as i16, 0, 0],
            Self::SetPosition { position } => [position, 0, 0],
            Self::Stop | Self::Eack | Self::Reboot | Self::ReadyForLoading => [0, 0, 0],
        }
    }

    /// Encode into `buffer`, returning the number of bytes written
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, FrameError> {
        if buffer.len() < COMMAND_FRAME_LEN {
            return Err(FrameError::BufferTooSmall);
        }

        buffer[0] = FRAME_SYNC;
        buffer[1] = self.opcode_byte();
        for (i, param) in self.params().iter().enumerate() {
            let offset = 2 + i * 2;
            buffer[offset..offset + 2].copy_from_slice(&param.to_le_bytes());
        }

        Ok(COMMAND_FRAME_LEN)
    }

    /// Encode into a fixed array
    pub fn to_bytes(&self) -> [u8; COMMAND_FRAME_LEN] {
        let mut bytes = [0u8; COMMAND_FRAME_LEN];
        // Cannot fail: the array is exactly one frame long
        let _ = self.encode(&mut bytes);
        bytes
    }

    /// Decode a command frame (actuator side, simulators)
    pub fn decode(bytes: &[u8]) -> Result<Self, FrameError> {
        if bytes.len() < COMMAND_FRAME_LEN {
            return Err(FrameError::BufferTooSmall);
        }
        if bytes[0] != FRAME_SYNC {
            return Err(FrameError::BadSync);
        }

        let (opcode, seq) = Opcode::from_byte(bytes[1]).ok_or(FrameError::InvalidFrame)?;
        let p1 = read_i16(bytes, 2);
        let p2 = read_i16(bytes, 4);
        let p3 = read_i16(bytes, 6);

        let parameter = |raw: i16| {
            u8::try_from(raw)
                .ok()
                .and_then(ParameterId::from_u8)
                .ok_or(FrameError::InvalidFrame)
        };

        let command = match opcode {
            Opcode::Move => Self::Move {
                target: p1,
                speed: p2,
                mode: MoveMode::from_i16(p3).ok_or(FrameError::InvalidFrame)?,
                seq,
            },
            Opcode::Stop => Self::Stop,
            Opcode::Eack => Self::Eack,
            Opcode::Reboot => Self::Reboot,
            Opcode::SetParameter => Self::SetParameter {
                id: parameter(p1)?,
                value: p2,
            },
            Opcode::ReadParameter => Self::ReadParameter { id: parameter(p1)? },
            Opcode::ReadyForLoading => Self::ReadyForLoading,
            Opcode::SetPosition => Self::SetPosition { position: p1 },
        };

        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_opcode_carries_seq() {
        for seq in 0..SEQ_MODULO {
            let cmd = MotorCommand::Move {
                target: 1,
                speed: 1200,
                mode: MoveMode::ConstantSpeed,
                seq,
            };
            assert_eq!(cmd.opcode_byte(), 1 + seq);
        }
    }

    #[test]
    fn test_move_layout() {
        let cmd = MotorCommand::Move {
            target: 17967,
            speed: -1200,
            mode: MoveMode::ConstantSpeed,
            seq: 5,
        };
        let bytes = cmd.to_bytes();
        assert_eq!(bytes[0], FRAME_SYNC);
        assert_eq!(bytes[1], 6);
        assert_eq!(&bytes[2..4], &17967i16.to_le_bytes());
        assert_eq!(&bytes[4..6], &(-1200i16).to_le_bytes());
        assert_eq!(&bytes[6..8], &[1, 0]);
    }

    #[test]
    fn test_fixed_opcodes() {
        assert_eq!(MotorCommand::Stop.to_bytes(), [0xFE, 10, 0, 0, 0, 0, 0, 0]);
        assert_eq!(MotorCommand::Eack.to_bytes(), [0xFE, 11, 0, 0, 0, 0, 0, 0]);
        assert_eq!(MotorCommand::Reboot.to_bytes(), [0xFE, 12, 0, 0, 0, 0, 0, 0]);
        assert_eq!(
            MotorCommand::SetPosition { position: 0x7FFF }.to_bytes(),
            [0xFE, 16, 0xFF, 0x7F, 0, 0, 0, 0]
        );
        assert_eq!(
            MotorCommand::SetParameter {
                id: ParameterId::IgnoreSensor,
                value: 1
            }
            .to_bytes(),
            [0xFE, 13, 10, 0, 1, 0, 0, 0]
        );
    }

    #[test]
    fn test_decode_matches_encode() {
        let cmd = MotorCommand::ReadParameter {
            id: ParameterId::CurrentLimitValue,
        };
        assert_eq!(MotorCommand::decode(&cmd.to_bytes()), Ok(cmd));

        let mv = MotorCommand::Move {
            target: 0,
            speed: 750,
            mode: MoveMode::ConstantSpeed,
            seq: 7,
        };
        assert_eq!(MotorCommand::decode(&mv.to_bytes()), Ok(mv));
    }

    #[test]
    fn test_decode_rejects_unknown() {
        assert_eq!(
            MotorCommand::decode(&[0xFE, 9, 0, 0, 0, 0, 0, 0]),
            Err(FrameError::InvalidFrame)
        );
        assert_eq!(
            MotorCommand::decode(&[0xFE, 14, 42, 0, 0, 0, 0, 0]),
            Err(FrameError::InvalidFrame)
        );
        assert_eq!(
            MotorCommand::decode(&[0x00, 10, 0, 0, 0, 0, 0, 0]),
            Err(FrameError::BadSync)
        );
        assert_eq!(MotorCommand::decode(&[0xFE]), Err(FrameError::BufferTooSmall));
    }
}
