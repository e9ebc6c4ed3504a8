//! Actuator error codes

/// Errors reported by the actuator or raised by the sequencer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ErrorKind {
    #[default]
    None,
    InvalidParameter,
    FailedToStartMotor,
    Overload,
    CommandTimeout,
    InvalidSequenceNumber,
    /// Emergency stop pressed on the actuator
    EStop,
    /// End of stroke reached far from home
    ProtectionActivated,
    /// Stopped short of the target
    MotorJammed,
    /// Code outside the known table
    Unknown(u8),
}

impl ErrorKind {
    /// Decode a wire error code
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => Self::None,
            1 => Self::InvalidParameter,
            2 => Self::FailedToStartMotor,
            3 => Self::Overload,
            4 => Self::CommandTimeout,
            5 => Self::InvalidSequenceNumber,
            6 => Self::EStop,
            7 => Self::ProtectionActivated,
            8 => Self::MotorJammed,
            other => Self::Unknown(other),
        }
    }

    /// Numeric code, as shown on the display
    pub fn code(self) -> u8 {
        match self {
            Self::None => 0,
            Self::InvalidParameter => 1,
            Self::FailedToStartMotor => 2,
            Self::Overload => 3,
            Self::CommandTimeout => 4,
            Self::InvalidSequenceNumber => 5,
            Self::EStop => 6,
            Self::ProtectionActivated => 7,
            Self::MotorJammed => 8,
            Self::Unknown(code) => code,
        }
    }

    pub fn is_none(self) -> bool {
        self == Self::None
    }
}
