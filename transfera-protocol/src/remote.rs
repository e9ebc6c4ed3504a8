//! Handheld remote position request.
//!
//! The handheld sends a short ASCII frame whenever a position button is
//! pressed:
//!
//! ```text
//! $ R <open> <mid> <close> \r \n
//! ```
//!
//! Each flag is the digit `0` or `1`. Exactly one flag set selects a target;
//! anything else is a no-op request.

/// Total remote frame size
pub const REMOTE_FRAME_LEN: usize = 7;

const HEADER: [u8; 2] = *b"$R";
const TERMINATOR: [u8; 2] = *b"\r\n";

// Button bits as reported by the handheld keypad scan
const BUTTON_CLOSE: u8 = 16;
const BUTTON_MID: u8 = 32;
const BUTTON_OPEN: u8 = 64;

/// Errors from parsing a remote frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RemoteError {
    /// Missing `$R`
    BadHeader,
    /// Missing CR LF
    BadTerminator,
    /// A flag that is neither `0` nor `1`
    BadDigit,
    /// Wrong frame length
    Length,
}

/// Target the operator asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HookRequest {
    Close,
    Mid,
    Open,
}

/// Decoded open/mid/close triplet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RemoteCommand {
    pub open: bool,
    pub mid: bool,
    pub close: bool,
}

impl RemoteCommand {
    /// Build from the keypad button mask
    pub fn from_button_mask(mask: u8) -> Self {
        Self {
            open: mask & BUTTON_OPEN != 0,
            mid: mask & BUTTON_MID != 0,
            close: mask & BUTTON_CLOSE != 0,
        }
    }

    /// Parse a complete frame
    pub fn parse(bytes: &[u8]) -> Result<Self, RemoteError> {
        if bytes.len() != REMOTE_FRAME_LEN {
            return Err(RemoteError::Length);
        }
        if bytes[..2] != HEADER {
            return Err(RemoteError::BadHeader);
        }
        if bytes[5..] != TERMINATOR {
            return Err(RemoteError::BadTerminator);
        }

        let flag = |byte: u8| match byte {
            b'0' => Ok(false),
            b'1' => Ok(true),
            _ => Err(RemoteError::BadDigit),
        };

        Ok(Self {
            open: flag(bytes[2])?,
            mid: flag(bytes[3])?,
            close: flag(bytes[4])?,
        })
    }

    /// Encode into a fixed array
    pub fn encode(&self) -> [u8; REMOTE_FRAME_LEN] {
        let digit = |set: bool| if set { b'1' } else { b'0' };
        [
            HEADER[0],
            HEADER[1],
            digit(self.open),
            digit(self.mid),
            digit(self.close),
            TERMINATOR[0],
            TERMINATOR[1],
        ]
    }

    /// The requested target, if exactly one flag is set
    pub fn request(&self) -> Option<HookRequest> {
        match (self.open, self.mid, self.close) {
            (false, false, true) => Some(HookRequest::Close),
            (false, true, false) => Some(HookRequest::Mid),
            (true, false, false) => Some(HookRequest::Open),
            _ => None,
        }
    }
}
