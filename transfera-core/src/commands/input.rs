//! Command requests

use transfera_protocol::{HookRequest, RemoteCommand};

use crate::state::HookTarget;

/// High-level operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Operation {
    /// No-op, dropped on dequeue
    None,
    Homing,
    /// Acknowledge the latched error
    Eack,
    Reboot,
    Stop,
    /// Escalate protection recovery one level
    EnableRecovery,
    Close,
    Mid,
    Open,
}

impl Operation {
    /// Decode an operation code
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::None),
            1 => Some(Self::Homing),
            2 => Some(Self::Eack),
            3 => Some(Self::Reboot),
            4 => Some(Self::Stop),
            5 => Some(Self::EnableRecovery),
            128 => Some(Self::Close),
            136 => Some(Self::Mid),
            142 => Some(Self::Open),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Homing => 1,
            Self::Eack => 2,
            Self::Reboot => 3,
            Self::Stop => 4,
            Self::EnableRecovery => 5,
            Self::Close => 128,
            Self::Mid => 136,
            Self::Open => 142,
        }
    }

    /// Operations allowed to run while an error is latched
    pub fn runs_during_fault(self) -> bool {
        matches!(self, Self::Stop | Self::Eack)
    }

    /// Destination of a positioning move
    pub fn target(self) -> Option<HookTarget> {
        match self {
            Self::Close => Some(HookTarget::Closed),
            Self::Mid => Some(HookTarget::Mid),
            Self::Open => Some(HookTarget::Open),
            _ => None,
        }
    }
}

impl From<HookRequest> for Operation {
    fn from(request: HookRequest) -> Self {
        match request {
            HookRequest::Close => Self::Close,
            HookRequest::Mid => Self::Mid,
            HookRequest::Open => Self::Open,
        }
    }
}

/// A queued request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CommandInput {
    pub operation: Operation,
    /// Operation-specific parameters, carried through unchanged
    pub parameters: [i32; 3],
}

impl CommandInput {
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            parameters: [0; 3],
        }
    }

    /// Decode an operation code with its parameters
    pub fn from_code(code: u8, parameters: [i32; 3]) -> Option<Self> {
        Operation::from_code(code).map(|operation| Self {
            operation,
            parameters,
        })
    }

    /// Decode an open/mid/close triplet
    ///
    /// Exactly one nonzero flag selects its target; anything else yields
    /// [`Operation::None`].
    pub fn from_triplet(open: i32, mid: i32, close: i32) -> Self {
        let operation = match (open != 0, mid != 0, close != 0) {
            (true, false, false) => Operation::Open,
            (false, true, false) => Operation::Mid,
            (false, false, true) => Operation::Close,
            _ => Operation::None,
        };

        Self {
            operation,
            parameters: [open, mid, close],
        }
    }

    pub fn from_remote(command: &RemoteCommand) -> Self {
        Self::from_triplet(
            command.open as i32,
            command.mid as i32,
            command.close as i32,
        )
    }
}

impl From<Operation> for CommandInput {
    fn from(operation: Operation) -> Self {
        Self::new(operation)
    }
}
