//! Hook state derived from the reported position

use transfera_protocol::{POSITION_END_STROKE_FLAG, POSITION_UNINITIALIZED};

use crate::config::Positions;

/// Where the hook is, in operator terms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HookState {
    /// Not homed since power-up or reboot
    Uninitialized,
    Closed,
    PartiallyClosed,
    Mid,
    PartiallyOpen,
    Open,
    /// Position outside every known range
    Error,
}

/// Named travel targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HookTarget {
    Home,
    Closed,
    Mid,
    Open,
}

impl HookTarget {
    /// Configured position for this target
    pub fn position(self, positions: &Positions) -> u16 {
        match self {
            Self::Home => positions.home,
            Self::Closed => positions.closed,
            Self::Mid => positions.mid,
            Self::Open => positions.open,
        }
    }

    /// State that counts as having arrived
    pub fn reached_state(self) -> HookState {
        match self {
            Self::Home | Self::Closed => HookState::Closed,
            Self::Mid => HookState::Mid,
            Self::Open => HookState::Open,
        }
    }
}

impl HookState {
    /// Map a raw position field (flag bit included) to a state
    ///
    /// Named targets are inclusive, the partial ranges between them are
    /// exclusive on both ends.
    pub fn from_position(raw: u16, positions: &Positions) -> Self {
        if raw & POSITION_END_STROKE_FLAG != 0 || raw <= positions.closed {
            Self::Closed
        } else if raw < positions.mid {
            Self::PartiallyClosed
        } else if raw == positions.mid {
            Self::Mid
        } else if raw < positions.open {
            Self::PartiallyOpen
        } else if raw == positions.open {
            Self::Open
        } else if raw == POSITION_UNINITIALIZED {
            Self::Uninitialized
        } else {
            Self::Error
        }
    }

    /// True while the hook is somewhere it can be driven from
    pub fn is_known(self) -> bool {
        !matches!(self, Self::Uninitialized | Self::Error)
    }
}
