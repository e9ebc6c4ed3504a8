//! Control parameter definitions

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Travel speeds, signed by direction (positive closes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Speeds {
    pub homing: i16,
    pub closing: i16,
    pub opening: i16,
}

impl Default for Speeds {
    fn default() -> Self {
        Self {
            homing: 750,
            closing: 1200,
            opening: -1200,
        }
    }
}

/// Named target positions (encoder counts)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Positions {
    pub home: u16,
    pub closed: u16,
    pub mid: u16,
    pub open: u16,
}

impl Default for Positions {
    fn default() -> Self {
        Self {
            home: 0,
            closed: 1,
            mid: 13393,
            open: 17967,
        }
    }
}

/// Current limiting profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CurrentMode {
    /// Normal travel
    Operation,
    /// Freeing a hook stuck against its protection
    Recovery,
}

/// Software current limits per mode (mA)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CurrentLimits {
    pub operation: i16,
    pub recovery: i16,
}

impl CurrentLimits {
    pub fn for_mode(&self, mode: CurrentMode) -> i16 {
        match mode {
            CurrentMode::Operation => self.operation,
            CurrentMode::Recovery => self.recovery,
        }
    }
}

impl Default for CurrentLimits {
    fn default() -> Self {
        Self {
            operation: 2000,
            recovery: 3500,
        }
    }
}

/// All tunable control parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ControlParameters {
    pub speeds: Speeds,
    pub positions: Positions,
    pub current_limits: CurrentLimits,
    /// End-of-stroke beyond this position means the protection tripped,
    /// not that the hook reached home
    pub protection_threshold: u16,
}

impl Default for ControlParameters {
    fn default() -> Self {
        Self {
            speeds: Speeds::default(),
            positions: Positions::default(),
            current_limits: CurrentLimits::default(),
            protection_threshold: 1000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_defaults() {
        let params = ControlParameters::default();
        assert!(params.speeds.closing > 0);
        assert!(params.speeds.opening < 0);
        assert!(params.positions.closed < params.positions.mid);
        assert!(params.positions.mid < params.positions.open);
        assert!(params.protection_threshold > params.positions.closed);
    }

    #[test]
    fn test_current_limit_for_mode() {
        let limits = CurrentLimits::default();
        assert_eq!(limits.for_mode(CurrentMode::Operation), 2000);
        assert_eq!(limits.for_mode(CurrentMode::Recovery), 3500);
    }
}
