//! Velocity and standstill detection
//!
//! Velocity is the absolute position change between two replies. A single
//! slow reply says little (the encoder jitters by a few counts), so the
//! actuator only counts as stopped after a run of consecutive slow replies.

use transfera_protocol::POSITION_VALUE_MASK;

use crate::config::timing::{STALL_NOISE_THRESHOLD, STALL_SAMPLES};

/// Debounced low-velocity classifier
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StallDetector {
    previous: Option<u16>,
    velocity: u16,
    slow_samples: u8,
}

impl StallDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the raw position field of one reply
    pub fn update(&mut self, raw_position: u16) {
        let position = raw_position & POSITION_VALUE_MASK;
        self.velocity = match self.previous {
            Some(previous) => previous.abs_diff(position),
            None => 0,
        };
        self.previous = Some(position);

        if self.velocity < STALL_NOISE_THRESHOLD {
            self.slow_samples = self.slow_samples.saturating_add(1);
        } else {
            self.slow_samples = 0;
        }
    }

    /// Counts per reply, last sample
    pub fn velocity(&self) -> u16 {
        self.velocity
    }

    pub fn is_stopped(&self) -> bool {
        self.slow_samples > STALL_SAMPLES
    }

    /// Forget history, e.g. after the position was redefined
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
