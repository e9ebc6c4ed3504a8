//! Reply decoding from the receive ring
//!
//! Runs once per tick and consumes every complete frame available. A byte
//! that is not the sync marker where a frame should start is dropped, which
//! realigns the stream after lost or corrupted bytes. Frames with a bad
//! checksum are dropped whole and never surface as an actuator error.

use transfera_protocol::{FrameError, Reply, FRAME_SYNC, REPLY_FRAME_LEN};

use super::store::ActuatorState;
use crate::ring::Consumer;

/// Counters for one decode pass (or a running total)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DecodeStats {
    /// Replies accepted
    pub frames: u32,
    /// Replies dropped on checksum
    pub checksum_failures: u32,
    /// Bytes skipped while looking for sync
    pub discarded: u32,
}

impl DecodeStats {
    fn accumulate(&mut self, other: &DecodeStats) {
        self.frames = self.frames.wrapping_add(other.frames);
        self.checksum_failures = self.checksum_failures.wrapping_add(other.checksum_failures);
        self.discarded = self.discarded.wrapping_add(other.discarded);
    }
}

/// Turns buffered bytes into state updates
#[derive(Debug, Clone, Default)]
pub struct ProtocolDecoder {
    totals: DecodeStats,
}

impl ProtocolDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode every complete frame waiting in `ring` into `state`
    pub fn run<const N: usize>(
        &mut self,
        ring: &mut Consumer<'_, N>,
        state: &mut ActuatorState,
    ) -> DecodeStats {
        let mut stats = DecodeStats::default();
        let mut frame = [0u8; REPLY_FRAME_LEN];

        while ring.len().unwrap_or(0) >= REPLY_FRAME_LEN {
            let mut first = [0u8; 1];
            if ring.peek(&mut first).is_err() {
                break;
            }

            if first[0] != FRAME_SYNC {
                if ring.poll(&mut first).is_err() {
                    break;
                }
                debug!("discarded byte {}", first[0]);
                stats.discarded += 1;
                continue;
            }

            if ring.poll(&mut frame).is_err() {
                break;
            }

            match Reply::parse(&frame) {
                Ok(reply) => {
                    state.apply_reply(&reply);
                    stats.frames += 1;
                }
                Err(FrameError::InvalidChecksum) => {
                    warn!("reply dropped: invalid checksum");
                    stats.checksum_failures += 1;
                }
                Err(e) => {
                    warn!("reply dropped: {:?}", e);
                }
            }
        }

        self.totals.accumulate(&stats);
        stats
    }

    /// Totals since creation
    pub fn totals(&self) -> DecodeStats {
        self.totals
    }
}
