//! Hook Actuator Link Protocol
//!
//! This crate defines the binary frames exchanged between the Transfera remote
//! and the hook's motor controller, plus the short ASCII command the handheld
//! remote sends when a position button is pressed.
//!
//! # Protocol Overview
//!
//! Telemetry replies (actuator → remote), fixed size, little-endian:
//! ```text
//! ┌──────┬──────┬─────────┬─────────┬──────────┬───────┬──────┬─────────┬──────────┐
//! │ SYNC │ TYPE │ VOLTAGE │ CURRENT │ POSITION │ ERROR │ ECHO │ DATA    │ CHECKSUM │
//! │ 1B   │ 1B   │ u16     │ i16     │ u16      │ 1B    │ 1B   │ 4B      │ u16      │
//! └──────┴──────┴─────────┴─────────┴──────────┴───────┴──────┴─────────┴──────────┘
//! ```
//!
//! Motor commands (remote → actuator):
//! ```text
//! ┌──────┬────────┬─────┬─────┬─────┐
//! │ SYNC │ OPCODE │ P1  │ P2  │ P3  │
//! │ 1B   │ 1B     │ i16 │ i16 │ i16 │
//! └──────┴────────┴─────┴─────┴─────┘
//! ```
//!
//! The checksum is Fletcher-16 over every reply byte before it. Commands carry
//! no checksum; the radio link below is already integrity checked.

#![no_std]
#![deny(unsafe_code)]

pub mod checksum;
pub mod command;
pub mod frame;
pub mod remote;
pub mod reply;

pub use checksum::{fletcher16, fletcher16_with_seed, is_valid, is_valid_with_seed};
pub use command::{MotorCommand, MoveMode, Opcode, ParameterId, COMMAND_FRAME_LEN, SEQ_MODULO};
pub use frame::{FrameError, FRAME_SYNC};
pub use remote::{HookRequest, RemoteCommand, RemoteError, REMOTE_FRAME_LEN};
pub use reply::{
    CommandEcho, DataSource, Reply, POSITION_END_STROKE_FLAG, POSITION_UNINITIALIZED,
    POSITION_VALUE_MASK, REPLY_FRAME_LEN,
};
