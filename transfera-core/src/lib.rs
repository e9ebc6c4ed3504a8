//! Board-agnostic control core for the Transfera hook remote
//!
//! Everything between the radio link and the operator lives here:
//!
//! - Receive ring buffer fed by the link driver
//! - Telemetry decoding into a single owned [`state::ActuatorState`]
//! - Hook state derivation, stall detection and error latching
//! - Motor command encoding
//! - The command sequencer running one task state machine at a time
//!
//! The firmware calls [`controller::HookController::tick`] every
//! [`config::timing::TICK_PERIOD_MS`]. The link receive path keeps the
//! writing half of the split receive buffer and feeds it through
//! [`controller::append_bytes`], without locking against the tick.

#![no_std]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

pub mod commands;
pub mod config;
pub mod controller;
pub mod motor;
pub mod ring;
pub mod state;

pub use controller::{append_bytes, rx_buffer, HookController, HookStatus, RxBuffer, RxProducer};
