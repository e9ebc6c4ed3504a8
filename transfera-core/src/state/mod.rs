//! Actuator state
//!
//! Everything known about the actuator lives in one [`ActuatorState`]: the
//! latest telemetry, what it means (hook state, stopped, end of stroke),
//! the latched error and the control parameters. The decoder writes it once
//! per tick; the sequencer reads it and records the few things it decides.

pub mod decoder;
pub mod error;
pub mod hook;
pub mod motion;
pub mod store;

pub use decoder::{DecodeStats, ProtocolDecoder};
pub use error::ErrorKind;
pub use hook::{HookState, HookTarget};
pub use motion::StallDetector;
pub use store::{ActuatorState, ParameterEcho, MAX_PROTECTION_LEVEL};
