//! Configuration
//!
//! Factory control parameters and the tick budgets the sequencer runs on.
//! Parameters can be changed at runtime but are never persisted.

pub mod params;
pub mod timing;

pub use params::*;
