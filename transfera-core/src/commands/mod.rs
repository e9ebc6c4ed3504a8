//! Command sequencing
//!
//! Operator and automatic requests queue up as [`CommandInput`]s. The
//! sequencer runs them one at a time, each as a [`CommandTask`] state
//! machine stepped once per tick.

pub mod input;
pub mod sequencer;
pub mod task;

pub use input::{CommandInput, Operation};
pub use sequencer::CommandSequencer;
pub use task::{CommandTask, TaskState};
