//! Motor controller side of the link
//!
//! Builds command frames and hands them to the link. Retries and reply
//! correlation belong to the sequencer.

pub mod encoder;

pub use encoder::CommandEncoder;
