//! Receive buffering between the link driver and the decoder
//!
//! One writer (link receive path) and one reader (decoder on the tick), each
//! holding its own half of the split buffer.

pub mod buffer;

pub use buffer::{Consumer, Producer, RingBuffer, RingError};
