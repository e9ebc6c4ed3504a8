//! Transfera Hardware Abstraction Layer
//!
//! This crate defines the seam between the hook control core and whatever
//! carries bytes to the actuator (BLE NUS bridge, UART, or a test double).
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  transfera-core (decoder, sequencer)    │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  transfera-hal (this crate - traits)    │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │  BLE NUS      │       │  host/test    │
//! │  bridge       │       │  link double  │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! Inbound bytes do not go through a trait: the transport's receive callback
//! pushes them straight into the core's ring buffer.

#![no_std]
#![deny(unsafe_code)]

pub mod link;

pub use link::LinkTx;
