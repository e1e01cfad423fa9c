//! Wheel Clock Control Link Protocol
//!
//! This crate defines the UART protocol between a host (companion app,
//! bridge board or a terminal script) and the clock. It carries the
//! control surface: commands in, one reply per command out, plus time
//! updates and a heartbeat.
//!
//! # Protocol Overview
//!
//! All messages use a simple binary frame format:
//! ```text
//! ┌───────┬────────┬──────┬─────────────┬──────────┐
//! │ START │ LENGTH │ TYPE │ PAYLOAD     │ CHECKSUM │
//! │ 1B    │ 2B LE  │ 1B   │ 0–384B      │ 1B       │
//! └───────┴────────┴──────┴─────────────┴──────────┘
//! ```
//!
//! Payloads are postcard-encoded, so the host needs the same core types
//! (or a postcard schema of them) to talk to the clock.

#![no_std]
#![deny(unsafe_code)]

pub mod frame;
pub mod messages;

pub use frame::{Frame, FrameError, FrameParser, FRAME_START, MAX_FRAME_SIZE, MAX_PAYLOAD_SIZE};
pub use messages::{ClockMessage, HostMessage, MAX_UNIX_SECONDS};
