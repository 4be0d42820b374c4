//! Transport module - the physical byte-stream layer.
//!
//! The session itself is transport-agnostic: it runs over anything
//! implementing `AsyncRead + AsyncWrite`. This module provides the concrete
//! serial-port transport used against real hardware.

mod serial;

pub use serial::{open, DEFAULT_BAUD};
