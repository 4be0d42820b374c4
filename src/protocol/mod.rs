//! Protocol module - frame layout and the decoding state machine.
//!
//! The platform frames every message the same way:
//!
//! ```text
//! ┌────────┬────────┬──────────┬──────────────────┬──────────┐
//! │ header │ length │ packetID │ payload          │ checksum │
//! │ 1 byte │ 1 byte │ 1 byte   │ `length` bytes   │ 1 byte   │
//! └────────┴────────┴──────────┴──────────────────┴──────────┘
//! ```
//!
//! The checksum byte is chosen so the sum of every frame byte, header and
//! checksum included, is congruent to 0 modulo 256.

mod decoder;
mod packet;

pub use decoder::{FrameDecoder, Step};
pub use packet::{checksum, encode_frame, Packet, DEFAULT_FRAME_HEADER};
