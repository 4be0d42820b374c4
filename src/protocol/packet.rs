//! Packet type and frame encoding.
//!
//! A [`Packet`] is the decoded result of one wire frame: the packet ID plus
//! its payload. Uses `bytes::Bytes` for cheap payload sharing.

use bytes::Bytes;

/// Start-of-frame sentinel used by the platform firmware.
///
/// The decoder discards bytes until it sees this value, which is also how it
/// resynchronizes after line noise.
pub const DEFAULT_FRAME_HEADER: u8 = 19;

/// A validated `(packet ID, payload)` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    id: u8,
    payload: Bytes,
}

impl Packet {
    /// Create a packet from an ID and payload.
    pub fn new(id: u8, payload: Bytes) -> Self {
        Self { id, payload }
    }

    /// Create a packet from an ID and raw bytes (copies data).
    pub fn from_parts(id: u8, payload: &[u8]) -> Self {
        Self {
            id,
            payload: Bytes::copy_from_slice(payload),
        }
    }

    /// The packet ID identifying the payload shape.
    #[inline]
    pub fn id(&self) -> u8 {
        self.id
    }

    /// The payload bytes.
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// A cheap clone of the payload as `Bytes`.
    #[inline]
    pub fn payload_bytes(&self) -> Bytes {
        self.payload.clone()
    }

    /// Payload length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Whether the payload is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

/// Compute the checksum trailer for the given frame bytes.
///
/// Returns the byte that makes the sum of `bytes` plus the trailer
/// congruent to 0 modulo 256.
pub fn checksum(bytes: &[u8]) -> u8 {
    let sum = bytes.iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
    sum.wrapping_neg()
}

/// Encode a complete frame: `[header][length][packetID][payload][checksum]`.
///
/// The payload must fit the one-byte length field (at most 255 bytes).
pub fn encode_frame(header: u8, id: u8, payload: &[u8]) -> Vec<u8> {
    debug_assert!(payload.len() <= u8::MAX as usize);
    let mut buf = Vec::with_capacity(4 + payload.len());
    buf.push(header);
    buf.push(payload.len() as u8);
    buf.push(id);
    buf.extend_from_slice(payload);
    buf.push(checksum(&buf));
    buf
}
