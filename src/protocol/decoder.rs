//! Frame decoding state machine.
//!
//! Consumes a raw byte stream and produces validated [`Packet`]s, discarding
//! corrupted sequences. The decoder owns no I/O and never blocks; the
//! transport session drives it with whatever bytes the device delivers.
//! Feeding bytes one at a time or in bursts produces identical outcomes -
//! there is no buffering beyond the frame currently in flight.

use bytes::{BufMut, BytesMut};

use super::packet::Packet;

/// Parsing state. Exactly one frame is in flight at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Discarding bytes until one matches the frame header.
    WaitingForHeader,
    /// Next byte is the payload length.
    WaitingForLength,
    /// Next byte is the packet ID.
    WaitingForId,
    /// Accumulating payload bytes.
    WaitingForPayload,
    /// Next byte is the checksum trailer.
    WaitingForChecksum,
}

/// Outcome of feeding one byte to the decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Byte consumed; no frame completed yet.
    Pending,
    /// A frame completed and passed its checksum.
    Complete(Packet),
    /// A frame completed but failed its checksum and was discarded.
    Corrupt,
}

/// Byte-by-byte decoder for the platform's framed serial protocol.
///
/// A checksum mismatch is an expected condition on a noisy link, not an
/// error: the frame is discarded, the corruption counter is bumped, and the
/// decoder goes back to hunting for the next header byte. Packet IDs are not
/// validated here; deciding what an ID means is the data store's concern.
pub struct FrameDecoder {
    header: u8,
    state: State,
    packet_id: u8,
    expected_len: u8,
    payload: BytesMut,
    sum: u32,
    accepted: u64,
    corrupted: u64,
}

impl FrameDecoder {
    /// Create a decoder hunting for the given header byte.
    pub fn new(header: u8) -> Self {
        Self {
            header,
            state: State::WaitingForHeader,
            packet_id: 0,
            expected_len: 0,
            payload: BytesMut::with_capacity(usize::from(u8::MAX)),
            sum: 0,
            accepted: 0,
            corrupted: 0,
        }
    }

    /// Feed a single byte and advance the state machine.
    pub fn feed(&mut self, byte: u8) -> Step {
        match self.state {
            State::WaitingForHeader => {
                if byte == self.header {
                    self.sum = u32::from(byte);
                    self.payload.clear();
                    self.state = State::WaitingForLength;
                }
                Step::Pending
            }
            State::WaitingForLength => {
                self.expected_len = byte;
                self.sum += u32::from(byte);
                self.state = State::WaitingForId;
                Step::Pending
            }
            State::WaitingForId => {
                self.packet_id = byte;
                self.sum += u32::from(byte);
                self.state = if self.expected_len == 0 {
                    State::WaitingForChecksum
                } else {
                    State::WaitingForPayload
                };
                Step::Pending
            }
            State::WaitingForPayload => {
                self.payload.put_u8(byte);
                self.sum += u32::from(byte);
                if self.payload.len() == usize::from(self.expected_len) {
                    self.state = State::WaitingForChecksum;
                }
                Step::Pending
            }
            State::WaitingForChecksum => {
                self.sum += u32::from(byte);
                self.state = State::WaitingForHeader;
                if self.sum % 256 == 0 {
                    self.accepted += 1;
                    Step::Complete(Packet::new(self.packet_id, self.payload.split().freeze()))
                } else {
                    self.corrupted += 1;
                    Step::Corrupt
                }
            }
        }
    }

    /// Feed a burst of bytes, collecting every accepted frame.
    ///
    /// Equivalent to calling [`feed`](Self::feed) once per byte; rejected
    /// frames show up only in [`packets_corrupted`](Self::packets_corrupted).
    pub fn push(&mut self, data: &[u8]) -> Vec<Packet> {
        let mut packets = Vec::new();
        for &byte in data {
            if let Step::Complete(packet) = self.feed(byte) {
                packets.push(packet);
            }
        }
        packets
    }

    /// Discard any in-flight frame and hunt for the next header.
    ///
    /// Counters are preserved.
    pub fn reset(&mut self) {
        self.state = State::WaitingForHeader;
        self.payload.clear();
    }

    /// Frames accepted since construction. Monotonic, never reset.
    pub fn packets_accepted(&self) -> u64 {
        self.accepted
    }

    /// Frames rejected by checksum since construction. Monotonic, never reset.
    pub fn packets_corrupted(&self) -> u64 {
        self.corrupted
    }
}

#[cfg(test)]
mod tests {
    use super::super::packet::{encode_frame, DEFAULT_FRAME_HEADER};
    use super::*;

    /// Feed a byte slice one byte at a time, collecting accepted frames.
    fn feed_all(decoder: &mut FrameDecoder, bytes: &[u8]) -> Vec<Packet> {
        let mut packets = Vec::new();
        for &byte in bytes {
            if let Step::Complete(packet) = decoder.feed(byte) {
                packets.push(packet);
            }
        }
        packets
    }

    #[test]
    fn test_round_trip_single_frame() {
        let mut decoder = FrameDecoder::new(DEFAULT_FRAME_HEADER);
        let bytes = encode_frame(DEFAULT_FRAME_HEADER, 33, b"wheel encoder");

        let packets = feed_all(&mut decoder, &bytes);

        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].id(), 33);
        assert_eq!(packets[0].payload(), b"wheel encoder");
        assert_eq!(decoder.packets_accepted(), 1);
        assert_eq!(decoder.packets_corrupted(), 0);
    }

    #[test]
    fn test_known_good_frame_bytes() {
        // header 19, id 7, payload [1, 2, 3]: checksum must be 221.
        let mut decoder = FrameDecoder::new(19);
        let packets = feed_all(&mut decoder, &[19, 3, 7, 1, 2, 3, 221]);

        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].id(), 7);
        assert_eq!(packets[0].payload(), &[1, 2, 3]);
        assert_eq!(decoder.packets_accepted(), 1);
        assert_eq!(decoder.packets_corrupted(), 0);

        // Same frame with the checksum off by one is rejected.
        let packets = feed_all(&mut decoder, &[19, 3, 7, 1, 2, 3, 222]);
        assert!(packets.is_empty());
        assert_eq!(decoder.packets_accepted(), 1);
        assert_eq!(decoder.packets_corrupted(), 1);
    }

    #[test]
    fn test_zero_length_payload() {
        let mut decoder = FrameDecoder::new(DEFAULT_FRAME_HEADER);
        let bytes = encode_frame(DEFAULT_FRAME_HEADER, 14, &[]);

        let packets = feed_all(&mut decoder, &bytes);

        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].id(), 14);
        assert!(packets[0].is_empty());
    }

    #[test]
    fn test_garbage_prefix_ignored() {
        let mut decoder = FrameDecoder::new(DEFAULT_FRAME_HEADER);
        let mut bytes = vec![0x00, 0xFF, 0x42, 0x18, 0x14];
        bytes.extend(encode_frame(DEFAULT_FRAME_HEADER, 7, &[1, 2, 3]));

        let packets = feed_all(&mut decoder, &bytes);

        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].id(), 7);
        assert_eq!(decoder.packets_corrupted(), 0);
    }

    #[test]
    fn test_payload_flip_rejected_then_next_frame_accepted() {
        let mut decoder = FrameDecoder::new(DEFAULT_FRAME_HEADER);
        let mut corrupted = encode_frame(DEFAULT_FRAME_HEADER, 7, &[1, 2, 3]);
        corrupted[4] ^= 0x10; // flip a payload byte
        let mut bytes = corrupted;
        bytes.extend(encode_frame(DEFAULT_FRAME_HEADER, 8, &[9, 9]));

        let packets = feed_all(&mut decoder, &bytes);

        assert_eq!(decoder.packets_corrupted(), 1);
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].id(), 8);
        assert_eq!(packets[0].payload(), &[9, 9]);
    }

    #[test]
    fn test_checksum_flip_rejected_then_next_frame_accepted() {
        let mut decoder = FrameDecoder::new(DEFAULT_FRAME_HEADER);
        let mut corrupted = encode_frame(DEFAULT_FRAME_HEADER, 7, &[1, 2, 3]);
        let last = corrupted.len() - 1;
        corrupted[last] = corrupted[last].wrapping_add(1);
        let mut bytes = corrupted;
        bytes.extend(encode_frame(DEFAULT_FRAME_HEADER, 7, &[1, 2, 3]));

        let packets = feed_all(&mut decoder, &bytes);

        assert_eq!(decoder.packets_corrupted(), 1);
        assert_eq!(decoder.packets_accepted(), 1);
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].payload(), &[1, 2, 3]);
    }

    #[test]
    fn test_header_byte_inside_payload() {
        // The decoder is mid-frame when the header value shows up as data;
        // it must not restart on it.
        let mut decoder = FrameDecoder::new(DEFAULT_FRAME_HEADER);
        let payload = [DEFAULT_FRAME_HEADER, 0, DEFAULT_FRAME_HEADER];
        let bytes = encode_frame(DEFAULT_FRAME_HEADER, 21, &payload);

        let packets = feed_all(&mut decoder, &bytes);

        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].payload(), &payload);
    }

    #[test]
    fn test_byte_at_a_time_matches_bursts() {
        let mut stream = vec![0xDE, 0xAD]; // leading garbage
        stream.extend(encode_frame(DEFAULT_FRAME_HEADER, 7, &[1, 2, 3]));
        let mut bad = encode_frame(DEFAULT_FRAME_HEADER, 8, &[4, 5]);
        let last = bad.len() - 1;
        bad[last] ^= 0xFF;
        stream.extend(bad);
        stream.extend(encode_frame(DEFAULT_FRAME_HEADER, 9, &[]));
        stream.extend(encode_frame(DEFAULT_FRAME_HEADER, 10, &[6; 40]));

        let mut bytewise = FrameDecoder::new(DEFAULT_FRAME_HEADER);
        let expected = feed_all(&mut bytewise, &stream);

        for chunk_size in [1usize, 2, 3, 5, 16, stream.len()] {
            let mut decoder = FrameDecoder::new(DEFAULT_FRAME_HEADER);
            let mut packets = Vec::new();
            for chunk in stream.chunks(chunk_size) {
                packets.extend(decoder.push(chunk));
            }
            assert_eq!(packets, expected, "chunk size {}", chunk_size);
            assert_eq!(decoder.packets_accepted(), bytewise.packets_accepted());
            assert_eq!(decoder.packets_corrupted(), bytewise.packets_corrupted());
        }
    }

    #[test]
    fn test_custom_header_value() {
        let mut decoder = FrameDecoder::new(0x7E);
        let bytes = encode_frame(0x7E, 3, &[0xAB]);

        let packets = feed_all(&mut decoder, &bytes);

        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].id(), 3);
    }

    #[test]
    fn test_unknown_id_still_accepted() {
        // ID validation belongs to the data store, not the framing layer.
        let mut decoder = FrameDecoder::new(DEFAULT_FRAME_HEADER);
        let bytes = encode_frame(DEFAULT_FRAME_HEADER, 0xFF, &[0]);

        let packets = feed_all(&mut decoder, &bytes);

        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].id(), 0xFF);
    }

    #[test]
    fn test_reset_discards_in_flight_frame() {
        let mut decoder = FrameDecoder::new(DEFAULT_FRAME_HEADER);
        let bytes = encode_frame(DEFAULT_FRAME_HEADER, 7, &[1, 2, 3]);

        // Feed half a frame, then abandon it.
        for &byte in &bytes[..4] {
            assert_eq!(decoder.feed(byte), Step::Pending);
        }
        decoder.reset();

        let packets = feed_all(&mut decoder, &bytes);
        assert_eq!(packets.len(), 1);
        assert_eq!(decoder.packets_accepted(), 1);
        assert_eq!(decoder.packets_corrupted(), 0);
    }

    #[test]
    fn test_incomplete_frame_yields_nothing() {
        // A frame that never completes just leaves the decoder mid-frame.
        let mut decoder = FrameDecoder::new(DEFAULT_FRAME_HEADER);
        let bytes = encode_frame(DEFAULT_FRAME_HEADER, 7, &[1, 2, 3]);

        let packets = feed_all(&mut decoder, &bytes[..bytes.len() - 1]);
        assert!(packets.is_empty());
        assert_eq!(decoder.packets_accepted(), 0);
        assert_eq!(decoder.packets_corrupted(), 0);
    }

    #[test]
    fn test_max_length_payload() {
        let payload = vec![0x5A; 255];
        let mut decoder = FrameDecoder::new(DEFAULT_FRAME_HEADER);
        let bytes = encode_frame(DEFAULT_FRAME_HEADER, 100, &payload);

        let packets = feed_all(&mut decoder, &bytes);

        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].len(), 255);
        assert_eq!(packets[0].payload(), payload.as_slice());
    }
}
