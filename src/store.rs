//! Data store seam for decoded packets.
//!
//! The session does not interpret payloads; it hands every accepted frame
//! to a [`SensorStore`]. Implementations own their thread-safety contract:
//! `record_packet` is only ever called from the session's reader task, but
//! applications typically read the store concurrently from other threads.

use std::collections::HashMap;
use std::sync::Mutex;

use bytes::Bytes;

/// Destination for decoded `(packet ID, payload)` events.
pub trait SensorStore: Send + Sync {
    /// Record the payload of an accepted frame.
    ///
    /// Called once per accepted frame, in arrival order, from the session's
    /// reader task. Implementations should return quickly; heavy work here
    /// stalls the read loop.
    fn record_packet(&self, id: u8, payload: &[u8]);
}

/// Keeps the latest payload seen for each packet ID.
#[derive(Debug, Default)]
pub struct LatestPacketStore {
    packets: Mutex<HashMap<u8, Bytes>>,
}

impl LatestPacketStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recent payload recorded for `id`, if any.
    pub fn get(&self, id: u8) -> Option<Bytes> {
        self.packets.lock().ok().and_then(|map| map.get(&id).cloned())
    }

    /// Number of distinct packet IDs seen so far.
    pub fn len(&self) -> usize {
        self.packets.lock().map(|map| map.len()).unwrap_or(0)
    }

    /// Whether any packet has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SensorStore for LatestPacketStore {
    fn record_packet(&self, id: u8, payload: &[u8]) {
        if let Ok(mut map) = self.packets.lock() {
            map.insert(id, Bytes::copy_from_slice(payload));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_get() {
        let store = LatestPacketStore::new();
        assert!(store.is_empty());

        store.record_packet(7, &[1, 2, 3]);
        assert_eq!(store.get(7).as_deref(), Some(&[1u8, 2, 3][..]));
        assert_eq!(store.get(8), None);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_latest_payload_wins() {
        let store = LatestPacketStore::new();
        store.record_packet(7, &[1]);
        store.record_packet(7, &[2]);

        assert_eq!(store.get(7).as_deref(), Some(&[2u8][..]));
        assert_eq!(store.len(), 1);
    }
}
