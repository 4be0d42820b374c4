//! # roverlink
//!
//! Serial packet transport for a mobile-robot platform.
//!
//! The platform streams sensor data as checksummed binary frames over an
//! asynchronous serial link and accepts raw command bytes in the other
//! direction. This crate reassembles that error-prone byte stream into
//! validated packets, records each one into a caller-supplied store, and
//! tells one interested party when a packet has fully arrived.
//!
//! ## Architecture
//!
//! - **Frame decoding** ([`protocol`]): a byte-by-byte state machine that
//!   finds frame boundaries, verifies checksums, and resynchronizes after
//!   corruption. Pure logic, no I/O.
//! - **Transport session** ([`Session`]): owns the serial connection, pumps
//!   arriving bytes through the decoder on a background task, and exposes
//!   the connect/disconnect/send lifecycle.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use roverlink::{LatestPacketStore, Session};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(LatestPacketStore::new());
//!     let mut session = Session::new(store.clone());
//!
//!     session
//!         .connect("/dev/ttyUSB0", roverlink::transport::DEFAULT_BAUD, None)
//!         .await?;
//!
//!     session.wait_for_packet().await;
//!     println!("{} packets accepted", session.packets_accepted());
//!
//!     session.disconnect().await;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod protocol;
pub mod store;
pub mod transport;
pub mod util;

mod session;

pub use error::LinkError;
pub use protocol::{FrameDecoder, Packet, Step, DEFAULT_FRAME_HEADER};
pub use session::{PacketNotify, Session};
pub use store::{LatestPacketStore, SensorStore};
