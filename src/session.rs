//! Transport session: connection lifecycle and the background read loop.
//!
//! A [`Session`] owns one serial link. `connect` opens the device and spawns
//! a reader task that pumps arriving bytes through the frame decoder; every
//! accepted frame is recorded into the data store and signaled before the
//! next byte is processed. `disconnect` asks the reader task to stop and
//! waits for it to finish, so no packet notification can fire after it
//! returns.
//!
//! Exactly two threads of control touch a session: the owning task
//! (`connect`/`disconnect`/`send`, enforced by `&mut self`) and the one
//! reader task the session spawns. The decoder is owned by the reader task
//! alone and needs no locking.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{oneshot, Notify};
use tokio::task::JoinHandle;

use crate::error::{LinkError, Result};
use crate::protocol::{FrameDecoder, Step, DEFAULT_FRAME_HEADER};
use crate::store::SensorStore;
use crate::transport;

/// Read buffer size for the reader task.
const READ_CHUNK: usize = 256;

/// Callback invoked by the reader task once per accepted frame.
///
/// Runs on the reader task itself: implementations must be fast and
/// non-blocking, or hand the work off through a channel. Heavy work here
/// delays frame processing.
pub type PacketNotify = Box<dyn FnMut() + Send>;

/// Counters mirrored out of the reader task.
#[derive(Debug, Default)]
struct LinkStats {
    accepted: AtomicU64,
    corrupted: AtomicU64,
}

/// Packet-ready signal: a mutex-guarded flag paired with a notifier.
///
/// Waiters re-check the flag after every wake; a wake that finds the flag
/// clear is treated as spurious and the wait resumes.
#[derive(Default)]
struct PacketGate {
    ready: Mutex<bool>,
    notify: Notify,
}

impl PacketGate {
    fn signal(&self) {
        if let Ok(mut ready) = self.ready.lock() {
            *ready = true;
        }
        self.notify.notify_one();
    }

    async fn wait(&self) {
        loop {
            let notified = self.notify.notified();
            if let Ok(mut ready) = self.ready.lock() {
                if *ready {
                    *ready = false;
                    return;
                }
            }
            notified.await;
        }
    }
}

/// Live connection state; exists only between connect and disconnect.
struct Connection {
    writer: Box<dyn AsyncWrite + Send + Unpin>,
    stop: oneshot::Sender<()>,
    reader: JoinHandle<()>,
    connected: Arc<AtomicBool>,
}

/// Everything the reader task owns or shares.
struct Reader {
    decoder: FrameDecoder,
    store: Arc<dyn SensorStore>,
    gate: Arc<PacketGate>,
    stats: Arc<LinkStats>,
    notify: Option<PacketNotify>,
    connected: Arc<AtomicBool>,
}

/// Manages one serial link to the robot platform.
///
/// Construct with a data store, connect to a device, and either register a
/// notify callback or block on [`wait_for_packet`](Session::wait_for_packet)
/// to learn when decoded fields have landed in the store.
pub struct Session {
    store: Arc<dyn SensorStore>,
    header: u8,
    stats: Arc<LinkStats>,
    gate: Arc<PacketGate>,
    conn: Option<Connection>,
}

impl Session {
    /// Create a session that records packets into `store`, framed by the
    /// platform's default header byte.
    pub fn new(store: Arc<dyn SensorStore>) -> Self {
        Self::with_header(store, DEFAULT_FRAME_HEADER)
    }

    /// Create a session with a custom start-of-frame byte.
    pub fn with_header(store: Arc<dyn SensorStore>, header: u8) -> Self {
        Self {
            store,
            header,
            stats: Arc::new(LinkStats::default()),
            gate: Arc::new(PacketGate::default()),
            conn: None,
        }
    }

    /// Open the serial device and start reading.
    ///
    /// `notify`, if supplied, is invoked once per accepted frame; without it,
    /// callers use [`wait_for_packet`](Session::wait_for_packet) instead.
    /// Fails with [`LinkError::AlreadyConnected`] if a live connection
    /// exists, leaving that connection untouched; an open failure leaves the
    /// session disconnected.
    pub async fn connect(
        &mut self,
        path: &str,
        baud: u32,
        notify: Option<PacketNotify>,
    ) -> Result<()> {
        if self.connected() {
            return Err(LinkError::AlreadyConnected);
        }
        let stream = transport::open(path, baud)?;
        tracing::debug!("serial device {} open at {} baud", path, baud);
        self.attach(stream, notify).await
    }

    /// Drive the session over an already-open byte stream.
    ///
    /// This is the transport-agnostic half of [`connect`](Session::connect):
    /// serial hardware, a TCP bridge exposing a UART, or an in-memory duplex
    /// in tests all behave the same way.
    pub async fn attach<T>(&mut self, stream: T, notify: Option<PacketNotify>) -> Result<()>
    where
        T: AsyncRead + AsyncWrite + Send + 'static,
    {
        if self.connected() {
            return Err(LinkError::AlreadyConnected);
        }
        // A previous link that died on its own still holds a finished task;
        // reap it before starting over.
        if let Some(old) = self.conn.take() {
            drop(old.stop);
            let _ = old.reader.await;
        }

        let (read_half, write_half) = tokio::io::split(stream);
        let (stop_tx, stop_rx) = oneshot::channel();
        let connected = Arc::new(AtomicBool::new(true));

        let reader = Reader {
            decoder: FrameDecoder::new(self.header),
            store: self.store.clone(),
            gate: self.gate.clone(),
            stats: self.stats.clone(),
            notify,
            connected: connected.clone(),
        };
        let task = tokio::spawn(read_loop(read_half, stop_rx, reader));

        self.conn = Some(Connection {
            writer: Box::new(write_half),
            stop: stop_tx,
            reader: task,
            connected,
        });
        Ok(())
    }

    /// Stop reading and close the device.
    ///
    /// Waits for the reader task to finish before returning: once this
    /// resolves, no packet notification will ever fire again, even for bytes
    /// that were already buffered. Idempotent; safe to call when not
    /// connected.
    pub async fn disconnect(&mut self) {
        if let Some(conn) = self.conn.take() {
            let _ = conn.stop.send(());
            if let Err(e) = conn.reader.await {
                tracing::error!("reader task join failed: {}", e);
            }
            conn.connected.store(false, Ordering::Release);
            tracing::debug!("session disconnected");
        }
    }

    /// Whether the underlying link is currently live.
    ///
    /// Turns false after [`disconnect`](Session::disconnect) and after a
    /// fatal read error or end-of-stream. The session never reconnects on
    /// its own; call [`connect`](Session::connect) again to recover.
    pub fn connected(&self) -> bool {
        self.conn
            .as_ref()
            .map(|conn| conn.connected.load(Ordering::Acquire))
            .unwrap_or(false)
    }

    /// Write raw bytes to the device.
    ///
    /// A short or failed write surfaces as an error and the caller may not
    /// assume any of the bytes were delivered.
    pub async fn send(&mut self, bytes: &[u8]) -> Result<()> {
        let conn = self.conn.as_mut().ok_or(LinkError::NotConnected)?;
        if !conn.connected.load(Ordering::Acquire) {
            return Err(LinkError::NotConnected);
        }
        conn.writer.write_all(bytes).await?;
        conn.writer.flush().await?;
        Ok(())
    }

    /// Send a single command opcode byte.
    pub async fn send_opcode(&mut self, opcode: u8) -> Result<()> {
        self.send(&[opcode]).await
    }

    /// Wait until the next frame has been accepted and recorded.
    ///
    /// The blocking alternative to the connect-time callback. Note this
    /// pends indefinitely while no packets arrive; pair it with
    /// `tokio::time::timeout` when the link may go quiet.
    pub async fn wait_for_packet(&self) {
        self.gate.wait().await;
    }

    /// Total frames accepted over the life of this session.
    pub fn packets_accepted(&self) -> u64 {
        self.stats.accepted.load(Ordering::Relaxed)
    }

    /// Total frames rejected by checksum over the life of this session.
    pub fn packets_corrupted(&self) -> u64 {
        self.stats.corrupted.load(Ordering::Relaxed)
    }
}

impl Drop for Session {
    // Dropping signals the reader task to stop and releases the device, but
    // cannot wait for the task; only an explicit `disconnect().await` gives
    // the no-callback-after-return guarantee.
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            conn.connected.store(false, Ordering::Release);
        }
    }
}

/// Main read loop - pulls bytes off the device and drives the decoder.
async fn read_loop<R>(mut source: R, mut stop: oneshot::Receiver<()>, mut state: Reader)
where
    R: AsyncRead + Unpin,
{
    let mut buf = [0u8; READ_CHUNK];
    let mut first_read = true;

    loop {
        let n = tokio::select! {
            biased;

            // Once disconnect is requested, never pick up another read.
            _ = &mut stop => break,

            result = source.read(&mut buf) => match result {
                Ok(n) => n,
                Err(e) => {
                    tracing::error!("read loop I/O error: {}", e);
                    break;
                }
            },
        };

        if n == 0 {
            // Some transports report an empty completion right after the
            // device opens; anything after that means end-of-stream.
            if first_read {
                first_read = false;
                continue;
            }
            tracing::debug!("byte stream ended");
            break;
        }
        first_read = false;

        for &byte in &buf[..n] {
            match state.decoder.feed(byte) {
                Step::Complete(packet) => {
                    state.store.record_packet(packet.id(), packet.payload());
                    state.stats.accepted.fetch_add(1, Ordering::Relaxed);
                    state.gate.signal();
                    if let Some(notify) = state.notify.as_mut() {
                        notify();
                    }
                }
                Step::Corrupt => {
                    state.stats.corrupted.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!(
                        "discarded corrupt frame ({} total)",
                        state.decoder.packets_corrupted()
                    );
                }
                Step::Pending => {}
            }
        }
    }

    state.connected.store(false, Ordering::Release);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_gate_signal_before_wait() {
        let gate = PacketGate::default();
        gate.signal();
        // Flag already set: the wait returns without a fresh notification.
        gate.wait().await;
    }

    #[tokio::test]
    async fn test_gate_wakes_waiter() {
        let gate = Arc::new(PacketGate::default());
        let waiter = {
            let gate = gate.clone();
            tokio::spawn(async move { gate.wait().await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        gate.signal();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter timed out")
            .expect("waiter panicked");
    }

    #[tokio::test]
    async fn test_gate_consumes_flag() {
        let gate = PacketGate::default();
        gate.signal();
        gate.wait().await;
        // Flag is consumed: a second wait must pend until signaled again.
        let second = tokio::time::timeout(Duration::from_millis(50), gate.wait()).await;
        assert!(second.is_err());
    }
}
