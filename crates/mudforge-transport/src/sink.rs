//! The outbound seam: how the game core writes to and closes connections.
//!
//! The game core runs synchronously and must never wait on a socket. So
//! instead of holding connections, it holds a [`ConnectionSink`] and fires
//! requests at it. [`ChannelSink`] is the production implementation: each
//! connection gets an unbounded mpsc channel, and a writer task on the
//! other end does the actual (async) I/O.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;

use crate::{ConnectionId, TransportError};

/// Write/close requests the game core can make of the transport layer.
///
/// Both calls are fire-and-forget: they queue the request and return
/// immediately. An `Err` means the connection is already gone, which
/// callers treat as a warning, not a failure.
pub trait ConnectionSink: Send + Sync + 'static {
    /// Queues `data` to be written to `conn`.
    fn write(&self, conn: ConnectionId, data: &[u8]) -> Result<(), TransportError>;

    /// Queues a half-close of `conn`. Anything written before this call
    /// is still delivered first.
    fn half_close(&self, conn: ConnectionId) -> Result<(), TransportError>;
}

/// A request for a connection's writer task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// Bytes to write.
    Data(Vec<u8>),
    /// Shut down the write side; the writer task stops after this.
    Close,
}

/// A [`ConnectionSink`] that forwards requests over per-connection
/// channels.
///
/// Cloning is cheap (it's an `Arc`), so the accept loop and the world
/// actor can share one.
#[derive(Debug, Clone, Default)]
pub struct ChannelSink {
    writers: Arc<Mutex<HashMap<ConnectionId, mpsc::UnboundedSender<Outbound>>>>,
}

impl ChannelSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a connection and returns the receiving end its writer
    /// task should drain.
    pub fn register(&self, conn: ConnectionId) -> mpsc::UnboundedReceiver<Outbound> {
        let (tx, rx) = mpsc::unbounded_channel();
        if self.writers().insert(conn, tx).is_some() {
            tracing::warn!(%conn, "replaced an existing outbound channel");
        }
        rx
    }

    /// Drops the outbound channel for `conn`, which ends its writer task.
    ///
    /// Returns `false` if the connection was not registered.
    pub fn forget(&self, conn: ConnectionId) -> bool {
        self.writers().remove(&conn).is_some()
    }

    /// Number of connections with a live outbound channel.
    pub fn len(&self) -> usize {
        self.writers().len()
    }

    /// Returns `true` if no connection is registered.
    pub fn is_empty(&self) -> bool {
        self.writers().is_empty()
    }

    fn writers(&self) -> MutexGuard<'_, HashMap<ConnectionId, mpsc::UnboundedSender<Outbound>>> {
        self.writers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ConnectionSink for ChannelSink {
    fn write(&self, conn: ConnectionId, data: &[u8]) -> Result<(), TransportError> {
        let writers = self.writers();
        let tx = writers
            .get(&conn)
            .ok_or(TransportError::UnknownConnection(conn))?;
        tx.send(Outbound::Data(data.to_vec()))
            .map_err(|_| TransportError::ConnectionClosed(conn.to_string()))
    }

    fn half_close(&self, conn: ConnectionId) -> Result<(), TransportError> {
        // Removing the sender means nothing else can be queued after the
        // close request.
        let tx = self
            .writers()
            .remove(&conn)
            .ok_or(TransportError::UnknownConnection(conn))?;
        tx.send(Outbound::Close)
            .map_err(|_| TransportError::ConnectionClosed(conn.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cid(id: u64) -> ConnectionId {
        ConnectionId::new(id)
    }

    #[test]
    fn test_write_registered_connection_queues_data() {
        let sink = ChannelSink::new();
        let mut rx = sink.register(cid(1));

        sink.write(cid(1), b"hello\n").expect("should queue");

        assert_eq!(rx.try_recv().unwrap(), Outbound::Data(b"hello\n".to_vec()));
    }

    #[test]
    fn test_write_unknown_connection_returns_error() {
        let sink = ChannelSink::new();

        let result = sink.write(cid(9), b"hello");

        assert!(matches!(
            result,
            Err(TransportError::UnknownConnection(c)) if c == cid(9)
        ));
    }

    #[test]
    fn test_half_close_delivers_after_pending_data_and_unregisters() {
        let sink = ChannelSink::new();
        let mut rx = sink.register(cid(1));
        sink.write(cid(1), b"bye\n").unwrap();

        sink.half_close(cid(1)).expect("should queue close");

        assert_eq!(rx.try_recv().unwrap(), Outbound::Data(b"bye\n".to_vec()));
        assert_eq!(rx.try_recv().unwrap(), Outbound::Close);
        assert!(sink.is_empty());
        // Nothing can be written once the close is queued.
        assert!(sink.write(cid(1), b"late").is_err());
    }

    #[test]
    fn test_write_after_receiver_dropped_returns_closed() {
        let sink = ChannelSink::new();
        let rx = sink.register(cid(1));
        drop(rx);

        let result = sink.write(cid(1), b"hello");

        assert!(matches!(result, Err(TransportError::ConnectionClosed(_))));
    }

    #[test]
    fn test_forget_removes_registration() {
        let sink = ChannelSink::new();
        let _rx = sink.register(cid(1));
        assert_eq!(sink.len(), 1);

        assert!(sink.forget(cid(1)));
        assert!(!sink.forget(cid(1)));
        assert!(sink.is_empty());
    }
}
