//! Transport abstraction layer for Mudforge.
//!
//! The game core never touches sockets. It sees the network through two
//! narrow seams defined here:
//!
//! - **Inbound**: [`TransportEvent`]: "a connection arrived", "a line
//!   arrived", "the connection closed", "the connection went idle".
//! - **Outbound**: [`ConnectionSink`]: "write these bytes" and
//!   "half-close this connection".
//!
//! The async [`Transport`] and [`Connection`] traits describe the socket
//! side of those seams; [`TcpLineTransport`] implements them for plain
//! newline-delimited TCP (telnet-style clients).
//!
//! # Feature Flags
//!
//! - `tcp` (default): TCP line transport via `tokio::net`

#![allow(async_fn_in_trait)]

mod error;
mod sink;
#[cfg(feature = "tcp")]
mod tcp;

pub use error::TransportError;
pub use sink::{ChannelSink, ConnectionSink, Outbound};
#[cfg(feature = "tcp")]
pub use tcp::{DEFAULT_MAX_LINE_LEN, TcpLineConnection, TcpLineTransport};

use std::fmt;

/// Opaque identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Something that happened on the network, reported to the game core.
///
/// These are the only entry points that drive the core. Each one is
/// handled to completion before the next is looked at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// A new client connected.
    Accepted(ConnectionId),

    /// A full line arrived (terminator already removed, raw bytes).
    Line(ConnectionId, Vec<u8>),

    /// The connection closed. `had_error` is set when it ended because
    /// of an I/O error rather than a clean EOF.
    Closed {
        /// The connection that closed.
        conn: ConnectionId,
        /// Whether the close was caused by an error.
        had_error: bool,
    },

    /// Nothing arrived on the connection for the configured idle period.
    TimedOut(ConnectionId),
}

/// Accepts new incoming connections.
pub trait Transport: Send + Sync + 'static {
    /// The connection type produced by this transport.
    type Connection: Connection;
    /// The error type for transport operations.
    type Error: std::error::Error + Send + Sync;

    /// Waits for and accepts the next incoming connection.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error>;
}

/// A single line-oriented connection.
pub trait Connection: Send + Sync + 'static {
    /// The error type for connection operations.
    type Error: std::error::Error + Send + Sync;

    /// Sends data to the remote peer.
    async fn send(&self, data: &[u8]) -> Result<(), Self::Error>;

    /// Receives the next line from the remote peer, without its `\n`.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed. A line
    /// longer than the transport allows is an error.
    async fn recv_line(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Half-closes the connection: no more data will be sent, but the
    /// peer may still be read from until it closes its side.
    async fn close(&self) -> Result<(), Self::Error>;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}
