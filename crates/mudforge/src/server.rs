//! `MudServer` builder and server loop.
//!
//! This is the entry point for running a Mudforge server. It ties the
//! layers together:
//!
//! ```text
//!  accept loop ──→ per connection: reader task ──┐
//!                                 writer task ←─┐│ TransportEvent
//!                                               ││
//!                  ChannelSink (Outbound) ──────┘▼
//!                                        world actor (GameWorld)
//! ```
//!
//! The world actor is the only task that touches the [`GameWorld`].
//! Reader tasks turn socket activity into [`TransportEvent`]s on one
//! channel; the world answers through the [`ChannelSink`], whose
//! per-connection queues the writer tasks drain.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use mudforge_session::CredentialStore;
use mudforge_transport::{
    ChannelSink, Connection, ConnectionId, Outbound, TcpLineConnection, TcpLineTransport,
    Transport, TransportError, TransportEvent,
};
use tokio::sync::mpsc;

use crate::{GameWorld, MudError, ServerConfig};

/// Builder for configuring and starting a Mudforge server.
///
/// # Example
///
/// ```rust,no_run
/// use mudforge::prelude::*;
///
/// # async fn start() -> Result<(), MudError> {
/// let accounts = InMemoryCredentials::new().with_account("Celidur", "password");
/// let server = MudServerBuilder::new()
///     .bind("0.0.0.0:3333")
///     .build(accounts)
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct MudServerBuilder {
    config: ServerConfig,
}

impl MudServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
        }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Sets how long a connection may stay silent before it is closed.
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.idle_timeout = timeout;
        self
    }

    /// Sets the longest line a client may send before it is dropped.
    pub fn max_line_len(mut self, max_line_len: usize) -> Self {
        self.config.max_line_len = max_line_len;
        self
    }

    /// Binds the listener. Accounts are checked against `credentials`.
    pub async fn build<C: CredentialStore>(self, credentials: C) -> Result<MudServer<C>, MudError> {
        let transport = TcpLineTransport::bind(&self.config.bind_addr)
            .await?
            .with_max_line_len(self.config.max_line_len);

        Ok(MudServer {
            transport,
            config: self.config,
            credentials: Arc::new(credentials),
        })
    }
}

impl Default for MudServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Mudforge server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct MudServer<C> {
    transport: TcpLineTransport,
    config: ServerConfig,
    credentials: Arc<C>,
}

impl<C: CredentialStore> MudServer<C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the server accept loop.
    ///
    /// Starts the world actor, then accepts connections and spawns a
    /// reader and a writer task for each. Runs until the process is
    /// terminated or the world actor stops.
    pub async fn run(mut self) -> Result<(), MudError> {
        let sink = ChannelSink::new();
        let events = spawn_world(GameWorld::new(Arc::new(sink.clone()), self.credentials));

        tracing::info!(
            addr = %self.config.bind_addr,
            idle_timeout_secs = self.config.idle_timeout.as_secs(),
            "Mudforge server running"
        );

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let id = conn.id();
                    // Registered before the world hears of the connection,
                    // so the first prompt has somewhere to go.
                    let outbound = sink.register(id);
                    if events.send(TransportEvent::Accepted(id)).is_err() {
                        sink.forget(id);
                        return Err(TransportError::Shutdown.into());
                    }
                    spawn_connection(
                        Arc::new(conn),
                        outbound,
                        events.clone(),
                        sink.clone(),
                        self.config.idle_timeout,
                    );
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}

/// Spawns the world actor and returns the channel that feeds it.
///
/// The actor applies events one at a time, in arrival order, until every
/// sender is gone; then it detaches the systems and stops.
pub fn spawn_world(mut game: GameWorld) -> mpsc::UnboundedSender<TransportEvent> {
    let (tx, mut rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        tracing::info!("world actor started");
        while let Some(event) = rx.recv().await {
            game.handle(event);
        }
        game.shutdown();
        tracing::info!("world actor stopped");
    });

    tx
}

/// Spawns the reader and writer tasks for one connection.
fn spawn_connection(
    conn: Arc<TcpLineConnection>,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
    events: mpsc::UnboundedSender<TransportEvent>,
    sink: ChannelSink,
    idle_timeout: Duration,
) {
    let id = conn.id();
    tracing::debug!(%id, peer = %conn.peer_addr(), "connection started");

    let writer = Arc::clone(&conn);
    tokio::spawn(async move {
        while let Some(message) = outbound.recv().await {
            match message {
                Outbound::Data(bytes) => {
                    if let Err(e) = writer.send(&bytes).await {
                        tracing::debug!(%id, error = %e, "write failed");
                        break;
                    }
                }
                Outbound::Close => {
                    if let Err(e) = writer.close().await {
                        tracing::debug!(%id, error = %e, "close failed");
                    }
                    break;
                }
            }
        }
    });

    tokio::spawn(async move {
        // After a timeout the world still has a notice to write, and its
        // half-close unregisters the connection itself.
        if !read_lines(&conn, id, &events, idle_timeout).await {
            sink.forget(id);
        }
    });
}

/// Forwards lines from `conn` until it closes or goes idle. Returns
/// `true` if it went idle.
async fn read_lines(
    conn: &TcpLineConnection,
    id: ConnectionId,
    events: &mpsc::UnboundedSender<TransportEvent>,
    idle_timeout: Duration,
) -> bool {
    loop {
        let event = match tokio::time::timeout(idle_timeout, conn.recv_line()).await {
            Ok(Ok(Some(line))) => TransportEvent::Line(id, line),
            Ok(Ok(None)) => {
                let _ = events.send(TransportEvent::Closed {
                    conn: id,
                    had_error: false,
                });
                return false;
            }
            Ok(Err(e @ TransportError::LineTooLong { .. })) => {
                tracing::warn!(%id, error = %e, "dropping connection");
                let _ = events.send(TransportEvent::Closed {
                    conn: id,
                    had_error: true,
                });
                return false;
            }
            Ok(Err(e)) => {
                tracing::debug!(%id, error = %e, "read failed");
                let _ = events.send(TransportEvent::Closed {
                    conn: id,
                    had_error: true,
                });
                return false;
            }
            Err(_) => {
                let _ = events.send(TransportEvent::TimedOut(id));
                return true;
            }
        };

        if events.send(event).is_err() {
            return false;
        }
    }
}
