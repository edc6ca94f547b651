//! # Mudforge
//!
//! The session core of a text MUD server.
//!
//! Each connection becomes an entity in an ECS [`World`]. Three systems
//! attached to that world carry a player from a raw TCP line to a seat
//! in the game:
//!
//! - [`NetworkSystem`]: binds connections to entities and moves them
//!   between entities on reconnection
//! - [`LoginSystem`]: the username/password handshake
//! - [`SessionRouter`]: in-world commands, the username directory, and
//!   releasing entities on `quit`
//!
//! [`GameWorld`] assembles them; [`MudServer`] runs one on a tokio
//! runtime behind a TCP listener.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mudforge::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), MudError> {
//!     mudforge::init_tracing("info");
//!
//!     let accounts = InMemoryCredentials::new().with_account("Celidur", "password");
//!     let server = MudServerBuilder::new()
//!         .config(ServerConfig::from_env()?)
//!         .build(accounts)
//!         .await?;
//!     server.run().await
//! }
//! ```

mod config;
mod error;
mod game;
pub mod network;
mod server;
mod telemetry;

pub use config::{DEFAULT_BIND_ADDR, DEFAULT_IDLE_TIMEOUT, ServerConfig};
pub use error::{BindingError, MudError};
pub use game::GameWorld;
pub use network::{ConnectionBinding, NetworkSystem};
pub use server::{MudServer, MudServerBuilder, spawn_world};
pub use telemetry::init_tracing;

pub use mudforge_ecs::World;
pub use mudforge_session::{LoginSystem, SessionRouter};

/// Everything needed to configure and run a server.
pub mod prelude {
    pub use crate::{GameWorld, MudError, MudServer, MudServerBuilder, ServerConfig};
    pub use mudforge_ecs::{EntityId, World};
    pub use mudforge_session::{CredentialStore, InMemoryCredentials, UsernameDirectory};
    pub use mudforge_transport::{ChannelSink, ConnectionId, ConnectionSink, TransportEvent};
}
