//! The assembled game: a world with its systems, fed by transport events.

use std::sync::Arc;

use mudforge_ecs::{EntityId, World};
use mudforge_protocol::decode_line;
use mudforge_session::{CredentialStore, LoginSystem, SessionRouter, UsernameDirectory};
use mudforge_transport::{ConnectionId, ConnectionSink, TransportEvent};

use crate::network::{ConnectionBinding, NetworkSystem};

/// A [`World`] with the network, routing and login systems attached.
///
/// Synchronous and single-owner: [`handle`](Self::handle) runs one
/// transport event to quiescence and returns. The server drives it from
/// one task; tests drive it directly.
///
/// Systems are attached network first, then the router, then login.
/// The router must see `PlayerInput` before login does, so the password
/// line that completes a login is never read as a command.
pub struct GameWorld {
    world: World,
    binding: ConnectionBinding,
    directory: UsernameDirectory,
}

impl GameWorld {
    pub fn new<C: CredentialStore>(sink: Arc<dyn ConnectionSink>, credentials: Arc<C>) -> Self {
        let mut world = World::new();
        let binding = ConnectionBinding::new(sink);

        world.add_system(NetworkSystem::new(binding.clone()));
        let router = SessionRouter::new();
        let directory = router.directory();
        world.add_system(router);
        world.add_system(LoginSystem::new(credentials));

        Self {
            world,
            binding,
            directory,
        }
    }

    /// Applies one transport event.
    pub fn handle(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Accepted(conn) => {
                self.binding.on_accept(&mut self.world, conn);
            }
            TransportEvent::Line(conn, raw) => match decode_line(&raw) {
                Ok(line) => self.binding.on_line(&mut self.world, conn, line),
                Err(e) => tracing::warn!(%conn, error = %e, "undecodable line dropped"),
            },
            TransportEvent::Closed { conn, had_error } => {
                self.binding.on_closed(&mut self.world, conn, had_error);
            }
            TransportEvent::TimedOut(conn) => {
                self.binding.on_timeout(&mut self.world, conn);
            }
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// The `username → entity` directory kept by the router.
    pub fn directory(&self) -> &UsernameDirectory {
        &self.directory
    }

    /// The entity currently bound to `conn`.
    pub fn entity_for_connection(&self, conn: ConnectionId) -> Option<EntityId> {
        self.binding.owner(conn)
    }

    /// Detaches every system (login, router, network, in that order).
    pub fn shutdown(&mut self) {
        self.world.remove_all_systems();
        tracing::debug!(entities = self.world.len(), "game world shut down");
    }
}
