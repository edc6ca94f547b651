//! Gameplay input for logged-in players, and the username directory.
//!
//! The router takes over once the handshake is done. It decides which
//! entity a login becomes (a new one, or the identity the player left
//! behind when their connection dropped), answers commands, and frees an
//! entity only after the player asked to leave.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use mudforge_ecs::{
    EntityDeleted, EntityId, HasConnection, InGameWorld, LoggingOut, LoginSuccess,
    PerformDisconnect, PlayerInput, SendData, SwitchConnOwnership, System, SystemContext, World,
};
use mudforge_protocol::Command;

pub const UNKNOWN_REPLY: &str = "I don't understand that.\n";
pub const UNHANDLED_REPLY: &str = "You can't do that.\n";
pub const FAREWELL: &str = "Farewell.\n";

/// `username → entity` for every player with an identity in the world.
///
/// A cheap cloneable handle: the router keeps one and hands out clones,
/// so the server and tests can look inside after the router is attached.
/// The lock is only ever held for a single map operation.
#[derive(Debug, Clone, Default)]
pub struct UsernameDirectory {
    entries: Arc<Mutex<HashMap<String, EntityId>>>,
}

impl UsernameDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, EntityId>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The entity registered for `username`. It may have been released
    /// since; check with [`World::contains`].
    pub fn entity_for(&self, username: &str) -> Option<EntityId> {
        self.lock().get(username).copied()
    }

    /// Points `username` at `entity`, returning the previous entry.
    pub fn insert(&self, username: impl Into<String>, entity: EntityId) -> Option<EntityId> {
        self.lock().insert(username.into(), entity)
    }

    /// Removes `username`, but only if it still points at `entity`.
    pub fn remove_if(&self, username: &str, entity: EntityId) -> bool {
        let mut entries = self.lock();
        if entries.get(username) == Some(&entity) {
            entries.remove(username);
            true
        } else {
            false
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

/// Routes logins and commands for players in the world.
#[derive(Debug, Default)]
pub struct SessionRouter {
    directory: UsernameDirectory,
}

impl SessionRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle to the directory this router maintains.
    pub fn directory(&self) -> UsernameDirectory {
        self.directory.clone()
    }
}

impl System for SessionRouter {
    fn name(&self) -> &'static str {
        "session-router"
    }

    fn configure(&mut self, ctx: &mut SystemContext<'_>) {
        let directory = self.directory.clone();
        ctx.subscribe::<LoginSuccess>(move |world, event| {
            enter_world(world, &directory, event);
        });

        ctx.subscribe::<PlayerInput>(|world, input| {
            if world.has::<InGameWorld>(input.entity) {
                dispatch(world, input);
            }
        });

        // A bare drop keeps the entity so the player can come back to it.
        ctx.on_removed::<HasConnection>(|world, entity, _| {
            if world.has::<LoggingOut>(entity) {
                world.release_entity(entity);
            }
        });

        let directory = self.directory.clone();
        ctx.subscribe::<EntityDeleted>(move |world, event| {
            if let Some(in_game) = world.get::<InGameWorld>(event.entity) {
                if directory.remove_if(&in_game.username, event.entity) {
                    tracing::debug!(entity = %event.entity, username = %in_game.username, "directory entry removed");
                }
            }
        });
    }

    fn unconfigure(&mut self, _world: &mut World) {
        self.directory.clear();
    }
}

/// Gives a freshly authenticated connection its in-world identity.
fn enter_world(world: &mut World, directory: &UsernameDirectory, event: &LoginSuccess) {
    let LoginSuccess { username, entity } = event;
    let entity = *entity;

    let existing = directory
        .entity_for(username)
        .filter(|&existing| existing != entity && world.contains(existing));

    let home = match existing {
        Some(existing) => {
            // The login entity is only a carrier for the connection. Marked
            // this way, it is released as soon as the switch detaches it.
            if let Err(e) = world.add_component(entity, LoggingOut) {
                tracing::warn!(%entity, error = %e, "cannot mark login entity");
            }
            world.emit(SwitchConnOwnership {
                from: entity,
                to: existing,
            });
            if world.has::<HasConnection>(entity) {
                // The switch was refused and the connection stayed put, so
                // the login entity carries on as the player.
                tracing::error!(%username, %existing, %entity, "reconnection failed, using new identity");
                world.remove_component::<LoggingOut>(entity);
                entity
            } else {
                tracing::info!(%username, %existing, via = %entity, "player resumed existing identity");
                existing
            }
        }
        None => {
            tracing::info!(%username, %entity, "player entered the world");
            entity
        }
    };

    if let Err(e) = world.add_component(home, InGameWorld::new(username.clone())) {
        tracing::warn!(entity = %home, error = %e, "cannot place player in world");
        return;
    }
    directory.insert(username.clone(), home);
}

fn dispatch(world: &mut World, input: &PlayerInput) {
    let entity = input.entity;
    match mudforge_protocol::parse(&input.line) {
        Some(Command::Quit) => {
            if let Err(e) = world.add_component(entity, LoggingOut) {
                tracing::warn!(%entity, error = %e, "cannot mark entity as leaving");
                return;
            }
            world.emit(SendData::new(entity, FAREWELL));
            world.emit(PerformDisconnect { entity });
        }
        Some(command) => {
            tracing::debug!(%entity, kind = command.kind(), "unhandled command");
            world.emit(SendData::new(entity, UNHANDLED_REPLY));
        }
        None => {
            world.emit(SendData::new(entity, UNKNOWN_REPLY));
        }
    }
}
