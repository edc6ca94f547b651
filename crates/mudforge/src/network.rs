//! Connection binding: which entity owns which connection.
//!
//! This is the only place that knows about connections. Everything else
//! talks about entities and asks for bytes to be written (`SendData`), a
//! connection to be dropped (`PerformDisconnect`) or moved
//! (`SwitchConnOwnership`).
//!
//! Per connection:
//!
//! ```text
//!  UNBOUND ──accept──→ BOUND(entity, reassigned=false)
//!                        │
//!                        ├──switch──→ BOUND(other, reassigned=true)
//!                        │
//!                        └──close / timeout / disconnect──→ UNBOUND
//! ```
//!
//! The `owners` table and the `HasConnection` components always agree:
//! a connection is in the table exactly when some entity holds it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use mudforge_ecs::{
    EntityId, HasConnection, PerformDisconnect, PlayerInput, SendData, SwitchConnOwnership,
    System, SystemContext, World,
};
use mudforge_transport::{ConnectionId, ConnectionSink};

use crate::BindingError;

/// Sent to the connection being evicted by a reconnection.
pub const PUSHED_OUT: &str = "You feel like you're being pushed out of your own mind!\n";
/// Sent once a reconnection has landed on the player's existing body.
pub const INHABIT: &str = "You feel yourself inhabit your existing body.\n";
/// Sent just before an idle connection is closed.
pub const IDLE_NOTICE: &str = "\n\nClosing connection due to inactivity.\n";

/// The connection ↔ entity table plus the sink that reaches the sockets.
///
/// Cheap to clone. The [`NetworkSystem`] holds one copy to serve bus
/// requests and the server holds another to feed transport events in.
#[derive(Clone)]
pub struct ConnectionBinding {
    sink: Arc<dyn ConnectionSink>,
    owners: Arc<Mutex<HashMap<ConnectionId, EntityId>>>,
}

impl ConnectionBinding {
    pub fn new(sink: Arc<dyn ConnectionSink>) -> Self {
        Self {
            sink,
            owners: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn owners(&self) -> MutexGuard<'_, HashMap<ConnectionId, EntityId>> {
        self.owners.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The entity currently bound to `conn`.
    pub fn owner(&self, conn: ConnectionId) -> Option<EntityId> {
        self.owners().get(&conn).copied()
    }

    /// Number of bound connections.
    pub fn len(&self) -> usize {
        self.owners().len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners().is_empty()
    }

    // -----------------------------------------------------------------
    // Transport → world
    // -----------------------------------------------------------------

    /// A new connection: give it a fresh entity. If none can be made the
    /// connection is closed straight away.
    pub fn on_accept(&self, world: &mut World, conn: ConnectionId) -> Option<EntityId> {
        let entity = match world.create_entity() {
            Ok(entity) => entity,
            Err(e) => {
                tracing::error!(%conn, error = %e, "no entity for new connection");
                if let Err(e) = self.sink.half_close(conn) {
                    tracing::debug!(%conn, error = %e, "close not delivered");
                }
                return None;
            }
        };
        self.owners().insert(conn, entity);
        if let Err(e) = world.add_component(entity, HasConnection::new(conn)) {
            tracing::error!(%conn, %entity, error = %e, "cannot bind new connection");
            self.owners().remove(&conn);
            return None;
        }
        tracing::debug!(%conn, %entity, "connection bound");
        Some(entity)
    }

    /// A line from `conn`: hand it to whoever owns the connection.
    pub fn on_line(&self, world: &mut World, conn: ConnectionId, line: String) {
        let Some(entity) = self.owner(conn) else {
            tracing::warn!(%conn, "line from unbound connection dropped");
            return;
        };
        world.emit(PlayerInput { entity, line });
    }

    /// `conn` closed on its own (EOF or error).
    pub fn on_closed(&self, world: &mut World, conn: ConnectionId, had_error: bool) {
        if had_error {
            tracing::warn!(%conn, "connection closed with error");
        } else {
            tracing::debug!(%conn, "connection closed");
        }
        self.detach(world, conn);
    }

    /// `conn` went idle: say goodbye, close it, and detach it.
    pub fn on_timeout(&self, world: &mut World, conn: ConnectionId) {
        tracing::info!(%conn, "closing idle connection");
        if let Err(e) = self.sink.write(conn, IDLE_NOTICE.as_bytes()) {
            tracing::debug!(%conn, error = %e, "idle notice not delivered");
        }
        if let Err(e) = self.sink.half_close(conn) {
            tracing::debug!(%conn, error = %e, "idle close not delivered");
        }
        self.detach(world, conn);
    }

    /// Forgets `conn` and removes it from its owner, if it still has one.
    fn detach(&self, world: &mut World, conn: ConnectionId) {
        let Some(entity) = self.owners().remove(&conn) else {
            tracing::debug!(%conn, "closed connection was not bound");
            return;
        };
        if world.get::<HasConnection>(entity).is_some_and(|c| c.conn == conn) {
            world.remove_component::<HasConnection>(entity);
        }
    }

    // -----------------------------------------------------------------
    // World → transport
    // -----------------------------------------------------------------

    /// Writes `data` to the entity's connection. An entity without one is
    /// unreachable, which is worth a warning and nothing more.
    pub fn send(&self, world: &World, entity: EntityId, data: &str) {
        let Some(conn) = world.get::<HasConnection>(entity).map(|c| c.conn) else {
            tracing::warn!(%entity, "send to entity without a connection");
            return;
        };
        if let Err(e) = self.sink.write(conn, data.as_bytes()) {
            tracing::warn!(%entity, %conn, error = %e, "write failed");
        }
    }

    /// Half-closes the entity's connection and detaches it.
    pub fn perform_disconnect(&self, world: &mut World, entity: EntityId) {
        let Some(conn) = world.get::<HasConnection>(entity).map(|c| c.conn) else {
            tracing::warn!(%entity, "disconnect requested for entity without a connection");
            return;
        };
        if let Err(e) = self.sink.half_close(conn) {
            tracing::debug!(%entity, %conn, error = %e, "close not delivered");
        }
        self.owners().remove(&conn);
        tracing::debug!(%entity, %conn, "connection disconnected");
        world.remove_component::<HasConnection>(entity);
    }

    /// Moves the connection held by `from` onto `to`.
    ///
    /// Any connection `to` already had is evicted first (notified, then
    /// disconnected), so an entity never holds two. Then `to` gets the
    /// connection flagged as reassigned, `from` loses it, and the table
    /// points at `to`.
    ///
    /// # Errors
    /// Refuses, changing nothing, if `from` has no connection, if `to`
    /// doesn't exist, or if they are the same entity.
    pub fn switch_ownership(
        &self,
        world: &mut World,
        from: EntityId,
        to: EntityId,
    ) -> Result<(), BindingError> {
        if from == to {
            return Err(BindingError::SelfSwitch(from));
        }
        let conn = world
            .get::<HasConnection>(from)
            .map(|c| c.conn)
            .ok_or(BindingError::NoConnection(from))?;
        if !world.contains(to) {
            return Err(BindingError::NoSuchEntity(to));
        }

        if world.has::<HasConnection>(to) {
            tracing::info!(entity = %to, "evicting existing connection");
            self.send(world, to, PUSHED_OUT);
            self.perform_disconnect(world, to);
        }

        self.owners().insert(conn, to);
        if let Err(e) = world.add_component(to, HasConnection::reassigned(conn)) {
            // Only reachable if the eviction released the target.
            self.owners().insert(conn, from);
            tracing::error!(%from, %to, error = %e, "switch target vanished");
            return Err(BindingError::NoSuchEntity(to));
        }
        world.remove_component::<HasConnection>(from);

        tracing::debug!(%conn, %from, %to, "connection re-homed");
        self.send(world, to, INHABIT);
        Ok(())
    }
}

/// Serves the bus requests that need a socket.
pub struct NetworkSystem {
    binding: ConnectionBinding,
}

impl NetworkSystem {
    pub fn new(binding: ConnectionBinding) -> Self {
        Self { binding }
    }
}

impl System for NetworkSystem {
    fn name(&self) -> &'static str {
        "network"
    }

    fn configure(&mut self, ctx: &mut SystemContext<'_>) {
        let binding = self.binding.clone();
        ctx.subscribe::<SendData>(move |world, event| {
            binding.send(world, event.entity, &event.data);
        });

        let binding = self.binding.clone();
        ctx.subscribe::<PerformDisconnect>(move |world, event| {
            binding.perform_disconnect(world, event.entity);
        });

        let binding = self.binding.clone();
        ctx.subscribe::<SwitchConnOwnership>(move |world, event| {
            if let Err(e) = binding.switch_ownership(world, event.from, event.to) {
                tracing::error!(from = %event.from, to = %event.to, error = %e, "ownership switch refused");
            }
        });
    }

    fn unconfigure(&mut self, _world: &mut World) {
        self.binding.owners().clear();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use mudforge_transport::TransportError;

    use super::*;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Recorded {
        writes: Vec<(ConnectionId, String)>,
        closed: Vec<ConnectionId>,
    }

    #[derive(Clone, Default)]
    struct RecordingSink {
        inner: Arc<Mutex<Recorded>>,
    }

    impl ConnectionSink for RecordingSink {
        fn write(&self, conn: ConnectionId, data: &[u8]) -> Result<(), TransportError> {
            self.inner
                .lock()
                .unwrap()
                .writes
                .push((conn, String::from_utf8_lossy(data).into_owned()));
            Ok(())
        }

        fn half_close(&self, conn: ConnectionId) -> Result<(), TransportError> {
            self.inner.lock().unwrap().closed.push(conn);
            Ok(())
        }
    }

    /// Everything a refused request must leave untouched.
    #[derive(Debug, PartialEq)]
    struct State {
        connections: Vec<Option<HasConnection>>,
        owners: HashMap<ConnectionId, EntityId>,
        sink: Recorded,
    }

    struct Fixture {
        world: World,
        binding: ConnectionBinding,
        sink: RecordingSink,
    }

    impl Fixture {
        fn new() -> Self {
            let sink = RecordingSink::default();
            let binding = ConnectionBinding::new(Arc::new(sink.clone()));
            Self {
                world: World::new(),
                binding,
                sink,
            }
        }

        fn accept(&mut self, id: u64) -> EntityId {
            self.binding
                .on_accept(&mut self.world, ConnectionId::new(id))
                .expect("entity should be created")
        }

        fn state(&self, entities: &[EntityId]) -> State {
            State {
                connections: entities
                    .iter()
                    .map(|&e| self.world.get::<HasConnection>(e).copied())
                    .collect(),
                owners: self.binding.owners().clone(),
                sink: self.sink.inner.lock().unwrap().clone(),
            }
        }
    }

    // =====================================================================
    // switch_ownership(): refusals
    // =====================================================================

    #[test]
    fn test_switch_ownership_source_without_connection_changes_nothing() {
        let mut f = Fixture::new();
        let source = f.world.create_entity().unwrap();
        let target = f.accept(1);
        let before = f.state(&[source, target]);

        let result = f.binding.switch_ownership(&mut f.world, source, target);

        assert_eq!(result, Err(BindingError::NoConnection(source)));
        assert_eq!(f.state(&[source, target]), before);
    }

    #[test]
    fn test_switch_ownership_onto_itself_changes_nothing() {
        let mut f = Fixture::new();
        let entity = f.accept(1);
        let before = f.state(&[entity]);

        let result = f.binding.switch_ownership(&mut f.world, entity, entity);

        assert_eq!(result, Err(BindingError::SelfSwitch(entity)));
        assert_eq!(f.state(&[entity]), before);
    }

    #[test]
    fn test_switch_ownership_to_released_entity_changes_nothing() {
        let mut f = Fixture::new();
        let source = f.accept(1);
        let target = f.world.create_entity().unwrap();
        assert!(f.world.release_entity(target));
        let before = f.state(&[source, target]);

        let result = f.binding.switch_ownership(&mut f.world, source, target);

        assert_eq!(result, Err(BindingError::NoSuchEntity(target)));
        assert_eq!(f.state(&[source, target]), before);
    }

    // =====================================================================
    // switch_ownership(): success
    // =====================================================================

    #[test]
    fn test_switch_ownership_evicts_target_and_rehomes_connection() {
        let mut f = Fixture::new();
        let source = f.accept(1);
        let target = f.accept(2);

        f.binding
            .switch_ownership(&mut f.world, source, target)
            .expect("switch should succeed");

        assert!(!f.world.has::<HasConnection>(source));
        assert_eq!(
            f.world.get::<HasConnection>(target).copied(),
            Some(HasConnection::reassigned(ConnectionId::new(1)))
        );
        assert_eq!(f.binding.owner(ConnectionId::new(1)), Some(target));
        assert_eq!(f.binding.owner(ConnectionId::new(2)), None);

        let recorded = f.sink.inner.lock().unwrap().clone();
        assert_eq!(
            recorded.writes,
            vec![
                (ConnectionId::new(2), PUSHED_OUT.to_string()),
                (ConnectionId::new(1), INHABIT.to_string()),
            ]
        );
        assert_eq!(recorded.closed, vec![ConnectionId::new(2)]);
    }

    // =====================================================================
    // send() / perform_disconnect() without a connection
    // =====================================================================

    #[test]
    fn test_send_to_entity_without_connection_writes_nothing() {
        let mut f = Fixture::new();
        let bound = f.accept(1);
        let loose = f.world.create_entity().unwrap();
        let before = f.state(&[bound, loose]);

        f.binding.send(&f.world, loose, "hello\n");

        assert_eq!(f.state(&[bound, loose]), before);
    }

    #[test]
    fn test_perform_disconnect_without_connection_changes_nothing() {
        let mut f = Fixture::new();
        let bound = f.accept(1);
        let loose = f.world.create_entity().unwrap();
        let before = f.state(&[bound, loose]);

        f.binding.perform_disconnect(&mut f.world, loose);

        assert_eq!(f.state(&[bound, loose]), before);
        assert!(f.world.contains(loose));
    }

    #[test]
    fn test_perform_disconnect_closes_and_detaches() {
        let mut f = Fixture::new();
        let entity = f.accept(1);

        f.binding.perform_disconnect(&mut f.world, entity);

        assert!(!f.world.has::<HasConnection>(entity));
        assert!(f.binding.is_empty());
        assert_eq!(f.sink.inner.lock().unwrap().closed, vec![ConnectionId::new(1)]);
    }
}
