//! The registry: entities, the component index, the bus, and systems.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;

use crate::bus::EventBus;
use crate::system::AttachedSystem;
use crate::{
    BusEvent, Component, ComponentAssigned, ComponentData, ComponentKind, ComponentRemoved,
    EcsError, Entity, EntityCreated, EntityDeleted, EntityId, Event, EventKind, SubscriptionId,
    Subscriptions, System, SystemContext, SystemId,
};

/// One entity slot. `entity` is `None` while the slot sits in the
/// recycle pool.
struct Slot {
    generation: u32,
    entity: Option<Entity>,
}

/// The authoritative store of entities and components, plus the event bus
/// that connects systems.
///
/// ## Invariants
///
/// - An entity exists from [`create_entity`](Self::create_entity) until
///   [`release_entity`](Self::release_entity).
/// - The component index is updated on every add/remove, so
///   [`with_component`](Self::with_component) returns exactly the
///   entities currently holding that kind.
/// - A slot in the recycle pool is never live.
#[derive(Default)]
pub struct World {
    slots: Vec<Slot>,
    /// Released slot indices, reused oldest first.
    recycled: VecDeque<u32>,
    live: usize,
    index: HashMap<ComponentKind, HashSet<EntityId>>,
    bus: EventBus,
    systems: Vec<AttachedSystem>,
    next_system_id: u64,
    /// Slot ceiling below the `u32` index space. Only lowered in tests.
    slot_limit: Option<u32>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    fn with_slot_limit(limit: u32) -> Self {
        Self {
            slot_limit: Some(limit),
            ..Self::default()
        }
    }

    // -----------------------------------------------------------------
    // Entities
    // -----------------------------------------------------------------

    /// Creates an empty entity and publishes [`EntityCreated`].
    ///
    /// Reuses the oldest released slot if there is one (with its
    /// generation bumped), otherwise allocates the next index.
    ///
    /// # Errors
    /// [`EcsError::SlotsExhausted`] once every index is taken by a live
    /// entity and none has been released for reuse.
    pub fn create_entity(&mut self) -> Result<EntityId, EcsError> {
        let id = match self.recycled.pop_front() {
            Some(index) => EntityId::new(index, self.slots[index as usize].generation),
            None => {
                let index = u32::try_from(self.slots.len())
                    .ok()
                    .filter(|&index| self.slot_limit.is_none_or(|limit| index < limit))
                    .ok_or(EcsError::SlotsExhausted(self.slots.len()))?;
                self.slots.push(Slot {
                    generation: 0,
                    entity: None,
                });
                EntityId::new(index, 0)
            }
        };

        self.slots[id.index() as usize].entity = Some(Entity::new(id));
        self.live += 1;
        tracing::debug!(entity = %id, "entity created");

        self.emit(EntityCreated { entity: id });
        Ok(id)
    }

    /// Looks up a live entity. Stale and never-issued ids give `None`.
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.slots
            .get(id.index() as usize)?
            .entity
            .as_ref()
            .filter(|entity| entity.id() == id)
    }

    fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.slots
            .get_mut(id.index() as usize)?
            .entity
            .as_mut()
            .filter(|entity| entity.id() == id)
    }

    /// Returns `true` if `id` names a live entity.
    pub fn contains(&self, id: EntityId) -> bool {
        self.entity(id).is_some()
    }

    /// Releases an entity.
    ///
    /// [`EntityDeleted`] is published first, while the entity and its
    /// components are still readable; then the entity is dropped, its
    /// index entries are purged and its slot goes to the recycle pool.
    ///
    /// Returns `false` (and does nothing) for an unknown id, or for an
    /// entity whose release is already in progress further up the stack.
    pub fn release_entity(&mut self, id: EntityId) -> bool {
        match self.entity_mut(id) {
            Some(entity) if !entity.releasing => entity.releasing = true,
            Some(_) => {
                tracing::debug!(entity = %id, "entity release already in progress");
                return false;
            }
            None => {
                tracing::warn!(entity = %id, "release requested for unknown entity");
                return false;
            }
        }

        self.emit(EntityDeleted { entity: id });

        let slot = &mut self.slots[id.index() as usize];
        let Some(entity) = slot.entity.take() else {
            return false;
        };
        slot.generation = slot.generation.wrapping_add(1);

        for kind in entity.kinds() {
            self.unregister_component(kind, id);
        }
        self.recycled.push_back(id.index());
        self.live -= 1;

        tracing::debug!(entity = %id, "entity released");
        true
    }

    /// Number of live entities.
    pub fn len(&self) -> usize {
        self.live
    }

    /// Returns `true` if no entity is live.
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Every live entity.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.slots.iter().filter_map(|slot| slot.entity.as_ref())
    }

    // -----------------------------------------------------------------
    // Components
    // -----------------------------------------------------------------

    /// Attaches `component`, overwriting any existing component of the
    /// same kind. Publishes [`ComponentAssigned`] once the index shows it.
    ///
    /// # Errors
    /// [`EcsError::NoSuchEntity`] if `id` is not live.
    pub fn add_component(
        &mut self,
        id: EntityId,
        component: impl Into<Component>,
    ) -> Result<(), EcsError> {
        let component = component.into();
        let kind = component.kind();

        let entity = self.entity_mut(id).ok_or(EcsError::NoSuchEntity(id))?;
        entity.insert(component.clone());
        self.register_component(kind, id);

        tracing::trace!(entity = %id, ?kind, "component assigned");
        self.emit(ComponentAssigned {
            entity: id,
            component,
        });
        Ok(())
    }

    /// Detaches the component of type `C`, publishing
    /// [`ComponentRemoved`] with the removed value.
    ///
    /// Returns whether anything was removed; an absent component (or an
    /// unknown entity) is not an error.
    pub fn remove_component<C: ComponentData>(&mut self, id: EntityId) -> bool {
        self.remove_component_kind(id, C::KIND)
    }

    /// Untyped form of [`remove_component`](Self::remove_component).
    pub fn remove_component_kind(&mut self, id: EntityId, kind: ComponentKind) -> bool {
        let Some(component) = self.entity_mut(id).and_then(|entity| entity.remove(kind)) else {
            return false;
        };
        self.unregister_component(kind, id);

        tracing::trace!(entity = %id, ?kind, "component removed");
        self.emit(ComponentRemoved {
            entity: id,
            component,
        });
        true
    }

    /// Returns `true` if `id` is live and holds a `C`.
    pub fn has<C: ComponentData>(&self, id: EntityId) -> bool {
        self.entity(id).is_some_and(Entity::has::<C>)
    }

    /// Borrows the `C` held by `id`.
    pub fn get<C: ComponentData>(&self, id: EntityId) -> Option<&C> {
        self.entity(id)?.get::<C>()
    }

    /// Mutably borrows the `C` held by `id`, for in-place updates.
    ///
    /// No event is published: the kind set of the entity doesn't change.
    pub fn get_mut<C: ComponentData>(&mut self, id: EntityId) -> Option<&mut C> {
        self.entity_mut(id)?.get_mut::<C>()
    }

    /// Snapshot of the entities currently holding a component of `kind`,
    /// in no particular order.
    pub fn with_component(&self, kind: ComponentKind) -> Vec<EntityId> {
        self.index
            .get(&kind)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Typed form of [`with_component`](Self::with_component).
    pub fn with<C: ComponentData>(&self) -> Vec<EntityId> {
        self.with_component(C::KIND)
    }

    fn register_component(&mut self, kind: ComponentKind, id: EntityId) {
        self.index.entry(kind).or_default().insert(id);
    }

    fn unregister_component(&mut self, kind: ComponentKind, id: EntityId) {
        if let Some(ids) = self.index.get_mut(&kind) {
            ids.remove(&id);
            if ids.is_empty() {
                self.index.remove(&kind);
            }
        }
    }

    // -----------------------------------------------------------------
    // Bus
    // -----------------------------------------------------------------

    /// Publishes `event` to every current subscriber of its kind, in
    /// subscription order, and returns once all of them have run.
    ///
    /// Handlers may emit further events; those are dispatched in full
    /// before the handler that emitted them continues. The subscriber
    /// list is snapshotted on entry: subscriptions made during dispatch
    /// see the next event, and a snapshotted subscriber that is
    /// unsubscribed before its turn is skipped.
    ///
    /// Returns `false` if nobody was subscribed.
    pub fn emit(&mut self, event: impl Into<Event>) -> bool {
        let event = event.into();
        let subscribers = self.bus.snapshot(event.kind());
        if subscribers.is_empty() {
            return false;
        }

        for (id, handler) in subscribers {
            if self.bus.is_subscribed(id) {
                handler(&mut *self, &event);
            }
        }
        true
    }

    /// Subscribes `handler` to events with payload type `E`.
    ///
    /// Systems should subscribe through their
    /// [`SystemContext`](crate::SystemContext) instead, so the handle is
    /// released when the system is detached.
    pub fn subscribe<E: BusEvent>(
        &mut self,
        handler: impl Fn(&mut World, &E) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.bus.subscribe(
            E::KIND,
            Arc::new(move |world: &mut World, event: &Event| {
                if let Some(event) = E::from_event(event) {
                    handler(world, event);
                }
            }),
        )
    }

    /// Removes a subscription. Returns `false` if it was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    /// Number of subscribers currently registered for `kind`.
    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.bus.subscriber_count(kind)
    }

    // -----------------------------------------------------------------
    // Systems
    // -----------------------------------------------------------------

    /// Attaches a system and runs its [`System::configure`] hook.
    pub fn add_system(&mut self, system: impl System) -> SystemId {
        let id = SystemId(self.next_system_id);
        self.next_system_id += 1;

        let mut system: Box<dyn System> = Box::new(system);
        let mut subscriptions = Subscriptions::new();
        system.configure(&mut SystemContext {
            world: self,
            subscriptions: &mut subscriptions,
        });

        tracing::debug!(
            system = system.name(),
            %id,
            subscriptions = subscriptions.len(),
            "system attached"
        );
        self.systems.push(AttachedSystem {
            id,
            system,
            subscriptions,
        });
        id
    }

    /// Detaches a system: severs all its subscriptions, then runs its
    /// [`System::unconfigure`] hook.
    ///
    /// # Errors
    /// [`EcsError::NoSuchSystem`] if `id` is not attached.
    pub fn remove_system(&mut self, id: SystemId) -> Result<(), EcsError> {
        let position = self
            .systems
            .iter()
            .position(|attached| attached.id == id)
            .ok_or(EcsError::NoSuchSystem(id))?;
        let mut attached = self.systems.remove(position);

        let severed = attached.subscriptions.unsubscribe_all(self);
        attached.system.unconfigure(self);

        tracing::debug!(system = attached.system.name(), %id, severed, "system detached");
        Ok(())
    }

    /// Detaches every system, most recently attached first.
    pub fn remove_all_systems(&mut self) {
        while let Some(id) = self.systems.last().map(|attached| attached.id) {
            // The id was just read from the list, so it is attached.
            let _ = self.remove_system(id);
        }
    }

    /// Number of attached systems.
    pub fn system_count(&self) -> usize {
        self.systems.len()
    }
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("entities", &self.live)
            .field("recycled", &self.recycled.len())
            .field("subscriptions", &self.bus.len())
            .field("systems", &self.systems.len())
            .finish_non_exhaustive()
    }
}

// =========================================================================
// Tests
// =========================================================================
