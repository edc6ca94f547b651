//! The behaviour-unit contract.
//!
//! A [`System`] holds no entity data. It is attached to a world with
//! [`World::add_system`], which calls [`System::configure`] once; that is
//! the only place a system gets to subscribe, through the
//! [`SystemContext`] it is handed. The context records every handle in
//! the system's [`Subscriptions`], so when the system is detached the
//! world can sever all of them *before* calling [`System::unconfigure`].
//! A late event therefore can never re-enter a system that is tearing
//! down.

use std::fmt;

use crate::{BusEvent, ComponentAssigned, ComponentData, ComponentRemoved, EntityId, SubscriptionId, World};

/// Identifies an attached system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SystemId(pub(crate) u64);

impl fmt::Display for SystemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sys-{}", self.0)
    }
}

/// A unit of behaviour attached to a [`World`].
///
/// `Send` because the world is handed to a single owning task, and the
/// systems travel with it.
pub trait System: Send + 'static {
    /// A short name for logs.
    fn name(&self) -> &'static str;

    /// Called once on attach. Establish every subscription here.
    fn configure(&mut self, ctx: &mut SystemContext<'_>);

    /// Called once on detach, after all subscriptions are gone. Release
    /// anything the system owns (directories, pending sets).
    fn unconfigure(&mut self, _world: &mut World) {}
}

/// The subscription handles held on behalf of one system.
#[derive(Debug, Default)]
pub struct Subscriptions {
    handles: Vec<SubscriptionId>,
}

impl Subscriptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes ownership of a handle.
    pub fn track(&mut self, id: SubscriptionId) {
        self.handles.push(id);
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Severs every tracked subscription.
    ///
    /// Idempotent: the handles are drained, so a second call does
    /// nothing. Returns how many subscriptions were actually removed.
    pub fn unsubscribe_all(&mut self, world: &mut World) -> usize {
        self.handles
            .drain(..)
            .filter(|id| world.unsubscribe(*id))
            .count()
    }
}

/// A system as held by the world, with the handles it owns.
pub(crate) struct AttachedSystem {
    pub(crate) id: SystemId,
    pub(crate) system: Box<dyn System>,
    pub(crate) subscriptions: Subscriptions,
}

/// What a system sees while it is being configured.
pub struct SystemContext<'w> {
    pub(crate) world: &'w mut World,
    pub(crate) subscriptions: &'w mut Subscriptions,
}

impl SystemContext<'_> {
    /// Subscribes to events of payload type `E`.
    pub fn subscribe<E: BusEvent>(
        &mut self,
        handler: impl Fn(&mut World, &E) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let id = self.world.subscribe::<E>(handler);
        self.subscriptions.track(id);
        id
    }

    /// Subscribes to assignments of component type `C`.
    ///
    /// Fires for every assignment of that kind, fresh or overwrite. A
    /// handler that cares whether a connection was re-homed must look at
    /// the component itself (e.g. `HasConnection::was_reassigned`).
    pub fn on_assigned<C: ComponentData>(
        &mut self,
        handler: impl Fn(&mut World, EntityId, &C) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.subscribe::<ComponentAssigned>(move |world, event| {
            if let Some(component) = C::from_component(&event.component) {
                handler(world, event.entity, component);
            }
        })
    }

    /// Subscribes to removals of component type `C`. The handler gets
    /// the removed value.
    pub fn on_removed<C: ComponentData>(
        &mut self,
        handler: impl Fn(&mut World, EntityId, &C) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.subscribe::<ComponentRemoved>(move |world, event| {
            if let Some(component) = C::from_component(&event.component) {
                handler(world, event.entity, component);
            }
        })
    }

    /// The world being configured, for systems that need to look around
    /// (or seed entities) while attaching.
    pub fn world(&mut self) -> &mut World {
        self.world
    }
}
