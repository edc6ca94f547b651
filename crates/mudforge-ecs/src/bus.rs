//! Subscriber bookkeeping for the world's event bus.
//!
//! The bus only stores handlers. Dispatch lives on
//! [`World::emit`](crate::World::emit), because handlers need `&mut World`
//! and the bus is part of the world.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::{Event, EventKind, World};

/// An untyped handler as stored on the bus.
///
/// `Arc` so dispatch can take a snapshot of the subscriber list and let
/// go of the bus before calling into handlers.
pub(crate) type Handler = Arc<dyn Fn(&mut World, &Event) + Send + Sync>;

/// De-registration handle returned by every subscribe call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

#[derive(Default)]
pub(crate) struct EventBus {
    next_id: u64,
    /// Per kind, in subscription order.
    subscribers: HashMap<EventKind, Vec<(SubscriptionId, Handler)>>,
    /// Reverse index so unsubscribe doesn't need to know the kind.
    kinds: HashMap<SubscriptionId, EventKind>,
}

impl EventBus {
    pub(crate) fn subscribe(&mut self, kind: EventKind, handler: Handler) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers
            .entry(kind)
            .or_default()
            .push((id, handler));
        self.kinds.insert(id, kind);
        id
    }

    pub(crate) fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let Some(kind) = self.kinds.remove(&id) else {
            return false;
        };
        if let Some(list) = self.subscribers.get_mut(&kind) {
            list.retain(|(sub, _)| *sub != id);
        }
        true
    }

    pub(crate) fn is_subscribed(&self, id: SubscriptionId) -> bool {
        self.kinds.contains_key(&id)
    }

    /// The current subscribers for `kind`, cloned out in order.
    pub(crate) fn snapshot(&self, kind: EventKind) -> Vec<(SubscriptionId, Handler)> {
        self.subscribers.get(&kind).cloned().unwrap_or_default()
    }

    pub(crate) fn subscriber_count(&self, kind: EventKind) -> usize {
        self.subscribers.get(&kind).map_or(0, Vec::len)
    }

    pub(crate) fn len(&self) -> usize {
        self.kinds.len()
    }
}
