//! The event set.
//!
//! Each event kind has its own payload struct, and [`Event`] is the
//! closed union of all of them. Subscribers name the payload they want
//! (`world.subscribe::<PlayerInput>(..)`) and receive exactly that type;
//! the bus does the matching on [`EventKind`].

use crate::{Component, EntityId};

/// A payload type that can travel on the bus.
pub trait BusEvent: Into<Event> + Sized + 'static {
    /// The tag subscriptions for this payload are keyed on.
    const KIND: EventKind;

    /// Borrows this payload out of `event` if it has this kind.
    fn from_event(event: &Event) -> Option<&Self>;
}

macro_rules! bus_events {
    ($(
        $(#[$meta:meta])*
        $name:ident { $( $(#[$field_meta:meta])* $field:ident : $ty:ty ),* $(,)? }
    )*) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, PartialEq, Eq)]
            pub struct $name {
                $( $(#[$field_meta])* pub $field: $ty, )*
            }

            impl From<$name> for Event {
                fn from(event: $name) -> Self {
                    Event::$name(event)
                }
            }

            impl BusEvent for $name {
                const KIND: EventKind = EventKind::$name;

                fn from_event(event: &Event) -> Option<&Self> {
                    match event {
                        Event::$name(inner) => Some(inner),
                        _ => None,
                    }
                }
            }
        )*

        /// Any event, tagged with its kind.
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub enum Event {
            $( $name($name), )*
        }

        /// The tag of an [`Event`].
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum EventKind {
            $( $name, )*
        }

        impl Event {
            /// This event's tag.
            pub fn kind(&self) -> EventKind {
                match self {
                    $( Event::$name(_) => EventKind::$name, )*
                }
            }
        }
    };
}

bus_events! {
    /// An entity was created. Published after it is stored.
    EntityCreated { entity: EntityId }

    /// An entity is about to be released. Published while the entity and
    /// its components are still readable.
    EntityDeleted { entity: EntityId }

    /// A component was attached (or overwritten). Published after the
    /// component index reflects it.
    ComponentAssigned { entity: EntityId, component: Component }

    /// A component was detached. Carries the removed value.
    ComponentRemoved { entity: EntityId, component: Component }

    /// A line of text arrived on the entity's connection.
    PlayerInput { entity: EntityId, line: String }

    /// Request: write `data` to the entity's connection.
    SendData { entity: EntityId, data: String }

    /// Request: close the entity's connection and detach it.
    PerformDisconnect { entity: EntityId }

    /// Request: move the connection held by `from` onto `to`.
    SwitchConnOwnership {
        /// The entity currently holding the connection.
        from: EntityId,
        /// The entity that should hold it afterwards.
        to: EntityId,
    }

    /// A player proved who they are.
    LoginSuccess { username: String, entity: EntityId }
}

impl SendData {
    pub fn new(entity: EntityId, data: impl Into<String>) -> Self {
        Self {
            entity,
            data: data.into(),
        }
    }
}

impl PlayerInput {
    pub fn new(entity: EntityId, line: impl Into<String>) -> Self {
        Self {
            entity,
            line: line.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_event_matches_only_own_kind() {
        let entity = EntityId::new(0, 0);
        let event: Event = PerformDisconnect { entity }.into();

        assert_eq!(event.kind(), EventKind::PerformDisconnect);
        assert_eq!(
            PerformDisconnect::from_event(&event),
            Some(&PerformDisconnect { entity })
        );
        assert!(EntityDeleted::from_event(&event).is_none());
    }

    #[test]
    fn test_kind_constant_matches_event_kind() {
        let entity = EntityId::new(1, 0);
        let event: Event = SendData::new(entity, "hi").into();
        assert_eq!(event.kind(), SendData::KIND);
    }
}
