//! Entity ids and the per-entity component map.

use std::collections::HashMap;
use std::fmt;

use crate::{Component, ComponentData, ComponentKind};

/// A generational entity id.
///
/// `index` is the slot number: allocated from a counter and recycled when
/// the entity is released. `generation` counts how many times that slot
/// has been recycled. A holder of a stale id (same index, older
/// generation) finds nothing when it looks the id up, so it can never
/// touch whatever entity occupies the slot now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId {
    index: u32,
    generation: u32,
}

impl EntityId {
    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// The (recyclable) slot number.
    pub fn index(self) -> u32 {
        self.index
    }

    /// How many times the slot had been recycled when this id was issued.
    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E-{}v{}", self.index, self.generation)
    }
}

/// A live entity: its id plus at most one component per kind.
///
/// Read access is public. All mutation goes through the
/// [`World`](crate::World) so the component index and the bus stay in
/// step with the map.
#[derive(Debug, Clone)]
pub struct Entity {
    id: EntityId,
    components: HashMap<ComponentKind, Component>,
    pub(crate) releasing: bool,
}

impl Entity {
    pub(crate) fn new(id: EntityId) -> Self {
        Self {
            id,
            components: HashMap::new(),
            releasing: false,
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Returns `true` if a component of type `C` is attached.
    pub fn has<C: ComponentData>(&self) -> bool {
        self.components.contains_key(&C::KIND)
    }

    /// Borrows the attached component of type `C`.
    pub fn get<C: ComponentData>(&self) -> Option<&C> {
        self.components.get(&C::KIND).and_then(C::from_component)
    }

    /// The kinds of every attached component.
    pub fn kinds(&self) -> impl Iterator<Item = ComponentKind> {
        self.components.keys().copied()
    }

    pub(crate) fn get_mut<C: ComponentData>(&mut self) -> Option<&mut C> {
        self.components
            .get_mut(&C::KIND)
            .and_then(C::from_component_mut)
    }

    /// Stores `component`, returning whatever it replaced.
    pub(crate) fn insert(&mut self, component: Component) -> Option<Component> {
        self.components.insert(component.kind(), component)
    }

    pub(crate) fn remove(&mut self, kind: ComponentKind) -> Option<Component> {
        self.components.remove(&kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{InGameWorld, LoggingOut};

    #[test]
    fn test_entity_id_display() {
        assert_eq!(EntityId::new(3, 0).to_string(), "E-3v0");
        assert_eq!(EntityId::new(3, 2).to_string(), "E-3v2");
    }

    #[test]
    fn test_entity_id_generation_distinguishes_same_index() {
        assert_ne!(EntityId::new(1, 0), EntityId::new(1, 1));
    }

    #[test]
    fn test_insert_same_kind_replaces_previous() {
        let mut entity = Entity::new(EntityId::new(0, 0));
        assert!(entity.insert(InGameWorld::new("Celidur").into()).is_none());

        let replaced = entity.insert(InGameWorld::new("Faerhan").into());

        assert_eq!(replaced, Some(InGameWorld::new("Celidur").into()));
        assert_eq!(entity.get::<InGameWorld>().unwrap().username, "Faerhan");
        assert_eq!(entity.kinds().count(), 1);
    }

    #[test]
    fn test_remove_absent_kind_returns_none() {
        let mut entity = Entity::new(EntityId::new(0, 0));
        assert!(entity.remove(ComponentKind::LoggingOut).is_none());

        entity.insert(LoggingOut.into());
        assert!(entity.has::<LoggingOut>());
        assert!(entity.remove(ComponentKind::LoggingOut).is_some());
        assert!(!entity.has::<LoggingOut>());
    }
}
