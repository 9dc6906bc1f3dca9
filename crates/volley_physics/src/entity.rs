//! Gameplay entities and the capabilities the substep loop dispatches to
//!
//! An entity is any boxed value implementing [`Entity`]. It opts into
//! notifications by returning itself from the matching `as_*` accessor:
//!
//! ```ignore
//! impl Entity for Mine {
//!     fn body(&self) -> Option<BodyHandle> { Some(self.body) }
//!     fn as_collision(&mut self) -> Option<&mut dyn OnCollision> { Some(self) }
//! }
//! ```
//!
//! While a callback runs, the entity is checked out of the registry so it can
//! freely borrow the world mutably.

use crate::body::BodyHandle;
use crate::events::HitInfo;
use crate::world::PhysicsWorld;
use std::any::Any;
use std::fmt;

/// Generational entity identifier
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId {
    index: u32,
    generation: u32,
}

impl EntityId {
    /// Slot index
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Generation (incremented each time the slot is reused)
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({}v{})", self.index, self.generation)
    }
}

/// Upcast helper so `dyn Entity` can be downcast to its concrete type
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Reacts to touching another body during the previous solve
pub trait OnCollision {
    fn on_collision(&mut self, world: &mut PhysicsWorld, other: BodyHandle);
}

/// Runs once per substep, before the solver advances
pub trait OnPresubstep {
    fn on_presubstep(&mut self, world: &mut PhysicsWorld, dt: f32);
}

/// Receives projectile impacts on the entity's body
pub trait OnHit {
    fn on_hit(&mut self, world: &mut PhysicsWorld, hit: &HitInfo);
}

/// Anything the world can own and notify
pub trait Entity: AsAny {
    /// Body this entity owns, linked on spawn
    fn body(&self) -> Option<BodyHandle> {
        None
    }

    fn as_collision(&mut self) -> Option<&mut dyn OnCollision> {
        None
    }

    fn as_presubstep(&mut self) -> Option<&mut dyn OnPresubstep> {
        None
    }

    fn as_hit(&mut self) -> Option<&mut dyn OnHit> {
        None
    }
}

/// Closure registered as a presubstep callback
pub struct PresubstepFn<F>(pub F);

impl<F> Entity for PresubstepFn<F>
where
    F: FnMut(&mut PhysicsWorld, f32) + 'static,
{
    fn as_presubstep(&mut self) -> Option<&mut dyn OnPresubstep> {
        Some(self)
    }
}

impl<F> OnPresubstep for PresubstepFn<F>
where
    F: FnMut(&mut PhysicsWorld, f32),
{
    fn on_presubstep(&mut self, world: &mut PhysicsWorld, dt: f32) {
        (self.0)(world, dt)
    }
}

enum Slot {
    Vacant,
    Occupied(Box<dyn Entity>),
    /// Temporarily lent out to a running callback
    CheckedOut,
}

struct Entry {
    generation: u32,
    slot: Slot,
}

/// Slot map of live entities plus the presubstep dispatch order
#[derive(Default)]
pub(crate) struct EntityRegistry {
    entries: Vec<Entry>,
    free: Vec<u32>,
    presubstep_order: Vec<EntityId>,
    len: usize,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn insert(&mut self, mut entity: Box<dyn Entity>) -> EntityId {
        let presubstep = entity.as_presubstep().is_some();

        let id = match self.free.pop() {
            Some(index) => {
                let entry = &mut self.entries[index as usize];
                entry.slot = Slot::Occupied(entity);
                EntityId {
                    index,
                    generation: entry.generation,
                }
            }
            None => {
                let index = self.entries.len() as u32;
                self.entries.push(Entry {
                    generation: 0,
                    slot: Slot::Occupied(entity),
                });
                EntityId {
                    index,
                    generation: 0,
                }
            }
        };

        if presubstep {
            self.presubstep_order.push(id);
        }
        self.len += 1;
        id
    }

    fn entry_mut(&mut self, id: EntityId) -> Option<&mut Entry> {
        self.entries
            .get_mut(id.index as usize)
            .filter(|e| e.generation == id.generation)
    }

    /// Remove an entity. A checked-out entity is released and dropped when it is checked back in.
    pub fn remove(&mut self, id: EntityId) -> Option<Box<dyn Entity>> {
        let entry = self.entry_mut(id)?;
        let taken = match std::mem::replace(&mut entry.slot, Slot::Vacant) {
            Slot::Vacant => return None,
            Slot::Occupied(entity) => Some(entity),
            Slot::CheckedOut => None,
        };
        entry.generation = entry.generation.wrapping_add(1);
        self.free.push(id.index);
        self.presubstep_order.retain(|other| *other != id);
        self.len -= 1;
        taken
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entries
            .get(id.index as usize)
            .map(|e| e.generation == id.generation && !matches!(e.slot, Slot::Vacant))
            .unwrap_or(false)
    }

    /// Take an entity out for the duration of a callback
    pub fn checkout(&mut self, id: EntityId) -> Option<Box<dyn Entity>> {
        let entry = self.entry_mut(id)?;
        match std::mem::replace(&mut entry.slot, Slot::CheckedOut) {
            Slot::Occupied(entity) => Some(entity),
            other => {
                entry.slot = other;
                None
            }
        }
    }

    /// Return a checked-out entity. Hands it back if it was removed meanwhile.
    pub fn checkin(&mut self, id: EntityId, entity: Box<dyn Entity>) -> Option<Box<dyn Entity>> {
        match self.entry_mut(id) {
            Some(entry) if matches!(entry.slot, Slot::CheckedOut) => {
                entry.slot = Slot::Occupied(entity);
                None
            }
            _ => Some(entity),
        }
    }

    pub fn get(&self, id: EntityId) -> Option<&dyn Entity> {
        match self.entries.get(id.index as usize) {
            Some(Entry {
                generation,
                slot: Slot::Occupied(entity),
            }) if *generation == id.generation => Some(&**entity),
            _ => None,
        }
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut dyn Entity> {
        match self.entry_mut(id).map(|e| &mut e.slot) {
            Some(Slot::Occupied(entity)) => Some(&mut **entity),
            _ => None,
        }
    }

    /// Presubstep order as of now; additions made during a pass are not in the snapshot
    pub fn presubstep_snapshot(&self) -> Vec<EntityId> {
        self.presubstep_order.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Marker(u32);

    impl Entity for Marker {}

    #[test]
    fn test_generation_bumps_on_reuse() {
        let mut registry = EntityRegistry::new();
        let a = registry.insert(Box::new(Marker(1)));
        assert!(registry.remove(a).is_some());
        let b = registry.insert(Box::new(Marker(2)));

        assert_eq!(a.index(), b.index());
        assert_ne!(a.generation(), b.generation());
        assert!(registry.get(a).is_none());
        assert!(registry.remove(a).is_none());

        let marker = registry.get(b).unwrap().as_any().downcast_ref::<Marker>();
        assert_eq!(marker.map(|m| m.0), Some(2));
    }

    #[test]
    fn test_removed_while_checked_out() {
        let mut registry = EntityRegistry::new();
        let id = registry.insert(Box::new(Marker(7)));

        let entity = registry.checkout(id).unwrap();
        assert!(registry.get(id).is_none());
        assert!(registry.checkout(id).is_none());
        assert!(registry.contains(id));

        assert!(registry.remove(id).is_none());
        assert!(!registry.contains(id));

        let rejected = registry.checkin(id, entity);
        assert!(rejected.is_some());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_presubstep_order() {
        let mut registry = EntityRegistry::new();
        let _plain = registry.insert(Box::new(Marker(0)));
        let first = registry.insert(Box::new(PresubstepFn(|_: &mut PhysicsWorld, _: f32| {})));
        let second = registry.insert(Box::new(PresubstepFn(|_: &mut PhysicsWorld, _: f32| {})));
        assert_eq!(registry.presubstep_snapshot(), vec![first, second]);

        registry.remove(first);
        assert_eq!(registry.presubstep_snapshot(), vec![second]);
    }
}
