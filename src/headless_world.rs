//! In-memory world with no rendering or physics.
//!
//! Used for dry runs of the husbandry core and by the test suites. Entities
//! only have a kind, a location and an optional tag; chunk loading is plain
//! bookkeeping and the caller forwards the matching events to the manager.

use std::collections::{BTreeMap, BTreeSet};

use crate::horse::HorseRecord;
use crate::models::{ChunkKey, HorseId, Location};
use crate::world::{EntityKind, EntityTag, WorldAdapter};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

#[derive(Clone, Debug, PartialEq)]
pub struct HeadlessEntity {
    pub kind: EntityKind,
    pub location: Location,
    pub tag: Option<EntityTag>,
    pub jump_strength: f64,
    pub movement_speed: f64,
}

#[derive(Debug, Default)]
pub struct HeadlessWorld {
    entities: BTreeMap<EntityId, HeadlessEntity>,
    loaded: BTreeSet<ChunkKey>,
    next_entity: u64,
}

impl HeadlessWorld {
    pub fn new() -> Self {
        HeadlessWorld::default()
    }

    pub fn load_chunk(&mut self, chunk: ChunkKey) {
        self.loaded.insert(chunk);
    }

    pub fn unload_chunk(&mut self, chunk: &ChunkKey) {
        self.loaded.remove(chunk);
    }

    pub fn is_chunk_loaded(&self, chunk: &ChunkKey) -> bool {
        self.loaded.contains(chunk)
    }

    pub fn entity(&self, handle: EntityId) -> Option<&HeadlessEntity> {
        self.entities.get(&handle)
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Live entities tagged with the given record id, whatever their marker.
    pub fn tagged_with(&self, horse_id: HorseId) -> Vec<EntityId> {
        self.entities
            .iter()
            .filter(|(_, entity)| entity.tag.as_ref().map_or(false, |tag| tag.horse_id == horse_id))
            .map(|(handle, _)| *handle)
            .collect()
    }

    /// Moves an entity the way its own wandering would, without telling the registry.
    pub fn move_entity(&mut self, handle: EntityId, location: Location) -> bool {
        match self.entities.get_mut(&handle) {
            Some(entity) => {
                entity.location = location;
                true
            }
            None => false,
        }
    }

    /// Removes an entity behind the registry's back (death, host cleanup).
    pub fn kill(&mut self, handle: EntityId) -> Option<HeadlessEntity> {
        self.entities.remove(&handle)
    }

    /// Places an entity that no registry spawned, e.g. one left over from a crash.
    pub fn spawn_stray(&mut self, kind: EntityKind, location: Location, tag: Option<EntityTag>) -> EntityId {
        let handle = self.allocate();
        self.entities.insert(handle, HeadlessEntity { kind, location, tag, jump_strength: 0.0, movement_speed: 0.0 });
        handle
    }

    fn allocate(&mut self) -> EntityId {
        self.next_entity += 1;
        EntityId(self.next_entity)
    }
}

impl WorldAdapter for HeadlessWorld {
    type Handle = EntityId;

    fn loaded_chunks(&self) -> Vec<ChunkKey> {
        self.loaded.iter().cloned().collect()
    }

    fn spawn_entity(&mut self, kind: EntityKind, location: &Location, record: &HorseRecord) -> EntityId {
        let handle = self.allocate();
        self.entities.insert(handle, HeadlessEntity {
            kind,
            location: location.clone(),
            tag: None,
            jump_strength: record.jump_strength,
            movement_speed: record.movement_speed,
        });
        handle
    }

    fn despawn_entity(&mut self, handle: EntityId) {
        self.entities.remove(&handle);
    }

    fn teleport_entity(&mut self, handle: EntityId, location: &Location) {
        if let Some(entity) = self.entities.get_mut(&handle) {
            entity.location = location.clone();
        }
    }

    fn tag_entity(&mut self, handle: EntityId, tag: EntityTag) {
        if let Some(entity) = self.entities.get_mut(&handle) {
            entity.tag = Some(tag);
        }
    }

    fn tag_of(&self, handle: EntityId) -> Option<EntityTag> {
        self.entities.get(&handle).and_then(|entity| entity.tag.clone())
    }

    fn entities_in_chunk(&self, chunk: &ChunkKey) -> Vec<EntityId> {
        self.entities
            .iter()
            .filter(|(_, entity)| entity.location.chunk() == *chunk)
            .map(|(handle, _)| *handle)
            .collect()
    }

    fn location_of(&self, handle: EntityId) -> Option<Location> {
        self.entities.get(&handle).map(|entity| entity.location.clone())
    }

    fn is_valid(&self, handle: EntityId) -> bool {
        self.entities.contains_key(&handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WorldId;

    fn at(x: f64, z: f64) -> Location {
        Location::new(WorldId::new("overworld"), x, 64.0, z)
    }

    #[test]
    fn entities_are_found_by_chunk() {
        let mut world = HeadlessWorld::new();
        let a = world.spawn_stray(EntityKind::Horse, at(1.0, 1.0), None);
        let b = world.spawn_stray(EntityKind::Horse, at(20.0, 1.0), None);
        let chunk = at(1.0, 1.0).chunk();
        assert_eq!(world.entities_in_chunk(&chunk), vec![a]);

        world.move_entity(b, at(15.0, 15.0));
        assert_eq!(world.entities_in_chunk(&chunk), vec![a, b]);
    }

    #[test]
    fn despawning_a_stale_handle_is_harmless() {
        let mut world = HeadlessWorld::new();
        let a = world.spawn_stray(EntityKind::Mule, at(0.0, 0.0), None);
        world.despawn_entity(a);
        world.despawn_entity(a);
        assert!(!world.is_valid(a));
        assert_eq!(world.entity_count(), 0);
    }
}
