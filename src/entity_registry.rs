//! Binding between horse records and live world entities.
//!
//! Each record has at most one `SpawnedHorse`, and a `SpawnedHorse` holds at
//! most one live handle. Entities the registry spawns carry the marker tag
//! and their record id, so anything tagged that the registry does not know
//! about (left over from a crash, duplicated by the host) can be recognised
//! and removed.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt::Debug;
use std::hash::Hash;
use thiserror::Error;

use crate::horse::{breed_config, HorseRecord};
use crate::models::{ChunkKey, HorseId, Location};
use crate::store::{update_logged, RecordStore, StoreError};
use crate::world::{EntityTag, WorldAdapter};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("horse record has not been persisted and cannot be tagged")]
    Unpersisted,
    #[error("no horse record with id {0}")]
    UnknownHorse(HorseId),
    #[error("could not store the new horse: {0}")]
    Store(#[from] StoreError),
}

/// Runtime binding of one record to its (optional) live entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnedHorse<H> {
    pub horse_id: HorseId,
    handle: Option<H>,
}

impl<H: Copy> SpawnedHorse<H> {
    pub fn handle(&self) -> Option<H> {
        self.handle
    }

    pub fn is_live(&self) -> bool {
        self.handle.is_some()
    }
}

/// Counts from one chunk event, for logging and tests.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSweep {
    pub strays_removed: usize,
    pub respawned: usize,
    pub stored: usize,
}

#[derive(Debug)]
pub struct EntityRegistry<H> {
    marker: String,
    spawned: HashMap<HorseId, SpawnedHorse<H>>,
    by_handle: HashMap<H, HorseId>,
    chunk_index: HashMap<ChunkKey, BTreeSet<HorseId>>, // last known chunk of every placed record
    indexed_chunk: HashMap<HorseId, ChunkKey>,
}

impl<H: Copy + Eq + Hash + Debug> EntityRegistry<H> {
    pub fn new(marker: impl Into<String>) -> Self {
        EntityRegistry {
            marker: marker.into(),
            spawned: HashMap::new(),
            by_handle: HashMap::new(),
            chunk_index: HashMap::new(),
            indexed_chunk: HashMap::new(),
        }
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    // --- Lookups ---

    pub fn lookup_handle(&self, handle: H) -> Option<&SpawnedHorse<H>> {
        self.by_handle.get(&handle).and_then(|id| self.spawned.get(id))
    }

    pub fn lookup_record(&self, horse_id: HorseId) -> Option<&SpawnedHorse<H>> {
        self.spawned.get(&horse_id)
    }

    /// Records with a live handle, in id order.
    pub fn live_horses(&self) -> Vec<(HorseId, H)> {
        let mut live: Vec<(HorseId, H)> = self
            .spawned
            .values()
            .filter_map(|spawned| spawned.handle.map(|handle| (spawned.horse_id, handle)))
            .collect();
        live.sort_by_key(|(id, _)| *id);
        live
    }

    pub fn horses_in_chunk(&self, chunk: &ChunkKey) -> Vec<HorseId> {
        self.chunk_index.get(chunk).map(|ids| ids.iter().copied().collect()).unwrap_or_default()
    }

    pub fn spawned_count(&self) -> usize {
        self.spawned.len()
    }

    // --- Chunk index ---

    /// Files a record under the chunk of its last known location.
    pub fn index_record(&mut self, record: &HorseRecord) {
        if let (Some(horse_id), Some(location)) = (record.id, record.location.as_ref()) {
            self.place(horse_id, location);
        }
    }

    fn place(&mut self, horse_id: HorseId, location: &Location) {
        let chunk = location.chunk();
        if let Some(previous) = self.indexed_chunk.insert(horse_id, chunk.clone()) {
            if previous != chunk {
                self.remove_from_chunk(horse_id, &previous);
            }
        }
        self.chunk_index.entry(chunk).or_default().insert(horse_id);
    }

    fn unplace(&mut self, horse_id: HorseId) {
        if let Some(previous) = self.indexed_chunk.remove(&horse_id) {
            self.remove_from_chunk(horse_id, &previous);
        }
    }

    fn remove_from_chunk(&mut self, horse_id: HorseId, chunk: &ChunkKey) {
        if let Some(ids) = self.chunk_index.get_mut(chunk) {
            ids.remove(&horse_id);
            if ids.is_empty() {
                self.chunk_index.remove(chunk);
            }
        }
    }

    // --- Spawn / teleport / despawn ---

    /// Puts the record into the world at `location`.
    ///
    /// Any previous handle of the record is removed first, so a record never
    /// has two live entities. The new location is written into the record and
    /// persisted; a failed write is logged and the spawn still stands.
    pub fn spawn<W, S>(
        &mut self,
        world: &mut W,
        store: &mut S,
        record: &mut HorseRecord,
        location: Location,
    ) -> Result<SpawnedHorse<H>, RegistryError>
    where
        W: WorldAdapter<Handle = H>,
        S: RecordStore + ?Sized,
    {
        let horse_id = record.id.ok_or(RegistryError::Unpersisted)?;

        if let Some(previous) = self.spawned.get_mut(&horse_id).and_then(|spawned| spawned.handle.take()) {
            self.by_handle.remove(&previous);
            world.despawn_entity(previous);
            log::debug!("🐴 Replaced previous entity {:?} of horse {}", previous, horse_id);
        }

        let kind = breed_config(record.breed).entity_kind;
        let handle = world.spawn_entity(kind, &location, record);
        world.tag_entity(handle, EntityTag { marker: self.marker.clone(), horse_id });

        self.place(horse_id, &location);
        record.location = Some(location);
        let _ = update_logged(store, record, "spawn");

        let spawned = self.spawned.entry(horse_id).or_insert(SpawnedHorse { horse_id, handle: None });
        spawned.handle = Some(handle);
        let spawned = *spawned;
        self.by_handle.insert(handle, horse_id);

        log::debug!("🐴 Spawned horse {} as entity {:?}", record.label(), handle);
        Ok(spawned)
    }

    /// Moves the record's live entity, or spawns one if it has none.
    pub fn teleport<W, S>(
        &mut self,
        world: &mut W,
        store: &mut S,
        record: &mut HorseRecord,
        location: Location,
    ) -> Result<SpawnedHorse<H>, RegistryError>
    where
        W: WorldAdapter<Handle = H>,
        S: RecordStore + ?Sized,
    {
        let horse_id = record.id.ok_or(RegistryError::Unpersisted)?;
        let live = self
            .spawned
            .get(&horse_id)
            .and_then(|spawned| spawned.handle)
            .filter(|handle| world.is_valid(*handle));

        let Some(handle) = live else {
            return self.spawn(world, store, record, location);
        };

        world.teleport_entity(handle, &location);
        self.place(horse_id, &location);
        record.location = Some(location);
        let _ = update_logged(store, record, "teleport");
        self.spawned.get(&horse_id).copied().ok_or(RegistryError::UnknownHorse(horse_id))
    }

    /// Removes the record's live entity. Returns false if there was none.
    pub fn despawn<W>(&mut self, world: &mut W, horse_id: HorseId) -> bool
    where
        W: WorldAdapter<Handle = H>,
    {
        match self.spawned.get_mut(&horse_id).and_then(|spawned| spawned.handle.take()) {
            Some(handle) => {
                self.by_handle.remove(&handle);
                world.despawn_entity(handle);
                true
            }
            None => false,
        }
    }

    /// Drops every trace of a record that no longer exists.
    pub fn forget<W>(&mut self, world: &mut W, horse_id: HorseId)
    where
        W: WorldAdapter<Handle = H>,
    {
        self.despawn(world, horse_id);
        self.spawned.remove(&horse_id);
        self.unplace(horse_id);
    }

    // --- Self-healing ---

    /// Checks an entity met in the world. A marker-tagged entity that is not
    /// the registry's live handle for its tagged record is removed.
    /// Returns false when the entity was removed.
    pub fn validate_entity<W>(&mut self, world: &mut W, handle: H) -> bool
    where
        W: WorldAdapter<Handle = H>,
    {
        let Some(tag) = world.tag_of(handle) else {
            return true;
        };
        if tag.marker != self.marker {
            return true;
        }

        let tracked = self.by_handle.get(&handle).copied();
        let current = self.spawned.get(&tag.horse_id).and_then(|spawned| spawned.handle);
        if tracked == Some(tag.horse_id) && current == Some(handle) {
            return true;
        }

        log::warn!(
            "🐴 Removing stray entity {:?} tagged as horse {} (registry holds {:?})",
            handle, tag.horse_id, current
        );
        if let Some(owner_id) = tracked {
            self.by_handle.remove(&handle);
            if let Some(spawned) = self.spawned.get_mut(&owner_id) {
                if spawned.handle == Some(handle) {
                    spawned.handle = None;
                }
            }
        }
        world.despawn_entity(handle);
        false
    }

    // --- Chunk events ---

    /// Removes stray tagged entities in the chunk, then respawns every record
    /// last seen in it that has no live entity.
    pub fn on_chunk_load<W, S>(
        &mut self,
        world: &mut W,
        store: &mut S,
        records: &mut BTreeMap<HorseId, HorseRecord>,
        chunk: &ChunkKey,
    ) -> ChunkSweep
    where
        W: WorldAdapter<Handle = H>,
        S: RecordStore + ?Sized,
    {
        let mut sweep = ChunkSweep::default();

        for handle in world.entities_in_chunk(chunk) {
            if !self.validate_entity(world, handle) {
                sweep.strays_removed += 1;
            }
        }

        for horse_id in self.horses_in_chunk(chunk) {
            let live = self
                .spawned
                .get(&horse_id)
                .and_then(|spawned| spawned.handle)
                .map_or(false, |handle| world.is_valid(handle));
            if live {
                continue;
            }
            let Some(record) = records.get_mut(&horse_id) else {
                log::warn!("🐴 Chunk {} indexed horse {} which has no record", chunk, horse_id);
                self.unplace(horse_id);
                continue;
            };
            let Some(location) = record.location.clone() else {
                self.unplace(horse_id);
                continue;
            };
            if location.chunk() != *chunk {
                self.place(horse_id, &location);
                continue;
            }
            match self.spawn(world, store, record, location) {
                Ok(_) => sweep.respawned += 1,
                Err(e) => log::error!("🐴 Could not respawn horse {} in chunk {}: {}", horse_id, chunk, e),
            }
        }

        if sweep.strays_removed > 0 {
            log::info!("🐴 Chunk {} loaded: removed {} stray horse entities", chunk, sweep.strays_removed);
        }
        log::debug!("🐴 Chunk {} loaded: respawned {} horses", chunk, sweep.respawned);
        sweep
    }

    /// Saves where each tracked horse in the chunk stands and takes it out of
    /// the world. The `SpawnedHorse` stays for the next load.
    pub fn on_chunk_unload<W, S>(
        &mut self,
        world: &mut W,
        store: &mut S,
        records: &mut BTreeMap<HorseId, HorseRecord>,
        chunk: &ChunkKey,
    ) -> ChunkSweep
    where
        W: WorldAdapter<Handle = H>,
        S: RecordStore + ?Sized,
    {
        let mut sweep = ChunkSweep::default();

        for handle in world.entities_in_chunk(chunk) {
            let Some(tag) = world.tag_of(handle) else {
                continue;
            };
            if tag.marker != self.marker {
                continue;
            }
            if !self.validate_entity(world, handle) {
                sweep.strays_removed += 1;
                continue;
            }

            self.store_and_remove(world, store, records, tag.horse_id, handle, "chunk unload");
            sweep.stored += 1;
        }

        log::debug!("🐴 Chunk {} unloaded: stored {} horses", chunk, sweep.stored);
        sweep
    }

    /// Persists every live horse's position and removes it from the world,
    /// then clears all indices. Used on shutdown.
    pub fn teardown<W, S>(&mut self, world: &mut W, store: &mut S, records: &mut BTreeMap<HorseId, HorseRecord>) -> usize
    where
        W: WorldAdapter<Handle = H>,
        S: RecordStore + ?Sized,
    {
        let live = self.live_horses();
        for (horse_id, handle) in &live {
            self.store_and_remove(world, store, records, *horse_id, *handle, "shutdown");
        }
        self.spawned.clear();
        self.by_handle.clear();
        self.chunk_index.clear();
        self.indexed_chunk.clear();
        live.len()
    }

    fn store_and_remove<W, S>(
        &mut self,
        world: &mut W,
        store: &mut S,
        records: &mut BTreeMap<HorseId, HorseRecord>,
        horse_id: HorseId,
        handle: H,
        context: &str,
    ) where
        W: WorldAdapter<Handle = H>,
        S: RecordStore + ?Sized,
    {
        match records.get_mut(&horse_id) {
            Some(record) => {
                if let Some(location) = world.location_of(handle) {
                    self.place(horse_id, &location);
                    record.location = Some(location);
                }
                let _ = update_logged(store, record, context);
            }
            None => log::warn!("🐴 Live entity {:?} belongs to horse {} which has no record", handle, horse_id),
        }
        self.despawn(world, horse_id);
    }
}
