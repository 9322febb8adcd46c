use serde::{Serialize, Deserialize};
use std::fmt::Debug;
use std::hash::Hash;

use crate::horse::HorseRecord;
use crate::models::{ChunkKey, HorseId, Location};

/// Kind of living entity the host spawns for a record.
#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Horse,
    Donkey,
    Mule,
}

/// Marker plus record id stamped on a spawned entity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntityTag {
    pub marker: String,
    pub horse_id: HorseId,
}

/// The host world as seen by the husbandry core.
///
/// Chunk load/unload notifications are not part of this trait: the host
/// forwards them to `HorseManager::on_chunk_load` / `on_chunk_unload`.
pub trait WorldAdapter {
    type Handle: Copy + Eq + Hash + Debug;

    /// Chunks already loaded when the manager starts.
    fn loaded_chunks(&self) -> Vec<ChunkKey>;

    /// Spawns a live entity initialised from `record` (appearance, stats, equipment).
    fn spawn_entity(&mut self, kind: EntityKind, location: &Location, record: &HorseRecord) -> Self::Handle;

    /// Removes the entity. A stale handle is a no-op.
    fn despawn_entity(&mut self, handle: Self::Handle);

    fn teleport_entity(&mut self, handle: Self::Handle, location: &Location);

    fn tag_entity(&mut self, handle: Self::Handle, tag: EntityTag);

    fn tag_of(&self, handle: Self::Handle) -> Option<EntityTag>;

    fn entities_in_chunk(&self, chunk: &ChunkKey) -> Vec<Self::Handle>;

    fn location_of(&self, handle: Self::Handle) -> Option<Location>;

    /// False once the entity died or was removed by the host.
    fn is_valid(&self, handle: Self::Handle) -> bool;
}
