use serde::{Serialize, Deserialize};
use std::fmt;

/// Chunks are 16 blocks wide on both horizontal axes.
pub const CHUNK_SHIFT: i32 = 4;

/// Stable identity of a persisted horse record.
#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct HorseId(pub u64);

impl fmt::Display for HorseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identity of a player (owner, initiator of a command, session holder).
#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player:{}", self.0)
    }
}

/// Identifier of a world (dimension) hosting chunks.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct WorldId(pub String);

impl WorldId {
    pub fn new(name: impl Into<String>) -> Self {
        WorldId(name.into())
    }
}

impl fmt::Display for WorldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Point in time delivered by the heartbeat, microseconds since the unix epoch.
#[derive(Serialize, Deserialize, Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    pub const UNIX_EPOCH: Timestamp = Timestamp(0);

    pub const fn from_micros_since_unix_epoch(micros: i64) -> Self {
        Timestamp(micros)
    }

    pub const fn from_secs_since_unix_epoch(secs: i64) -> Self {
        Timestamp(secs.saturating_mul(1_000_000))
    }

    pub const fn to_micros_since_unix_epoch(self) -> i64 {
        self.0
    }

    /// Whole seconds elapsed since `earlier`, zero if `earlier` is in the future.
    pub fn secs_since(self, earlier: Timestamp) -> u64 {
        (self.0.saturating_sub(earlier.0)).max(0) as u64 / 1_000_000
    }

    /// Saturates at the ends of the representable range.
    pub fn plus_secs(self, secs: u64) -> Self {
        Timestamp(self.0.saturating_add(secs_to_micros(secs)))
    }

    pub fn minus_secs(self, secs: u64) -> Self {
        Timestamp(self.0.saturating_sub(secs_to_micros(secs)))
    }
}

fn secs_to_micros(secs: u64) -> i64 {
    i64::try_from(secs).unwrap_or(i64::MAX).saturating_mul(1_000_000)
}

/// Position and orientation of something placed in a world.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Location {
    pub world: WorldId,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub pitch: f32,
    pub yaw: f32,
}

impl Location {
    pub fn new(world: WorldId, x: f64, y: f64, z: f64) -> Self {
        Location { world, x, y, z, pitch: 0.0, yaw: 0.0 }
    }

    pub fn chunk_x(&self) -> i32 {
        (self.x.floor() as i32) >> CHUNK_SHIFT
    }

    pub fn chunk_z(&self) -> i32 {
        (self.z.floor() as i32) >> CHUNK_SHIFT
    }

    pub fn chunk(&self) -> ChunkKey {
        ChunkKey::new(self.world.clone(), self.chunk_x(), self.chunk_z())
    }
}

/// Key of the per-chunk index: world plus chunk x/z packed into one `i64`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkKey {
    pub world: WorldId,
    pub packed: i64,
}

impl ChunkKey {
    pub fn new(world: WorldId, chunk_x: i32, chunk_z: i32) -> Self {
        ChunkKey { world, packed: pack_chunk_coords(chunk_x, chunk_z) }
    }

    pub fn chunk_x(&self) -> i32 {
        unpack_chunk_coords(self.packed).0
    }

    pub fn chunk_z(&self) -> i32 {
        unpack_chunk_coords(self.packed).1
    }
}

impl fmt::Display for ChunkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}, {}]", self.world, self.chunk_x(), self.chunk_z())
    }
}

/// Low 32 bits hold chunk x, high 32 bits hold chunk z.
pub fn pack_chunk_coords(chunk_x: i32, chunk_z: i32) -> i64 {
    (chunk_x as i64 & 0xffff_ffff) | ((chunk_z as i64 & 0xffff_ffff) << 32)
}

pub fn unpack_chunk_coords(packed: i64) -> (i32, i32) {
    (packed as i32, (packed >> 32) as i32)
}
