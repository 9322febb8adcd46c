//! Persistent, ownable horses living in a chunked world.
//!
//! `HorseManager` keeps every horse record in step with at most one live
//! entity, spawns and stores horses as chunks load and unload, and runs the
//! breeding lifecycle (pregnancy, labor, birth, recovery) off a
//! once-per-second heartbeat. Storage, the world and permissions are
//! supplied by the host through `RecordStore`, `WorldAdapter` and
//! `Permissions`.

pub mod models;
pub mod config;
pub mod horse;
pub mod store;
pub mod world;
pub mod headless_world;
pub mod permissions;
pub mod entity_registry;
pub mod sessions;
pub mod global_tick;
pub mod husbandry;

pub use config::{ConfigError, HusbandryConfig};
pub use entity_registry::{ChunkSweep, EntityRegistry, RegistryError, SpawnedHorse};
pub use headless_world::{EntityId, HeadlessWorld};
pub use horse::{BreedError, HorseRecord};
pub use husbandry::{HeartbeatReport, HorseManager, LoadError, OwnershipError, Selection};
pub use models::{ChunkKey, HorseId, Location, PlayerId, Timestamp, WorldId};
pub use permissions::{CapabilityGrants, Permissions, LICENSED_VET};
pub use store::{MemoryRecordStore, RecordStore, StoreError};
pub use world::{EntityKind, EntityTag, WorldAdapter};
