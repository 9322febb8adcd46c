#![allow(dead_code)]

use horse_husbandry::horse::{Breed, CoatColor, Gender, HorseRecord, Markings};
use horse_husbandry::{
    CapabilityGrants, EntityId, HeadlessWorld, HorseId, HorseManager, HusbandryConfig, Location, MemoryRecordStore,
    PlayerId, RecordStore, StoreError, Timestamp, WorldId, LICENSED_VET,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

pub type Manager = HorseManager<FlakyStore, HeadlessWorld, CapabilityGrants, ChaCha8Rng>;

pub const VET: PlayerId = PlayerId(1);
pub const STRANGER: PlayerId = PlayerId(2);

/// Memory store whose writes can be switched to fail.
#[derive(Debug, Default)]
pub struct FlakyStore {
    pub inner: MemoryRecordStore,
    pub fail_updates: bool,
    pub fail_inserts: bool,
    pub updates: usize,
}

impl FlakyStore {
    pub fn new() -> Self {
        FlakyStore { inner: MemoryRecordStore::new(), ..FlakyStore::default() }
    }

    pub fn stored(&self, id: HorseId) -> HorseRecord {
        self.inner.get(id).expect("stored record")
    }
}

impl RecordStore for FlakyStore {
    fn load_all(&mut self) -> Result<Vec<HorseRecord>, StoreError> {
        self.inner.load_all()
    }

    fn insert(&mut self, record: &mut HorseRecord) -> Result<HorseId, StoreError> {
        if self.fail_inserts {
            return Err(StoreError::Backend("disk full".to_string()));
        }
        self.inner.insert(record)
    }

    fn update(&mut self, record: &HorseRecord) -> Result<(), StoreError> {
        if self.fail_updates {
            return Err(StoreError::Backend("connection lost".to_string()));
        }
        self.updates += 1;
        self.inner.update(record)
    }

    fn delete(&mut self, id: HorseId) -> Result<(), StoreError> {
        self.inner.delete(id)
    }
}

pub fn at(x: f64, z: f64) -> Location {
    Location::new(WorldId::new("overworld"), x, 64.0, z)
}

pub fn adult(gender: Gender) -> HorseRecord {
    HorseRecord::new(Breed::Thoroughbred, gender, CoatColor::Chestnut, Markings::None, 0.6, 0.3, Timestamp::UNIX_EPOCH)
}

/// Stores a record standing at `location` and returns its id.
pub fn store_horse(store: &mut FlakyStore, mut record: HorseRecord, location: Location) -> HorseId {
    record.location = Some(location);
    store.insert(&mut record).expect("insert")
}

/// Loads a manager over `store` with the chunks of `loaded` already loaded.
pub fn load(store: FlakyStore, loaded: &[Location]) -> Manager {
    load_with(HusbandryConfig::default(), store, loaded)
}

pub fn load_with(config: HusbandryConfig, store: FlakyStore, loaded: &[Location]) -> Manager {
    let mut world = HeadlessWorld::new();
    for location in loaded {
        world.load_chunk(location.chunk());
    }
    let mut grants = CapabilityGrants::new();
    grants.grant(VET, LICENSED_VET);
    HorseManager::load(config, store, world, grants, ChaCha8Rng::seed_from_u64(2024)).expect("load")
}

/// A loaded manager with one spawned mare and one spawned stallion, both ready.
pub fn breeding_pair() -> (Manager, (HorseId, EntityId), (HorseId, EntityId)) {
    breeding_pair_with(HusbandryConfig::default())
}

/// Gestation and labor short enough to run to birth in a test.
pub fn quick_config() -> HusbandryConfig {
    HusbandryConfig {
        pregnancy_min_secs: 5,
        pregnancy_max_secs: 6,
        labor_segment_max_secs: 2,
        ..HusbandryConfig::default()
    }
}

pub fn breeding_pair_with(config: HusbandryConfig) -> (Manager, (HorseId, EntityId), (HorseId, EntityId)) {
    let mut store = FlakyStore::new();
    let mare_id = store_horse(&mut store, adult(Gender::Mare), at(3.0, 3.0));
    let mut stallion = adult(Gender::Stallion);
    stallion.jump_strength = 0.8;
    let stallion_id = store_horse(&mut store, stallion, at(5.0, 3.0));

    let manager = load_with(config, store, &[at(3.0, 3.0)]);
    let mare = manager.handle_of(mare_id).expect("mare spawned");
    let stallion = manager.handle_of(stallion_id).expect("stallion spawned");
    (manager, (mare_id, mare), (stallion_id, stallion))
}

pub fn now() -> Timestamp {
    Timestamp::from_secs_since_unix_epoch(1_700_000_000)
}
