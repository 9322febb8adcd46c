/******************************************************************************
 *                                                                            *
 * Horse Manager - single owner of records, live entities and breeding       *
 *                                                                            *
 * Host events (chunk load/unload, entity death, player quit, heartbeat) and  *
 * player actions (breed, claim, rename, transfer) all enter here. Every      *
 * mutation of a record is followed by a store write in the same call.        *
 *                                                                            *
 ******************************************************************************/

use std::collections::BTreeMap;
use rand::Rng;
use thiserror::Error;

use crate::config::{ConfigError, HusbandryConfig};
use crate::entity_registry::{ChunkSweep, EntityRegistry, RegistryError, SpawnedHorse};
use crate::global_tick::GlobalTick;
use crate::horse::{
    advance_age, check_pair, conceive, derive_child, roll_wild_horse, tick_breeding, Breed, BreedError,
    BreedingStage, Conception, HorseRecord, Owner, Pairing, TickOutcome, MAX_BODY_CONDITION,
};
use crate::models::{ChunkKey, HorseId, Location, PlayerId, Timestamp};
use crate::permissions::{Permissions, LICENSED_VET};
use crate::sessions::BreedingSessions;
use crate::store::{update_logged, RecordStore, StoreError};
use crate::world::WorldAdapter;

/// Longest name a horse can be given.
pub const MAX_NAME_LEN: usize = 32;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("could not load horse records: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum OwnershipError {
    #[error("that horse is not tracked")]
    Untracked,
    #[error("horse {0} already has an owner")]
    AlreadyOwned(HorseId),
    #[error("you do not own horse {0}")]
    NotOwner(HorseId),
    #[error("invalid horse name: {0}")]
    InvalidName(String),
    #[error("ownership changed but could not be saved: {0}")]
    Persistence(#[from] StoreError),
}

/// Outcome of one pick in a two-step breeding selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// First horse remembered; waiting for the second.
    First(HorseId),
    Bred(Conception),
}

/// What one heartbeat did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HeartbeatReport {
    pub tick: u64,
    pub ticked: usize,
    pub births: Vec<HorseId>,
    pub matured: usize,
    pub sessions_expired: usize,
}

pub struct HorseManager<S, W, P, R>
where
    W: WorldAdapter,
{
    config: HusbandryConfig,
    store: S,
    world: W,
    permissions: P,
    rng: R,
    records: BTreeMap<HorseId, HorseRecord>,
    registry: EntityRegistry<W::Handle>,
    sessions: BreedingSessions,
    tick: GlobalTick,
}

impl<S, W, P, R> HorseManager<S, W, P, R>
where
    S: RecordStore,
    W: WorldAdapter,
    P: Permissions,
    R: Rng,
{
    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Loads every stored record, indexes them by chunk and spawns the horses
    /// standing in chunks that are already loaded. The config is validated
    /// first; nothing is read from the store if it is rejected.
    pub fn load(config: HusbandryConfig, mut store: S, world: W, permissions: P, rng: R) -> Result<Self, LoadError> {
        config.validate()?;
        let loaded = store.load_all()?;
        let mut registry = EntityRegistry::new(config.entity_marker.clone());
        let mut records = BTreeMap::new();

        for record in loaded {
            let Some(horse_id) = record.id else {
                log::warn!("🐴 Skipping stored horse without an id: {}", record.label());
                continue;
            };
            if let Err(reason) = record.validate() {
                log::warn!("🐴 Stored horse {} is inconsistent ({}); keeping it as is", horse_id, reason);
            }
            registry.index_record(&record);
            records.insert(horse_id, record);
        }

        let mut manager = HorseManager {
            config,
            store,
            world,
            permissions,
            rng,
            records,
            registry,
            sessions: BreedingSessions::new(),
            tick: GlobalTick::new(),
        };

        for chunk in manager.world.loaded_chunks() {
            manager.on_chunk_load(&chunk);
        }

        log::info!(
            "🐴 Loaded {} horse records, {} spawned in loaded chunks",
            manager.records.len(),
            manager.registry.live_horses().len()
        );
        Ok(manager)
    }

    /// Stores the position of every live horse and removes it from the world.
    pub fn shutdown(&mut self) -> usize {
        let stored = self.registry.teardown(&mut self.world, &mut self.store, &mut self.records);
        self.sessions.clear();
        log::info!("🐴 Husbandry shut down: stored and removed {} live horses", stored);
        stored
    }

    /// Hands back the store and the world, e.g. to load them again.
    pub fn into_parts(self) -> (S, W, P, R) {
        (self.store, self.world, self.permissions, self.rng)
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    pub fn config(&self) -> &HusbandryConfig {
        &self.config
    }

    pub fn record(&self, horse_id: HorseId) -> Option<&HorseRecord> {
        self.records.get(&horse_id)
    }

    pub fn records(&self) -> impl Iterator<Item = &HorseRecord> {
        self.records.values()
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Record behind a live entity, if the entity is one of ours.
    pub fn record_for_handle(&self, handle: W::Handle) -> Option<&HorseRecord> {
        self.tracked_id(handle).and_then(|horse_id| self.records.get(&horse_id))
    }

    pub fn spawned(&self, horse_id: HorseId) -> Option<&SpawnedHorse<W::Handle>> {
        self.registry.lookup_record(horse_id)
    }

    pub fn handle_of(&self, horse_id: HorseId) -> Option<W::Handle> {
        self.registry.lookup_record(horse_id).and_then(|spawned| spawned.handle())
    }

    pub fn registry(&self) -> &EntityRegistry<W::Handle> {
        &self.registry
    }

    pub fn sessions(&self) -> &BreedingSessions {
        &self.sessions
    }

    pub fn tick_count(&self) -> u64 {
        self.tick.count()
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn permissions_mut(&mut self) -> &mut P {
        &mut self.permissions
    }

    fn tracked_id(&self, handle: W::Handle) -> Option<HorseId> {
        self.registry
            .lookup_handle(handle)
            .filter(|spawned| spawned.handle() == Some(handle))
            .map(|spawned| spawned.horse_id)
            .filter(|horse_id| self.records.contains_key(horse_id))
    }

    /// Looks up the horse behind an entity handed in by the host. A
    /// marker-tagged entity the registry does not hold is removed on the spot.
    fn resolve_handle(&mut self, handle: W::Handle) -> Option<HorseId> {
        if !self.registry.validate_entity(&mut self.world, handle) {
            return None;
        }
        self.tracked_id(handle)
    }

    // =========================================================================
    // PLACEMENT
    // =========================================================================

    pub fn spawn(&mut self, horse_id: HorseId, location: Location) -> Result<SpawnedHorse<W::Handle>, RegistryError> {
        let record = self.records.get_mut(&horse_id).ok_or(RegistryError::UnknownHorse(horse_id))?;
        self.registry.spawn(&mut self.world, &mut self.store, record, location)
    }

    pub fn teleport(&mut self, horse_id: HorseId, location: Location) -> Result<SpawnedHorse<W::Handle>, RegistryError> {
        let record = self.records.get_mut(&horse_id).ok_or(RegistryError::UnknownHorse(horse_id))?;
        self.registry.teleport(&mut self.world, &mut self.store, record, location)
    }

    /// Takes the horse out of the world, keeping its record. Idempotent.
    pub fn despawn(&mut self, horse_id: HorseId) -> bool {
        self.registry.despawn(&mut self.world, horse_id)
    }

    /// Rolls a new adult horse of `breed`, stores it and spawns it.
    pub fn spawn_wild(&mut self, breed: Breed, location: Location, now: Timestamp) -> Result<HorseId, RegistryError> {
        let mut record = roll_wild_horse(breed, now, self.config.adult_after_secs, &mut self.rng);
        let horse_id = self.store.insert(&mut record)?;
        log::info!(
            "🐴 Spawned wild {:?} {} ({:?} {:?}) at {:.1}, {:.1}",
            breed, horse_id, record.gender, record.color, location.x, location.z
        );
        let record = self.records.entry(horse_id).or_insert(record);
        self.registry.spawn(&mut self.world, &mut self.store, record, location)?;
        Ok(horse_id)
    }

    // =========================================================================
    // HOST EVENTS
    // =========================================================================

    pub fn on_chunk_load(&mut self, chunk: &ChunkKey) -> ChunkSweep {
        self.registry.on_chunk_load(&mut self.world, &mut self.store, &mut self.records, chunk)
    }

    pub fn on_chunk_unload(&mut self, chunk: &ChunkKey) -> ChunkSweep {
        self.registry.on_chunk_unload(&mut self.world, &mut self.store, &mut self.records, chunk)
    }

    /// A tracked horse died: its record is deleted and every reference to it
    /// dropped. Pregnancies it fathered end through the missing-father path.
    pub fn on_entity_death(&mut self, handle: W::Handle) -> Option<HorseId> {
        let horse_id = self.resolve_handle(handle)?;

        self.registry.forget(&mut self.world, horse_id);
        self.sessions.forget_horse(horse_id);
        let record = self.records.remove(&horse_id);
        if let Err(e) = self.store.delete(horse_id) {
            log::error!("🐴 Failed to delete dead horse {} from the store: {}", horse_id, e);
        }

        let label = record.map(|r| r.label()).unwrap_or_else(|| horse_id.to_string());
        log::info!("🐴 Horse {} died and was removed", label);
        Some(horse_id)
    }

    pub fn on_player_quit(&mut self, player: PlayerId) {
        if self.sessions.cancel(player) {
            log::debug!("🐴 Dropped breeding selection of {} on quit", player);
        }
    }

    // =========================================================================
    // BREEDING
    // =========================================================================

    /// Breeds the two horses behind `first` and `second`.
    ///
    /// Checks, in order: both tracked, initiator licensed, one mare and one
    /// stallion, both adult, mare not pregnant, both ready. A failed check
    /// changes nothing. A failed save keeps the pregnancy and is reported.
    pub fn breed(
        &mut self,
        first: W::Handle,
        second: W::Handle,
        initiator: PlayerId,
        now: Timestamp,
    ) -> Result<Conception, BreedError> {
        let (Some(first_id), Some(second_id)) = (self.resolve_handle(first), self.resolve_handle(second)) else {
            return Err(BreedError::Feral);
        };
        if !self.permissions.has_capability(initiator, LICENSED_VET) {
            return Err(BreedError::NotLicensed);
        }
        if first_id == second_id {
            return Err(BreedError::SameHorse);
        }

        let (Some(first_record), Some(second_record)) = (self.records.get(&first_id), self.records.get(&second_id)) else {
            return Err(BreedError::Feral);
        };
        let (mut mother, mut father) = match check_pair(first_record, second_record)? {
            Pairing::FirstIsMother => (first_record.clone(), second_record.clone()),
            Pairing::SecondIsMother => (second_record.clone(), first_record.clone()),
        };

        let conception = conceive(&mut mother, &mut father, now, &self.config, &mut self.rng)?;
        let mother_saved = update_logged(&mut self.store, &mother, "conception");
        let father_saved = update_logged(&mut self.store, &father, "breeding");
        self.records.insert(conception.mother_id, mother);
        self.records.insert(conception.father_id, father);

        mother_saved?;
        father_saved?;
        Ok(conception)
    }

    /// Two-step breeding: the first pick is remembered for the session
    /// timeout, the second breeds the pair.
    pub fn select_for_breeding(
        &mut self,
        actor: PlayerId,
        handle: W::Handle,
        now: Timestamp,
    ) -> Result<Selection, BreedError> {
        let horse_id = self.resolve_handle(handle).ok_or(BreedError::Feral)?;
        if !self.permissions.has_capability(actor, LICENSED_VET) {
            return Err(BreedError::NotLicensed);
        }

        let Some(first) = self.sessions.take(actor, now) else {
            self.sessions.select(actor, horse_id, now.plus_secs(self.config.session_timeout_secs));
            log::debug!("🐴 {} selected horse {} for breeding", actor, horse_id);
            return Ok(Selection::First(horse_id));
        };

        if first.horse_id == horse_id {
            self.sessions.select(actor, first.horse_id, first.expires_at);
            return Err(BreedError::SameHorse);
        }
        let first_handle = self.handle_of(first.horse_id).ok_or(BreedError::Feral)?;
        self.breed(first_handle, handle, actor, now).map(Selection::Bred)
    }

    /// Vet assessment of body condition, clamped to the 0..=9 scale.
    pub fn set_body_condition(&mut self, horse_id: HorseId, score: u8) -> Result<u8, StoreError> {
        let record = self.records.get_mut(&horse_id).ok_or(StoreError::Missing(horse_id))?;
        record.body_condition = score.min(MAX_BODY_CONDITION);
        update_logged(&mut self.store, record, "body condition check")?;
        Ok(record.body_condition)
    }

    // =========================================================================
    // OWNERSHIP
    // =========================================================================

    pub fn claim(
        &mut self,
        handle: W::Handle,
        player: PlayerId,
        display_name: &str,
        horse_name: &str,
    ) -> Result<HorseId, OwnershipError> {
        let horse_id = self.resolve_handle(handle).ok_or(OwnershipError::Untracked)?;
        let name = valid_name(horse_name)?;
        let record = self.records.get_mut(&horse_id).ok_or(OwnershipError::Untracked)?;
        if record.owner.is_some() {
            return Err(OwnershipError::AlreadyOwned(horse_id));
        }

        record.owner = Some(Owner { player, display_name: display_name.to_string() });
        record.name = Some(name);
        log::info!("🐴 {} claimed horse {}", display_name, record.label());
        update_logged(&mut self.store, record, "claim")?;
        Ok(horse_id)
    }

    pub fn rename(&mut self, handle: W::Handle, player: PlayerId, name: &str) -> Result<(), OwnershipError> {
        let horse_id = self.resolve_handle(handle).ok_or(OwnershipError::Untracked)?;
        let name = valid_name(name)?;
        let record = self.records.get_mut(&horse_id).ok_or(OwnershipError::Untracked)?;
        if !record.is_owned_by(player) {
            return Err(OwnershipError::NotOwner(horse_id));
        }

        record.name = Some(name);
        update_logged(&mut self.store, record, "rename")?;
        Ok(())
    }

    pub fn transfer(
        &mut self,
        handle: W::Handle,
        from: PlayerId,
        to: PlayerId,
        display_name: &str,
    ) -> Result<(), OwnershipError> {
        let horse_id = self.resolve_handle(handle).ok_or(OwnershipError::Untracked)?;
        let record = self.records.get_mut(&horse_id).ok_or(OwnershipError::Untracked)?;
        if !record.is_owned_by(from) {
            return Err(OwnershipError::NotOwner(horse_id));
        }

        record.owner = Some(Owner { player: to, display_name: display_name.to_string() });
        log::info!("🐴 Horse {} transferred from {} to {}", record.label(), from, to);
        update_logged(&mut self.store, record, "transfer")?;
        Ok(())
    }

    // =========================================================================
    // HEARTBEAT
    // =========================================================================

    /// Runs once per simulated second.
    ///
    /// Every live horse that is not ready is ticked once, one after another;
    /// each tick is saved and a birth is spawned before the next horse runs.
    /// Maturation runs every `age_check_interval_ticks` heartbeats.
    pub fn heartbeat(&mut self, now: Timestamp) -> HeartbeatReport {
        let tick = self.tick.advance(now);
        let mut report = HeartbeatReport { tick, ..HeartbeatReport::default() };

        for (horse_id, handle) in self.registry.live_horses() {
            if !self.world.is_valid(handle) {
                log::warn!("🐴 Entity {:?} of horse {} vanished without notice; clearing it", handle, horse_id);
                self.registry.despawn(&mut self.world, horse_id);
                continue;
            }
            if self.tick_horse(horse_id, handle, now, &mut report) {
                report.ticked += 1;
            }
        }

        if self.tick.is_due(self.config.age_check_interval_ticks) {
            report.matured = self.advance_ages(now);
        }
        report.sessions_expired = self.sessions.purge_expired(now);
        report
    }

    /// Returns false for ready or unknown horses, which are not ticked.
    fn tick_horse(&mut self, horse_id: HorseId, handle: W::Handle, now: Timestamp, report: &mut HeartbeatReport) -> bool {
        let partner = match self.records.get(&horse_id) {
            Some(record) if record.breeding_stage != BreedingStage::Ready => {
                record.pregnancy.as_ref().map(|pregnancy| pregnancy.partner_id)
            }
            _ => return false,
        };
        let father_alive = partner.map_or(false, |father_id| self.records.contains_key(&father_id));

        let Some(record) = self.records.get_mut(&horse_id) else {
            return false;
        };
        let outcome = tick_breeding(record, &self.config, &mut self.rng, |_| father_alive);
        let _ = update_logged(&mut self.store, record, "breeding tick");

        if let TickOutcome::Delivered { father_id, premature } = outcome {
            if let Some(foal_id) = self.deliver_foal(horse_id, handle, father_id, premature, now) {
                report.births.push(foal_id);
            }
        }
        true
    }

    fn deliver_foal(
        &mut self,
        mother_id: HorseId,
        mother_handle: W::Handle,
        father_id: HorseId,
        premature: bool,
        now: Timestamp,
    ) -> Option<HorseId> {
        let (Some(mother), Some(father)) = (self.records.get(&mother_id), self.records.get(&father_id)) else {
            log::warn!("🐴 Birth of mare {} skipped: a parent record is gone", mother_id);
            return None;
        };
        let mut foal = derive_child(mother, father, now, &mut self.rng);
        let location = self.world.location_of(mother_handle).or_else(|| mother.location.clone());

        let foal_id = match self.store.insert(&mut foal) {
            Ok(foal_id) => foal_id,
            Err(e) => {
                log::error!("🐴 Foal of mare {} could not be stored and was lost: {}", mother_id, e);
                return None;
            }
        };
        if premature {
            log::info!("🐴 Foal {} of mare {} was born premature", foal_id, mother_id);
        }
        log::info!(
            "🐴 Mare {} gave birth to {:?} {:?} foal {} (sire {})",
            mother_id, foal.breed, foal.gender, foal_id, father_id
        );

        let foal = self.records.entry(foal_id).or_insert(foal);
        match location {
            Some(location) => {
                if let Err(e) = self.registry.spawn(&mut self.world, &mut self.store, foal, location) {
                    log::error!("🐴 Could not spawn foal {}: {}", foal_id, e);
                }
            }
            None => log::warn!("🐴 Mare {} has no location; foal {} stays unplaced", mother_id, foal_id),
        }
        Some(foal_id)
    }

    /// Recomputes age stages from birth times. Returns how many advanced.
    pub fn advance_ages(&mut self, now: Timestamp) -> usize {
        let mut advanced = 0;
        for record in self.records.values_mut() {
            if advance_age(record, now, &self.config).is_some() {
                let _ = update_logged(&mut self.store, record, "maturation");
                advanced += 1;
            }
        }
        advanced
    }
}

fn valid_name(name: &str) -> Result<String, OwnershipError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(OwnershipError::InvalidName("name must not be empty".to_string()));
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(OwnershipError::InvalidName(format!("name must be at most {} characters", MAX_NAME_LEN)));
    }
    Ok(trimmed.to_string())
}
