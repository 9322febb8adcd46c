use rand::Rng;
use rand::seq::SliceRandom;

use crate::models::Timestamp;
use super::breeds::breed_config;
use super::record::{
    AgeStage, Breed, BreedingStage, Equipment, Gender, HorseRecord, DEFAULT_BODY_CONDITION,
};

/// Foals are born intact; a fair draw between mare and stallion.
pub fn roll_foal_gender(rng: &mut impl Rng) -> Gender {
    if rng.gen::<bool>() { Gender::Mare } else { Gender::Stallion }
}

/// Builds the record of a foal. The foal has no id yet; the caller inserts it
/// into the record store before it is spawned.
///
/// Breed, color and markings come wholesale from one parent picked by a coin
/// flip. Jump strength and movement speed are the exact parental means.
pub fn derive_child(mother: &HorseRecord, father: &HorseRecord, now: Timestamp, rng: &mut impl Rng) -> HorseRecord {
    let inherited = if rng.gen::<bool>() { mother } else { father };

    HorseRecord {
        id: None,
        name: None,
        owner: mother.owner.clone(), // Foals belong to the mare's owner
        breed: inherited.breed,
        gender: roll_foal_gender(rng),
        age: AgeStage::Foal,
        born: now,
        color: inherited.color,
        markings: inherited.markings,
        jump_strength: (mother.jump_strength + father.jump_strength) / 2.0,
        movement_speed: (mother.movement_speed + father.movement_speed) / 2.0,
        body_condition: DEFAULT_BODY_CONDITION,
        mother_id: mother.id,
        father_id: father.id,
        breeding_stage: BreedingStage::Ready,
        breeding_cooldown: 0,
        pregnancy: None,
        location: None,
        equipment: Equipment::default(),
    }
}

/// Rolls an adult, unowned horse of `breed` with a coat, markings and stats
/// allowed by the breed table. `adult_age_secs` backdates its birth so the
/// maturation pass sees it as grown.
pub fn roll_wild_horse(breed: Breed, now: Timestamp, adult_age_secs: u64, rng: &mut impl Rng) -> HorseRecord {
    let config = breed_config(breed);
    let color = *config.colors.choose(rng).unwrap_or(&config.colors[0]);
    let markings = *config.markings.choose(rng).unwrap_or(&config.markings[0]);
    let jump_strength = rng.gen_range(config.jump_range.0..config.jump_range.1);
    let movement_speed = rng.gen_range(config.speed_range.0..config.speed_range.1);

    let mut record = HorseRecord::new(
        breed,
        roll_foal_gender(rng),
        color,
        markings,
        jump_strength,
        movement_speed,
        now.minus_secs(adult_age_secs),
    );
    record.age = AgeStage::Adult;
    record
}
