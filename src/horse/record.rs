use serde::{Serialize, Deserialize};
use std::collections::BTreeSet;

use crate::models::{HorseId, Location, PlayerId, Timestamp};
use super::breeds::breed_config;

/// Highest value of the 0-9 body condition scale.
pub const MAX_BODY_CONDITION: u8 = 9;
/// Score given to newborns and freshly rolled wild horses.
pub const DEFAULT_BODY_CONDITION: u8 = 5;

#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Breed {
    Arabian,
    Thoroughbred,
    Mustang,
    Friesian,
    Appaloosa,
    Clydesdale,
    Donkey,
    Mule,
}

impl Breed {
    pub const ALL: [Breed; 8] = [
        Breed::Arabian,
        Breed::Thoroughbred,
        Breed::Mustang,
        Breed::Friesian,
        Breed::Appaloosa,
        Breed::Clydesdale,
        Breed::Donkey,
        Breed::Mule,
    ];
}

#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Gender {
    Mare,
    Stallion,
    Gelding,
}

/// Age stage of a horse - only ever advances.
#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AgeStage {
    Foal,
    Yearling,
    Adolescent,
    Adult,
}

#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CoatColor {
    White,
    Creamy,
    Chestnut,
    Brown,
    Black,
    Gray,
    DarkBrown,
}

#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Markings {
    None,
    Stockings,
    WhiteField,
    WhiteDots,
    BlackDots,
}

/// Breeding state machine stage.
#[derive(Serialize, Deserialize, Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum BreedingStage {
    #[default]
    Ready,
    Pregnant,
    Labor,
    Recovery,
    Nurture,
}

#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PregnancyFlag {
    Overweight,
    Underweight,
    Miscarriage,
    Premature,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Pregnancy {
    pub conceived: Timestamp,
    pub partner_id: HorseId,
    pub flags: BTreeSet<PregnancyFlag>,
}

impl Pregnancy {
    pub fn new(conceived: Timestamp, partner_id: HorseId) -> Self {
        Pregnancy { conceived, partner_id, flags: BTreeSet::new() }
    }

    pub fn has(&self, flag: PregnancyFlag) -> bool {
        self.flags.contains(&flag)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Owner {
    pub player: PlayerId,
    pub display_name: String,
}

/// Item worn by a horse as the host serialized it. The bytes are opaque here.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ItemSnapshot {
    pub item_id: String,
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Equipment {
    pub saddle: Option<ItemSnapshot>,
    pub armor: Option<ItemSnapshot>,
}

/// Durable record of one horse.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct HorseRecord {
    pub id: Option<HorseId>, // None until the store assigns one
    pub name: Option<String>,
    pub owner: Option<Owner>,

    pub breed: Breed,
    pub gender: Gender,
    pub age: AgeStage,
    pub born: Timestamp,
    pub color: CoatColor,
    pub markings: Markings,
    pub jump_strength: f64,
    pub movement_speed: f64,
    pub body_condition: u8,

    pub mother_id: Option<HorseId>,
    pub father_id: Option<HorseId>,

    pub breeding_stage: BreedingStage,
    pub breeding_cooldown: u32, // seconds (heartbeats) remaining
    pub pregnancy: Option<Pregnancy>,

    pub location: Option<Location>,
    pub equipment: Equipment,
}

impl HorseRecord {
    /// Unpersisted, unplaced adult with no lineage and a ready breeding stage.
    pub fn new(
        breed: Breed,
        gender: Gender,
        color: CoatColor,
        markings: Markings,
        jump_strength: f64,
        movement_speed: f64,
        born: Timestamp,
    ) -> Self {
        HorseRecord {
            id: None,
            name: None,
            owner: None,
            breed,
            gender,
            age: AgeStage::Adult,
            born,
            color,
            markings,
            jump_strength,
            movement_speed,
            body_condition: DEFAULT_BODY_CONDITION,
            mother_id: None,
            father_id: None,
            breeding_stage: BreedingStage::Ready,
            breeding_cooldown: 0,
            pregnancy: None,
            location: None,
            equipment: Equipment::default(),
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    pub fn is_owned_by(&self, player: PlayerId) -> bool {
        self.owner.as_ref().map_or(false, |owner| owner.player == player)
    }

    pub fn is_pregnant(&self) -> bool {
        self.breeding_stage == BreedingStage::Pregnant
    }

    /// Name for log lines: the given name if claimed, otherwise the id.
    pub fn label(&self) -> String {
        match (&self.name, self.id) {
            (Some(name), Some(id)) => format!("{} ({})", name, id),
            (Some(name), None) => name.clone(),
            (None, Some(id)) => format!("{:?} {}", self.breed, id),
            (None, None) => format!("unsaved {:?}", self.breed),
        }
    }

    /// Checks the record against its breed table entry and the breeding invariants.
    pub fn validate(&self) -> Result<(), String> {
        let config = breed_config(self.breed);
        if !config.colors.contains(&self.color) {
            return Err(format!("{:?} is not a valid coat color for {}", self.color, config.display_name));
        }
        if !config.markings.contains(&self.markings) {
            return Err(format!("{:?} markings are not valid for {}", self.markings, config.display_name));
        }
        if !(self.jump_strength >= 0.0) || !(self.movement_speed >= 0.0) {
            return Err("jump strength and movement speed must be non-negative".to_string());
        }
        if self.body_condition > MAX_BODY_CONDITION {
            return Err(format!("body condition {} exceeds {}", self.body_condition, MAX_BODY_CONDITION));
        }
        let carries = matches!(self.breeding_stage, BreedingStage::Pregnant | BreedingStage::Labor);
        if carries != self.pregnancy.is_some() {
            return Err(format!("stage {:?} disagrees with pregnancy {:?}", self.breeding_stage, self.pregnancy));
        }
        if self.pregnancy.is_some() && self.gender != Gender::Mare {
            return Err(format!("{:?} cannot carry a pregnancy", self.gender));
        }
        Ok(())
    }
}

/// Serde adapter writing raw bytes as standard base64 text.
mod base64_bytes {
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        STANDARD.decode(text.as_bytes()).map_err(serde::de::Error::custom)
    }
}
