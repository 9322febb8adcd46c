use std::collections::HashMap;
use lazy_static::lazy_static;

use crate::world::EntityKind;
use super::record::{Breed, CoatColor, Markings};

// --- Breed Configuration ---

#[derive(Clone, Debug)]
pub struct BreedConfig {
    pub display_name: &'static str,
    pub entity_kind: EntityKind,
    pub colors: Vec<CoatColor>,
    pub markings: Vec<Markings>,
    pub jump_range: (f64, f64),  // min, max for freshly rolled wild horses
    pub speed_range: (f64, f64),
}

// --- Breed Configuration Database ---

lazy_static! {
    pub static ref BREED_CONFIGS: HashMap<Breed, BreedConfig> = {
        let mut configs = HashMap::new();

        configs.insert(Breed::Arabian, BreedConfig {
            display_name: "Arabian",
            entity_kind: EntityKind::Horse,
            colors: vec![CoatColor::Chestnut, CoatColor::Gray, CoatColor::Black, CoatColor::Brown, CoatColor::White],
            markings: vec![Markings::None, Markings::Stockings, Markings::WhiteField],
            jump_range: (0.55, 0.80),
            speed_range: (0.28, 0.34), // Endurance runner
        });

        configs.insert(Breed::Thoroughbred, BreedConfig {
            display_name: "Thoroughbred",
            entity_kind: EntityKind::Horse,
            colors: vec![CoatColor::Chestnut, CoatColor::Brown, CoatColor::DarkBrown, CoatColor::Black, CoatColor::Gray],
            markings: vec![Markings::None, Markings::Stockings],
            jump_range: (0.60, 0.85),
            speed_range: (0.30, 0.3375), // Fastest breed
        });

        configs.insert(Breed::Mustang, BreedConfig {
            display_name: "Mustang",
            entity_kind: EntityKind::Horse,
            colors: vec![
                CoatColor::Brown, CoatColor::DarkBrown, CoatColor::Chestnut, CoatColor::Black,
                CoatColor::Gray, CoatColor::Creamy, CoatColor::White,
            ],
            markings: vec![Markings::None, Markings::Stockings, Markings::WhiteField, Markings::WhiteDots, Markings::BlackDots],
            jump_range: (0.50, 0.90),
            speed_range: (0.22, 0.32), // Feral stock, widest spread
        });

        configs.insert(Breed::Friesian, BreedConfig {
            display_name: "Friesian",
            entity_kind: EntityKind::Horse,
            colors: vec![CoatColor::Black],
            markings: vec![Markings::None],
            jump_range: (0.55, 0.75),
            speed_range: (0.22, 0.27),
        });

        configs.insert(Breed::Appaloosa, BreedConfig {
            display_name: "Appaloosa",
            entity_kind: EntityKind::Horse,
            colors: vec![CoatColor::White, CoatColor::Creamy, CoatColor::Chestnut, CoatColor::Brown, CoatColor::Gray],
            markings: vec![Markings::WhiteDots, Markings::BlackDots, Markings::WhiteField],
            jump_range: (0.50, 0.80),
            speed_range: (0.24, 0.30),
        });

        configs.insert(Breed::Clydesdale, BreedConfig {
            display_name: "Clydesdale",
            entity_kind: EntityKind::Horse,
            colors: vec![CoatColor::Brown, CoatColor::DarkBrown, CoatColor::Black, CoatColor::Chestnut],
            markings: vec![Markings::Stockings, Markings::WhiteField],
            jump_range: (0.40, 0.60), // Draft horse, heavy
            speed_range: (0.18, 0.24),
        });

        configs.insert(Breed::Donkey, BreedConfig {
            display_name: "Donkey",
            entity_kind: EntityKind::Donkey,
            colors: vec![CoatColor::Gray, CoatColor::Brown],
            markings: vec![Markings::None],
            jump_range: (0.45, 0.55),
            speed_range: (0.17, 0.20),
        });

        configs.insert(Breed::Mule, BreedConfig {
            display_name: "Mule",
            entity_kind: EntityKind::Mule,
            colors: vec![CoatColor::Brown, CoatColor::DarkBrown],
            markings: vec![Markings::None],
            jump_range: (0.45, 0.60),
            speed_range: (0.17, 0.22),
        });

        configs
    };
}

/// Every `Breed` variant has an entry in `BREED_CONFIGS`.
pub fn breed_config(breed: Breed) -> &'static BreedConfig {
    &BREED_CONFIGS[&breed]
}
