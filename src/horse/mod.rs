// Horse records and everything that happens to them without a world:
// breed table, genetics, breeding state machine and maturation.

pub mod record;
pub mod breeds;
pub mod genetics;
pub mod breeding;
pub mod maturity;

pub use record::*;
pub use breeds::{breed_config, BreedConfig, BREED_CONFIGS};
pub use genetics::{derive_child, roll_foal_gender, roll_wild_horse};
pub use breeding::{
    check_pair, conceive, roll_complications, tick_breeding, BreedError, Conception, Pairing, TickOutcome,
};
pub use maturity::{advance_age, stage_for_age};
