/******************************************************************************
 *                                                                            *
 * Horse Breeding - Pregnancy, Labor and Recovery State Machine               *
 *                                                                            *
 * STAGES (cycle, no terminal stage):                                         *
 *   - Ready:    default; the only stage breed() accepts                      *
 *   - Pregnant: mare after conception, 6-7 days; weight complications        *
 *   - Labor:    up to ~2 hours, then birth resolution                        *
 *   - Recovery: stallion after breeding (1 day), mare after a miscarriage    *
 *   - Nurture:  mare after a live birth (7 days)                             *
 *                                                                            *
 * TIMING: cooldowns count heartbeats (one per simulated second). When the    *
 * heartbeat pauses, breeding pauses with it.                                 *
 *                                                                            *
 ******************************************************************************/

use rand::Rng;
use thiserror::Error;

use crate::config::HusbandryConfig;
use crate::models::{HorseId, Timestamp};
use crate::store::StoreError;
use super::record::{AgeStage, BreedingStage, Gender, HorseRecord, Pregnancy, PregnancyFlag};

// =============================================================================
// BREEDING PRECONDITIONS
// =============================================================================

/// Why a breeding attempt was refused. Every variant except `Persistence`
/// leaves both horses untouched.
#[derive(Debug, Error)]
pub enum BreedError {
    #[error("that horse is feral and cannot be bred")]
    Feral,
    #[error("only a licensed vet can breed horses")]
    NotLicensed,
    #[error("a horse cannot be bred with itself")]
    SameHorse,
    #[error("breeding needs one mare and one stallion")]
    IncompatibleGenders,
    #[error("horse {0} is not fully grown")]
    NotAdult(HorseId),
    #[error("mare {0} is already pregnant")]
    AlreadyPregnant(HorseId),
    #[error("horse {id} is not ready to breed ({stage:?})")]
    NotReady { id: HorseId, stage: BreedingStage },
    #[error("breeding took effect but could not be saved: {0}")]
    Persistence(#[from] StoreError),
}

/// Which side of a checked pair carries the foal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pairing {
    FirstIsMother,
    SecondIsMother,
}

/// Gender, age, pregnancy and stage checks, in that order.
/// Both records must already be persisted.
pub fn check_pair(first: &HorseRecord, second: &HorseRecord) -> Result<Pairing, BreedError> {
    let pairing = match (first.gender, second.gender) {
        (Gender::Mare, Gender::Stallion) => Pairing::FirstIsMother,
        (Gender::Stallion, Gender::Mare) => Pairing::SecondIsMother,
        _ => return Err(BreedError::IncompatibleGenders),
    };
    let (mother, father) = match pairing {
        Pairing::FirstIsMother => (first, second),
        Pairing::SecondIsMother => (second, first),
    };
    let mother_id = mother.id.ok_or(BreedError::Feral)?;
    let father_id = father.id.ok_or(BreedError::Feral)?;

    if mother.age != AgeStage::Adult {
        return Err(BreedError::NotAdult(mother_id));
    }
    if father.age != AgeStage::Adult {
        return Err(BreedError::NotAdult(father_id));
    }
    if mother.is_pregnant() {
        return Err(BreedError::AlreadyPregnant(mother_id));
    }
    for (id, horse) in [(mother_id, mother), (father_id, father)] {
        if horse.breeding_stage != BreedingStage::Ready {
            return Err(BreedError::NotReady { id, stage: horse.breeding_stage });
        }
    }
    Ok(pairing)
}

/// Result of a successful breed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Conception {
    pub mother_id: HorseId,
    pub father_id: HorseId,
    pub due_in_secs: u32,
}

/// Starts the mare's pregnancy and sends the stallion into recovery.
/// Callers run `check_pair` first and persist both records afterwards.
pub fn conceive(
    mother: &mut HorseRecord,
    father: &mut HorseRecord,
    now: Timestamp,
    config: &HusbandryConfig,
    rng: &mut impl Rng,
) -> Result<Conception, BreedError> {
    let (Some(mother_id), Some(father_id)) = (mother.id, father.id) else {
        return Err(BreedError::Feral);
    };
    let due_in_secs = rng.gen_range(config.pregnancy_min_secs..config.pregnancy_max_secs);

    mother.breeding_stage = BreedingStage::Pregnant;
    mother.breeding_cooldown = due_in_secs;
    mother.pregnancy = Some(Pregnancy::new(now, father_id));

    father.breeding_stage = BreedingStage::Recovery;
    father.breeding_cooldown = config.father_recovery_secs;

    log::info!("🐴 Mare {} is now PREGNANT by stallion {}! Due in {}s", mother_id, father_id, due_in_secs);

    Ok(Conception { mother_id, father_id, due_in_secs })
}

// =============================================================================
// PER-TICK STATE MACHINE
// =============================================================================

/// What a single heartbeat did to one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Ready records are not ticked.
    Idle,
    CountingDown,
    LaborStarted { labor_secs: u32 },
    /// Live birth: the caller derives and spawns the foal.
    Delivered { father_id: HorseId, premature: bool },
    Miscarried { father_missing: bool },
    BecameReady,
}

/// Advances one record by one heartbeat.
///
/// If the cooldown is already zero the stage's exit transition fires,
/// otherwise the cooldown drops by one. Pregnant mares roll their weight
/// complications first. `father_exists` is asked only at labor resolution.
pub fn tick_breeding(
    record: &mut HorseRecord,
    config: &HusbandryConfig,
    rng: &mut impl Rng,
    father_exists: impl FnOnce(HorseId) -> bool,
) -> TickOutcome {
    match record.breeding_stage {
        BreedingStage::Ready => TickOutcome::Idle,
        BreedingStage::Pregnant => {
            roll_complications(record, config, rng);
            if record.breeding_cooldown == 0 {
                start_labor(record, config, rng)
            } else {
                record.breeding_cooldown -= 1;
                TickOutcome::CountingDown
            }
        }
        BreedingStage::Labor => {
            if record.breeding_cooldown == 0 {
                resolve_labor(record, config, father_exists)
            } else {
                record.breeding_cooldown -= 1;
                TickOutcome::CountingDown
            }
        }
        BreedingStage::Recovery | BreedingStage::Nurture => {
            if record.breeding_cooldown == 0 {
                log::debug!("🐴 Horse {} finished {:?} and is ready to breed", record.label(), record.breeding_stage);
                record.breeding_stage = BreedingStage::Ready;
                TickOutcome::BecameReady
            } else {
                record.breeding_cooldown -= 1;
                TickOutcome::CountingDown
            }
        }
    }
}

/// Body-condition complications. Each flag is rolled at most once per pregnancy.
/// Returns the flags set by this call.
pub fn roll_complications(record: &mut HorseRecord, config: &HusbandryConfig, rng: &mut impl Rng) -> Vec<PregnancyFlag> {
    let body_condition = record.body_condition;
    let label = record.label();
    let Some(pregnancy) = record.pregnancy.as_mut() else {
        return Vec::new();
    };
    let mut flagged = Vec::new();

    if body_condition >= config.overweight_threshold && !pregnancy.has(PregnancyFlag::Overweight) {
        pregnancy.flags.insert(PregnancyFlag::Overweight);
        flagged.push(PregnancyFlag::Overweight);
        if rng.gen::<f64>() < config.miscarriage_chance {
            pregnancy.flags.insert(PregnancyFlag::Miscarriage);
            flagged.push(PregnancyFlag::Miscarriage);
        }
    }

    if body_condition <= config.underweight_threshold && !pregnancy.has(PregnancyFlag::Underweight) {
        pregnancy.flags.insert(PregnancyFlag::Underweight);
        flagged.push(PregnancyFlag::Underweight);
        if rng.gen::<f64>() < config.premature_chance {
            pregnancy.flags.insert(PregnancyFlag::Premature);
            flagged.push(PregnancyFlag::Premature);
        }
    }

    if !flagged.is_empty() {
        log::info!("🐴 Pregnant mare {} (body condition {}) developed {:?}", label, body_condition, flagged);
    }
    flagged
}

fn start_labor(record: &mut HorseRecord, config: &HusbandryConfig, rng: &mut impl Rng) -> TickOutcome {
    let labor_secs = rng.gen_range(0..config.labor_segment_max_secs) + rng.gen_range(0..config.labor_segment_max_secs);
    record.breeding_stage = BreedingStage::Labor;
    record.breeding_cooldown = labor_secs;
    log::info!("🐴 Mare {} went into LABOR ({}s)", record.label(), labor_secs);
    TickOutcome::LaborStarted { labor_secs }
}

fn resolve_labor(
    record: &mut HorseRecord,
    config: &HusbandryConfig,
    father_exists: impl FnOnce(HorseId) -> bool,
) -> TickOutcome {
    let pregnancy = record.pregnancy.take();
    let label = record.label();

    let outcome = match pregnancy {
        Some(pregnancy) if !pregnancy.has(PregnancyFlag::Miscarriage) => {
            if father_exists(pregnancy.partner_id) {
                TickOutcome::Delivered {
                    father_id: pregnancy.partner_id,
                    premature: pregnancy.has(PregnancyFlag::Premature),
                }
            } else {
                log::warn!("🐴 Mare {} lost her foal: father {} no longer exists", label, pregnancy.partner_id);
                TickOutcome::Miscarried { father_missing: true }
            }
        }
        Some(_) => {
            log::info!("🐴 Mare {} miscarried", label);
            TickOutcome::Miscarried { father_missing: false }
        }
        None => {
            log::warn!("🐴 Mare {} was in labor without a pregnancy record", label);
            TickOutcome::Miscarried { father_missing: true }
        }
    };

    match outcome {
        TickOutcome::Delivered { .. } => {
            record.breeding_stage = BreedingStage::Nurture;
            record.breeding_cooldown = config.nurture_secs;
        }
        _ => {
            record.breeding_stage = BreedingStage::Recovery;
            record.breeding_cooldown = config.miscarriage_recovery_secs;
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::horse::{Breed, CoatColor, Markings};
    use rand::{RngCore, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    /// Counts how many random words the state machine consumed.
    struct CountingRng {
        inner: ChaCha8Rng,
        draws: usize,
    }

    impl RngCore for CountingRng {
        fn next_u32(&mut self) -> u32 {
            self.draws += 1;
            self.inner.next_u32()
        }
        fn next_u64(&mut self) -> u64 {
            self.draws += 1;
            self.inner.next_u64()
        }
        fn fill_bytes(&mut self, dest: &mut [u8]) {
            self.draws += 1;
            self.inner.fill_bytes(dest)
        }
        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
            self.draws += 1;
            self.inner.try_fill_bytes(dest)
        }
    }

    fn horse(id: u64, gender: Gender) -> HorseRecord {
        let mut record = HorseRecord::new(
            Breed::Thoroughbred, gender, CoatColor::Brown, Markings::None, 0.7, 0.31, Timestamp::UNIX_EPOCH,
        );
        record.id = Some(HorseId(id));
        record
    }

    fn pregnant_mare(body_condition: u8, cooldown: u32) -> HorseRecord {
        let mut mare = horse(1, Gender::Mare);
        mare.body_condition = body_condition;
        mare.breeding_stage = BreedingStage::Pregnant;
        mare.breeding_cooldown = cooldown;
        mare.pregnancy = Some(Pregnancy::new(Timestamp::UNIX_EPOCH, HorseId(2)));
        mare
    }

    #[test]
    fn conception_sets_both_sides() {
        let config = HusbandryConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut mare = horse(1, Gender::Mare);
        let mut stallion = horse(2, Gender::Stallion);
        let now = Timestamp::from_secs_since_unix_epoch(77);

        assert_eq!(check_pair(&stallion, &mare).expect("valid pair"), Pairing::SecondIsMother);
        let conception = conceive(&mut mare, &mut stallion, now, &config, &mut rng).expect("conceive");

        assert_eq!(mare.breeding_stage, BreedingStage::Pregnant);
        assert!((518_400..604_800).contains(&mare.breeding_cooldown));
        assert_eq!(conception.due_in_secs, mare.breeding_cooldown);
        let pregnancy = mare.pregnancy.as_ref().expect("pregnancy");
        assert_eq!(pregnancy.conceived, now);
        assert_eq!(pregnancy.partner_id, HorseId(2));
        assert!(pregnancy.flags.is_empty());

        assert_eq!(stallion.breeding_stage, BreedingStage::Recovery);
        assert_eq!(stallion.breeding_cooldown, 86_400);
        assert!(stallion.pregnancy.is_none());
    }

    #[test]
    fn preconditions_fail_in_order() {
        let mare = horse(1, Gender::Mare);
        let gelding = horse(2, Gender::Gelding);
        assert!(matches!(check_pair(&mare, &gelding), Err(BreedError::IncompatibleGenders)));
        assert!(matches!(check_pair(&mare, &mare.clone()), Err(BreedError::IncompatibleGenders)));

        let mut foal = horse(3, Gender::Stallion);
        foal.age = AgeStage::Yearling;
        assert!(matches!(check_pair(&mare, &foal), Err(BreedError::NotAdult(HorseId(3)))));

        let stallion = horse(4, Gender::Stallion);
        let pregnant = pregnant_mare(5, 100);
        assert!(matches!(check_pair(&pregnant, &stallion), Err(BreedError::AlreadyPregnant(HorseId(1)))));

        let mut tired = stallion.clone();
        tired.breeding_stage = BreedingStage::Recovery;
        tired.breeding_cooldown = 30;
        assert!(matches!(
            check_pair(&mare, &tired),
            Err(BreedError::NotReady { id: HorseId(4), stage: BreedingStage::Recovery })
        ));
    }

    #[test]
    fn overweight_flag_is_rolled_once() {
        let config = HusbandryConfig::default();
        let mut rng = CountingRng { inner: ChaCha8Rng::seed_from_u64(5), draws: 0 };
        let mut mare = pregnant_mare(8, 1_000);

        tick_breeding(&mut mare, &config, &mut rng, |_| true);
        assert!(mare.pregnancy.as_ref().expect("pregnant").has(PregnancyFlag::Overweight));
        assert_eq!(rng.draws, 1);
        assert_eq!(mare.breeding_cooldown, 999);

        tick_breeding(&mut mare, &config, &mut rng, |_| true);
        assert_eq!(rng.draws, 1, "no second complication draw");
        assert_eq!(mare.breeding_cooldown, 998);
    }

    #[test]
    fn underweight_can_mark_premature() {
        let config = HusbandryConfig { premature_chance: 1.0, ..HusbandryConfig::default() };
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut mare = pregnant_mare(3, 10);
        let flagged = roll_complications(&mut mare, &config, &mut rng);
        assert_eq!(flagged, vec![PregnancyFlag::Underweight, PregnancyFlag::Premature]);
        assert!(roll_complications(&mut mare, &config, &mut rng).is_empty());
    }

    #[test]
    fn healthy_weight_rolls_nothing() {
        let config = HusbandryConfig::default();
        let mut rng = CountingRng { inner: ChaCha8Rng::seed_from_u64(5), draws: 0 };
        let mut mare = pregnant_mare(5, 10);
        assert!(roll_complications(&mut mare, &config, &mut rng).is_empty());
        assert_eq!(rng.draws, 0);
    }

    #[test]
    fn pregnancy_runs_into_labor_then_birth() {
        let config = HusbandryConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let mut mare = pregnant_mare(5, 1);

        assert_eq!(tick_breeding(&mut mare, &config, &mut rng, |_| true), TickOutcome::CountingDown);
        let outcome = tick_breeding(&mut mare, &config, &mut rng, |_| true);
        let TickOutcome::LaborStarted { labor_secs } = outcome else {
            panic!("expected labor, got {:?}", outcome);
        };
        assert!(labor_secs < 7_200);
        assert_eq!(mare.breeding_stage, BreedingStage::Labor);
        assert!(mare.pregnancy.is_some());

        mare.breeding_cooldown = 0;
        let outcome = tick_breeding(&mut mare, &config, &mut rng, |id| id == HorseId(2));
        assert_eq!(outcome, TickOutcome::Delivered { father_id: HorseId(2), premature: false });
        assert_eq!(mare.breeding_stage, BreedingStage::Nurture);
        assert_eq!(mare.breeding_cooldown, 604_800);
        assert!(mare.pregnancy.is_none());
    }

    #[test]
    fn miscarriage_and_missing_father_lead_to_recovery() {
        let config = HusbandryConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(8);

        let mut mare = pregnant_mare(5, 0);
        mare.breeding_stage = BreedingStage::Labor;
        mare.pregnancy.as_mut().expect("pregnancy").flags.insert(PregnancyFlag::Miscarriage);
        assert_eq!(
            tick_breeding(&mut mare, &config, &mut rng, |_| true),
            TickOutcome::Miscarried { father_missing: false }
        );
        assert_eq!(mare.breeding_stage, BreedingStage::Recovery);
        assert_eq!(mare.breeding_cooldown, 604_800);
        assert!(mare.pregnancy.is_none());

        let mut mare = pregnant_mare(5, 0);
        mare.breeding_stage = BreedingStage::Labor;
        assert_eq!(
            tick_breeding(&mut mare, &config, &mut rng, |_| false),
            TickOutcome::Miscarried { father_missing: true }
        );
        assert_eq!(mare.breeding_stage, BreedingStage::Recovery);
    }

    #[test]
    fn recovery_returns_to_ready_after_cooldown() {
        let config = HusbandryConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let mut stallion = horse(2, Gender::Stallion);
        stallion.breeding_stage = BreedingStage::Recovery;
        stallion.breeding_cooldown = 2;

        assert_eq!(tick_breeding(&mut stallion, &config, &mut rng, |_| true), TickOutcome::CountingDown);
        assert_eq!(tick_breeding(&mut stallion, &config, &mut rng, |_| true), TickOutcome::CountingDown);
        assert_eq!(stallion.breeding_cooldown, 0);
        assert_eq!(tick_breeding(&mut stallion, &config, &mut rng, |_| true), TickOutcome::BecameReady);
        assert_eq!(stallion.breeding_stage, BreedingStage::Ready);
        assert_eq!(tick_breeding(&mut stallion, &config, &mut rng, |_| true), TickOutcome::Idle);
    }
}
