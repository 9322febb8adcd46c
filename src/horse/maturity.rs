use crate::config::HusbandryConfig;
use crate::models::Timestamp;
use super::record::{AgeStage, HorseRecord};

/// Stage a horse of the given age (seconds since birth) should be at.
pub fn stage_for_age(age_secs: u64, config: &HusbandryConfig) -> AgeStage {
    if age_secs >= config.adult_after_secs {
        AgeStage::Adult
    } else if age_secs >= config.adolescent_after_secs {
        AgeStage::Adolescent
    } else if age_secs >= config.yearling_after_secs {
        AgeStage::Yearling
    } else {
        AgeStage::Foal
    }
}

/// Advances the record's age stage from its birth time.
/// NOTE: Only ages UP, never DOWN - a record backdated or edited by hand keeps
/// the more mature stage. Returns the new stage if it changed.
pub fn advance_age(record: &mut HorseRecord, now: Timestamp, config: &HusbandryConfig) -> Option<AgeStage> {
    let calculated = stage_for_age(now.secs_since(record.born), config);
    if calculated <= record.age {
        return None;
    }
    log::info!("🐴 Horse {} grows from {:?} to {:?}", record.label(), record.age, calculated);
    record.age = calculated;
    Some(calculated)
}
