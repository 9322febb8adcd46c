use serde::Deserialize;
use thiserror::Error;

// --- Time Constants (seconds, one heartbeat each) ---

pub const SECONDS_PER_DAY: u32 = 86_400;

/// Marker tag stamped on every entity the registry spawns.
pub const DEFAULT_ENTITY_MARKER: &str = "husbandry:horse";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid husbandry config json: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid husbandry config: {0}")]
    Invalid(String),
}

/// Tunables for breeding, maturation and sessions.
/// Every field falls back to its default when absent from the JSON source.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct HusbandryConfig {
    pub entity_marker: String,

    // Breeding
    pub pregnancy_min_secs: u32,
    pub pregnancy_max_secs: u32, // exclusive
    pub father_recovery_secs: u32,
    pub labor_segment_max_secs: u32, // labor = two draws in [0, max)
    pub nurture_secs: u32,
    pub miscarriage_recovery_secs: u32,

    // Complications
    pub overweight_threshold: u8,
    pub underweight_threshold: u8,
    pub miscarriage_chance: f64,
    pub premature_chance: f64,

    // Maturation (seconds since birth)
    pub yearling_after_secs: u64,
    pub adolescent_after_secs: u64,
    pub adult_after_secs: u64,
    pub age_check_interval_ticks: u64,

    // Sessions
    pub session_timeout_secs: u64,
}

impl Default for HusbandryConfig {
    fn default() -> Self {
        HusbandryConfig {
            entity_marker: DEFAULT_ENTITY_MARKER.to_string(),
            pregnancy_min_secs: 6 * SECONDS_PER_DAY,
            pregnancy_max_secs: 7 * SECONDS_PER_DAY,
            father_recovery_secs: SECONDS_PER_DAY,
            labor_segment_max_secs: 3_600,
            nurture_secs: 7 * SECONDS_PER_DAY,
            miscarriage_recovery_secs: 7 * SECONDS_PER_DAY,
            overweight_threshold: 7,
            underweight_threshold: 4,
            miscarriage_chance: 0.25,
            premature_chance: 0.25,
            yearling_after_secs: 2 * SECONDS_PER_DAY as u64,
            adolescent_after_secs: 4 * SECONDS_PER_DAY as u64,
            adult_after_secs: 6 * SECONDS_PER_DAY as u64,
            age_check_interval_ticks: 60,
            session_timeout_secs: 60,
        }
    }
}

impl HusbandryConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: HusbandryConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.entity_marker.is_empty() {
            return Err(ConfigError::Invalid("entity_marker must not be empty".to_string()));
        }
        if self.pregnancy_min_secs >= self.pregnancy_max_secs {
            return Err(ConfigError::Invalid(format!(
                "pregnancy_min_secs ({}) must be below pregnancy_max_secs ({})",
                self.pregnancy_min_secs, self.pregnancy_max_secs
            )));
        }
        if self.labor_segment_max_secs == 0 {
            return Err(ConfigError::Invalid("labor_segment_max_secs must be positive".to_string()));
        }
        for (name, chance) in [("miscarriage_chance", self.miscarriage_chance), ("premature_chance", self.premature_chance)] {
            if !(0.0..=1.0).contains(&chance) {
                return Err(ConfigError::Invalid(format!("{} must be within [0, 1], got {}", name, chance)));
            }
        }
        if self.underweight_threshold >= self.overweight_threshold {
            return Err(ConfigError::Invalid("underweight_threshold must be below overweight_threshold".to_string()));
        }
        if !(self.yearling_after_secs <= self.adolescent_after_secs && self.adolescent_after_secs <= self.adult_after_secs) {
            return Err(ConfigError::Invalid("maturation thresholds must be ascending".to_string()));
        }
        if self.age_check_interval_ticks == 0 {
            return Err(ConfigError::Invalid("age_check_interval_ticks must be positive".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_breeding_timings() {
        let config = HusbandryConfig::default();
        assert_eq!(config.pregnancy_min_secs, 518_400);
        assert_eq!(config.pregnancy_max_secs, 604_800);
        assert_eq!(config.father_recovery_secs, 86_400);
        assert_eq!(config.nurture_secs, 604_800);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_remaining_defaults() {
        let config = HusbandryConfig::from_json(r#"{ "miscarriage_chance": 0.5, "session_timeout_secs": 10 }"#)
            .expect("config");
        assert_eq!(config.miscarriage_chance, 0.5);
        assert_eq!(config.session_timeout_secs, 10);
        assert_eq!(config.premature_chance, 0.25);
    }

    #[test]
    fn inverted_pregnancy_window_is_rejected() {
        let err = HusbandryConfig::from_json(r#"{ "pregnancy_min_secs": 10, "pregnancy_max_secs": 5 }"#)
            .expect_err("window must be rejected");
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}
