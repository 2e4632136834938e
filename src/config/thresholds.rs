//! Score temperature thresholds.

use serde::{Deserialize, Serialize};

use crate::core::Temperature;

/// Partition of the 0-100 score range into cold/warm/hot bands.
///
/// Threaded explicitly into every consumer; club overrides replace the
/// defaults, nothing re-hardcodes 33/66.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreThresholds {
    /// Upper bound of the cold band, inclusive (default 33)
    #[serde(default = "default_cold_threshold")]
    pub cold: f64,

    /// Upper bound of the warm band, inclusive (default 66)
    #[serde(default = "default_warm_threshold")]
    pub warm: f64,
}

impl Default for ScoreThresholds {
    fn default() -> Self {
        Self {
            cold: default_cold_threshold(),
            warm: default_warm_threshold(),
        }
    }
}

impl ScoreThresholds {
    /// Map a score to its temperature band.
    pub fn classify(&self, score: f64) -> Temperature {
        if score <= self.cold {
            Temperature::Cold
        } else if score <= self.warm {
            Temperature::Warm
        } else {
            Temperature::Hot
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=100.0).contains(&self.cold) || !(0.0..=100.0).contains(&self.warm) {
            return Err("temperature thresholds must be within 0-100".to_string());
        }
        if self.cold >= self.warm {
            return Err(format!(
                "cold threshold ({}) must be below warm threshold ({})",
                self.cold, self.warm
            ));
        }
        Ok(())
    }
}

pub fn default_cold_threshold() -> f64 {
    33.0
}
pub fn default_warm_threshold() -> f64 {
    66.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_boundaries_are_inclusive() {
        let t = ScoreThresholds::default();
        assert_eq!(t.classify(0.0), Temperature::Cold);
        assert_eq!(t.classify(33.0), Temperature::Cold);
        assert_eq!(t.classify(33.1), Temperature::Warm);
        assert_eq!(t.classify(66.0), Temperature::Warm);
        assert_eq!(t.classify(66.1), Temperature::Hot);
        assert_eq!(t.classify(100.0), Temperature::Hot);
    }

    #[test]
    fn custom_thresholds_shift_the_partition() {
        let t = ScoreThresholds { cold: 20.0, warm: 80.0 };
        assert_eq!(t.classify(25.0), Temperature::Warm);
        assert_eq!(t.classify(79.9), Temperature::Warm);
    }

    #[test]
    fn validate_rejects_inverted_bands() {
        let t = ScoreThresholds { cold: 70.0, warm: 30.0 };
        assert!(t.validate().is_err());
    }
}
