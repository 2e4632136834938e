//! Scoring weight configuration.
//!
//! This module contains the weight types for the composite lead score:
//! - Per-dimension maxima (must sum to 100)
//! - Deal-potential sub-factor weights
//! - Engagement saturation curve parameters
//! - Pipeline-progress and velocity weights
//! - Contact role weights
//!
//! Every field carries a serde default so a club override file may specify
//! only the weights it wants to change.

use serde::{Deserialize, Serialize};

use crate::core::ContactRole;

/// A sub-factor weight is a share of its dimension maximum and must lie
/// in [0, 1]; anything outside would push a dimension score past its cap
/// or below zero.
fn unit_interval(group: &str, name: &str, value: f64) -> Result<(), String> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(format!(
            "{} {} must be between 0.0 and 1.0, got {}",
            group, name, value
        ));
    }
    Ok(())
}

/// Composite score weights: one maximum per dimension plus sub-factor
/// weight groups. Dimension maxima must sum to 100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    /// Maximum points for profile completeness (default 15)
    #[serde(default = "default_profile_max")]
    pub profile_max: f64,

    /// Maximum points for deal potential (default 25)
    #[serde(default = "default_deal_max")]
    pub deal_max: f64,

    /// Maximum points for engagement (default 25)
    #[serde(default = "default_engagement_max")]
    pub engagement_max: f64,

    /// Maximum points for pipeline progress (default 25)
    #[serde(default = "default_progress_max")]
    pub progress_max: f64,

    /// Maximum points for contact quality (default 10)
    #[serde(default = "default_contacts_max")]
    pub contacts_max: f64,

    #[serde(default)]
    pub deal: DealFactorWeights,

    #[serde(default)]
    pub engagement: EngagementFactorWeights,

    #[serde(default)]
    pub progress: ProgressFactorWeights,

    #[serde(default)]
    pub contacts: ContactRoleWeights,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            profile_max: default_profile_max(),
            deal_max: default_deal_max(),
            engagement_max: default_engagement_max(),
            progress_max: default_progress_max(),
            contacts_max: default_contacts_max(),
            deal: DealFactorWeights::default(),
            engagement: EngagementFactorWeights::default(),
            progress: ProgressFactorWeights::default(),
            contacts: ContactRoleWeights::default(),
        }
    }
}

impl ScoreWeights {
    fn dimension_maxima(&self) -> [f64; 5] {
        [
            self.profile_max,
            self.deal_max,
            self.engagement_max,
            self.progress_max,
            self.contacts_max,
        ]
    }

    /// Validate that dimension maxima are non-negative and sum to 100.
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("profile", self.profile_max),
            ("deal", self.deal_max),
            ("engagement", self.engagement_max),
            ("progress", self.progress_max),
            ("contacts", self.contacts_max),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{} dimension maximum must be non-negative", name));
            }
        }
        let sum: f64 = self.dimension_maxima().iter().sum();
        if (sum - 100.0).abs() > 0.001 {
            return Err(format!(
                "dimension maxima must sum to 100.0, but sum to {:.3}",
                sum
            ));
        }
        self.deal.validate()?;
        self.engagement.validate()?;
        self.progress.validate()?;
        Ok(())
    }

    /// Rescale dimension maxima so they sum to exactly 100.
    pub fn normalize(&mut self) {
        let sum: f64 = self.dimension_maxima().iter().sum();
        if sum > 0.0 && (sum - 100.0).abs() > 0.001 {
            let factor = 100.0 / sum;
            self.profile_max *= factor;
            self.deal_max *= factor;
            self.engagement_max *= factor;
            self.progress_max *= factor;
            self.contacts_max *= factor;
        }
    }
}

pub fn default_profile_max() -> f64 {
    15.0
}
pub fn default_deal_max() -> f64 {
    25.0
}
pub fn default_engagement_max() -> f64 {
    25.0
}
pub fn default_progress_max() -> f64 {
    25.0
}
pub fn default_contacts_max() -> f64 {
    10.0
}

/// Sub-factor weights for the deal-potential dimension.
///
/// The three sub-factor weights describe each factor's share of the
/// dimension maximum and should sum to 1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DealFactorWeights {
    /// Share for normalized estimated value (default 0.4)
    #[serde(default = "default_value_weight")]
    pub value_weight: f64,

    /// Share for closing probability (default 0.4)
    #[serde(default = "default_probability_weight")]
    pub probability_weight: f64,

    /// Share for the priority multiplier (default 0.2)
    #[serde(default = "default_priority_weight")]
    pub priority_weight: f64,

    /// Deal value at which the value sub-factor saturates (default 50 000)
    #[serde(default = "default_value_ceiling")]
    pub value_ceiling: f64,

    /// Multiplier for low priority (default 0.33)
    #[serde(default = "default_low_priority_multiplier")]
    pub low_priority: f64,

    /// Multiplier for medium priority (default 0.66)
    #[serde(default = "default_medium_priority_multiplier")]
    pub medium_priority: f64,

    /// Multiplier for high priority (default 1.0)
    #[serde(default = "default_high_priority_multiplier")]
    pub high_priority: f64,
}

impl Default for DealFactorWeights {
    fn default() -> Self {
        Self {
            value_weight: default_value_weight(),
            probability_weight: default_probability_weight(),
            priority_weight: default_priority_weight(),
            value_ceiling: default_value_ceiling(),
            low_priority: default_low_priority_multiplier(),
            medium_priority: default_medium_priority_multiplier(),
            high_priority: default_high_priority_multiplier(),
        }
    }
}

impl DealFactorWeights {
    pub fn priority_multiplier(&self, priority: crate::core::Priority) -> f64 {
        match priority {
            crate::core::Priority::Low => self.low_priority,
            crate::core::Priority::Medium => self.medium_priority,
            crate::core::Priority::High => self.high_priority,
        }
    }

    fn validate(&self) -> Result<(), String> {
        if self.value_ceiling <= 0.0 {
            return Err("deal value ceiling must be positive".to_string());
        }
        for (name, value) in [
            ("value weight", self.value_weight),
            ("probability weight", self.probability_weight),
            ("priority weight", self.priority_weight),
            ("low priority multiplier", self.low_priority),
            ("medium priority multiplier", self.medium_priority),
            ("high priority multiplier", self.high_priority),
        ] {
            unit_interval("deal", name, value)?;
        }
        let sum = self.value_weight + self.probability_weight + self.priority_weight;
        if (sum - 1.0).abs() > 0.001 {
            return Err(format!(
                "deal sub-factor weights must sum to 1.0, but sum to {:.3}",
                sum
            ));
        }
        Ok(())
    }
}

pub fn default_value_weight() -> f64 {
    0.4
}
pub fn default_probability_weight() -> f64 {
    0.4
}
pub fn default_priority_weight() -> f64 {
    0.2
}
pub fn default_value_ceiling() -> f64 {
    50_000.0
}
pub fn default_low_priority_multiplier() -> f64 {
    0.33
}
pub fn default_medium_priority_multiplier() -> f64 {
    0.66
}
pub fn default_high_priority_multiplier() -> f64 {
    1.0
}

/// Sub-factor weights and saturation points for the engagement dimension.
///
/// Each signal follows a saturating log curve `ln(1+n) / ln(1+saturation)`
/// capped at 1.0, so activity spam cannot inflate the score without bound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngagementFactorWeights {
    /// Share for logged activities (default 0.5)
    #[serde(default = "default_activity_weight")]
    pub activity_weight: f64,

    /// Share for completed follow-ups (default 0.3)
    #[serde(default = "default_follow_up_weight")]
    pub follow_up_weight: f64,

    /// Share for notes (default 0.2)
    #[serde(default = "default_note_weight")]
    pub note_weight: f64,

    /// Activity count at which the curve reaches 1.0 (default 10)
    #[serde(default = "default_activity_saturation")]
    pub activity_saturation: u32,

    /// Completed follow-up count at which the curve reaches 1.0 (default 5)
    #[serde(default = "default_follow_up_saturation")]
    pub follow_up_saturation: u32,

    /// Note count at which the curve reaches 1.0 (default 10)
    #[serde(default = "default_note_saturation")]
    pub note_saturation: u32,
}

impl Default for EngagementFactorWeights {
    fn default() -> Self {
        Self {
            activity_weight: default_activity_weight(),
            follow_up_weight: default_follow_up_weight(),
            note_weight: default_note_weight(),
            activity_saturation: default_activity_saturation(),
            follow_up_saturation: default_follow_up_saturation(),
            note_saturation: default_note_saturation(),
        }
    }
}

impl EngagementFactorWeights {
    fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("activity weight", self.activity_weight),
            ("follow-up weight", self.follow_up_weight),
            ("note weight", self.note_weight),
        ] {
            unit_interval("engagement", name, value)?;
        }
        let sum = self.activity_weight + self.follow_up_weight + self.note_weight;
        if (sum - 1.0).abs() > 0.001 {
            return Err(format!(
                "engagement sub-factor weights must sum to 1.0, but sum to {:.3}",
                sum
            ));
        }
        if self.activity_saturation == 0
            || self.follow_up_saturation == 0
            || self.note_saturation == 0
        {
            return Err("engagement saturation points must be at least 1".to_string());
        }
        Ok(())
    }
}

pub fn default_activity_weight() -> f64 {
    0.5
}
pub fn default_follow_up_weight() -> f64 {
    0.3
}
pub fn default_note_weight() -> f64 {
    0.2
}
pub fn default_activity_saturation() -> u32 {
    10
}
pub fn default_follow_up_saturation() -> u32 {
    5
}
pub fn default_note_saturation() -> u32 {
    10
}

/// Weights for the pipeline-progress dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressFactorWeights {
    /// Share for stage position (default 0.7)
    #[serde(default = "default_stage_weight")]
    pub stage_weight: f64,

    /// Share for advancement velocity (default 0.3)
    #[serde(default = "default_velocity_weight")]
    pub velocity_weight: f64,

    /// Average days-per-stage at or below which velocity scores 1.0
    /// (default 14)
    #[serde(default = "default_velocity_target_days")]
    pub velocity_target_days: f64,
}

impl Default for ProgressFactorWeights {
    fn default() -> Self {
        Self {
            stage_weight: default_stage_weight(),
            velocity_weight: default_velocity_weight(),
            velocity_target_days: default_velocity_target_days(),
        }
    }
}

impl ProgressFactorWeights {
    fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("stage weight", self.stage_weight),
            ("velocity weight", self.velocity_weight),
        ] {
            unit_interval("progress", name, value)?;
        }
        let sum = self.stage_weight + self.velocity_weight;
        if (sum - 1.0).abs() > 0.001 {
            return Err(format!(
                "progress sub-factor weights must sum to 1.0, but sum to {:.3}",
                sum
            ));
        }
        if self.velocity_target_days <= 0.0 {
            return Err("velocity target must be positive".to_string());
        }
        Ok(())
    }
}

pub fn default_stage_weight() -> f64 {
    0.7
}
pub fn default_velocity_weight() -> f64 {
    0.3
}
pub fn default_velocity_target_days() -> f64 {
    14.0
}

/// Per-role weights for the contact-quality dimension.
///
/// A blocker exerts no positive pressure; its weight is clamped at zero
/// when scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactRoleWeights {
    /// Weight for decision makers (default 1.0)
    #[serde(default = "default_decision_maker_weight")]
    pub decision_maker: f64,

    /// Weight for influencers (default 0.6)
    #[serde(default = "default_influencer_weight")]
    pub influencer: f64,

    /// Weight for end users (default 0.3)
    #[serde(default = "default_user_weight")]
    pub user: f64,

    /// Weight for champions (default 0.2)
    #[serde(default = "default_champion_weight")]
    pub champion: f64,

    /// Weight for blockers (default 0.0)
    #[serde(default = "default_blocker_weight")]
    pub blocker: f64,

    /// Points one full-weight contact contributes (default 5.0)
    #[serde(default = "default_per_contact_points")]
    pub per_contact_points: f64,
}

impl Default for ContactRoleWeights {
    fn default() -> Self {
        Self {
            decision_maker: default_decision_maker_weight(),
            influencer: default_influencer_weight(),
            user: default_user_weight(),
            champion: default_champion_weight(),
            blocker: default_blocker_weight(),
            per_contact_points: default_per_contact_points(),
        }
    }
}

impl ContactRoleWeights {
    pub fn role_weight(&self, role: ContactRole) -> f64 {
        let weight = match role {
            ContactRole::DecisionMaker => self.decision_maker,
            ContactRole::Influencer => self.influencer,
            ContactRole::User => self.user,
            ContactRole::Champion => self.champion,
            ContactRole::Blocker => self.blocker,
        };
        weight.max(0.0)
    }
}

pub fn default_decision_maker_weight() -> f64 {
    1.0
}
pub fn default_influencer_weight() -> f64 {
    0.6
}
pub fn default_user_weight() -> f64 {
    0.3
}
pub fn default_champion_weight() -> f64 {
    0.2
}
pub fn default_blocker_weight() -> f64 {
    0.0
}
pub fn default_per_contact_points() -> f64 {
    5.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weights_validate() {
        assert!(ScoreWeights::default().validate().is_ok());
    }

    #[test]
    fn default_maxima_sum_to_100() {
        let w = ScoreWeights::default();
        let sum: f64 = w.dimension_maxima().iter().sum();
        assert!((sum - 100.0).abs() < 1e-9);
    }

    #[test]
    fn validate_catches_bad_sum() {
        let mut w = ScoreWeights::default();
        w.deal_max = 40.0;
        assert!(w.validate().is_err());
    }

    #[test]
    fn normalize_repairs_sum() {
        let mut w = ScoreWeights::default();
        w.deal_max = 50.0; // sum now 125
        w.normalize();
        assert!(w.validate().is_ok());
        assert!((w.deal_max - 40.0).abs() < 1e-9);
    }

    #[test]
    fn validate_rejects_negative_sub_factor_weight() {
        // Sums to 1.0, so the sum check alone would pass.
        let mut w = ScoreWeights::default();
        w.deal.value_weight = -0.5;
        w.deal.probability_weight = 1.0;
        w.deal.priority_weight = 0.5;
        assert!(w.validate().is_err());

        let mut w = ScoreWeights::default();
        w.engagement.note_weight = -0.2;
        w.engagement.activity_weight = 0.9;
        w.engagement.follow_up_weight = 0.3;
        assert!(w.validate().is_err());

        let mut w = ScoreWeights::default();
        w.progress.stage_weight = 1.4;
        w.progress.velocity_weight = -0.4;
        assert!(w.validate().is_err());
    }

    #[test]
    fn validate_rejects_out_of_range_priority_multiplier() {
        let mut w = ScoreWeights::default();
        w.deal.high_priority = 1.5;
        assert!(w.validate().is_err());

        let mut w = ScoreWeights::default();
        w.deal.low_priority = -0.1;
        assert!(w.validate().is_err());
    }

    #[test]
    fn blocker_weight_is_clamped_at_zero() {
        let mut roles = ContactRoleWeights::default();
        roles.blocker = -0.5;
        assert_eq!(roles.role_weight(ContactRole::Blocker), 0.0);
    }

    #[test]
    fn partial_toml_override_keeps_other_defaults() {
        let w: ScoreWeights = toml::from_str("deal_max = 30.0\ncontacts_max = 5.0").unwrap();
        assert!((w.deal_max - 30.0).abs() < 1e-9);
        assert!((w.contacts_max - 5.0).abs() < 1e-9);
        assert!((w.profile_max - 15.0).abs() < 1e-9);
        assert!((w.engagement.activity_weight - 0.5).abs() < 1e-9);
    }
}
