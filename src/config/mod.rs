//! Score weight and threshold configuration.

mod loader;
mod scoring;
mod thresholds;

pub use loader::{load_config, parse_and_validate_config, ScoreConfig, CONFIG_FILE_NAME};
pub use scoring::{
    default_activity_saturation, default_activity_weight, default_blocker_weight,
    default_champion_weight, default_contacts_max, default_deal_max,
    default_decision_maker_weight, default_engagement_max, default_follow_up_saturation,
    default_follow_up_weight, default_high_priority_multiplier, default_influencer_weight,
    default_low_priority_multiplier, default_medium_priority_multiplier, default_note_saturation,
    default_note_weight, default_per_contact_points, default_priority_weight,
    default_probability_weight, default_profile_max, default_progress_max, default_stage_weight,
    default_user_weight, default_value_ceiling, default_value_weight, default_velocity_target_days,
    default_velocity_weight, ContactRoleWeights, DealFactorWeights, EngagementFactorWeights,
    ProgressFactorWeights, ScoreWeights,
};
pub use thresholds::{default_cold_threshold, default_warm_threshold, ScoreThresholds};
