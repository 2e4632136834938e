//! Composite lead scoring.
//!
//! Five weighted dimensions sum to the 0-100 lead score:
//! - profile completeness: populated identity fields, linear
//! - deal potential: normalized value + closing probability + priority
//! - engagement: activity signals on a saturating log curve
//! - pipeline progress: stage position plus advancement velocity
//! - contact quality: decision-role weighted contact count
//!
//! `compute_score` is pure: identical inputs and weights always produce an
//! identical breakdown. Dimension maxima and every sub-factor weight come
//! from [`ScoreWeights`]; nothing here hardcodes a club policy.

use serde::{Deserialize, Serialize};

use crate::config::{ScoreThresholds, ScoreWeights};
use crate::core::{Contact, EngagementStats, Lead, Stage, StageHistoryEntry, Temperature};
use crate::stage::stage_durations;

/// One dimension's contribution: achieved points out of its maximum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DimensionScore {
    pub score: f64,
    pub max: f64,
}

/// Per-dimension decomposition of a lead's score.
///
/// `total()` equals the lead score; under validated weights the maxima sum
/// to 100. Recomputed on demand, never persisted as an edit history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub profile_completeness: DimensionScore,
    pub deal_potential: DimensionScore,
    pub engagement: DimensionScore,
    pub pipeline_progress: DimensionScore,
    pub contact_quality: DimensionScore,
}

impl ScoreBreakdown {
    pub fn dimensions(&self) -> [DimensionScore; 5] {
        [
            self.profile_completeness,
            self.deal_potential,
            self.engagement,
            self.pipeline_progress,
            self.contact_quality,
        ]
    }

    /// The composite lead score: sum of the dimension scores.
    pub fn total(&self) -> f64 {
        self.dimensions().iter().map(|d| d.score).sum()
    }

    /// Sum of the dimension maxima (100 under validated weights).
    pub fn max_total(&self) -> f64 {
        self.dimensions().iter().map(|d| d.max).sum()
    }
}

/// Compute the composite score breakdown for a lead.
pub fn compute_score(
    lead: &Lead,
    engagement: &EngagementStats,
    contacts: &[Contact],
    history: &[StageHistoryEntry],
    weights: &ScoreWeights,
) -> ScoreBreakdown {
    ScoreBreakdown {
        profile_completeness: profile_completeness(lead, weights),
        deal_potential: deal_potential(lead, weights),
        engagement: engagement_score(engagement, weights),
        pipeline_progress: pipeline_progress(lead, history, weights),
        contact_quality: contact_quality(contacts, weights),
    }
}

/// Compute and cache the lead's score, returning the breakdown.
pub fn rescore(
    lead: &mut Lead,
    engagement: &EngagementStats,
    contacts: &[Contact],
    history: &[StageHistoryEntry],
    weights: &ScoreWeights,
) -> ScoreBreakdown {
    let breakdown = compute_score(lead, engagement, contacts, history, weights);
    lead.lead_score = breakdown.total();
    breakdown
}

/// Temperature band of a score under the given thresholds.
pub fn temperature(score: f64, thresholds: &ScoreThresholds) -> Temperature {
    thresholds.classify(score)
}

fn profile_completeness(lead: &Lead, weights: &ScoreWeights) -> DimensionScore {
    let populated = lead.populated_profile_fields() as f64;
    let score = weights.profile_max * populated / Lead::PROFILE_FIELD_COUNT as f64;
    DimensionScore {
        score: score.clamp(0.0, weights.profile_max),
        max: weights.profile_max,
    }
}

fn deal_potential(lead: &Lead, weights: &ScoreWeights) -> DimensionScore {
    let w = &weights.deal;
    let value_norm = (lead.estimated_value / w.value_ceiling).clamp(0.0, 1.0);
    let probability_norm = f64::from(lead.closing_probability.min(100)) / 100.0;
    let priority = w.priority_multiplier(lead.priority).clamp(0.0, 1.0);

    let raw = value_norm * w.value_weight
        + probability_norm * w.probability_weight
        + priority * w.priority_weight;
    DimensionScore {
        score: (raw * weights.deal_max).clamp(0.0, weights.deal_max),
        max: weights.deal_max,
    }
}

/// Saturating diminishing-returns curve: ln(1+n) / ln(1+saturation), 1.0
/// at and beyond the saturation point.
fn saturating(count: u32, saturation: u32) -> f64 {
    let saturation = saturation.max(1);
    let curve = (f64::from(count) + 1.0).ln() / (f64::from(saturation) + 1.0).ln();
    curve.min(1.0)
}

fn engagement_score(engagement: &EngagementStats, weights: &ScoreWeights) -> DimensionScore {
    let w = &weights.engagement;
    let raw = saturating(engagement.activity_count, w.activity_saturation) * w.activity_weight
        + saturating(engagement.completed_follow_up_count, w.follow_up_saturation)
            * w.follow_up_weight
        + saturating(engagement.note_count, w.note_saturation) * w.note_weight;
    DimensionScore {
        score: (raw * weights.engagement_max).clamp(0.0, weights.engagement_max),
        max: weights.engagement_max,
    }
}

/// Stage whose ordinal drives the progress dimension.
///
/// Terminal stages are excluded: a closed lead scores on the last active
/// stage it reached, recovered from history, so the score stays frozen at
/// the shape it had when the deal closed.
fn progress_stage(lead: &Lead, history: &[StageHistoryEntry]) -> Option<Stage> {
    if lead.stage.is_active() {
        return Some(lead.stage);
    }
    history.iter().rev().find_map(|entry| {
        if entry.to_stage.is_active() {
            Some(entry.to_stage)
        } else {
            entry.from_stage.filter(|s| s.is_active())
        }
    })
}

fn pipeline_progress(
    lead: &Lead,
    history: &[StageHistoryEntry],
    weights: &ScoreWeights,
) -> DimensionScore {
    let w = &weights.progress;
    let last_ordinal = (Stage::ACTIVE.len() - 1) as f64;
    let stage_share = progress_stage(lead, history)
        .and_then(Stage::ordinal)
        .map_or(0.0, |ord| ord as f64 / last_ordinal);

    let completed: Vec<f64> = stage_durations(history)
        .into_iter()
        .flatten()
        .map(|d| d.num_seconds() as f64 / 86_400.0)
        .collect();
    let velocity = if completed.is_empty() {
        0.0
    } else {
        let avg_days = completed.iter().sum::<f64>() / completed.len() as f64;
        if avg_days <= 0.0 {
            1.0
        } else {
            (w.velocity_target_days / avg_days).min(1.0)
        }
    };

    let raw = stage_share * w.stage_weight + velocity * w.velocity_weight;
    DimensionScore {
        score: (raw * weights.progress_max).clamp(0.0, weights.progress_max),
        max: weights.progress_max,
    }
}

fn contact_quality(contacts: &[Contact], weights: &ScoreWeights) -> DimensionScore {
    let w = &weights.contacts;
    let raw: f64 = contacts
        .iter()
        .map(|c| w.role_weight(c.role) * w.per_contact_points)
        .sum();
    DimensionScore {
        score: raw.clamp(0.0, weights.contacts_max),
        max: weights.contacts_max,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ContactRole, Priority};
    use crate::stage::{append_entry, initial_entry, transition, TransitionOptions};
    use chrono::{DateTime, TimeZone, Utc};

    fn ts(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, day, 9, 0, 0).unwrap()
    }

    fn bare_lead() -> Lead {
        let mut lead = Lead::new("ACME Lighting");
        lead.estimated_value = 10_000.0;
        lead.closing_probability = 50;
        lead.priority = Priority::High;
        lead
    }

    #[test]
    fn breakdown_total_is_sum_of_dimensions() {
        let lead = bare_lead();
        let weights = ScoreWeights::default();
        let breakdown = compute_score(
            &lead,
            &EngagementStats::default(),
            &[],
            &[],
            &weights,
        );
        let sum: f64 = breakdown.dimensions().iter().map(|d| d.score).sum();
        assert!((breakdown.total() - sum).abs() < 1e-12);
        assert!((breakdown.max_total() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn fresh_high_priority_lead_scores_cold() {
        // Value 10 000, probability 50, priority high, stage new, no
        // engagement and no contacts.
        let lead = bare_lead();
        let weights = ScoreWeights::default();
        let thresholds = ScoreThresholds::default();
        let breakdown = compute_score(
            &lead,
            &EngagementStats::default(),
            &[],
            &[],
            &weights,
        );

        assert!(breakdown.deal_potential.score < weights.deal_max / 2.0 + 1e-9);
        assert_eq!(breakdown.pipeline_progress.score, 0.0);
        assert!(breakdown.total() < 40.0);
        assert_eq!(temperature(breakdown.total(), &thresholds), Temperature::Cold);
    }

    #[test]
    fn score_rises_monotonically_with_advancement_and_engagement() {
        let weights = ScoreWeights::default();
        let thresholds = ScoreThresholds::default();

        let mut lead = bare_lead();
        let mut history = vec![initial_entry(&lead, ts(1))];
        let mut engagement = EngagementStats::default();
        let mut contacts = Vec::new();

        let mut last = compute_score(&lead, &engagement, &contacts, &history, &weights).total();

        // Advance a stage per day; each hop must raise the score.
        for (day, stage) in [
            (2, Stage::Contacted),
            (3, Stage::Negotiating),
            (4, Stage::Closing),
        ] {
            let outcome = transition(&lead, stage, &TransitionOptions::at(ts(day))).unwrap();
            lead = outcome.lead;
            append_entry(&mut history, outcome.entry);
            let score = compute_score(&lead, &engagement, &contacts, &history, &weights).total();
            assert!(score > last, "stage {} did not raise the score", stage);
            last = score;
        }

        // Each engagement signal must also raise it.
        for _ in 0..5 {
            engagement.activity_count += 1;
            let score = compute_score(&lead, &engagement, &contacts, &history, &weights).total();
            assert!(score > last);
            last = score;
        }
        for _ in 0..2 {
            contacts.push(Contact::new("Dana", ContactRole::DecisionMaker));
            let score = compute_score(&lead, &engagement, &contacts, &history, &weights).total();
            assert!(score >= last);
            last = score;
        }

        let band = temperature(last, &thresholds);
        assert!(
            matches!(band, Temperature::Warm | Temperature::Hot),
            "expected warm or hot, got {} at score {:.1}",
            band,
            last
        );
    }

    #[test]
    fn closed_lead_score_is_frozen_at_closing_stage() {
        let weights = ScoreWeights::default();
        let mut lead = bare_lead();
        let mut history = vec![initial_entry(&lead, ts(1))];
        for (day, stage) in [(2, Stage::Contacted), (3, Stage::Negotiating)] {
            let outcome = transition(&lead, stage, &TransitionOptions::at(ts(day))).unwrap();
            lead = outcome.lead;
            append_entry(&mut history, outcome.entry);
        }
        let before = compute_score(
            &lead,
            &EngagementStats::default(),
            &[],
            &history,
            &weights,
        );

        let won = transition(&lead, Stage::Won, &TransitionOptions::at(ts(4))).unwrap();
        let mut won_history = history.clone();
        append_entry(&mut won_history, won.entry);
        let after = compute_score(
            &won.lead,
            &EngagementStats::default(),
            &[],
            &won_history,
            &weights,
        );

        // Stage share stays at Negotiating's ordinal; only the velocity
        // term may move with the extra completed duration.
        assert_eq!(
            progress_stage(&won.lead, &won_history),
            Some(Stage::Negotiating)
        );
        assert!(after.pipeline_progress.score >= before.pipeline_progress.score);
    }

    #[test]
    fn dimension_scores_are_floored_at_zero_under_hostile_weights() {
        // Sub-factor weights that sum to 1.0 but carry a negative share.
        // Validation rejects these, but the scorer must still hold the
        // 0-100 contract if handed them directly.
        let mut weights = ScoreWeights::default();
        weights.deal.value_weight = -0.5;
        weights.deal.probability_weight = 1.0;
        weights.deal.priority_weight = 0.5;

        let mut lead = bare_lead();
        lead.estimated_value = 1_000_000.0;
        lead.closing_probability = 0;
        lead.priority = Priority::Low;

        let breakdown = compute_score(
            &lead,
            &EngagementStats::default(),
            &[],
            &[],
            &weights,
        );
        assert_eq!(breakdown.deal_potential.score, 0.0);
        for dim in breakdown.dimensions() {
            assert!(dim.score >= 0.0 && dim.score <= dim.max);
        }
        assert!((0.0..=100.0).contains(&breakdown.total()));
    }

    #[test]
    fn engagement_has_diminishing_returns() {
        let weights = ScoreWeights::default();
        let gain = |n: u32| {
            let a = engagement_score(
                &EngagementStats {
                    activity_count: n,
                    ..Default::default()
                },
                &weights,
            )
            .score;
            let b = engagement_score(
                &EngagementStats {
                    activity_count: n + 1,
                    ..Default::default()
                },
                &weights,
            )
            .score;
            b - a
        };
        assert!(gain(0) > gain(5));
        // Saturated: more spam adds nothing.
        assert_eq!(gain(500), 0.0);
    }

    #[test]
    fn contact_quality_is_capped_and_ignores_blockers() {
        let weights = ScoreWeights::default();
        let blockers = vec![Contact::new("B", ContactRole::Blocker); 4];
        assert_eq!(contact_quality(&blockers, &weights).score, 0.0);

        let board: Vec<Contact> = (0..5)
            .map(|_| Contact::new("D", ContactRole::DecisionMaker))
            .collect();
        assert_eq!(contact_quality(&board, &weights).score, weights.contacts_max);
    }

    #[test]
    fn rescore_caches_total_on_lead() {
        let mut lead = bare_lead();
        lead.email = Some("sales@acme.example".to_string());
        let weights = ScoreWeights::default();
        let breakdown = rescore(
            &mut lead,
            &EngagementStats::default(),
            &[],
            &[],
            &weights,
        );
        assert_eq!(lead.lead_score, breakdown.total());
    }

    #[test]
    fn custom_weights_shift_dimension_maxima() {
        let mut weights = ScoreWeights::default();
        weights.profile_max = 40.0;
        weights.deal_max = 20.0;
        weights.engagement_max = 20.0;
        weights.progress_max = 15.0;
        weights.contacts_max = 5.0;
        assert!(weights.validate().is_ok());

        let mut lead = bare_lead();
        lead.sector = Some("lighting".to_string());
        lead.email = Some("sales@acme.example".to_string());
        lead.phone = Some("+39 02 1234".to_string());

        let breakdown = compute_score(
            &lead,
            &EngagementStats::default(),
            &[],
            &[],
            &weights,
        );
        // 4 of 8 fields populated under a 40-point maximum.
        assert!((breakdown.profile_completeness.score - 20.0).abs() < 1e-9);
        assert!((breakdown.max_total() - 100.0).abs() < 1e-9);
    }
}
