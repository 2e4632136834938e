//! Shared builders for the integration suite.

use chrono::{DateTime, TimeZone, Utc};
use leadmap::{Lead, LeadSource, Priority, Stage};

#[allow(dead_code)]
pub fn ts(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, day, 10, 0, 0).unwrap()
}

/// A lead with enough profile to be realistic.
pub fn sample_lead(name: &str) -> Lead {
    let mut lead = Lead::new(name);
    lead.sector = Some("manufacturing".to_string());
    lead.email = Some(format!(
        "{}@example.com",
        name.to_lowercase().replace(' ', ".")
    ));
    lead.estimated_value = 10_000.0;
    lead.closing_probability = 50;
    lead.priority = Priority::High;
    lead.source = LeadSource::Referral;
    lead
}

#[allow(dead_code)]
pub fn closed_lead(name: &str, stage: Stage, score: f64) -> Lead {
    let mut lead = sample_lead(name);
    lead.stage = stage;
    lead.lead_score = score;
    if stage == Stage::Lost {
        lead.loss_reason = Some("budget reallocated".to_string());
    }
    lead
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
