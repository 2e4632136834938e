//! Lead, tag, and contact domain types.
//!
//! Categorical fields (priority, source, contact role, temperature) are
//! closed enumerations rather than free strings so illegal states are
//! unrepresentable. All optional identity fields participate in the
//! profile-completeness scoring dimension.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use super::ids::{ContactId, LeadId, SponsorId, TagId};
use super::stage::Stage;

/// Deal priority assigned by the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

/// Where the lead came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadSource {
    Referral,
    Website,
    Event,
    ColdOutreach,
    Social,
    Inbound,
    Other,
}

/// Score temperature band, derived from the threshold partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Temperature {
    Cold,
    Warm,
    Hot,
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Temperature::Cold => "cold",
            Temperature::Warm => "warm",
            Temperature::Hot => "hot",
        };
        f.write_str(label)
    }
}

/// Decision role of a contact person, ordered by buying influence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactRole {
    DecisionMaker,
    Influencer,
    User,
    Champion,
    Blocker,
}

/// A contact person attached to a lead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub id: ContactId,
    pub name: String,
    pub role: ContactRole,
}

impl Contact {
    pub fn new(name: impl Into<String>, role: ContactRole) -> Self {
        Self {
            id: ContactId::new(),
            name: name.into(),
            role,
        }
    }
}

/// Club-owned label with independent lifecycle; deleting a tag removes the
/// association from leads, never the lead itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
    pub color: String,
}

impl Tag {
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id: TagId::new(),
            name: name.into(),
            color: color.into(),
        }
    }
}

/// Engagement counters for one lead, read from the activity collaborator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementStats {
    pub activity_count: u32,
    pub completed_follow_up_count: u32,
    pub pending_follow_up_count: u32,
    pub note_count: u32,
}

/// A prospective sponsor moving through the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub id: LeadId,
    pub name: String,
    pub sector: Option<String>,
    pub fiscal_code: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub address: Option<String>,
    pub logo_url: Option<String>,
    #[serde(default)]
    pub social_handles: Vec<String>,
    pub estimated_value: f64,
    /// Closing probability in percent, 0-100.
    pub closing_probability: u8,
    pub priority: Priority,
    pub source: LeadSource,
    pub stage: Stage,
    /// Non-empty exactly when `stage == Lost`.
    pub loss_reason: Option<String>,
    pub converted: bool,
    pub converted_sponsor_id: Option<SponsorId>,
    pub created_at: DateTime<Utc>,
    pub last_contacted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tag_ids: BTreeSet<TagId>,
    /// Cached composite score, recomputed whenever scoring inputs change.
    #[serde(default)]
    pub lead_score: f64,
}

impl Lead {
    /// Create a lead in the initial stage with empty optional fields.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: LeadId::new(),
            name: name.into(),
            sector: None,
            fiscal_code: None,
            email: None,
            phone: None,
            website: None,
            address: None,
            logo_url: None,
            social_handles: Vec::new(),
            estimated_value: 0.0,
            closing_probability: 0,
            priority: Priority::Medium,
            source: LeadSource::Other,
            stage: Stage::New,
            loss_reason: None,
            converted: false,
            converted_sponsor_id: None,
            created_at: Utc::now(),
            last_contacted_at: None,
            tag_ids: BTreeSet::new(),
            lead_score: 0.0,
        }
    }

    pub fn has_tag(&self, tag_id: TagId) -> bool {
        self.tag_ids.contains(&tag_id)
    }

    /// Cascade helper used when a tag is deleted club-wide.
    pub fn remove_tag(&mut self, tag_id: TagId) -> bool {
        self.tag_ids.remove(&tag_id)
    }

    /// Number of populated identity fields, the input to the
    /// profile-completeness scoring dimension. Eight fields total.
    pub fn populated_profile_fields(&self) -> usize {
        let populated = |field: &Option<String>| {
            field.as_deref().is_some_and(|v| !v.trim().is_empty())
        };
        let mut count = usize::from(!self.name.trim().is_empty());
        count += [
            &self.sector,
            &self.fiscal_code,
            &self.email,
            &self.phone,
            &self.website,
            &self.address,
            &self.logo_url,
        ]
        .into_iter()
        .filter(|f| populated(f))
        .count();
        count
    }

    /// Total number of profile fields considered by completeness scoring.
    pub const PROFILE_FIELD_COUNT: usize = 8;

    /// Check the cross-field invariants that the stage machine maintains.
    pub fn validate(&self) -> Result<(), String> {
        let has_reason = self
            .loss_reason
            .as_deref()
            .is_some_and(|r| !r.trim().is_empty());
        if self.stage == Stage::Lost && !has_reason {
            return Err("lost lead must carry a loss reason".to_string());
        }
        if self.stage != Stage::Lost && self.loss_reason.is_some() {
            return Err("loss reason present outside the lost stage".to_string());
        }
        if self.converted && self.stage != Stage::Won {
            return Err("converted lead must be in the won stage".to_string());
        }
        if self.closing_probability > 100 {
            return Err("closing probability must be 0-100".to_string());
        }
        Ok(())
    }
}
