//! External collaborator contracts.
//!
//! The engine consumes persistence through these traits and never commits
//! a stage change itself. A conforming `LeadStore` must persist the stage
//! change and its history entry atomically: the stage never advances
//! without an audit record, and vice versa.

mod memory;

pub use memory::{MemoryLeadStore, MemoryTagStore};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::{Lead, LeadId, LeadSource, Priority, SponsorId, StageHistoryEntry, Tag, TagId};

/// External store failure surfaced to the controller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflicting update: {0}")]
    Conflict(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Treated exactly like any other failure: the optimistic local
    /// mutation is rolled back.
    #[error("store timed out after {0} ms")]
    Timeout(u64),
}

impl StoreError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Conflict(_) | Self::Unavailable(_) | Self::Timeout(_)
        )
    }
}

/// Partial update of a lead's editable attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeadPatch {
    pub name: Option<String>,
    pub sector: Option<String>,
    pub fiscal_code: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub address: Option<String>,
    pub logo_url: Option<String>,
    pub estimated_value: Option<f64>,
    pub closing_probability: Option<u8>,
    pub priority: Option<Priority>,
    pub source: Option<LeadSource>,
    pub last_contacted_at: Option<DateTime<Utc>>,
    pub lead_score: Option<f64>,
    pub converted: Option<bool>,
    pub converted_sponsor_id: Option<SponsorId>,
}

impl LeadPatch {
    /// Apply the populated fields onto a lead.
    pub fn apply(&self, lead: &mut Lead) {
        macro_rules! patch {
            ($($field:ident),* $(,)?) => {
                $(if let Some(value) = self.$field.clone() {
                    lead.$field = Some(value);
                })*
            };
        }
        if let Some(name) = self.name.clone() {
            lead.name = name;
        }
        patch!(sector, fiscal_code, email, phone, website, address, logo_url);
        if let Some(value) = self.estimated_value {
            lead.estimated_value = value;
        }
        if let Some(probability) = self.closing_probability {
            lead.closing_probability = probability.min(100);
        }
        if let Some(priority) = self.priority {
            lead.priority = priority;
        }
        if let Some(source) = self.source {
            lead.source = source;
        }
        if let Some(at) = self.last_contacted_at {
            lead.last_contacted_at = Some(at);
        }
        if let Some(score) = self.lead_score {
            lead.lead_score = score;
        }
        if let Some(converted) = self.converted {
            lead.converted = converted;
        }
        if let Some(sponsor) = self.converted_sponsor_id {
            lead.converted_sponsor_id = Some(sponsor);
        }
    }
}

/// Persistence contract for leads and their stage history.
#[async_trait]
pub trait LeadStore: Send + Sync {
    async fn get(&self, id: LeadId) -> Result<Lead, StoreError>;

    async fn list(&self) -> Result<Vec<Lead>, StoreError>;

    async fn create(&self, lead: Lead) -> Result<Lead, StoreError>;

    async fn update(&self, id: LeadId, patch: LeadPatch) -> Result<Lead, StoreError>;

    /// Delete a lead, cascading its history.
    async fn delete(&self, id: LeadId) -> Result<(), StoreError>;

    /// Atomically persist a validated transition: the updated lead and its
    /// history entry commit together or not at all.
    async fn apply_transition(
        &self,
        lead: Lead,
        entry: StageHistoryEntry,
    ) -> Result<Lead, StoreError>;

    async fn get_history(&self, id: LeadId) -> Result<Vec<StageHistoryEntry>, StoreError>;
}

/// Partial update of a tag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagPatch {
    pub name: Option<String>,
    pub color: Option<String>,
}

/// Persistence contract for club tags. Deleting a tag cascades the
/// lead association, never the lead.
#[async_trait]
pub trait TagStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Tag>, StoreError>;

    async fn create(&self, name: String, color: String) -> Result<Tag, StoreError>;

    async fn update(&self, id: TagId, patch: TagPatch) -> Result<Tag, StoreError>;

    async fn delete(&self, id: TagId) -> Result<(), StoreError>;
}

/// Signature of the external conversion service invoked when a won lead is
/// turned into a sponsor account. After conversion the lead is read-only
/// to the stage machine.
#[async_trait]
pub trait ConversionService: Send + Sync {
    async fn convert(&self, lead_id: LeadId) -> Result<SponsorId, StoreError>;
}
