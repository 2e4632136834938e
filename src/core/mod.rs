//! Domain model for the lead pipeline.

mod ids;
mod lead;
mod stage;

pub use ids::{ContactId, HistoryEntryId, LeadId, SponsorId, TagId};
pub use lead::{Contact, ContactRole, EngagementStats, Lead, LeadSource, Priority, Tag, Temperature};
pub use stage::{Stage, StageHistoryEntry};
