// Export modules for library usage
pub mod config;
pub mod controller;
pub mod core;
pub mod error;
pub mod query;
pub mod score;
pub mod stage;
pub mod store;

// Re-export commonly used types
pub use crate::core::{
    Contact, ContactId, ContactRole, EngagementStats, HistoryEntryId, Lead, LeadId, LeadSource,
    Priority, SponsorId, Stage, StageHistoryEntry, Tag, TagId, Temperature,
};

pub use crate::config::{
    load_config, parse_and_validate_config, ContactRoleWeights, DealFactorWeights,
    EngagementFactorWeights, ProgressFactorWeights, ScoreConfig, ScoreThresholds, ScoreWeights,
};

pub use crate::error::PipelineError;

pub use crate::stage::{
    append_entry, check_transition, initial_entry, stage_durations, transition, TransitionOptions,
    TransitionOutcome,
};

pub use crate::score::{compute_score, rescore, temperature, DimensionScore, ScoreBreakdown};

pub use crate::query::{filter_and_sort, page, FilterCriteria, StageFilter};

pub use crate::controller::{
    aggregate_by_stage, compute_kpis, BoardAggregates, PipelineController, PipelineKpis,
    ReconcileOutcome, StageAggregate, StageColumn, TemperatureDistribution, TransitionRequest,
};

pub use crate::store::{
    ConversionService, LeadPatch, LeadStore, MemoryLeadStore, MemoryTagStore, StoreError, TagPatch,
    TagStore,
};
