//! Pipeline view queries: multi-facet filtering, sorting, pagination.
//!
//! Each facet is a pure predicate; facets combine with AND semantics,
//! except the tag facet which matches when the lead carries *any* selected
//! tag. A facet left at its sentinel value ("all"/empty/`None`) excludes
//! nothing. Queries never fail and are idempotent: identical inputs yield
//! an identical ordered list, which keeps pagination deterministic.

use serde::{Deserialize, Serialize};

use crate::config::ScoreThresholds;
use crate::core::{Lead, LeadSource, Priority, Stage, TagId, Temperature};

/// Stage facet: a single stage or the match-all sentinel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageFilter {
    #[default]
    All,
    Only(Stage),
}

/// Criteria for one pipeline view. `Default` matches every lead in input
/// order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterCriteria {
    /// Case-insensitive substring over name, email, and sector (OR across
    /// the three fields).
    #[serde(default)]
    pub search: Option<String>,

    #[serde(default)]
    pub stage: StageFilter,

    #[serde(default)]
    pub source: Option<LeadSource>,

    #[serde(default)]
    pub priority: Option<Priority>,

    /// Temperature band of the lead's cached score under the threshold
    /// partition.
    #[serde(default)]
    pub temperature: Option<Temperature>,

    /// Lead must carry at least one of these; empty = no-op.
    #[serde(default)]
    pub tag_ids: Vec<TagId>,

    /// Stable descending sort on the lead score; ties keep input order.
    #[serde(default)]
    pub sort_by_score: bool,
}

impl FilterCriteria {
    pub fn search(text: impl Into<String>) -> Self {
        Self {
            search: Some(text.into()),
            ..Self::default()
        }
    }
}

/// Check if a lead matches the free-text search.
#[inline]
pub fn matches_search(lead: &Lead, needle: &str) -> bool {
    let needle = needle.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    let contains = |field: Option<&str>| {
        field.is_some_and(|value| value.to_lowercase().contains(&needle))
    };
    contains(Some(&lead.name)) || contains(lead.email.as_deref()) || contains(lead.sector.as_deref())
}

#[inline]
pub fn matches_stage(lead: &Lead, filter: StageFilter) -> bool {
    match filter {
        StageFilter::All => true,
        StageFilter::Only(stage) => lead.stage == stage,
    }
}

/// Check the tag facet: any overlap between the lead's tags and the
/// selection. An empty selection excludes nothing.
#[inline]
pub fn matches_tags(lead: &Lead, tag_ids: &[TagId]) -> bool {
    tag_ids.is_empty() || tag_ids.iter().any(|id| lead.has_tag(*id))
}

#[inline]
pub fn matches_temperature(
    lead: &Lead,
    wanted: Temperature,
    thresholds: &ScoreThresholds,
) -> bool {
    thresholds.classify(lead.lead_score) == wanted
}

fn matches(lead: &Lead, criteria: &FilterCriteria, thresholds: &ScoreThresholds) -> bool {
    criteria
        .search
        .as_deref()
        .map_or(true, |needle| matches_search(lead, needle))
        && matches_stage(lead, criteria.stage)
        && criteria.source.map_or(true, |s| lead.source == s)
        && criteria.priority.map_or(true, |p| lead.priority == p)
        && criteria
            .temperature
            .map_or(true, |t| matches_temperature(lead, t, thresholds))
        && matches_tags(lead, &criteria.tag_ids)
}

/// Apply every facet, then the optional score sort.
///
/// Side-effect-free; the returned order is deterministic and the function
/// is idempotent over its own output.
pub fn filter_and_sort(
    leads: &[Lead],
    criteria: &FilterCriteria,
    thresholds: &ScoreThresholds,
) -> Vec<Lead> {
    let mut selected: Vec<Lead> = leads
        .iter()
        .filter(|lead| matches(lead, criteria, thresholds))
        .cloned()
        .collect();

    if criteria.sort_by_score {
        // Stable sort: equal scores keep their input order.
        selected.sort_by(|a, b| b.lead_score.total_cmp(&a.lead_score));
    }

    selected
}

/// One page of a list, 1-based.
///
/// Out-of-range page numbers clamp to the nearest valid page; a zero page
/// size yields an empty slice.
pub fn page<T>(list: &[T], page_number: usize, page_size: usize) -> &[T] {
    if page_size == 0 || list.is_empty() {
        return &[];
    }
    let last_page = list.len().div_ceil(page_size);
    let page_number = page_number.clamp(1, last_page);
    let start = (page_number - 1) * page_size;
    let end = (start + page_size).min(list.len());
    &list[start..end]
}
