//! Stage machine: transition validation and the audit history.
//!
//! All functions here are pure. The machine computes the legal next state
//! and the audit entry; persisting both atomically is the store's job.

use chrono::{DateTime, Duration, Utc};

use crate::core::{Lead, Stage, StageHistoryEntry};
use crate::error::PipelineError;

/// Options for a stage transition.
#[derive(Debug, Clone, Default)]
pub struct TransitionOptions {
    /// Required when transitioning to `Lost`; ignored otherwise.
    pub loss_reason: Option<String>,
    /// Transition timestamp; `Utc::now()` when absent.
    pub at: Option<DateTime<Utc>>,
}

impl TransitionOptions {
    pub fn with_loss_reason(reason: impl Into<String>) -> Self {
        Self {
            loss_reason: Some(reason.into()),
            at: None,
        }
    }

    pub fn at(timestamp: DateTime<Utc>) -> Self {
        Self {
            loss_reason: None,
            at: Some(timestamp),
        }
    }
}

/// Result of a validated transition: the updated lead and its new history
/// entry, neither persisted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionOutcome {
    pub lead: Lead,
    pub entry: StageHistoryEntry,
}

/// Validate a stage change and produce the updated lead plus audit entry.
///
/// Rejections:
/// - converted leads are frozen (`InvalidState`)
/// - transitioning to the current stage is a no-op (`InvalidState`)
/// - leaving `Won` (`InvalidState`); won deals are final
/// - `Lost` to a terminal stage (`InvalidState`); a lost lead reopens to
///   an active stage only
/// - `Lost` without a non-blank loss reason (`Validation`)
///
/// Moving into `Lost` records the reason; moving anywhere else clears it,
/// keeping the reason-iff-lost invariant.
pub fn transition(
    lead: &Lead,
    to: Stage,
    opts: &TransitionOptions,
) -> Result<TransitionOutcome, PipelineError> {
    check_transition(lead, to)?;

    let loss_reason = match to {
        Stage::Lost => {
            let reason = opts
                .loss_reason
                .as_deref()
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .ok_or_else(|| {
                    PipelineError::validation("a loss reason is required to mark a lead lost")
                })?;
            Some(reason.to_string())
        }
        _ => None,
    };

    let changed_at = opts.at.unwrap_or_else(Utc::now);
    let entry = StageHistoryEntry::new(
        lead.id,
        Some(lead.stage),
        to,
        changed_at,
        lead.estimated_value,
    );

    let mut updated = lead.clone();
    updated.stage = to;
    updated.loss_reason = loss_reason;

    Ok(TransitionOutcome { lead: updated, entry })
}

/// State checks for a proposed stage change, everything in `transition`
/// except the loss reason requirement. Callers that must decide whether
/// to collect a reason can reject impossible moves first.
pub fn check_transition(lead: &Lead, to: Stage) -> Result<(), PipelineError> {
    if lead.converted {
        return Err(PipelineError::invalid_state(format!(
            "lead '{}' is converted and read-only",
            lead.name
        )));
    }
    if to == lead.stage {
        return Err(PipelineError::invalid_state(format!(
            "lead '{}' is already in stage {}",
            lead.name, to
        )));
    }
    if lead.stage == Stage::Won {
        return Err(PipelineError::invalid_state(format!(
            "lead '{}' is won; won deals are final",
            lead.name
        )));
    }
    if lead.stage == Stage::Lost && to.is_terminal() {
        return Err(PipelineError::invalid_state(format!(
            "lead '{}' is lost and can only reopen to an active stage",
            lead.name
        )));
    }
    Ok(())
}

/// Build the creation entry for a freshly created lead.
pub fn initial_entry(lead: &Lead, at: DateTime<Utc>) -> StageHistoryEntry {
    StageHistoryEntry::new(lead.id, None, lead.stage, at, lead.estimated_value)
}

/// Append an entry to a lead's history, flipping the previous entry's
/// `is_current` flag. Maintains the exactly-one-current invariant.
pub fn append_entry(history: &mut Vec<StageHistoryEntry>, mut entry: StageHistoryEntry) {
    for existing in history.iter_mut() {
        existing.is_current = false;
    }
    entry.is_current = true;
    history.push(entry);
}

/// Time spent in the stage each entry moved the lead into.
///
/// Computed from consecutive `changed_at` timestamps; the last entry's
/// stage is still open, so its slot is `None` (callers compute the live
/// duration against "now").
pub fn stage_durations(entries: &[StageHistoryEntry]) -> Vec<Option<Duration>> {
    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            entries
                .get(i + 1)
                .map(|next| next.changed_at - entry.changed_at)
        })
        .collect()
}
