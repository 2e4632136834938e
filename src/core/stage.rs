//! Pipeline stages and the immutable stage history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{HistoryEntryId, LeadId};

/// A lead's position in the sales pipeline.
///
/// The five active stages are ordered; `Won` and `Lost` are terminal and
/// reachable from any active stage. There is no backward enforcement: any
/// active-to-active move is legal, which also allows reopening a lost lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    New,
    Contacted,
    Negotiating,
    ProposalSent,
    Closing,
    Won,
    Lost,
}

impl Stage {
    /// The active (non-terminal) stages, in pipeline order.
    pub const ACTIVE: [Stage; 5] = [
        Stage::New,
        Stage::Contacted,
        Stage::Negotiating,
        Stage::ProposalSent,
        Stage::Closing,
    ];

    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Won | Stage::Lost)
    }

    pub fn is_active(self) -> bool {
        !self.is_terminal()
    }

    /// Position among the active stages, `None` for terminal stages.
    pub fn ordinal(self) -> Option<usize> {
        Self::ACTIVE.iter().position(|s| *s == self)
    }

    pub fn label(self) -> &'static str {
        match self {
            Stage::New => "new",
            Stage::Contacted => "contacted",
            Stage::Negotiating => "negotiating",
            Stage::ProposalSent => "proposal_sent",
            Stage::Closing => "closing",
            Stage::Won => "won",
            Stage::Lost => "lost",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One immutable record in a lead's stage audit trail.
///
/// Entries are append-only: once written, only the `is_current` flag is
/// flipped when a successor entry is appended. `from_stage` is `None` only
/// for the creation entry. The deal value is snapshotted at transition time
/// so historical pipeline reports survive later value edits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageHistoryEntry {
    pub id: HistoryEntryId,
    pub lead_id: LeadId,
    pub from_stage: Option<Stage>,
    pub to_stage: Stage,
    pub changed_at: DateTime<Utc>,
    pub value_at_transition: f64,
    pub is_current: bool,
}

impl StageHistoryEntry {
    pub fn new(
        lead_id: LeadId,
        from_stage: Option<Stage>,
        to_stage: Stage,
        changed_at: DateTime<Utc>,
        value_at_transition: f64,
    ) -> Self {
        Self {
            id: HistoryEntryId::new(),
            lead_id,
            from_stage,
            to_stage,
            changed_at,
            value_at_transition,
            is_current: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_stages_are_ordered() {
        let ordinals: Vec<_> = Stage::ACTIVE.iter().map(|s| s.ordinal()).collect();
        assert_eq!(
            ordinals,
            vec![Some(0), Some(1), Some(2), Some(3), Some(4)]
        );
    }

    #[test]
    fn terminal_stages_have_no_ordinal() {
        assert!(Stage::Won.is_terminal());
        assert!(Stage::Lost.is_terminal());
        assert_eq!(Stage::Won.ordinal(), None);
        assert_eq!(Stage::Lost.ordinal(), None);
    }

    #[test]
    fn stage_round_trips_through_serde_snake_case() {
        let json = serde_json::to_string(&Stage::ProposalSent).unwrap();
        assert_eq!(json, "\"proposal_sent\"");
        let back: Stage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Stage::ProposalSent);
    }
}
