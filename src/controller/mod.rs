//! Pipeline orchestration against an external lead store.
//!
//! The controller holds the client-side lead collection as explicit
//! two-state slots: a `committed` lead (what the store last confirmed) and
//! an optional `pending` optimistic transition. Drag-and-drop stays
//! responsive because the optimistic state is visible immediately; the
//! store's eventual answer is reconciled through [`reconcile`], which
//! commits, rolls back, or discards a stale response based on a per-lead
//! request sequence number.
//!
//! Concurrency model: one transition in flight per lead. A second request
//! on the same lead while one is pending is rejected; requests on
//! different leads proceed independently. `cancel_pending` bumps the
//! sequence so a superseding request can be issued and the stale response
//! is ignored on arrival.

mod aggregate;

pub use aggregate::{
    aggregate_by_stage, compute_kpis, BoardAggregates, PipelineKpis, StageAggregate, StageColumn,
    TemperatureDistribution,
};

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::ScoreConfig;
use crate::core::{Contact, EngagementStats, Lead, LeadId, Stage, StageHistoryEntry};
use crate::error::PipelineError;
use crate::score;
use crate::stage::{self, TransitionOptions};
use crate::store::{LeadPatch, LeadStore, StoreError};

/// Client-held state for one lead.
#[derive(Debug, Clone)]
struct LeadSlot {
    committed: Lead,
    pending: Option<PendingTransition>,
    /// Monotonically increasing per-lead request sequence; a store
    /// response tagged with an older value is stale.
    seq: u64,
}

#[derive(Debug, Clone)]
struct PendingTransition {
    seq: u64,
    optimistic: Lead,
}

impl LeadSlot {
    fn new(committed: Lead) -> Self {
        Self {
            committed,
            pending: None,
            seq: 0,
        }
    }

    /// The lead as views should render it: optimistic when pending.
    fn visible(&self) -> &Lead {
        self.pending
            .as_ref()
            .map(|p| &p.optimistic)
            .unwrap_or(&self.committed)
    }
}

/// Answer to a transition request.
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionRequest {
    /// Losing a lead needs a reason first; the store was not contacted.
    /// Collect the reason and call again (two-phase).
    NeedsLossReason,
    /// The store confirmed; the committed lead is returned.
    Completed(Lead),
    /// The request was cancelled locally before the store answered; its
    /// response was discarded.
    Superseded,
}

/// Outcome of reconciling a store response against the slot state.
#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileOutcome {
    /// Response confirms the current pending transition.
    Committed(Lead),
    /// Store failed; the optimistic mutation was rolled back.
    RolledBack(StoreError),
    /// Response belongs to a superseded request; ignored. Internal
    /// signal, never surfaced as a user-visible error.
    StaleDiscarded,
}

/// Orchestrates stage transitions, scoring, and pipeline views over an
/// external store.
pub struct PipelineController {
    store: Arc<dyn LeadStore>,
    config: ScoreConfig,
    slots: Mutex<HashMap<LeadId, LeadSlot>>,
}

impl PipelineController {
    pub fn new(store: Arc<dyn LeadStore>, config: ScoreConfig) -> Self {
        Self {
            store,
            config,
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &ScoreConfig {
        &self.config
    }

    /// Reload the collection from the store, dropping any pending state.
    pub async fn refresh(&self) -> Result<usize, PipelineError> {
        let leads = self.store.list().await?;
        let mut slots = self.slots.lock();
        slots.clear();
        for lead in leads {
            slots.insert(lead.id, LeadSlot::new(lead));
        }
        Ok(slots.len())
    }

    /// Current collection as views should render it (optimistic state
    /// included), in insertion-independent id order for determinism.
    pub fn leads(&self) -> Vec<Lead> {
        let slots = self.slots.lock();
        let mut leads: Vec<Lead> = slots.values().map(|s| s.visible().clone()).collect();
        leads.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        leads
    }

    pub fn lead(&self, id: LeadId) -> Option<Lead> {
        self.slots.lock().get(&id).map(|s| s.visible().clone())
    }

    /// Request a stage transition with optimistic local update.
    ///
    /// Phase one of losing a lead: called without a reason, returns
    /// [`TransitionRequest::NeedsLossReason`] without touching the store.
    /// State errors (unknown lead, in-flight transition, impossible move)
    /// are rejected first so the caller never collects a reason for a
    /// transition that could not commit anyway.
    pub async fn request_transition(
        &self,
        lead_id: LeadId,
        to: Stage,
        reason: Option<String>,
    ) -> Result<TransitionRequest, PipelineError> {
        let needs_reason = to == Stage::Lost
            && reason.as_deref().map_or(true, |r| r.trim().is_empty());

        // Validate and install the optimistic state under the lock.
        let (seq, lead, entry) = {
            let mut slots = self.slots.lock();
            let slot = slots
                .get_mut(&lead_id)
                .ok_or_else(|| PipelineError::invalid_state(format!("unknown lead {}", lead_id)))?;
            if slot.pending.is_some() {
                return Err(PipelineError::invalid_state(format!(
                    "a transition is already in flight for lead {}",
                    lead_id
                )));
            }
            // Impossible moves are rejected before asking the caller to
            // collect a loss reason.
            stage::check_transition(&slot.committed, to)?;
            if needs_reason {
                return Ok(TransitionRequest::NeedsLossReason);
            }

            let opts = TransitionOptions {
                loss_reason: reason,
                at: None,
            };
            let outcome = stage::transition(&slot.committed, to, &opts)?;

            slot.seq += 1;
            slot.pending = Some(PendingTransition {
                seq: slot.seq,
                optimistic: outcome.lead.clone(),
            });
            (slot.seq, outcome.lead, outcome.entry)
        };

        let result = self.store.apply_transition(lead, entry).await;
        match self.reconcile(lead_id, seq, result) {
            ReconcileOutcome::Committed(lead) => Ok(TransitionRequest::Completed(lead)),
            ReconcileOutcome::RolledBack(err) => Err(PipelineError::Store(err)),
            ReconcileOutcome::StaleDiscarded => Ok(TransitionRequest::Superseded),
        }
    }

    /// Reconcile a store response for request `seq` against the slot.
    ///
    /// Decides commit, rollback, or stale-discard; exposed separately so
    /// the protocol is testable without a store in the loop.
    pub fn reconcile(
        &self,
        lead_id: LeadId,
        seq: u64,
        result: Result<Lead, StoreError>,
    ) -> ReconcileOutcome {
        let mut slots = self.slots.lock();
        let Some(slot) = slots.get_mut(&lead_id) else {
            log::debug!("discarding response for removed lead {}", lead_id);
            return ReconcileOutcome::StaleDiscarded;
        };
        let current = slot.pending.as_ref().is_some_and(|p| p.seq == seq);
        if !current {
            log::debug!(
                "discarding stale response for lead {} (seq {}, now {})",
                lead_id,
                seq,
                slot.seq
            );
            return ReconcileOutcome::StaleDiscarded;
        }

        match result {
            Ok(lead) => {
                slot.committed = lead.clone();
                slot.pending = None;
                ReconcileOutcome::Committed(lead)
            }
            Err(err) => {
                log::warn!(
                    "store rejected transition for lead {}: {}; rolling back",
                    lead_id,
                    err
                );
                slot.pending = None;
                ReconcileOutcome::RolledBack(err)
            }
        }
    }

    /// Abandon the pending transition so a newer request can win; the
    /// in-flight response will be discarded on arrival.
    pub fn cancel_pending(&self, lead_id: LeadId) -> bool {
        let mut slots = self.slots.lock();
        let Some(slot) = slots.get_mut(&lead_id) else {
            return false;
        };
        if slot.pending.take().is_some() {
            slot.seq += 1;
            true
        } else {
            false
        }
    }

    /// Recompute a lead's score from fresh inputs, cache it locally, and
    /// persist it through the store.
    pub async fn recompute_score(
        &self,
        lead_id: LeadId,
        engagement: &EngagementStats,
        contacts: &[Contact],
    ) -> Result<f64, PipelineError> {
        let history: Vec<StageHistoryEntry> = self.store.get_history(lead_id).await?;
        let mut lead = {
            let slots = self.slots.lock();
            slots
                .get(&lead_id)
                .map(|s| s.committed.clone())
                .ok_or_else(|| PipelineError::invalid_state(format!("unknown lead {}", lead_id)))?
        };

        let breakdown = score::rescore(
            &mut lead,
            engagement,
            contacts,
            &history,
            &self.config.weights,
        );
        let total = breakdown.total();

        let patch = LeadPatch {
            lead_score: Some(total),
            ..Default::default()
        };
        let stored = self.store.update(lead_id, patch).await?;

        let mut slots = self.slots.lock();
        if let Some(slot) = slots.get_mut(&lead_id) {
            slot.committed = stored;
        }
        Ok(total)
    }

    /// Board aggregation over the current visible collection.
    pub fn board(&self) -> BoardAggregates {
        aggregate_by_stage(&self.leads())
    }

    /// KPIs over the current visible collection.
    pub fn kpis(&self) -> PipelineKpis {
        compute_kpis(&self.leads(), &self.config.thresholds)
    }
}
