//! In-memory reference stores.
//!
//! Used by the test suite and as a single-process backend. Honors the
//! atomic transition contract and the cascade rules. `fail_next` injects
//! one failure into the next operation, which is how the rollback path is
//! exercised.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;

use super::{LeadPatch, LeadStore, StoreError, TagPatch, TagStore};
use crate::core::{Lead, LeadId, StageHistoryEntry, Tag, TagId};
use crate::stage;

#[derive(Debug, Clone)]
struct LeadRecord {
    lead: Lead,
    history: Vec<StageHistoryEntry>,
}

/// Reference `LeadStore` backed by a hash map.
#[derive(Default)]
pub struct MemoryLeadStore {
    records: RwLock<HashMap<LeadId, LeadRecord>>,
    fail_next: Mutex<Option<StoreError>>,
}

impl MemoryLeadStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store, writing each lead's creation history entry.
    pub fn with_leads(leads: impl IntoIterator<Item = Lead>) -> Self {
        let store = Self::new();
        {
            let mut records = store.records.write();
            for lead in leads {
                let entry = stage::initial_entry(&lead, lead.created_at);
                records.insert(
                    lead.id,
                    LeadRecord {
                        lead,
                        history: vec![entry],
                    },
                );
            }
        }
        store
    }

    /// Make the next store operation fail with `err`.
    pub fn fail_next(&self, err: StoreError) {
        *self.fail_next.lock() = Some(err);
    }

    fn take_failure(&self) -> Result<(), StoreError> {
        match self.fail_next.lock().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn missing(id: LeadId) -> StoreError {
        StoreError::NotFound(format!("lead {}", id))
    }

    /// Strip a tag from every lead; called by the linked tag store.
    fn remove_tag_everywhere(&self, tag_id: TagId) {
        let mut records = self.records.write();
        for record in records.values_mut() {
            record.lead.remove_tag(tag_id);
        }
    }
}

#[async_trait]
impl LeadStore for MemoryLeadStore {
    async fn get(&self, id: LeadId) -> Result<Lead, StoreError> {
        self.take_failure()?;
        let records = self.records.read();
        records
            .get(&id)
            .map(|r| r.lead.clone())
            .ok_or_else(|| Self::missing(id))
    }

    async fn list(&self) -> Result<Vec<Lead>, StoreError> {
        self.take_failure()?;
        let records = self.records.read();
        let mut leads: Vec<Lead> = records.values().map(|r| r.lead.clone()).collect();
        leads.sort_by_key(|l| l.created_at);
        Ok(leads)
    }

    async fn create(&self, lead: Lead) -> Result<Lead, StoreError> {
        self.take_failure()?;
        let mut records = self.records.write();
        if records.contains_key(&lead.id) {
            return Err(StoreError::Conflict(format!("lead {} exists", lead.id)));
        }
        let entry = stage::initial_entry(&lead, Utc::now());
        records.insert(
            lead.id,
            LeadRecord {
                lead: lead.clone(),
                history: vec![entry],
            },
        );
        Ok(lead)
    }

    async fn update(&self, id: LeadId, patch: LeadPatch) -> Result<Lead, StoreError> {
        self.take_failure()?;
        let mut records = self.records.write();
        let record = records.get_mut(&id).ok_or_else(|| Self::missing(id))?;
        patch.apply(&mut record.lead);
        Ok(record.lead.clone())
    }

    async fn delete(&self, id: LeadId) -> Result<(), StoreError> {
        self.take_failure()?;
        let mut records = self.records.write();
        // History is owned by the record, so removal cascades it.
        records.remove(&id).map(|_| ()).ok_or_else(|| Self::missing(id))
    }

    async fn apply_transition(
        &self,
        lead: Lead,
        entry: StageHistoryEntry,
    ) -> Result<Lead, StoreError> {
        self.take_failure()?;
        let mut records = self.records.write();
        let record = records.get_mut(&lead.id).ok_or_else(|| Self::missing(lead.id))?;
        // Single write-lock section: stage and history commit together.
        record.lead = lead.clone();
        stage::append_entry(&mut record.history, entry);
        Ok(lead)
    }

    async fn get_history(&self, id: LeadId) -> Result<Vec<StageHistoryEntry>, StoreError> {
        self.take_failure()?;
        let records = self.records.read();
        records
            .get(&id)
            .map(|r| r.history.clone())
            .ok_or_else(|| Self::missing(id))
    }
}

/// Reference `TagStore`; optionally linked to a lead store so tag deletion
/// cascades the association removal.
#[derive(Default)]
pub struct MemoryTagStore {
    tags: RwLock<HashMap<TagId, Tag>>,
    leads: Option<Arc<MemoryLeadStore>>,
}

impl MemoryTagStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn linked(leads: Arc<MemoryLeadStore>) -> Self {
        Self {
            tags: RwLock::new(HashMap::new()),
            leads: Some(leads),
        }
    }
}

#[async_trait]
impl TagStore for MemoryTagStore {
    async fn list(&self) -> Result<Vec<Tag>, StoreError> {
        let tags = self.tags.read();
        let mut all: Vec<Tag> = tags.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }

    async fn create(&self, name: String, color: String) -> Result<Tag, StoreError> {
        let tag = Tag::new(name, color);
        self.tags.write().insert(tag.id, tag.clone());
        Ok(tag)
    }

    async fn update(&self, id: TagId, patch: TagPatch) -> Result<Tag, StoreError> {
        let mut tags = self.tags.write();
        let tag = tags
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("tag {}", id)))?;
        if let Some(name) = patch.name {
            tag.name = name;
        }
        if let Some(color) = patch.color {
            tag.color = color;
        }
        Ok(tag.clone())
    }

    async fn delete(&self, id: TagId) -> Result<(), StoreError> {
        let removed = self.tags.write().remove(&id);
        if removed.is_none() {
            return Err(StoreError::NotFound(format!("tag {}", id)));
        }
        if let Some(leads) = &self.leads {
            leads.remove_tag_everywhere(id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Stage;
    use crate::stage::{transition, TransitionOptions};

    fn seeded() -> (MemoryLeadStore, LeadId) {
        let lead = Lead::new("ACME Lighting");
        let id = lead.id;
        (MemoryLeadStore::with_leads([lead]), id)
    }

    #[tokio::test]
    async fn seeding_writes_the_creation_entry() {
        let (store, id) = seeded();
        let history = store.get_history(id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].from_stage, None);
        assert_eq!(history[0].to_stage, Stage::New);
        assert!(history[0].is_current);
    }

    #[tokio::test]
    async fn apply_transition_commits_stage_and_history_together() {
        let (store, id) = seeded();
        let lead = store.get(id).await.unwrap();
        let outcome = transition(&lead, Stage::Contacted, &TransitionOptions::default()).unwrap();

        let stored = store
            .apply_transition(outcome.lead, outcome.entry)
            .await
            .unwrap();
        assert_eq!(stored.stage, Stage::Contacted);

        let history = store.get_history(id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert!(!history[0].is_current);
        assert!(history[1].is_current);
    }

    #[tokio::test]
    async fn injected_failure_hits_exactly_one_operation() {
        let (store, id) = seeded();
        store.fail_next(StoreError::Unavailable("flaky network".into()));
        assert!(store.get(id).await.is_err());
        assert!(store.get(id).await.is_ok());
    }

    #[tokio::test]
    async fn delete_cascades_history() {
        let (store, id) = seeded();
        store.delete(id).await.unwrap();
        assert!(matches!(
            store.get_history(id).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn tag_deletion_cascades_association_not_lead() {
        let mut lead = Lead::new("ACME");
        let lead_id = lead.id;
        let lead_store = Arc::new(MemoryLeadStore::new());
        let tag_store = MemoryTagStore::linked(Arc::clone(&lead_store));

        let tag = tag_store
            .create("gold".into(), "#ffd700".into())
            .await
            .unwrap();
        lead.tag_ids.insert(tag.id);
        lead_store.create(lead).await.unwrap();

        tag_store.delete(tag.id).await.unwrap();
        let survivor = lead_store.get(lead_id).await.unwrap();
        assert!(!survivor.has_tag(tag.id));
    }
}
