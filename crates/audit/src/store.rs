use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use thiserror::Error;

use stockpact_core::AggregateId;

use crate::entry::{AuditEntry, AuditRecord, EntityType};

/// Ledger persistence error.
///
/// Infrastructure failures only; a broken chain is reported through
/// [`crate::ChainVerification`], never as an error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuditError {
    #[error("audit storage failure: {0}")]
    Storage(String),

    #[error("audit payload serialization failed: {0}")]
    Serialization(String),
}

/// Append-only storage for audit entries.
///
/// Implementations must:
/// - assign strictly increasing global `id`s on insert
/// - never expose an update or delete path
/// - return per-type entries in ascending `sequence` order
pub trait AuditStore: Send + Sync {
    /// Persist a sealed record and return it with its assigned id.
    fn insert(&self, record: AuditRecord) -> Result<AuditEntry, AuditError>;

    /// Latest entry (highest sequence) for an entity type.
    fn last_for_type(&self, entity_type: EntityType) -> Result<Option<AuditEntry>, AuditError>;

    /// Full chain for an entity type, ascending by sequence.
    fn entries_for_type(&self, entity_type: EntityType) -> Result<Vec<AuditEntry>, AuditError>;

    /// Entries touching one entity, ascending by sequence.
    fn entries_for_entity(
        &self,
        entity_type: EntityType,
        entity_id: AggregateId,
    ) -> Result<Vec<AuditEntry>, AuditError>;

    /// Most recent entries across all types, newest first.
    fn recent(&self, limit: usize) -> Result<Vec<AuditEntry>, AuditError>;
}

impl<S> AuditStore for Arc<S>
where
    S: AuditStore + ?Sized,
{
    fn insert(&self, record: AuditRecord) -> Result<AuditEntry, AuditError> {
        (**self).insert(record)
    }

    fn last_for_type(&self, entity_type: EntityType) -> Result<Option<AuditEntry>, AuditError> {
        (**self).last_for_type(entity_type)
    }

    fn entries_for_type(&self, entity_type: EntityType) -> Result<Vec<AuditEntry>, AuditError> {
        (**self).entries_for_type(entity_type)
    }

    fn entries_for_entity(
        &self,
        entity_type: EntityType,
        entity_id: AggregateId,
    ) -> Result<Vec<AuditEntry>, AuditError> {
        (**self).entries_for_entity(entity_type, entity_id)
    }

    fn recent(&self, limit: usize) -> Result<Vec<AuditEntry>, AuditError> {
        (**self).recent(limit)
    }
}

#[derive(Debug, Default)]
struct Inner {
    entries: Vec<AuditEntry>,
    /// Secondary index: positions in `entries` per entity type, in append order.
    by_type: HashMap<EntityType, Vec<usize>>,
}

/// In-memory append-only audit table.
///
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryAuditStore {
    inner: RwLock<Inner>,
}

impl InMemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rewrites a stored entry in place, bypassing the append-only contract.
    ///
    /// Only exists so verification can be exercised against a tampered table.
    #[cfg(test)]
    pub(crate) fn tamper(&self, id: u64, f: impl FnOnce(&mut AuditEntry)) {
        let mut inner = self.inner.write().unwrap();
        let entry = inner.entries.iter_mut().find(|e| e.id == id).unwrap();
        f(entry);
    }

    fn poisoned() -> AuditError {
        AuditError::Storage("lock poisoned".to_string())
    }
}

impl AuditStore for InMemoryAuditStore {
    fn insert(&self, record: AuditRecord) -> Result<AuditEntry, AuditError> {
        let mut inner = self.inner.write().map_err(|_| Self::poisoned())?;

        // Reject records that would fork the chain (defense against a caller
        // bypassing the ledger's per-type serialization).
        let expected_sequence = inner
            .by_type
            .get(&record.entity_type)
            .and_then(|positions| positions.last())
            .map(|&pos| inner.entries[pos].sequence + 1)
            .unwrap_or(1);
        if record.sequence != expected_sequence {
            return Err(AuditError::Storage(format!(
                "{} chain expected sequence {expected_sequence}, got {}",
                record.entity_type, record.sequence
            )));
        }

        let id = inner.entries.last().map(|e| e.id + 1).unwrap_or(1);
        let entry = AuditEntry::from_record(id, record);
        let position = inner.entries.len();
        inner.entries.push(entry.clone());
        inner
            .by_type
            .entry(entry.entity_type)
            .or_default()
            .push(position);

        Ok(entry)
    }

    fn last_for_type(&self, entity_type: EntityType) -> Result<Option<AuditEntry>, AuditError> {
        let inner = self.inner.read().map_err(|_| Self::poisoned())?;
        Ok(inner
            .by_type
            .get(&entity_type)
            .and_then(|positions| positions.last())
            .map(|&pos| inner.entries[pos].clone()))
    }

    fn entries_for_type(&self, entity_type: EntityType) -> Result<Vec<AuditEntry>, AuditError> {
        let inner = self.inner.read().map_err(|_| Self::poisoned())?;
        let mut entries: Vec<AuditEntry> = inner
            .by_type
            .get(&entity_type)
            .map(|positions| positions.iter().map(|&p| inner.entries[p].clone()).collect())
            .unwrap_or_default();
        entries.sort_by_key(|e| (e.sequence, e.id));
        Ok(entries)
    }

    fn entries_for_entity(
        &self,
        entity_type: EntityType,
        entity_id: AggregateId,
    ) -> Result<Vec<AuditEntry>, AuditError> {
        Ok(self
            .entries_for_type(entity_type)?
            .into_iter()
            .filter(|e| e.entity_id == entity_id)
            .collect())
    }

    fn recent(&self, limit: usize) -> Result<Vec<AuditEntry>, AuditError> {
        let inner = self.inner.read().map_err(|_| Self::poisoned())?;
        Ok(inner.entries.iter().rev().take(limit).cloned().collect())
    }
}
