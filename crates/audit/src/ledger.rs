use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use stockpact_core::{AggregateId, Clock};

use crate::entry::{
    AuditDraft, AuditEntry, AuditRecord, ChainBreak, ChainVerification, EntityType, GENESIS,
};
use crate::hash::compute_data_hash;
use crate::store::{AuditError, AuditStore};

/// Entries returned by an unfiltered trail query.
pub const DEFAULT_TRAIL_LIMIT: usize = 100;

/// Hash-chained audit ledger, one chain per [`EntityType`].
///
/// Appends to the same entity type are serialized by a per-type mutex, so
/// two entries can never share a `previous_hash`. Appends to different
/// types only contend on the brief lock-table lookup.
pub struct AuditLedger<S> {
    store: S,
    clock: Arc<dyn Clock>,
    chain_locks: Mutex<HashMap<EntityType, Arc<Mutex<()>>>>,
}

impl<S> AuditLedger<S> {
    pub fn new(store: S, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            chain_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn chain_lock(&self, entity_type: EntityType) -> Result<Arc<Mutex<()>>, AuditError> {
        let mut locks = self
            .chain_locks
            .lock()
            .map_err(|_| AuditError::Storage("chain lock table poisoned".to_string()))?;
        Ok(locks.entry(entity_type).or_default().clone())
    }
}

impl<S: AuditStore> AuditLedger<S> {
    /// Append a chained entry for `draft`.
    pub fn append(&self, draft: AuditDraft) -> Result<AuditEntry, AuditError> {
        self.append_with(draft, |_| ()).map(|(entry, ())| entry)
    }

    /// Append a chained entry, then run `commit` while the chain is still held.
    ///
    /// `commit` only runs once the entry has been durably stored; if the store
    /// rejects the entry the caller's state change never happens. Callers keep
    /// their own write guard across this call so readers never observe one
    /// without the other.
    pub fn append_with<T>(
        &self,
        draft: AuditDraft,
        commit: impl FnOnce(&AuditEntry) -> T,
    ) -> Result<(AuditEntry, T), AuditError> {
        let lock = self.chain_lock(draft.entity_type)?;
        let _serialized = lock
            .lock()
            .map_err(|_| AuditError::Storage(format!("{} chain lock poisoned", draft.entity_type)))?;

        let last = self.store.last_for_type(draft.entity_type)?;
        let (sequence, previous_hash) = match last {
            Some(prev) => (prev.sequence + 1, prev.data_hash),
            None => (1, GENESIS.to_string()),
        };

        let data_hash = compute_data_hash(
            &draft.payload,
            draft.entity_type,
            draft.entity_id,
            draft.action,
            sequence,
        );

        let entry = self.store.insert(AuditRecord {
            entity_type: draft.entity_type,
            entity_id: draft.entity_id,
            action: draft.action,
            sequence,
            payload: draft.payload,
            data_hash,
            previous_hash,
            created_at: self.clock.now(),
        })?;

        tracing::debug!(
            entity_type = %entry.entity_type,
            entity_id = %entry.entity_id,
            action = entry.action.as_str(),
            sequence = entry.sequence,
            "audit entry appended"
        );

        let committed = commit(&entry);
        Ok((entry, committed))
    }

    /// Walk one chain in sequence order and report the first divergence.
    ///
    /// Read-only: never repairs, never takes the append lock.
    pub fn verify(&self, entity_type: EntityType) -> Result<ChainVerification, AuditError> {
        let entries = self.store.entries_for_type(entity_type)?;
        let total_entries = entries.len();

        let mut expected_previous = GENESIS.to_string();
        let mut expected_sequence = 1u64;

        for entry in &entries {
            let reason = if entry.sequence != expected_sequence {
                Some(ChainBreak::SequenceGap)
            } else if compute_data_hash(
                &entry.payload,
                entry.entity_type,
                entry.entity_id,
                entry.action,
                entry.sequence,
            ) != entry.data_hash
            {
                Some(ChainBreak::HashMismatch)
            } else if entry.previous_hash != expected_previous {
                Some(ChainBreak::LinkMismatch)
            } else {
                None
            };

            if let Some(reason) = reason {
                tracing::warn!(
                    entity_type = %entity_type,
                    entry_id = entry.id,
                    ?reason,
                    "audit chain verification failed"
                );
                return Ok(ChainVerification {
                    entity_type,
                    valid: false,
                    total_entries,
                    first_broken_entry_id: Some(entry.id),
                    reason: Some(reason),
                });
            }

            expected_previous = entry.data_hash.clone();
            expected_sequence += 1;
        }

        Ok(ChainVerification {
            entity_type,
            valid: true,
            total_entries,
            first_broken_entry_id: None,
            reason: None,
        })
    }

    /// Audit trail, newest first.
    ///
    /// - type + entity: that entity's entries
    /// - type only: the whole chain
    /// - neither: the latest [`DEFAULT_TRAIL_LIMIT`] entries across all types
    pub fn trail(
        &self,
        entity_type: Option<EntityType>,
        entity_id: Option<AggregateId>,
    ) -> Result<Vec<AuditEntry>, AuditError> {
        let mut entries = match (entity_type, entity_id) {
            (Some(t), Some(id)) => self.store.entries_for_entity(t, id)?,
            (Some(t), None) => self.store.entries_for_type(t)?,
            (None, _) => return self.store.recent(DEFAULT_TRAIL_LIMIT),
        };
        entries.reverse();
        Ok(entries)
    }
}
