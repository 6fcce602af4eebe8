use stockpact_audit::{AuditEntry, AuditStore, ChainVerification, EntityType};
use stockpact_core::AggregateId;

use super::ScmService;
use crate::error::ScmError;

impl<S: AuditStore> ScmService<S> {
    /// Audit trail, newest first. No filter returns the latest 100 entries.
    pub fn audit_trail(
        &self,
        entity_type: Option<EntityType>,
        entity_id: Option<AggregateId>,
    ) -> Result<Vec<AuditEntry>, ScmError> {
        Ok(self.ledger.trail(entity_type, entity_id)?)
    }

    /// Verify one chain. A broken chain is a result, not an error.
    #[tracing::instrument(skip(self), fields(entity_type = %entity_type))]
    pub fn verify_audit_chain(&self, entity_type: EntityType) -> Result<ChainVerification, ScmError> {
        let verification = self.ledger.verify(entity_type)?;
        tracing::info!(
            valid = verification.valid,
            total_entries = verification.total_entries,
            "audit chain verified"
        );
        Ok(verification)
    }

    pub fn verify_all_audit_chains(&self) -> Result<Vec<ChainVerification>, ScmError> {
        EntityType::ALL
            .iter()
            .map(|entity_type| self.verify_audit_chain(*entity_type))
            .collect()
    }
}
