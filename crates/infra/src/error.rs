//! Facade error model.
//!
//! Every `ScmService` operation returns [`ScmError`]. Domain errors map onto
//! the matching kind one-to-one; storage and collaborator faults become
//! [`ScmError::Internal`], whose message is logged where the mapping happens
//! and never shown to callers.

use thiserror::Error;

use stockpact_audit::AuditError;
use stockpact_core::DomainError;

use crate::providers::ProviderError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScmError {
    /// Input rejected before any state change.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The record is not in a state that allows the operation; reload and retry.
    #[error("state conflict: {0}")]
    StateConflict(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// Storage or collaborator failure. The cause is kept for logs only.
    #[error("internal error")]
    Internal(String),
}

impl ScmError {
    pub fn internal(cause: impl Into<String>) -> Self {
        let cause = cause.into();
        tracing::error!(cause = %cause, "internal failure");
        Self::Internal(cause)
    }

    pub fn not_found(entity: &'static str, id: impl core::fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Short machine-readable kind, used in API error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            ScmError::Validation(_) => "validation_error",
            ScmError::StateConflict(_) => "state_conflict",
            ScmError::NotFound { .. } => "not_found",
            ScmError::InvalidId(_) => "invalid_id",
            ScmError::Internal(_) => "internal_error",
        }
    }
}

impl From<DomainError> for ScmError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) => ScmError::Validation(msg),
            DomainError::Conflict(msg) => ScmError::StateConflict(msg),
            DomainError::InvalidId(msg) => ScmError::InvalidId(msg),
            DomainError::NotFound { entity, id } => ScmError::NotFound { entity, id },
        }
    }
}

impl From<AuditError> for ScmError {
    fn from(value: AuditError) -> Self {
        ScmError::internal(value.to_string())
    }
}

impl From<ProviderError> for ScmError {
    fn from(value: ProviderError) -> Self {
        match value {
            ProviderError::NotFound { entity, id } => ScmError::NotFound { entity, id },
            ProviderError::Unavailable(msg) => ScmError::internal(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_cause_is_not_displayed() {
        let err: ScmError = AuditError::Storage("disk full at /var/lib/ledger".into()).into();
        assert_eq!(err.to_string(), "internal error");
        assert!(matches!(err, ScmError::Internal(cause) if cause.contains("disk full")));
    }

    #[test]
    fn domain_errors_keep_their_kind() {
        assert_eq!(ScmError::from(DomainError::conflict("closed")).kind(), "state_conflict");
        assert_eq!(
            ScmError::from(DomainError::not_found("rfq", "42")).to_string(),
            "rfq 42 not found"
        );
    }
}
