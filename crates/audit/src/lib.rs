//! `stockpact-audit`: tamper-evident, append-only audit ledger.
//!
//! One SHA-256 hash chain per [`EntityType`]. Appends for the same entity
//! type are serialized; different entity types append independently.
//! Verification is a read-only diagnostic that reports the first broken
//! entry instead of failing.

pub mod entry;
pub mod hash;
pub mod ledger;
pub mod store;

pub use entry::{
    AuditAction, AuditDraft, AuditEntry, AuditRecord, ChainBreak, ChainVerification, EntityType,
    GENESIS,
};
pub use ledger::AuditLedger;
pub use store::{AuditError, AuditStore, InMemoryAuditStore};
