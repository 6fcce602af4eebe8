use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use stockpact_core::{AggregateId, DomainError};

use crate::store::AuditError;

/// `previousHash` of the first entry in every chain.
pub const GENESIS: &str = "GENESIS";

/// Logical stream an audit entry belongs to. Each has its own hash chain.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Rfq,
    Shipment,
    SupplierRiskScore,
    ReplenishmentRequest,
    StockReservation,
    InventoryLot,
}

impl EntityType {
    pub const ALL: [EntityType; 6] = [
        EntityType::Rfq,
        EntityType::Shipment,
        EntityType::SupplierRiskScore,
        EntityType::ReplenishmentRequest,
        EntityType::StockReservation,
        EntityType::InventoryLot,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Rfq => "rfq",
            EntityType::Shipment => "shipment",
            EntityType::SupplierRiskScore => "supplier_risk_score",
            EntityType::ReplenishmentRequest => "replenishment_request",
            EntityType::StockReservation => "stock_reservation",
            EntityType::InventoryLot => "inventory_lot",
        }
    }
}

impl core::fmt::Display for EntityType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for EntityType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| DomainError::validation(format!("unknown entity type '{s}'")))
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Create => "create",
            AuditAction::Update => "update",
            AuditAction::Delete => "delete",
        }
    }
}

/// A state change about to be chained: the entity's post-mutation state.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditDraft {
    pub entity_type: EntityType,
    pub entity_id: AggregateId,
    pub action: AuditAction,
    pub payload: JsonValue,
}

impl AuditDraft {
    pub fn new<T: Serialize>(
        entity_type: EntityType,
        entity_id: AggregateId,
        action: AuditAction,
        state: &T,
    ) -> Result<Self, AuditError> {
        let payload = serde_json::to_value(state)
            .map_err(|e| AuditError::Serialization(format!("{entity_type} {entity_id}: {e}")))?;
        Ok(Self {
            entity_type,
            entity_id,
            action,
            payload,
        })
    }
}

/// A sealed entry handed to the store; the store assigns the global `id`.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditRecord {
    pub entity_type: EntityType,
    pub entity_id: AggregateId,
    pub action: AuditAction,
    /// Position within the entity type's chain (1-based).
    pub sequence: u64,
    pub payload: JsonValue,
    pub data_hash: String,
    pub previous_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Immutable, persisted audit entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: u64,
    pub entity_type: EntityType,
    pub entity_id: AggregateId,
    pub action: AuditAction,
    pub sequence: u64,
    pub payload: JsonValue,
    pub data_hash: String,
    pub previous_hash: String,
    pub created_at: DateTime<Utc>,
}

impl AuditEntry {
    pub fn from_record(id: u64, record: AuditRecord) -> Self {
        Self {
            id,
            entity_type: record.entity_type,
            entity_id: record.entity_id,
            action: record.action,
            sequence: record.sequence,
            payload: record.payload,
            data_hash: record.data_hash,
            previous_hash: record.previous_hash,
            created_at: record.created_at,
        }
    }
}

/// Why verification stopped at an entry.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainBreak {
    /// Recomputing the hash from the stored payload gave a different digest.
    HashMismatch,
    /// `previous_hash` does not equal the preceding entry's `data_hash`.
    LinkMismatch,
    /// Sequence numbers are not contiguous from 1.
    SequenceGap,
}

/// Result of walking one chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainVerification {
    pub entity_type: EntityType,
    pub valid: bool,
    pub total_entries: usize,
    pub first_broken_entry_id: Option<u64>,
    pub reason: Option<ChainBreak>,
}
