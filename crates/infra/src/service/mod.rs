//! `ScmService`: the application facade over the SCM decision modules.
//!
//! Every state-changing operation follows the same pipeline:
//!
//! ```text
//! take the table write guard
//!   -> load current state (or an empty aggregate)
//!   -> check the expected version
//!   -> decide + evolve on a copy (pure)
//!   -> append the post-mutation state to the audit ledger
//!   -> swap the new row in (only if the append succeeded)
//! ```
//!
//! The write guard is held across the append, so a reader never observes a
//! row without its ledger entry or the other way round. A failed append
//! leaves the table untouched.

mod atp;
mod audit;
mod kpis;
mod lots;
mod replenishment;
mod rfq;
mod shipments;
mod suppliers;

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use serde::Serialize;

use stockpact_audit::{AuditAction, AuditDraft, AuditLedger, AuditStore, EntityType, InMemoryAuditStore};
use stockpact_core::{execute, Aggregate, AggregateId, AggregateRoot, Clock, DomainError, Event, ExpectedVersion, VendorId};
use stockpact_inventory::{InventoryLot, LotId, ReservationId, Shipment, ShipmentId, StockReservation};
use stockpact_replenishment::{ReplenishmentRequest, ReplenishmentRequestId};
use stockpact_rfq::{Rfq, RfqId};
use stockpact_suppliers::RiskScore;

use crate::config::ScmConfig;
use crate::error::ScmError;
use crate::providers::{
    DeliveryHistoryFeed, InMemoryCatalog, InMemoryDeliveryHistory, InMemoryPurchaseOrders,
    InMemoryStock, InMemoryVendors, ProductCatalog, PurchaseOrderStore, Seed, StockProvider,
    VendorMaster,
};
use crate::tables::{NumberSequence, StateTable};

pub use atp::ReserveStockRequest;
pub use kpis::ScmKpis;
pub use lots::NewInventoryLot;
pub use rfq::{AcceptedResponse, NewRfq, NewRfqLine, NewRfqResponse, NewVendorBid};
pub use shipments::{NewShipment, NewShipmentLine};
pub use suppliers::VendorRiskSummary;

/// External collaborators the facade reads from and hands off to.
#[derive(Clone)]
pub struct Collaborators {
    pub catalog: Arc<dyn ProductCatalog>,
    pub stock: Arc<dyn StockProvider>,
    pub purchase_orders: Arc<dyn PurchaseOrderStore>,
    pub vendors: Arc<dyn VendorMaster>,
    pub history: Arc<dyn DeliveryHistoryFeed>,
}

impl Collaborators {
    /// In-memory adapters populated from `seed`.
    pub fn in_memory(seed: Seed) -> Self {
        Self {
            catalog: Arc::new(InMemoryCatalog::new(seed.products)),
            stock: Arc::new(InMemoryStock::new(seed.stock)),
            purchase_orders: Arc::new(InMemoryPurchaseOrders::new(seed.purchase_orders)),
            vendors: Arc::new(InMemoryVendors::new(seed.vendors)),
            history: Arc::new(InMemoryDeliveryHistory::new(seed.histories)),
        }
    }
}

/// What a state change records in the ledger.
struct Change<'a, A: Aggregate> {
    entity_type: EntityType,
    entity_id: AggregateId,
    action: AuditAction,
    expected: ExpectedVersion,
    command: &'a A::Command,
}

pub struct ScmService<S = Arc<InMemoryAuditStore>> {
    config: ScmConfig,
    clock: Arc<dyn Clock>,
    ledger: AuditLedger<S>,
    collaborators: Collaborators,
    numbers: NumberSequence,
    rfqs: StateTable<RfqId, Rfq>,
    replenishment_requests: StateTable<ReplenishmentRequestId, ReplenishmentRequest>,
    reservations: StateTable<ReservationId, StockReservation>,
    shipments: StateTable<ShipmentId, Shipment>,
    lots: StateTable<LotId, InventoryLot>,
    risk_scores: StateTable<VendorId, Vec<RiskScore>>,
    assessments_in_flight: Mutex<HashSet<VendorId>>,
}

impl ScmService<Arc<InMemoryAuditStore>> {
    /// Fully in-memory service (dev server, tests).
    pub fn in_memory(config: ScmConfig, clock: Arc<dyn Clock>, seed: Seed) -> Self {
        Self::new(
            config,
            clock,
            Arc::new(InMemoryAuditStore::new()),
            Collaborators::in_memory(seed),
        )
    }
}

impl<S: AuditStore> ScmService<S> {
    pub fn new(config: ScmConfig, clock: Arc<dyn Clock>, audit_store: S, collaborators: Collaborators) -> Self {
        Self {
            ledger: AuditLedger::new(audit_store, clock.clone()),
            config,
            clock,
            collaborators,
            numbers: NumberSequence::new(),
            rfqs: StateTable::new("rfqs"),
            replenishment_requests: StateTable::new("replenishment_requests"),
            reservations: StateTable::new("stock_reservations"),
            shipments: StateTable::new("shipments"),
            lots: StateTable::new("inventory_lots"),
            risk_scores: StateTable::new("supplier_risk_scores"),
            assessments_in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn config(&self) -> &ScmConfig {
        &self.config
    }

    pub fn collaborators(&self) -> &Collaborators {
        &self.collaborators
    }

    pub fn ledger(&self) -> &AuditLedger<S> {
        &self.ledger
    }

    fn today(&self) -> NaiveDate {
        self.clock.now().date_naive()
    }

    /// Decide on `current`, chain the result and store it in `rows`.
    ///
    /// `rows` must be the write guard's map for the aggregate's table.
    fn chain_transition<A>(
        &self,
        rows: &mut HashMap<A::Id, A>,
        current: A,
        change: Change<'_, A>,
    ) -> Result<A, ScmError>
    where
        A: Aggregate<Error = DomainError> + Clone + Serialize,
        A::Event: Event,
    {
        change.expected.check(current.version())?;
        let mut next = current;
        let events = match execute(&mut next, change.command) {
            Ok(events) => events,
            Err(err) => {
                tracing::warn!(
                    entity_type = %change.entity_type,
                    entity_id = %change.entity_id,
                    error = %err,
                    "transition rejected"
                );
                return Err(err.into());
            }
        };
        let event_types: Vec<&'static str> = events.iter().map(Event::event_type).collect();

        let draft = AuditDraft::new(change.entity_type, change.entity_id, change.action, &next)?;
        let key = next.id().clone();
        let committed = next.clone();
        self.ledger.append_with(draft, move |_| {
            rows.insert(key, next);
        })?;

        tracing::info!(
            entity_type = %change.entity_type,
            entity_id = %change.entity_id,
            action = change.action.as_str(),
            version = committed.version(),
            events = ?event_types,
            "state change committed"
        );
        Ok(committed)
    }

    /// Load-or-empty, then [`Self::chain_transition`], all under one write guard.
    fn transition<A>(
        &self,
        table: &StateTable<A::Id, A>,
        key: A::Id,
        empty: impl FnOnce() -> A,
        change: Change<'_, A>,
    ) -> Result<A, ScmError>
    where
        A: Aggregate<Error = DomainError> + Clone + Serialize,
        A::Event: Event,
    {
        let mut rows = table.write()?;
        let current = rows.get(&key).cloned().unwrap_or_else(empty);
        self.chain_transition(&mut rows, current, change)
    }

    /// Undo an external purchase order after a failed hand-off.
    fn void_purchase_order(&self, po_number: &str, cause: &ScmError) {
        tracing::error!(po_number, error = %cause, "hand-off failed after PO creation; voiding PO");
        if let Err(err) = self.collaborators.purchase_orders.void(po_number) {
            tracing::error!(po_number, error = %err, "failed to void purchase order");
        }
    }
}

/// Marks a vendor assessment as running until dropped.
struct InFlight<'a> {
    set: &'a Mutex<HashSet<VendorId>>,
    vendor_id: VendorId,
}

impl<'a> InFlight<'a> {
    fn acquire(set: &'a Mutex<HashSet<VendorId>>, vendor_id: VendorId) -> Result<Self, ScmError> {
        let mut running = set
            .lock()
            .map_err(|_| ScmError::internal("assessment registry poisoned"))?;
        if !running.insert(vendor_id) {
            return Err(ScmError::StateConflict(format!(
                "a risk assessment for vendor {vendor_id} is already in progress"
            )));
        }
        Ok(Self { set, vendor_id })
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut running = match self.set.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        running.remove(&self.vendor_id);
    }
}
