//! Stock reservations held by this core against a sales order.
//!
//! An active reservation counts as `reserved` in ATP. It ends either by
//! release (stock returns to ATP) or consumption (the sales order shipped).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockpact_core::{aggregate_id, Aggregate, AggregateRoot, DomainError, Event, ProductId, WarehouseId};

aggregate_id!(
    /// Stock reservation identifier.
    ReservationId
);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    Active,
    Released,
    Consumed,
}

/// Aggregate root: StockReservation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockReservation {
    id: ReservationId,
    product_id: Option<ProductId>,
    warehouse_id: Option<WarehouseId>,
    sales_order_ref: String,
    quantity: i64,
    status: ReservationStatus,
    created_at: Option<DateTime<Utc>>,
    closed_at: Option<DateTime<Utc>>,
    version: u64,
    #[serde(skip)]
    created: bool,
}

impl StockReservation {
    /// Create an empty, not-yet-created aggregate instance.
    pub fn empty(id: ReservationId) -> Self {
        Self {
            id,
            product_id: None,
            warehouse_id: None,
            sales_order_ref: String::new(),
            quantity: 0,
            status: ReservationStatus::Active,
            created_at: None,
            closed_at: None,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> ReservationId {
        self.id
    }

    pub fn product_id(&self) -> Option<ProductId> {
        self.product_id
    }

    pub fn warehouse_id(&self) -> Option<WarehouseId> {
        self.warehouse_id
    }

    pub fn sales_order_ref(&self) -> &str {
        &self.sales_order_ref
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn status(&self) -> ReservationStatus {
        self.status
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn is_active(&self) -> bool {
        self.created && self.status == ReservationStatus::Active
    }

    /// Quantity this reservation currently withholds from ATP.
    pub fn held_quantity(&self) -> i64 {
        if self.is_active() { self.quantity } else { 0 }
    }
}

impl AggregateRoot for StockReservation {
    type Id = ReservationId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: ReserveStock.
///
/// `available` is the ATP the caller computed for the same product and
/// warehouse just before issuing the command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReserveStock {
    pub reservation_id: ReservationId,
    pub product_id: ProductId,
    pub warehouse_id: WarehouseId,
    pub sales_order_ref: String,
    pub quantity: i64,
    pub available: i64,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseReservation {
    pub reservation_id: ReservationId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumeReservation {
    pub reservation_id: ReservationId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReservationCommand {
    Reserve(ReserveStock),
    Release(ReleaseReservation),
    Consume(ConsumeReservation),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReservationEvent {
    StockReserved {
        reservation_id: ReservationId,
        product_id: ProductId,
        warehouse_id: WarehouseId,
        sales_order_ref: String,
        quantity: i64,
        occurred_at: DateTime<Utc>,
    },
    ReservationReleased {
        reservation_id: ReservationId,
        occurred_at: DateTime<Utc>,
    },
    ReservationConsumed {
        reservation_id: ReservationId,
        occurred_at: DateTime<Utc>,
    },
}

impl Event for ReservationEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ReservationEvent::StockReserved { .. } => "inventory.reservation.created",
            ReservationEvent::ReservationReleased { .. } => "inventory.reservation.released",
            ReservationEvent::ReservationConsumed { .. } => "inventory.reservation.consumed",
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            ReservationEvent::StockReserved { occurred_at, .. }
            | ReservationEvent::ReservationReleased { occurred_at, .. }
            | ReservationEvent::ReservationConsumed { occurred_at, .. } => *occurred_at,
        }
    }
}

impl Aggregate for StockReservation {
    type Command = ReservationCommand;
    type Event = ReservationEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            ReservationEvent::StockReserved {
                reservation_id,
                product_id,
                warehouse_id,
                sales_order_ref,
                quantity,
                occurred_at,
            } => {
                self.id = *reservation_id;
                self.product_id = Some(*product_id);
                self.warehouse_id = Some(*warehouse_id);
                self.sales_order_ref = sales_order_ref.clone();
                self.quantity = *quantity;
                self.status = ReservationStatus::Active;
                self.created_at = Some(*occurred_at);
                self.created = true;
            }
            ReservationEvent::ReservationReleased { occurred_at, .. } => {
                self.status = ReservationStatus::Released;
                self.closed_at = Some(*occurred_at);
            }
            ReservationEvent::ReservationConsumed { occurred_at, .. } => {
                self.status = ReservationStatus::Consumed;
                self.closed_at = Some(*occurred_at);
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            ReservationCommand::Reserve(cmd) => self.handle_reserve(cmd),
            ReservationCommand::Release(cmd) => {
                self.ensure_active()?;
                Ok(vec![ReservationEvent::ReservationReleased {
                    reservation_id: cmd.reservation_id,
                    occurred_at: cmd.occurred_at,
                }])
            }
            ReservationCommand::Consume(cmd) => {
                self.ensure_active()?;
                Ok(vec![ReservationEvent::ReservationConsumed {
                    reservation_id: cmd.reservation_id,
                    occurred_at: cmd.occurred_at,
                }])
            }
        }
    }
}

impl StockReservation {
    fn ensure_active(&self) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::not_found("reservation", self.id));
        }
        if self.status != ReservationStatus::Active {
            return Err(DomainError::conflict(format!(
                "reservation is {:?}, only active reservations can change",
                self.status
            )));
        }
        Ok(())
    }

    fn handle_reserve(&self, cmd: &ReserveStock) -> Result<Vec<ReservationEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("reservation already exists"));
        }
        if cmd.sales_order_ref.trim().is_empty() {
            return Err(DomainError::validation("sales order reference cannot be empty"));
        }
        if cmd.quantity <= 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        if cmd.quantity > cmd.available {
            return Err(DomainError::validation(format!(
                "insufficient stock: available {}, requested {}",
                cmd.available, cmd.quantity
            )));
        }

        Ok(vec![ReservationEvent::StockReserved {
            reservation_id: cmd.reservation_id,
            product_id: cmd.product_id,
            warehouse_id: cmd.warehouse_id,
            sales_order_ref: cmd.sales_order_ref.trim().to_string(),
            quantity: cmd.quantity,
            occurred_at: cmd.occurred_at,
        }])
    }
}
