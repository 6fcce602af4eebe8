//! Inventory lots: a received batch of one product in one warehouse.
//!
//! Lots are recorded once and never edited. Lot numbers are unique per
//! product; the caller enforces that across lots.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use stockpact_core::{aggregate_id, Aggregate, AggregateRoot, DomainError, Event, ProductId, WarehouseId};

aggregate_id!(
    /// Inventory lot identifier.
    LotId
);

/// Aggregate root: InventoryLot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryLot {
    id: LotId,
    lot_number: String,
    product_id: Option<ProductId>,
    warehouse_id: Option<WarehouseId>,
    quantity: i64,
    /// Minor currency units.
    unit_cost: Option<i64>,
    received_date: Option<NaiveDate>,
    expiry_date: Option<NaiveDate>,
    created_at: Option<DateTime<Utc>>,
    version: u64,
    #[serde(skip)]
    created: bool,
}

impl InventoryLot {
    pub fn empty(id: LotId) -> Self {
        Self {
            id,
            lot_number: String::new(),
            product_id: None,
            warehouse_id: None,
            quantity: 0,
            unit_cost: None,
            received_date: None,
            expiry_date: None,
            created_at: None,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> LotId {
        self.id
    }

    pub fn lot_number(&self) -> &str {
        &self.lot_number
    }

    pub fn product_id(&self) -> Option<ProductId> {
        self.product_id
    }

    pub fn warehouse_id(&self) -> Option<WarehouseId> {
        self.warehouse_id
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn expiry_date(&self) -> Option<NaiveDate> {
        self.expiry_date
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    /// Past its expiry date on `today`. Lots without one never expire.
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.expiry_date.is_some_and(|expiry| expiry < today)
    }
}

impl AggregateRoot for InventoryLot {
    type Id = LotId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiveLot {
    pub lot_id: LotId,
    pub lot_number: String,
    pub product_id: ProductId,
    pub warehouse_id: WarehouseId,
    pub quantity: i64,
    pub unit_cost: Option<i64>,
    pub received_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LotCommand {
    Receive(ReceiveLot),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LotEvent {
    LotReceived(ReceiveLot),
}

impl Event for LotEvent {
    fn event_type(&self) -> &'static str {
        match self {
            LotEvent::LotReceived(_) => "inventory.lot.received",
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            LotEvent::LotReceived(e) => e.occurred_at,
        }
    }
}

impl Aggregate for InventoryLot {
    type Command = LotCommand;
    type Event = LotEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            LotEvent::LotReceived(e) => {
                self.id = e.lot_id;
                self.lot_number = e.lot_number.clone();
                self.product_id = Some(e.product_id);
                self.warehouse_id = Some(e.warehouse_id);
                self.quantity = e.quantity;
                self.unit_cost = e.unit_cost;
                self.received_date = e.received_date;
                self.expiry_date = e.expiry_date;
                self.created_at = Some(e.occurred_at);
                self.created = true;
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            LotCommand::Receive(cmd) => {
                if self.created {
                    return Err(DomainError::conflict("lot already exists"));
                }
                if cmd.lot_number.trim().is_empty() {
                    return Err(DomainError::validation("lot number cannot be empty"));
                }
                if cmd.quantity <= 0 {
                    return Err(DomainError::validation("lot quantity must be positive"));
                }
                if cmd.unit_cost.is_some_and(|c| c < 0) {
                    return Err(DomainError::validation("unit cost cannot be negative"));
                }
                if let (Some(received), Some(expiry)) = (cmd.received_date, cmd.expiry_date) {
                    if expiry < received {
                        return Err(DomainError::validation(format!(
                            "lot expires ({expiry}) before it was received ({received})"
                        )));
                    }
                }
                let mut cmd = cmd.clone();
                cmd.lot_number = cmd.lot_number.trim().to_string();
                Ok(vec![LotEvent::LotReceived(cmd)])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use stockpact_core::execute;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, d).unwrap()
    }

    fn receive(lot_number: &str, quantity: i64, expiry_date: Option<NaiveDate>) -> ReceiveLot {
        ReceiveLot {
            lot_id: LotId::generate(),
            lot_number: lot_number.to_string(),
            product_id: ProductId::new(),
            warehouse_id: WarehouseId::new(),
            quantity,
            unit_cost: Some(120),
            received_date: Some(day(2)),
            expiry_date,
            occurred_at: Utc.with_ymd_and_hms(2026, 5, 2, 7, 30, 0).unwrap(),
        }
    }

    #[test]
    fn received_lot_is_recorded_once() {
        let cmd = receive(" L-0042 ", 80, Some(day(20)));
        let mut lot = InventoryLot::empty(cmd.lot_id);
        execute(&mut lot, &LotCommand::Receive(cmd.clone())).unwrap();

        assert_eq!(lot.lot_number(), "L-0042");
        assert_eq!(lot.quantity(), 80);
        assert_eq!(lot.version(), 1);
        assert!(!lot.is_expired(day(20)));
        assert!(lot.is_expired(day(21)));

        let err = lot.handle(&LotCommand::Receive(cmd)).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn invalid_lots_are_rejected() {
        for cmd in [
            receive("", 10, None),
            receive("L-1", 0, None),
            receive("L-1", 10, Some(day(1))),
            ReceiveLot { unit_cost: Some(-1), ..receive("L-1", 10, None) },
        ] {
            let err = InventoryLot::empty(cmd.lot_id).handle(&LotCommand::Receive(cmd)).unwrap_err();
            assert!(matches!(err, DomainError::Validation(_)));
        }
    }
}
