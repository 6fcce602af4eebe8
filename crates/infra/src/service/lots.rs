use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use stockpact_audit::{AuditAction, AuditStore, EntityType};
use stockpact_core::{ExpectedVersion, ProductId, WarehouseId};
use stockpact_inventory::{InventoryLot, LotCommand, LotId, ReceiveLot};

use super::{Change, ScmService};
use crate::error::ScmError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewInventoryLot {
    pub lot_number: String,
    pub product_id: ProductId,
    pub warehouse_id: WarehouseId,
    pub quantity: i64,
    #[serde(default)]
    pub unit_cost: Option<i64>,
    #[serde(default)]
    pub received_date: Option<NaiveDate>,
    #[serde(default)]
    pub expiry_date: Option<NaiveDate>,
}

impl<S: AuditStore> ScmService<S> {
    /// Record a received lot. Lot numbers are unique per product.
    #[tracing::instrument(skip(self, lot), fields(product_id = %lot.product_id, lot_number = %lot.lot_number))]
    pub fn create_inventory_lot(&self, lot: NewInventoryLot) -> Result<InventoryLot, ScmError> {
        self.require_product(lot.product_id)?;
        let lot_id = LotId::generate();

        let mut rows = self.lots.write()?;
        let lot_number = lot.lot_number.trim();
        if rows
            .values()
            .any(|l| l.product_id() == Some(lot.product_id) && l.lot_number() == lot_number)
        {
            return Err(ScmError::StateConflict(format!(
                "lot {lot_number} already exists for product {}",
                lot.product_id
            )));
        }

        let command = LotCommand::Receive(ReceiveLot {
            lot_id,
            lot_number: lot.lot_number,
            product_id: lot.product_id,
            warehouse_id: lot.warehouse_id,
            quantity: lot.quantity,
            unit_cost: lot.unit_cost,
            received_date: lot.received_date,
            expiry_date: lot.expiry_date,
            occurred_at: self.clock.now(),
        });
        self.chain_transition(
            &mut rows,
            InventoryLot::empty(lot_id),
            Change {
                entity_type: EntityType::InventoryLot,
                entity_id: lot_id.aggregate_id(),
                action: AuditAction::Create,
                expected: ExpectedVersion::Exact(0),
                command: &command,
            },
        )
    }

    /// Lots, newest first, narrowed by product and warehouse when given.
    pub fn inventory_lots(
        &self,
        product_id: Option<ProductId>,
        warehouse_id: Option<WarehouseId>,
    ) -> Result<Vec<InventoryLot>, ScmError> {
        let mut lots: Vec<InventoryLot> = self
            .lots
            .list()?
            .into_iter()
            .filter(|l| product_id.is_none() || l.product_id() == product_id)
            .filter(|l| warehouse_id.is_none() || l.warehouse_id() == warehouse_id)
            .collect();
        lots.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| b.lot_number().cmp(a.lot_number()))
        });
        Ok(lots)
    }
}
