use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use stockpact_core::{ProductId, WarehouseId};

/// On-hand and externally reserved quantity of one product in one warehouse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockPosition {
    pub product_id: ProductId,
    pub warehouse_id: WarehouseId,
    pub on_hand: i64,
    /// Committed to open sales orders / transfers by the inventory system.
    pub reserved: i64,
}

/// Lifecycle of a purchase-order line as seen by availability math.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncomingLineStatus {
    Draft,
    Sent,
    Confirmed,
    InTransit,
    Received,
    Cancelled,
}

impl IncomingLineStatus {
    /// Cancelled lines never arrive; received lines are already on hand.
    pub fn counts_as_incoming(&self) -> bool {
        !matches!(self, IncomingLineStatus::Cancelled | IncomingLineStatus::Received)
    }
}

/// One purchase-order line for a product that has not fully arrived yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingOrderLine {
    pub po_number: String,
    pub product_id: ProductId,
    /// Destination warehouse, when the PO names one.
    pub warehouse_id: Option<WarehouseId>,
    pub quantity: i64,
    #[serde(default)]
    pub received_quantity: i64,
    pub expected_date: Option<NaiveDate>,
    pub status: IncomingLineStatus,
}

impl IncomingOrderLine {
    /// Quantity still to arrive (never negative).
    pub fn outstanding(&self) -> i64 {
        (self.quantity - self.received_quantity).max(0)
    }
}
