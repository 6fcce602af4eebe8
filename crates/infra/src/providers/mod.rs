//! Ports to the external collaborators the SCM core reads from and hands
//! off to: product catalog, inventory stock, purchase orders, vendor master
//! and the delivery/quality history feed.
//!
//! All ports are synchronous and object-safe so the facade can hold them as
//! `Arc<dyn ...>`; in-memory adapters live in [`in_memory`].

pub mod in_memory;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use stockpact_core::{ProductId, VendorId, WarehouseId};
use stockpact_inventory::{IncomingLineStatus, IncomingOrderLine, StockPosition};
use stockpact_replenishment::HoldingCost;
use stockpact_suppliers::{SupplierHistory, VendorProfile};

use crate::config::EoqSettings;

pub use in_memory::{
    InMemoryCatalog, InMemoryDeliveryHistory, InMemoryPurchaseOrders, InMemoryStock,
    InMemoryVendors, Seed,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("collaborator unavailable: {0}")]
    Unavailable(String),
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Catalog entry with its replenishment settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogProduct {
    pub product_id: ProductId,
    pub name: String,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default = "default_uom")]
    pub unit_of_measure: String,
    /// Purchase price in minor currency units.
    #[serde(default)]
    pub unit_cost: Option<i64>,
    #[serde(default)]
    pub reorder_point: i64,
    #[serde(default)]
    pub safety_stock: i64,
    #[serde(default)]
    pub max_stock_level: Option<i64>,
    #[serde(default)]
    pub annual_demand: Option<f64>,
    #[serde(default)]
    pub ordering_cost: Option<f64>,
    #[serde(default)]
    pub holding_cost_per_unit: Option<f64>,
    /// Percent of `unit_cost`; used when no per-unit figure is given.
    #[serde(default)]
    pub holding_cost_percent: Option<f64>,
}

fn default_uom() -> String {
    "pcs".to_string()
}

impl CatalogProduct {
    /// Reorder point, falling back to safety stock when unset.
    pub fn effective_reorder_point(&self) -> i64 {
        if self.reorder_point > 0 { self.reorder_point } else { self.safety_stock }
    }

    /// EOQ inputs as far as the catalog knows them.
    pub fn eoq_settings(&self) -> EoqSettings {
        let holding_cost = match (self.holding_cost_per_unit, self.holding_cost_percent, self.unit_cost) {
            (Some(amount), _, _) => Some(HoldingCost::PerUnit { amount }),
            (None, Some(percent), Some(cost)) => Some(HoldingCost::PercentOfUnitCost {
                percent,
                unit_cost: cost as f64 / 100.0,
            }),
            _ => None,
        };
        EoqSettings {
            annual_demand: self.annual_demand,
            ordering_cost: self.ordering_cost,
            holding_cost,
        }
    }
}

pub trait ProductCatalog: Send + Sync {
    fn product(&self, product_id: ProductId) -> ProviderResult<Option<CatalogProduct>>;
    fn products(&self) -> ProviderResult<Vec<CatalogProduct>>;
}

pub trait StockProvider: Send + Sync {
    /// Positions for one product, or for every product when `None`.
    fn positions(&self, product_id: Option<ProductId>) -> ProviderResult<Vec<StockPosition>>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseOrderLine {
    pub product_id: Option<ProductId>,
    pub product_name: String,
    pub quantity: i64,
    #[serde(default)]
    pub received_quantity: i64,
    pub unit_of_measure: String,
    /// Minor currency units.
    pub unit_price: i64,
    #[serde(default)]
    pub line_total: i64,
}

/// A purchase order as submitted by the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPurchaseOrder {
    pub vendor_id: VendorId,
    pub warehouse_id: Option<WarehouseId>,
    pub order_date: NaiveDate,
    pub expected_delivery_date: Option<NaiveDate>,
    pub lines: Vec<PurchaseOrderLine>,
    /// Minor currency units.
    pub total_amount: i64,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseOrder {
    pub po_number: String,
    pub vendor_id: VendorId,
    #[serde(default)]
    pub warehouse_id: Option<WarehouseId>,
    pub status: IncomingLineStatus,
    #[serde(default)]
    pub order_date: Option<NaiveDate>,
    #[serde(default)]
    pub expected_delivery_date: Option<NaiveDate>,
    pub lines: Vec<PurchaseOrderLine>,
    #[serde(default)]
    pub total_amount: i64,
    #[serde(default)]
    pub notes: Option<String>,
}

impl PurchaseOrder {
    pub fn incoming_lines(&self) -> impl Iterator<Item = IncomingOrderLine> + '_ {
        self.lines.iter().filter_map(move |line| {
            Some(IncomingOrderLine {
                po_number: self.po_number.clone(),
                product_id: line.product_id?,
                warehouse_id: self.warehouse_id,
                quantity: line.quantity,
                received_quantity: line.received_quantity,
                expected_date: self.expected_delivery_date,
                status: self.status,
            })
        })
    }
}

pub trait PurchaseOrderStore: Send + Sync {
    /// Open PO lines for a product (any status; ATP filters).
    fn incoming_lines(&self, product_id: ProductId) -> ProviderResult<Vec<IncomingOrderLine>>;

    /// Create a draft PO and return its generated number (`PO-<year>-<nnnn>`).
    fn create(&self, order: NewPurchaseOrder) -> ProviderResult<String>;

    /// Compensation for a PO whose hand-off could not be committed.
    fn void(&self, po_number: &str) -> ProviderResult<()>;

    fn get(&self, po_number: &str) -> ProviderResult<Option<PurchaseOrder>>;
}

pub trait VendorMaster: Send + Sync {
    fn vendor(&self, vendor_id: VendorId) -> ProviderResult<Option<VendorProfile>>;
    fn vendors(&self) -> ProviderResult<Vec<VendorProfile>>;
}

pub trait DeliveryHistoryFeed: Send + Sync {
    /// Raw delivery/quality/price/response history for one vendor.
    fn history(&self, vendor_id: VendorId) -> ProviderResult<SupplierHistory>;
}
