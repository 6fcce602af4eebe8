//! In-memory collaborator adapters for tests, demos and the dev server.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use stockpact_core::{ProductId, VendorId};
use stockpact_inventory::{IncomingLineStatus, IncomingOrderLine, StockPosition};
use stockpact_suppliers::{SupplierHistory, VendorProfile};

use crate::tables::NumberSequence;

use super::{
    CatalogProduct, DeliveryHistoryFeed, NewPurchaseOrder, ProductCatalog, ProviderError,
    ProviderResult, PurchaseOrder, PurchaseOrderStore, StockProvider, VendorMaster,
};

fn poisoned(what: &str) -> ProviderError {
    ProviderError::Unavailable(format!("{what} lock poisoned"))
}

/// Initial collaborator data, usually read from a JSON seed file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Seed {
    pub products: Vec<CatalogProduct>,
    pub stock: Vec<StockPosition>,
    pub purchase_orders: Vec<PurchaseOrder>,
    pub vendors: Vec<VendorProfile>,
    pub histories: HashMap<VendorId, SupplierHistory>,
}

impl Seed {
    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    products: RwLock<HashMap<ProductId, CatalogProduct>>,
}

impl InMemoryCatalog {
    pub fn new(products: impl IntoIterator<Item = CatalogProduct>) -> Self {
        Self {
            products: RwLock::new(products.into_iter().map(|p| (p.product_id, p)).collect()),
        }
    }

    pub fn upsert(&self, product: CatalogProduct) {
        if let Ok(mut products) = self.products.write() {
            products.insert(product.product_id, product);
        }
    }
}

impl ProductCatalog for InMemoryCatalog {
    fn product(&self, product_id: ProductId) -> ProviderResult<Option<CatalogProduct>> {
        let products = self.products.read().map_err(|_| poisoned("catalog"))?;
        Ok(products.get(&product_id).cloned())
    }

    fn products(&self) -> ProviderResult<Vec<CatalogProduct>> {
        let products = self.products.read().map_err(|_| poisoned("catalog"))?;
        let mut all: Vec<_> = products.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name).then(a.product_id.cmp(&b.product_id)));
        Ok(all)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryStock {
    positions: RwLock<Vec<StockPosition>>,
}

impl InMemoryStock {
    pub fn new(positions: impl IntoIterator<Item = StockPosition>) -> Self {
        Self {
            positions: RwLock::new(positions.into_iter().collect()),
        }
    }

    /// Replace (or add) the position for a product in a warehouse.
    pub fn set(&self, position: StockPosition) {
        if let Ok(mut positions) = self.positions.write() {
            positions.retain(|p| !(p.product_id == position.product_id && p.warehouse_id == position.warehouse_id));
            positions.push(position);
        }
    }
}

impl StockProvider for InMemoryStock {
    fn positions(&self, product_id: Option<ProductId>) -> ProviderResult<Vec<StockPosition>> {
        let positions = self.positions.read().map_err(|_| poisoned("stock"))?;
        Ok(positions
            .iter()
            .filter(|p| product_id.is_none_or(|id| p.product_id == id))
            .cloned()
            .collect())
    }
}

/// Purchase-order book. PO numbers are sequenced per order-date year.
#[derive(Debug, Default)]
pub struct InMemoryPurchaseOrders {
    orders: RwLock<Vec<PurchaseOrder>>,
    numbers: NumberSequence,
}

impl InMemoryPurchaseOrders {
    pub fn new(orders: impl IntoIterator<Item = PurchaseOrder>) -> Self {
        Self {
            orders: RwLock::new(orders.into_iter().collect()),
            numbers: NumberSequence::new(),
        }
    }

    pub fn all(&self) -> ProviderResult<Vec<PurchaseOrder>> {
        Ok(self.orders.read().map_err(|_| poisoned("purchase orders"))?.clone())
    }
}

impl PurchaseOrderStore for InMemoryPurchaseOrders {
    fn incoming_lines(&self, product_id: ProductId) -> ProviderResult<Vec<IncomingOrderLine>> {
        let orders = self.orders.read().map_err(|_| poisoned("purchase orders"))?;
        Ok(orders
            .iter()
            .flat_map(|order| order.incoming_lines())
            .filter(|line| line.product_id == product_id)
            .collect())
    }

    fn create(&self, order: NewPurchaseOrder) -> ProviderResult<String> {
        let mut orders = self.orders.write().map_err(|_| poisoned("purchase orders"))?;
        let year = order.order_date.year();
        // Skip numbers already taken by seeded orders.
        let po_number = loop {
            let candidate = self.numbers.next("PO", year);
            if !orders.iter().any(|o| o.po_number == candidate) {
                break candidate;
            }
        };
        orders.push(PurchaseOrder {
            po_number: po_number.clone(),
            vendor_id: order.vendor_id,
            warehouse_id: order.warehouse_id,
            status: IncomingLineStatus::Draft,
            order_date: Some(order.order_date),
            expected_delivery_date: order.expected_delivery_date,
            lines: order.lines,
            total_amount: order.total_amount,
            notes: order.notes,
        });
        tracing::debug!(po_number = %po_number, "purchase order created");
        Ok(po_number)
    }

    fn void(&self, po_number: &str) -> ProviderResult<()> {
        let mut orders = self.orders.write().map_err(|_| poisoned("purchase orders"))?;
        let order = orders
            .iter_mut()
            .find(|o| o.po_number == po_number)
            .ok_or_else(|| ProviderError::NotFound {
                entity: "purchase order",
                id: po_number.to_string(),
            })?;
        order.status = IncomingLineStatus::Cancelled;
        Ok(())
    }

    fn get(&self, po_number: &str) -> ProviderResult<Option<PurchaseOrder>> {
        let orders = self.orders.read().map_err(|_| poisoned("purchase orders"))?;
        Ok(orders.iter().find(|o| o.po_number == po_number).cloned())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryVendors {
    vendors: RwLock<HashMap<VendorId, VendorProfile>>,
}

impl InMemoryVendors {
    pub fn new(vendors: impl IntoIterator<Item = VendorProfile>) -> Self {
        Self {
            vendors: RwLock::new(vendors.into_iter().map(|v| (v.vendor_id, v)).collect()),
        }
    }

    pub fn upsert(&self, vendor: VendorProfile) {
        if let Ok(mut vendors) = self.vendors.write() {
            vendors.insert(vendor.vendor_id, vendor);
        }
    }
}

impl VendorMaster for InMemoryVendors {
    fn vendor(&self, vendor_id: VendorId) -> ProviderResult<Option<VendorProfile>> {
        let vendors = self.vendors.read().map_err(|_| poisoned("vendors"))?;
        Ok(vendors.get(&vendor_id).cloned())
    }

    fn vendors(&self) -> ProviderResult<Vec<VendorProfile>> {
        let vendors = self.vendors.read().map_err(|_| poisoned("vendors"))?;
        let mut all: Vec<_> = vendors.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name).then(a.vendor_id.cmp(&b.vendor_id)));
        Ok(all)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryDeliveryHistory {
    histories: RwLock<HashMap<VendorId, SupplierHistory>>,
}

impl InMemoryDeliveryHistory {
    pub fn new(histories: HashMap<VendorId, SupplierHistory>) -> Self {
        Self {
            histories: RwLock::new(histories),
        }
    }

    pub fn set(&self, vendor_id: VendorId, history: SupplierHistory) {
        if let Ok(mut histories) = self.histories.write() {
            histories.insert(vendor_id, history);
        }
    }
}

impl DeliveryHistoryFeed for InMemoryDeliveryHistory {
    fn history(&self, vendor_id: VendorId) -> ProviderResult<SupplierHistory> {
        let histories = self.histories.read().map_err(|_| poisoned("delivery history"))?;
        Ok(histories.get(&vendor_id).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    use crate::providers::PurchaseOrderLine;

    fn order(vendor_id: VendorId, product_id: ProductId) -> NewPurchaseOrder {
        NewPurchaseOrder {
            vendor_id,
            warehouse_id: None,
            order_date: NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
            expected_delivery_date: NaiveDate::from_ymd_opt(2026, 2, 20),
            lines: vec![PurchaseOrderLine {
                product_id: Some(product_id),
                product_name: "Hex bolt M8".into(),
                quantity: 40,
                received_quantity: 0,
                unit_of_measure: "pcs".into(),
                unit_price: 12,
                line_total: 480,
            }],
            total_amount: 480,
            notes: None,
        }
    }

    #[test]
    fn created_po_counts_as_incoming_until_voided() {
        let pos = InMemoryPurchaseOrders::new(Vec::new());
        let product = ProductId::new();
        let po_number = pos.create(order(VendorId::new(), product)).unwrap();
        assert_eq!(po_number, "PO-2026-0001");

        let lines = pos.incoming_lines(product).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].status, IncomingLineStatus::Draft);

        pos.void(&po_number).unwrap();
        let lines = pos.incoming_lines(product).unwrap();
        assert_eq!(lines[0].status, IncomingLineStatus::Cancelled);
        assert!(matches!(pos.void("PO-1999-0001"), Err(ProviderError::NotFound { .. })));
    }

    #[test]
    fn po_numbers_skip_seeded_orders() {
        let vendor_id = VendorId::new();
        let seeded = PurchaseOrder {
            po_number: "PO-2026-0001".into(),
            vendor_id,
            warehouse_id: None,
            status: IncomingLineStatus::Confirmed,
            order_date: None,
            expected_delivery_date: None,
            lines: Vec::new(),
            total_amount: 0,
            notes: None,
        };
        let pos = InMemoryPurchaseOrders::new(vec![seeded]);
        assert_eq!(pos.create(order(vendor_id, ProductId::new())).unwrap(), "PO-2026-0002");
    }

    #[test]
    fn seed_parses_minimal_json() {
        let seed = Seed::from_json(r#"{ "products": [], "vendors": [] }"#).unwrap();
        assert!(seed.stock.is_empty());
        assert!(seed.histories.is_empty());
    }
}
