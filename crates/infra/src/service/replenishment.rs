use stockpact_audit::{AuditAction, AuditStore, EntityType};
use stockpact_core::{AggregateRoot, ExpectedVersion, ProductId, UserId, VendorId, WarehouseId};
use stockpact_inventory::AtpQuery;
use stockpact_replenishment::{
    evaluate, ApproveRequest, CreateRequest, MarkConverted, RejectRequest, ReplenishmentAlert,
    ReplenishmentCandidate, ReplenishmentCommand, ReplenishmentRequest, ReplenishmentRequestId,
    RequestStatus, StockBasis,
};

use super::{Change, ScmService};
use crate::error::ScmError;
use crate::providers::{CatalogProduct, NewPurchaseOrder, PurchaseOrderLine};

impl<S: AuditStore> ScmService<S> {
    fn current_stock(&self, product_id: ProductId, warehouse_id: Option<WarehouseId>) -> Result<i64, ScmError> {
        match self.config.replenishment.stock_basis {
            StockBasis::OnHand => Ok(self
                .collaborators
                .stock
                .positions(Some(product_id))?
                .iter()
                .filter(|p| p.product_id == product_id)
                .filter(|p| warehouse_id.is_none_or(|w| w == p.warehouse_id))
                .map(|p| p.on_hand)
                .sum()),
            StockBasis::Atp => {
                let mut query = AtpQuery::product(product_id);
                query.warehouse_id = warehouse_id;
                Ok(self.atp_unchecked(&query)?.atp_qty)
            }
        }
    }

    fn replenishment_alert(
        &self,
        product: &CatalogProduct,
        warehouse_id: Option<WarehouseId>,
    ) -> Result<Option<ReplenishmentAlert>, ScmError> {
        let candidate = ReplenishmentCandidate {
            product_id: product.product_id,
            product_name: product.name.clone(),
            warehouse_id,
            current_stock: self.current_stock(product.product_id, warehouse_id)?,
            reorder_point: product.effective_reorder_point(),
            safety_stock: product.safety_stock,
            max_stock_level: product.max_stock_level,
            eoq_inputs: self
                .config
                .replenishment
                .eoq_inputs(product.product_id, product.eoq_settings()),
        };
        // A zero suggestion is still reported; the request aggregate refuses it.
        Ok(evaluate(&candidate))
    }

    /// Products at or below their reorder point, most urgent first.
    #[tracing::instrument(skip(self))]
    pub fn scan_replenishment(
        &self,
        product_id: Option<ProductId>,
        warehouse_id: Option<WarehouseId>,
    ) -> Result<Vec<ReplenishmentAlert>, ScmError> {
        let products = match product_id {
            Some(id) => vec![self.require_product(id)?],
            None => self.collaborators.catalog.products()?,
        };

        let mut alerts = Vec::new();
        for product in &products {
            if let Some(alert) = self.replenishment_alert(product, warehouse_id)? {
                alerts.push(alert);
            }
        }
        alerts.sort_by(|a, b| {
            (a.current_stock - a.reorder_point)
                .cmp(&(b.current_stock - b.reorder_point))
                .then_with(|| a.product_name.cmp(&b.product_name))
        });

        tracing::info!(scanned = products.len(), alerts = alerts.len(), "replenishment scan finished");
        Ok(alerts)
    }

    pub fn check_all_replenishments(&self) -> Result<Vec<ReplenishmentAlert>, ScmError> {
        self.scan_replenishment(None, None)
    }

    #[tracing::instrument(skip(self))]
    pub fn create_replenishment_request(
        &self,
        product_id: ProductId,
        warehouse_id: WarehouseId,
    ) -> Result<ReplenishmentRequest, ScmError> {
        let product = self.require_product(product_id)?;
        let alert = self.replenishment_alert(&product, Some(warehouse_id))?.ok_or_else(|| {
            ScmError::Validation(format!("product {} does not need replenishment", product.name))
        })?;

        let request_id = ReplenishmentRequestId::generate();
        let command = ReplenishmentCommand::Create(CreateRequest {
            request_id,
            alert,
            occurred_at: self.clock.now(),
        });
        self.transition(
            &self.replenishment_requests,
            request_id,
            || ReplenishmentRequest::empty(request_id),
            Change {
                entity_type: EntityType::ReplenishmentRequest,
                entity_id: request_id.aggregate_id(),
                action: AuditAction::Create,
                expected: ExpectedVersion::Exact(0),
                command: &command,
            },
        )
    }

    #[tracing::instrument(skip(self), fields(request_id = %request_id))]
    pub fn approve_replenishment_request(
        &self,
        request_id: ReplenishmentRequestId,
        approved_by: Option<UserId>,
        expected: ExpectedVersion,
    ) -> Result<ReplenishmentRequest, ScmError> {
        let command = ReplenishmentCommand::Approve(ApproveRequest {
            request_id,
            approved_by,
            occurred_at: self.clock.now(),
        });
        self.update_replenishment_request(request_id, expected, &command)
    }

    #[tracing::instrument(skip(self), fields(request_id = %request_id))]
    pub fn reject_replenishment_request(
        &self,
        request_id: ReplenishmentRequestId,
        reason: Option<String>,
        expected: ExpectedVersion,
    ) -> Result<ReplenishmentRequest, ScmError> {
        let command = ReplenishmentCommand::Reject(RejectRequest {
            request_id,
            reason,
            occurred_at: self.clock.now(),
        });
        self.update_replenishment_request(request_id, expected, &command)
    }

    fn update_replenishment_request(
        &self,
        request_id: ReplenishmentRequestId,
        expected: ExpectedVersion,
        command: &ReplenishmentCommand,
    ) -> Result<ReplenishmentRequest, ScmError> {
        self.transition(
            &self.replenishment_requests,
            request_id,
            || ReplenishmentRequest::empty(request_id),
            Change {
                entity_type: EntityType::ReplenishmentRequest,
                entity_id: request_id.aggregate_id(),
                action: AuditAction::Update,
                expected,
                command,
            },
        )
    }

    /// Hand an approved request to procurement as a draft purchase order.
    ///
    /// The PO is voided again if the request cannot be marked converted.
    #[tracing::instrument(skip(self), fields(request_id = %request_id, vendor_id = %vendor_id))]
    pub fn convert_to_purchase_order(
        &self,
        request_id: ReplenishmentRequestId,
        vendor_id: VendorId,
        expected: ExpectedVersion,
    ) -> Result<ReplenishmentRequest, ScmError> {
        let mut rows = self.replenishment_requests.write()?;
        let current = rows
            .get(&request_id)
            .cloned()
            .ok_or_else(|| ScmError::not_found("replenishment request", request_id))?;
        current.ensure_convertible()?;
        expected.check(current.version())?;

        self.collaborators
            .vendors
            .vendor(vendor_id)?
            .ok_or_else(|| ScmError::not_found("vendor", vendor_id))?;
        let product_id = current
            .product_id()
            .ok_or_else(|| ScmError::internal(format!("request {request_id} has no product")))?;
        let product = self.require_product(product_id)?;

        let quantity = current.suggested_qty();
        let unit_price = product.unit_cost.unwrap_or(0);
        let po_number = self.collaborators.purchase_orders.create(NewPurchaseOrder {
            vendor_id,
            warehouse_id: current.warehouse_id(),
            order_date: self.today(),
            expected_delivery_date: None,
            lines: vec![PurchaseOrderLine {
                product_id: Some(product_id),
                product_name: product.name.clone(),
                quantity,
                received_quantity: 0,
                unit_of_measure: product.unit_of_measure.clone(),
                unit_price,
                line_total: quantity.saturating_mul(unit_price),
            }],
            total_amount: quantity.saturating_mul(unit_price),
            notes: Some(format!("Auto-generated from replenishment request {request_id}")),
        })?;

        let command = ReplenishmentCommand::MarkConverted(MarkConverted {
            request_id,
            vendor_id,
            po_number: po_number.clone(),
            occurred_at: self.clock.now(),
        });
        let change = Change {
            entity_type: EntityType::ReplenishmentRequest,
            entity_id: request_id.aggregate_id(),
            action: AuditAction::Update,
            expected: ExpectedVersion::Any,
            command: &command,
        };
        self.chain_transition(&mut rows, current, change).inspect_err(|err| {
            self.void_purchase_order(&po_number, err);
        })
    }

    pub fn get_replenishment_request(
        &self,
        request_id: ReplenishmentRequestId,
    ) -> Result<ReplenishmentRequest, ScmError> {
        self.replenishment_requests
            .get(&request_id)?
            .ok_or_else(|| ScmError::not_found("replenishment request", request_id))
    }

    /// Requests, newest first, optionally with one status.
    pub fn list_replenishment_requests(
        &self,
        status: Option<RequestStatus>,
    ) -> Result<Vec<ReplenishmentRequest>, ScmError> {
        let mut requests: Vec<ReplenishmentRequest> = self
            .replenishment_requests
            .list()?
            .into_iter()
            .filter(|r| status.is_none_or(|s| r.status() == s))
            .collect();
        requests.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(requests)
    }
}
