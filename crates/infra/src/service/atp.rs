use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use stockpact_audit::{AuditAction, AuditStore, EntityType};
use stockpact_core::{ExpectedVersion, ProductId, WarehouseId};
use stockpact_inventory::{
    calculate_atp, AtpQuery, AtpResult, ConsumeReservation, ReleaseReservation, ReservationCommand,
    ReservationId, ReserveStock, StockReservation,
};

use super::{Change, ScmService};
use crate::error::ScmError;
use crate::providers::CatalogProduct;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReserveStockRequest {
    pub product_id: ProductId,
    pub warehouse_id: WarehouseId,
    pub sales_order_ref: String,
    pub quantity: i64,
}

/// Quantity held by active reservations in scope.
fn held_quantity(
    rows: &HashMap<ReservationId, StockReservation>,
    product_id: ProductId,
    warehouse_id: Option<WarehouseId>,
) -> i64 {
    rows.values()
        .filter(|r| r.product_id() == Some(product_id))
        .filter(|r| warehouse_id.is_none() || r.warehouse_id() == warehouse_id)
        .map(StockReservation::held_quantity)
        .sum()
}

impl<S: AuditStore> ScmService<S> {
    pub(super) fn require_product(&self, product_id: ProductId) -> Result<CatalogProduct, ScmError> {
        self.collaborators
            .catalog
            .product(product_id)?
            .ok_or_else(|| ScmError::not_found("product", product_id))
    }

    fn atp_with_held(&self, query: &AtpQuery, held: i64) -> Result<AtpResult, ScmError> {
        let positions = self.collaborators.stock.positions(Some(query.product_id))?;
        let incoming = self.collaborators.purchase_orders.incoming_lines(query.product_id)?;
        Ok(calculate_atp(query, &positions, &incoming, held, self.today()))
    }

    /// ATP without the catalog check; used by the replenishment scan.
    pub(super) fn atp_unchecked(&self, query: &AtpQuery) -> Result<AtpResult, ScmError> {
        let held = {
            let rows = self.reservations.read()?;
            held_quantity(&rows, query.product_id, query.warehouse_id)
        };
        self.atp_with_held(query, held)
    }

    /// Available-to-promise for a product. Pure read; may be negative.
    #[tracing::instrument(skip(self), fields(product_id = %query.product_id))]
    pub fn calculate_atp(&self, query: AtpQuery) -> Result<AtpResult, ScmError> {
        self.require_product(query.product_id)?;
        let result = self.atp_unchecked(&query)?;
        if result.is_shortage() {
            tracing::warn!(shortage = result.shortage_qty(), "product is oversold");
        }
        Ok(result)
    }

    /// Hold stock for a sales order, bounded by the warehouse's ATP.
    #[tracing::instrument(
        skip(self, request),
        fields(product_id = %request.product_id, warehouse_id = %request.warehouse_id, quantity = request.quantity)
    )]
    pub fn reserve_stock(&self, request: ReserveStockRequest) -> Result<StockReservation, ScmError> {
        self.require_product(request.product_id)?;
        let reservation_id = ReservationId::generate();
        let query = AtpQuery::product(request.product_id).in_warehouse(request.warehouse_id);

        // The availability check and the insert happen under one write guard,
        // so two reservations can never both spend the same stock.
        let mut rows = self.reservations.write()?;
        let held = held_quantity(&rows, request.product_id, Some(request.warehouse_id));
        let atp = self.atp_with_held(&query, held)?;

        let command = ReservationCommand::Reserve(ReserveStock {
            reservation_id,
            product_id: request.product_id,
            warehouse_id: request.warehouse_id,
            sales_order_ref: request.sales_order_ref,
            quantity: request.quantity,
            available: atp.atp_qty,
            occurred_at: self.clock.now(),
        });
        self.chain_transition(
            &mut rows,
            StockReservation::empty(reservation_id),
            Change {
                entity_type: EntityType::StockReservation,
                entity_id: reservation_id.aggregate_id(),
                action: AuditAction::Create,
                expected: ExpectedVersion::Exact(0),
                command: &command,
            },
        )
    }

    #[tracing::instrument(skip(self), fields(reservation_id = %reservation_id))]
    pub fn release_reservation(
        &self,
        reservation_id: ReservationId,
        expected: ExpectedVersion,
    ) -> Result<StockReservation, ScmError> {
        let command = ReservationCommand::Release(ReleaseReservation {
            reservation_id,
            occurred_at: self.clock.now(),
        });
        self.update_reservation(reservation_id, expected, &command)
    }

    #[tracing::instrument(skip(self), fields(reservation_id = %reservation_id))]
    pub fn consume_reservation(
        &self,
        reservation_id: ReservationId,
        expected: ExpectedVersion,
    ) -> Result<StockReservation, ScmError> {
        let command = ReservationCommand::Consume(ConsumeReservation {
            reservation_id,
            occurred_at: self.clock.now(),
        });
        self.update_reservation(reservation_id, expected, &command)
    }

    fn update_reservation(
        &self,
        reservation_id: ReservationId,
        expected: ExpectedVersion,
        command: &ReservationCommand,
    ) -> Result<StockReservation, ScmError> {
        self.transition(
            &self.reservations,
            reservation_id,
            || StockReservation::empty(reservation_id),
            Change {
                entity_type: EntityType::StockReservation,
                entity_id: reservation_id.aggregate_id(),
                action: AuditAction::Update,
                expected,
                command,
            },
        )
    }

    pub fn get_reservation(&self, reservation_id: ReservationId) -> Result<StockReservation, ScmError> {
        self.reservations
            .get(&reservation_id)?
            .ok_or_else(|| ScmError::not_found("stock reservation", reservation_id))
    }

    /// Reservations, newest first, optionally for one product.
    pub fn list_reservations(&self, product_id: Option<ProductId>) -> Result<Vec<StockReservation>, ScmError> {
        let mut reservations: Vec<StockReservation> = self
            .reservations
            .list()?
            .into_iter()
            .filter(|r| product_id.is_none() || r.product_id() == product_id)
            .collect();
        reservations.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(reservations)
    }
}
