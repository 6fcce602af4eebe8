use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Extension, Json, Path, Query,
    },
    routing::{get, post},
    Router,
};

use stockpact_core::{ProductId, WarehouseId};
use stockpact_infra::service::{NewInventoryLot, ReserveStockRequest};
use stockpact_inventory::{AtpQuery, ReservationId};

use super::{created, ok, ApiResult};
use crate::app::dto;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/atp/:product_id", get(calculate_atp))
        .route("/reservations", post(reserve_stock).get(list_reservations))
        .route("/reservations/:id", get(get_reservation))
        .route("/reservations/:id/release", post(release_reservation))
        .route("/reservations/:id/consume", post(consume_reservation))
        .route("/lots", post(create_lot).get(list_lots))
}

pub async fn calculate_atp(
    Extension(services): Extension<Arc<AppServices>>,
    Path(product_id): Path<String>,
    params: Result<Query<dto::AtpQueryParams>, QueryRejection>,
) -> ApiResult {
    let product_id: ProductId = dto::parse_id(&product_id, "product")?;
    let params = dto::query(params)?;
    let mut query = AtpQuery::product(product_id);
    query.warehouse_id = dto::parse_opt_id::<WarehouseId>(params.warehouse_id.as_deref(), "warehouse")?;
    query.horizon = params.horizon;
    ok(services.calculate_atp(query))
}

pub async fn reserve_stock(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<ReserveStockRequest>, JsonRejection>,
) -> ApiResult {
    let request = dto::body(payload)?;
    created(services.reserve_stock(request))
}

pub async fn list_reservations(
    Extension(services): Extension<Arc<AppServices>>,
    params: Result<Query<dto::ProductFilter>, QueryRejection>,
) -> ApiResult {
    let params = dto::query(params)?;
    let product_id = dto::parse_opt_id::<ProductId>(params.product_id.as_deref(), "product")?;
    ok(services.list_reservations(product_id))
}

pub async fn get_reservation(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult {
    let reservation_id: ReservationId = dto::parse_id(&id, "reservation")?;
    ok(services.get_reservation(reservation_id))
}

pub async fn release_reservation(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    payload: Result<Json<dto::VersionedRequest>, JsonRejection>,
) -> ApiResult {
    let reservation_id: ReservationId = dto::parse_id(&id, "reservation")?;
    let body = dto::optional_body(payload)?;
    ok(services.release_reservation(reservation_id, body.expected()))
}

pub async fn consume_reservation(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    payload: Result<Json<dto::VersionedRequest>, JsonRejection>,
) -> ApiResult {
    let reservation_id: ReservationId = dto::parse_id(&id, "reservation")?;
    let body = dto::optional_body(payload)?;
    ok(services.consume_reservation(reservation_id, body.expected()))
}

pub async fn create_lot(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<NewInventoryLot>, JsonRejection>,
) -> ApiResult {
    let lot = dto::body(payload)?;
    created(services.create_inventory_lot(lot))
}

pub async fn list_lots(
    Extension(services): Extension<Arc<AppServices>>,
    params: Result<Query<dto::LotFilter>, QueryRejection>,
) -> ApiResult {
    let params = dto::query(params)?;
    let product_id = dto::parse_opt_id::<ProductId>(params.product_id.as_deref(), "product")?;
    let warehouse_id = dto::parse_opt_id::<WarehouseId>(params.warehouse_id.as_deref(), "warehouse")?;
    ok(services.inventory_lots(product_id, warehouse_id))
}
