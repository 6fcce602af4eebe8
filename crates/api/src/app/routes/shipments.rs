use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Extension, Json, Path, Query,
    },
    routing::{get, post},
    Router,
};

use stockpact_infra::service::{NewShipment, NewShipmentLine};
use stockpact_inventory::ShipmentId;

use super::{created, ok, ApiResult};
use crate::app::dto;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_shipment).get(list_shipments))
        .route("/:id", get(get_shipment))
        .route("/:id/status", post(update_status))
        .route("/:id/lines", post(add_line).get(list_lines))
}

pub async fn create_shipment(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<NewShipment>, JsonRejection>,
) -> ApiResult {
    let shipment = dto::body(payload)?;
    created(services.create_shipment(shipment))
}

pub async fn list_shipments(
    Extension(services): Extension<Arc<AppServices>>,
    params: Result<Query<dto::ShipmentStatusFilter>, QueryRejection>,
) -> ApiResult {
    let params = dto::query(params)?;
    ok(services.list_shipments(params.status))
}

pub async fn get_shipment(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult {
    let shipment_id: ShipmentId = dto::parse_id(&id, "shipment")?;
    ok(services.get_shipment(shipment_id))
}

pub async fn update_status(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    payload: Result<Json<dto::UpdateShipmentStatusRequest>, JsonRejection>,
) -> ApiResult {
    let shipment_id: ShipmentId = dto::parse_id(&id, "shipment")?;
    let body = dto::body(payload)?;
    ok(services.update_shipment_status(shipment_id, body.status, dto::expected(body.expected_version)))
}

pub async fn add_line(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    payload: Result<Json<dto::Versioned<NewShipmentLine>>, JsonRejection>,
) -> ApiResult {
    let shipment_id: ShipmentId = dto::parse_id(&id, "shipment")?;
    let line = dto::body(payload)?;
    created(services.add_shipment_line(shipment_id, line.body, dto::expected(line.expected_version)))
}

pub async fn list_lines(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult {
    let shipment_id: ShipmentId = dto::parse_id(&id, "shipment")?;
    ok(services.shipment_lines(shipment_id))
}
