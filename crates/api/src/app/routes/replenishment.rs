use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Extension, Json, Path, Query,
    },
    routing::{get, post},
    Router,
};

use stockpact_core::{ProductId, VendorId, WarehouseId};
use stockpact_replenishment::ReplenishmentRequestId;

use super::{created, ok, ApiResult};
use crate::app::dto;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/alerts", get(scan))
        .route("/requests", post(create_request).get(list_requests))
        .route("/requests/:id", get(get_request))
        .route("/requests/:id/approve", post(approve_request))
        .route("/requests/:id/reject", post(reject_request))
        .route("/requests/:id/convert", post(convert_request))
}

pub async fn scan(
    Extension(services): Extension<Arc<AppServices>>,
    params: Result<Query<dto::ScanQuery>, QueryRejection>,
) -> ApiResult {
    let params = dto::query(params)?;
    let product_id = dto::parse_opt_id::<ProductId>(params.product_id.as_deref(), "product")?;
    let warehouse_id = dto::parse_opt_id::<WarehouseId>(params.warehouse_id.as_deref(), "warehouse")?;
    ok(services.scan_replenishment(product_id, warehouse_id))
}

pub async fn create_request(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<dto::CreateReplenishmentRequest>, JsonRejection>,
) -> ApiResult {
    let body = dto::body(payload)?;
    let product_id: ProductId = dto::parse_id(&body.product_id, "product")?;
    let warehouse_id: WarehouseId = dto::parse_id(&body.warehouse_id, "warehouse")?;
    created(services.create_replenishment_request(product_id, warehouse_id))
}

pub async fn list_requests(
    Extension(services): Extension<Arc<AppServices>>,
    params: Result<Query<dto::RequestStatusFilter>, QueryRejection>,
) -> ApiResult {
    let params = dto::query(params)?;
    ok(services.list_replenishment_requests(params.status))
}

pub async fn get_request(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult {
    let request_id: ReplenishmentRequestId = dto::parse_id(&id, "replenishment request")?;
    ok(services.get_replenishment_request(request_id))
}

pub async fn approve_request(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    payload: Result<Json<dto::ApproveReplenishmentRequest>, JsonRejection>,
) -> ApiResult {
    let request_id: ReplenishmentRequestId = dto::parse_id(&id, "replenishment request")?;
    let body = dto::optional_body(payload)?;
    ok(services.approve_replenishment_request(request_id, body.approved_by, dto::expected(body.expected_version)))
}

pub async fn reject_request(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    payload: Result<Json<dto::ReasonRequest>, JsonRejection>,
) -> ApiResult {
    let request_id: ReplenishmentRequestId = dto::parse_id(&id, "replenishment request")?;
    let body = dto::optional_body(payload)?;
    ok(services.reject_replenishment_request(request_id, body.reason, dto::expected(body.expected_version)))
}

pub async fn convert_request(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    payload: Result<Json<dto::ConvertReplenishmentRequest>, JsonRejection>,
) -> ApiResult {
    let request_id: ReplenishmentRequestId = dto::parse_id(&id, "replenishment request")?;
    let body = dto::body(payload)?;
    let vendor_id: VendorId = dto::parse_id(&body.vendor_id, "vendor")?;
    ok(services.convert_to_purchase_order(request_id, vendor_id, dto::expected(body.expected_version)))
}
