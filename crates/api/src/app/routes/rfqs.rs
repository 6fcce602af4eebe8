use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Json, Path},
    routing::{delete, get, post},
    Router,
};

use stockpact_infra::service::{NewRfq, NewRfqLine, NewRfqResponse, NewVendorBid};
use stockpact_rfq::{RfqId, RfqResponseId};

use super::{created, ok, ApiResult};
use crate::app::dto;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_rfq).get(list_rfqs))
        .route("/:id", get(get_rfq).delete(delete_rfq))
        .route("/:id/lines", post(add_line))
        .route("/:id/lines/:line_no", delete(remove_line))
        .route("/:id/responses", post(add_response))
        .route("/:id/send", post(send_rfq))
        .route("/:id/cancel", post(cancel_rfq))
        .route("/:id/evaluate", post(evaluate_responses))
}

/// Responses are addressed on their own; the RFQ is found from the response.
pub fn responses_router() -> Router {
    Router::new()
        .route("/:response_id/accept", post(accept_response))
        .route("/:response_id/bids", post(add_bid).get(list_bids))
}

fn response_id(raw: &str) -> Result<RfqResponseId, axum::response::Response> {
    dto::parse_id(raw, "rfq response")
}

fn rfq_id(raw: &str) -> Result<RfqId, axum::response::Response> {
    dto::parse_id(raw, "rfq")
}

pub async fn create_rfq(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<NewRfq>, JsonRejection>,
) -> ApiResult {
    let rfq = dto::body(payload)?;
    created(services.create_rfq(rfq))
}

pub async fn list_rfqs(Extension(services): Extension<Arc<AppServices>>) -> ApiResult {
    ok(services.list_rfqs())
}

pub async fn get_rfq(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult {
    ok(services.get_rfq(rfq_id(&id)?))
}

pub async fn delete_rfq(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    payload: Result<Json<dto::VersionedRequest>, JsonRejection>,
) -> ApiResult {
    let rfq_id = rfq_id(&id)?;
    let body = dto::optional_body(payload)?;
    ok(services.delete_rfq(rfq_id, body.expected()))
}

pub async fn add_line(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    payload: Result<Json<dto::Versioned<NewRfqLine>>, JsonRejection>,
) -> ApiResult {
    let rfq_id = rfq_id(&id)?;
    let line = dto::body(payload)?;
    created(services.add_rfq_line(rfq_id, line.body, dto::expected(line.expected_version)))
}

pub async fn remove_line(
    Extension(services): Extension<Arc<AppServices>>,
    Path((id, line_no)): Path<(String, String)>,
    payload: Result<Json<dto::VersionedRequest>, JsonRejection>,
) -> ApiResult {
    let rfq_id = rfq_id(&id)?;
    let line_no: u32 = dto::parse_id(&line_no, "rfq line")?;
    let body = dto::optional_body(payload)?;
    ok(services.remove_rfq_line(rfq_id, line_no, body.expected()))
}

pub async fn add_response(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    payload: Result<Json<dto::Versioned<NewRfqResponse>>, JsonRejection>,
) -> ApiResult {
    let rfq_id = rfq_id(&id)?;
    let response = dto::body(payload)?;
    created(services.add_rfq_response(rfq_id, response.body, dto::expected(response.expected_version)))
}

pub async fn send_rfq(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    payload: Result<Json<dto::VersionedRequest>, JsonRejection>,
) -> ApiResult {
    let rfq_id = rfq_id(&id)?;
    let body = dto::optional_body(payload)?;
    ok(services.send_rfq(rfq_id, body.expected()))
}

pub async fn cancel_rfq(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    payload: Result<Json<dto::ReasonRequest>, JsonRejection>,
) -> ApiResult {
    let rfq_id = rfq_id(&id)?;
    let body = dto::optional_body(payload)?;
    ok(services.cancel_rfq(rfq_id, body.reason, dto::expected(body.expected_version)))
}

pub async fn evaluate_responses(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    payload: Result<Json<dto::VersionedRequest>, JsonRejection>,
) -> ApiResult {
    let rfq_id = rfq_id(&id)?;
    let body = dto::optional_body(payload)?;
    ok(services.evaluate_rfq_responses(rfq_id, body.expected()))
}

pub async fn accept_response(
    Extension(services): Extension<Arc<AppServices>>,
    Path(response_id): Path<String>,
    payload: Result<Json<dto::VersionedRequest>, JsonRejection>,
) -> ApiResult {
    let response_id = self::response_id(&response_id)?;
    let body = dto::optional_body(payload)?;
    ok(services.accept_rfq_response(response_id, body.expected()))
}

pub async fn add_bid(
    Extension(services): Extension<Arc<AppServices>>,
    Path(response_id): Path<String>,
    payload: Result<Json<dto::Versioned<NewVendorBid>>, JsonRejection>,
) -> ApiResult {
    let response_id = self::response_id(&response_id)?;
    let bid = dto::body(payload)?;
    created(services.add_vendor_bid(response_id, bid.body, dto::expected(bid.expected_version)))
}

pub async fn list_bids(
    Extension(services): Extension<Arc<AppServices>>,
    Path(response_id): Path<String>,
) -> ApiResult {
    ok(services.vendor_bids(self::response_id(&response_id)?))
}
