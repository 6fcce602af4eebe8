use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Json, Path},
    routing::{get, post},
    Router,
};

use stockpact_core::VendorId;
use stockpact_suppliers::RiskSignals;

use super::{created, ok, ApiResult};
use crate::app::dto;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/risk", get(latest_risk_scores))
        .route("/:vendor_id/risk", post(calculate_risk_score))
        .route("/:vendor_id/risk/signals", post(assess_with_signals))
        .route("/:vendor_id/risk/history", get(risk_history))
}

pub async fn latest_risk_scores(Extension(services): Extension<Arc<AppServices>>) -> ApiResult {
    ok(services.latest_risk_scores())
}

pub async fn calculate_risk_score(
    Extension(services): Extension<Arc<AppServices>>,
    Path(vendor_id): Path<String>,
) -> ApiResult {
    let vendor_id: VendorId = dto::parse_id(&vendor_id, "vendor")?;
    created(services.calculate_supplier_risk_score(vendor_id))
}

pub async fn assess_with_signals(
    Extension(services): Extension<Arc<AppServices>>,
    Path(vendor_id): Path<String>,
    payload: Result<Json<RiskSignals>, JsonRejection>,
) -> ApiResult {
    let vendor_id: VendorId = dto::parse_id(&vendor_id, "vendor")?;
    let signals = dto::body(payload)?;
    created(services.assess_with_signals(vendor_id, signals))
}

pub async fn risk_history(
    Extension(services): Extension<Arc<AppServices>>,
    Path(vendor_id): Path<String>,
) -> ApiResult {
    let vendor_id: VendorId = dto::parse_id(&vendor_id, "vendor")?;
    ok(services.risk_history(vendor_id))
}
