use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode};

use super::{ok, ApiResult};
use crate::app::services::AppServices;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn kpis(Extension(services): Extension<Arc<AppServices>>) -> ApiResult {
    ok(services.dashboard_kpis())
}
