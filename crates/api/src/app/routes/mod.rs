use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{routing::get, Json, Router};
use serde::Serialize;

use stockpact_infra::ScmError;

use crate::app::errors;

pub mod audit;
pub mod inventory;
pub mod replenishment;
pub mod rfqs;
pub mod shipments;
pub mod suppliers;
pub mod system;

/// Handlers return the error response on the `Err` side so `?` works.
pub type ApiResult = Result<Response, Response>;

/// Router for all SCM endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/dashboard/kpis", get(system::kpis))
        .nest("/audit", audit::router())
        .nest("/inventory", inventory::router())
        .nest("/replenishment", replenishment::router())
        .nest("/suppliers", suppliers::router())
        .nest("/rfqs", rfqs::router())
        .nest("/rfq-responses", rfqs::responses_router())
        .nest("/shipments", shipments::router())
}

pub(crate) fn ok<T: Serialize>(result: Result<T, ScmError>) -> ApiResult {
    reply(StatusCode::OK, result)
}

pub(crate) fn created<T: Serialize>(result: Result<T, ScmError>) -> ApiResult {
    reply(StatusCode::CREATED, result)
}

fn reply<T: Serialize>(status: StatusCode, result: Result<T, ScmError>) -> ApiResult {
    match result {
        Ok(value) => Ok((status, Json(value)).into_response()),
        Err(e) => Err(errors::scm_error_to_response(e)),
    }
}
