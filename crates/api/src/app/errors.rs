use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use stockpact_infra::ScmError;

/// Map a facade error onto a status code and a `{error, message}` body.
///
/// Internal failures only ever expose a generic message; the cause was
/// already logged where the error was raised.
pub fn scm_error_to_response(err: ScmError) -> axum::response::Response {
    let status = match &err {
        ScmError::Validation(_) | ScmError::InvalidId(_) => StatusCode::BAD_REQUEST,
        ScmError::StateConflict(_) => StatusCode::CONFLICT,
        ScmError::NotFound { .. } => StatusCode::NOT_FOUND,
        ScmError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    json_error(status, err.kind(), err.to_string())
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn invalid_id(what: &str) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "invalid_id", format!("invalid {what} id"))
}

pub fn bad_request(message: impl Into<String>) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "validation_error", message)
}
