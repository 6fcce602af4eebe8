//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: config + seed data -> `ScmService`
//! - `routes/`: HTTP routes + handlers (one file per SCM area)
//! - `dto.rs`: request DTOs and extraction helpers
//! - `errors.rs`: consistent `{error, message}` responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

use services::AppServices;

/// Build the full HTTP router (public entrypoint used by `main.rs` and tests).
pub fn build_app(services: Arc<AppServices>) -> Router {
    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router())
        .layer(ServiceBuilder::new().layer(Extension(services)))
}
