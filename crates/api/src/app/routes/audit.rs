use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Extension, Path, Query},
    routing::get,
    Router,
};

use stockpact_audit::EntityType;
use stockpact_core::AggregateId;

use super::{ok, ApiResult};
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/trail", get(trail))
        .route("/verify", get(verify_all))
        .route("/verify/:entity_type", get(verify))
}

fn parse_entity_type(raw: &str) -> Result<EntityType, axum::response::Response> {
    raw.parse()
        .map_err(|e: stockpact_core::DomainError| errors::bad_request(e.to_string()))
}

pub async fn trail(
    Extension(services): Extension<Arc<AppServices>>,
    params: Result<Query<dto::TrailQuery>, QueryRejection>,
) -> ApiResult {
    let params = dto::query(params)?;
    let entity_type = params.entity_type.as_deref().map(parse_entity_type).transpose()?;
    let entity_id: Option<AggregateId> = dto::parse_opt_id(params.entity_id.as_deref(), "entity")?;
    if entity_id.is_some() && entity_type.is_none() {
        return Err(errors::bad_request("entity_id filter requires entity_type"));
    }
    ok(services.audit_trail(entity_type, entity_id))
}

pub async fn verify(
    Extension(services): Extension<Arc<AppServices>>,
    Path(entity_type): Path<String>,
) -> ApiResult {
    let entity_type = parse_entity_type(&entity_type)?;
    ok(services.verify_audit_chain(entity_type))
}

pub async fn verify_all(Extension(services): Extension<Arc<AppServices>>) -> ApiResult {
    ok(services.verify_all_audit_chains())
}
