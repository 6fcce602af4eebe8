use std::str::FromStr;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Json, Query};
use chrono::NaiveDate;
use serde::Deserialize;

use stockpact_core::{ExpectedVersion, UserId};
use stockpact_inventory::ShipmentStatus;
use stockpact_replenishment::RequestStatus;

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

/// Optimistic-concurrency guard carried by update bodies.
///
/// Absent means "apply to whatever the current version is".
#[derive(Debug, Default, Deserialize)]
pub struct VersionedRequest {
    #[serde(default)]
    pub expected_version: Option<u64>,
}

impl VersionedRequest {
    pub fn expected(&self) -> ExpectedVersion {
        expected(self.expected_version)
    }
}

pub fn expected(version: Option<u64>) -> ExpectedVersion {
    version.map_or(ExpectedVersion::Any, ExpectedVersion::Exact)
}

#[derive(Debug, Deserialize)]
pub struct TrailQuery {
    pub entity_type: Option<String>,
    pub entity_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AtpQueryParams {
    pub warehouse_id: Option<String>,
    pub horizon: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct ProductFilter {
    pub product_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LotFilter {
    pub product_id: Option<String>,
    pub warehouse_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ScanQuery {
    pub product_id: Option<String>,
    pub warehouse_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateReplenishmentRequest {
    pub product_id: String,
    pub warehouse_id: String,
}

#[derive(Debug, Deserialize)]
pub struct RequestStatusFilter {
    pub status: Option<RequestStatus>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApproveReplenishmentRequest {
    #[serde(default)]
    pub approved_by: Option<UserId>,
    #[serde(default)]
    pub expected_version: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReasonRequest {
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub expected_version: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct ConvertReplenishmentRequest {
    pub vendor_id: String,
    #[serde(default)]
    pub expected_version: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct ShipmentStatusFilter {
    pub status: Option<ShipmentStatus>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateShipmentStatusRequest {
    pub status: ShipmentStatus,
    #[serde(default)]
    pub expected_version: Option<u64>,
}

/// Body that also carries an optional expected version next to its payload.
#[derive(Debug, Deserialize)]
pub struct Versioned<T> {
    #[serde(flatten)]
    pub body: T,
    #[serde(default)]
    pub expected_version: Option<u64>,
}

// -------------------------
// Extraction helpers
// -------------------------

pub fn parse_id<T: FromStr>(raw: &str, what: &str) -> Result<T, axum::response::Response> {
    raw.parse().map_err(|_| errors::invalid_id(what))
}

pub fn parse_opt_id<T: FromStr>(raw: Option<&str>, what: &str) -> Result<Option<T>, axum::response::Response> {
    raw.map(|r| parse_id(r, what)).transpose()
}

/// JSON body, with malformed input reported in the API's error shape.
pub fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, axum::response::Response> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| errors::bad_request(rejection.body_text()))
}

/// Optional JSON body; a missing body falls back to `T::default()`.
pub fn optional_body<T: Default>(
    payload: Result<Json<T>, JsonRejection>,
) -> Result<T, axum::response::Response> {
    match payload {
        Ok(Json(value)) => Ok(value),
        Err(JsonRejection::MissingJsonContentType(_)) => Ok(T::default()),
        Err(rejection) => Err(errors::bad_request(rejection.body_text())),
    }
}

pub fn query<T>(params: Result<Query<T>, QueryRejection>) -> Result<T, axum::response::Response> {
    params
        .map(|Query(value)| value)
        .map_err(|rejection| errors::bad_request(rejection.body_text()))
}
