//! # License Admin API
//!
//! HTTP adapter for [`LicenseAdmin`] and [`LicenseLookup`]. Handlers parse
//! and validate the request, call the admin service, and map
//! [`AdminError`](lauth_registry::AdminError) onto HTTP via [`AppError`].
//!
//! | Method & path                       | Operation        |
//! |-------------------------------------|------------------|
//! | `POST /v1/licenses`                 | create           |
//! | `GET  /v1/licenses?status=`         | list             |
//! | `GET  /v1/licenses/{key}`           | get              |
//! | `POST /v1/licenses/{key}/extend`    | extend           |
//! | `POST /v1/licenses/{key}/revoke`    | revoke           |
//! | `GET  /v1/licenses/{key}/history`   | transition log   |

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use lauth_core::{ExtraData, LicenseKey, Timestamp};
use lauth_registry::{AdminError, License, LicenseAdmin, LicenseLookup, NewLicense};
use lauth_state::{LicenseEvent, LicenseStatus};

use crate::error::AppError;
use crate::extractors::{extract_key, extract_query, extract_validated_json, Validate};
use crate::middleware::metrics::record_operation;
use crate::state::AppState;

// ─── Request / Response Types ────────────────────────────────────────

/// Request to create a license.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreateLicenseRequest {
    /// RFC 3339 expiration. Omit for a license that never expires.
    #[serde(default)]
    #[schema(value_type = Option<String>, format = DateTime, example = "2025-01-01T00:00:00Z")]
    pub expiration_date: Option<Timestamp>,
    /// Opaque JSON document, stored and returned verbatim.
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub extra_data: Option<ExtraData>,
}

impl Validate for CreateLicenseRequest {
    fn validate(&self) -> Result<(), String> {
        self.expiration_date
            .as_ref()
            .map_or(Ok(()), Timestamp::ensure_sensible)
            .map_err(|e| e.to_string())
    }
}

impl From<CreateLicenseRequest> for NewLicense {
    fn from(req: CreateLicenseRequest) -> Self {
        NewLicense {
            expiration_date: req.expiration_date,
            extra_data: req.extra_data,
        }
    }
}

/// Request to move a license's expiration forward.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ExtendLicenseRequest {
    /// New RFC 3339 expiration; must be later than the current one.
    #[schema(value_type = String, format = DateTime, example = "2025-06-01T00:00:00Z")]
    pub expiration_date: Timestamp,
}

impl Validate for ExtendLicenseRequest {
    fn validate(&self) -> Result<(), String> {
        self.expiration_date
            .ensure_sensible()
            .map_err(|e| e.to_string())
    }
}

/// A license as returned by the API.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LicenseResponse {
    #[schema(value_type = String, example = "0A1B2C3D-4E5F6071-8293A4B5-C6D7E8F9")]
    pub key: LicenseKey,
    #[schema(value_type = Option<String>, format = DateTime)]
    pub expiration_date: Option<Timestamp>,
    #[schema(value_type = Option<Object>)]
    pub extra_data: Option<ExtraData>,
    /// `active`, `expired` or `revoked`, as of the response.
    #[schema(value_type = String, example = "active")]
    pub status: LicenseStatus,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: Timestamp,
    #[schema(value_type = Option<String>, format = DateTime)]
    pub revoked_at: Option<Timestamp>,
}

impl From<License> for LicenseResponse {
    fn from(license: License) -> Self {
        Self {
            key: license.key,
            expiration_date: license.expiration_date,
            extra_data: license.extra_data,
            status: license.status,
            created_at: license.created_at,
            revoked_at: license.revoked_at,
        }
    }
}

/// Query parameters for listing licenses.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListLicensesQuery {
    /// Only licenses with this status (`active`, `expired`, `revoked`).
    pub status: Option<String>,
}

/// A page of licenses.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LicenseListResponse {
    pub licenses: Vec<LicenseResponse>,
    pub total: usize,
}

/// The transition log of one license.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LicenseHistoryResponse {
    #[schema(value_type = String)]
    pub key: LicenseKey,
    /// Events oldest first: `created`, `extended`, `revoked`.
    #[schema(value_type = Vec<Object>)]
    pub events: Vec<LicenseEvent>,
}

// ─── Router ──────────────────────────────────────────────────────────

/// Build the license admin router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/licenses", get(list_licenses).post(create_license))
        .route("/v1/licenses/{key}", get(get_license))
        .route("/v1/licenses/{key}/extend", post(extend_license))
        .route("/v1/licenses/{key}/revoke", post(revoke_license))
        .route("/v1/licenses/{key}/history", get(license_history))
}

/// Count the operation outcome, then hand the result on.
fn observe<T>(operation: &'static str, result: Result<T, AdminError>) -> Result<T, AppError> {
    match &result {
        Ok(_) => record_operation(operation, "ok"),
        Err(e) => record_operation(operation, e.code()),
    }
    result.map_err(AppError::from)
}

// ─── Handlers ────────────────────────────────────────────────────────

/// POST /v1/licenses: Issue a license under a fresh key.
#[utoipa::path(
    post,
    path = "/v1/licenses",
    request_body = CreateLicenseRequest,
    responses(
        (status = 201, description = "License created", body = LicenseResponse),
        (status = 400, description = "Malformed body", body = crate::error::ErrorBody),
        (status = 422, description = "Invalid expiration", body = crate::error::ErrorBody),
    ),
    tag = "licenses"
)]
pub async fn create_license(
    State(state): State<AppState>,
    body: Result<Json<CreateLicenseRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<LicenseResponse>), AppError> {
    let req = extract_validated_json(body)?;
    let license = observe("create", state.admin.create_license(req.into()))?;
    Ok((StatusCode::CREATED, Json(license.into())))
}

/// POST /v1/licenses/{key}/extend: Move the expiration forward.
#[utoipa::path(
    post,
    path = "/v1/licenses/{key}/extend",
    params(("key" = String, Path, description = "License key")),
    request_body = ExtendLicenseRequest,
    responses(
        (status = 200, description = "License extended", body = LicenseResponse),
        (status = 404, description = "Unknown key", body = crate::error::ErrorBody),
        (status = 409, description = "License is revoked", body = crate::error::ErrorBody),
        (status = 422, description = "Not later than current expiration", body = crate::error::ErrorBody),
    ),
    tag = "licenses"
)]
pub async fn extend_license(
    State(state): State<AppState>,
    key: Result<Path<String>, PathRejection>,
    body: Result<Json<ExtendLicenseRequest>, JsonRejection>,
) -> Result<Json<LicenseResponse>, AppError> {
    let key = extract_key(key)?;
    let req = extract_validated_json(body)?;
    let license = observe(
        "extend",
        state.admin.extend_license(&key, req.expiration_date),
    )?;
    Ok(Json(license.into()))
}

/// POST /v1/licenses/{key}/revoke: Revoke permanently (idempotent).
#[utoipa::path(
    post,
    path = "/v1/licenses/{key}/revoke",
    params(("key" = String, Path, description = "License key")),
    responses(
        (status = 200, description = "License revoked", body = LicenseResponse),
        (status = 404, description = "Unknown key", body = crate::error::ErrorBody),
    ),
    tag = "licenses"
)]
pub async fn revoke_license(
    State(state): State<AppState>,
    key: Result<Path<String>, PathRejection>,
) -> Result<Json<LicenseResponse>, AppError> {
    let key = extract_key(key)?;
    let license = observe("revoke", state.admin.revoke_license(&key))?;
    Ok(Json(license.into()))
}

/// GET /v1/licenses/{key}: Fetch one license with its current status.
#[utoipa::path(
    get,
    path = "/v1/licenses/{key}",
    params(("key" = String, Path, description = "License key")),
    responses(
        (status = 200, description = "License found", body = LicenseResponse),
        (status = 404, description = "Unknown key", body = crate::error::ErrorBody),
    ),
    tag = "licenses"
)]
pub async fn get_license(
    State(state): State<AppState>,
    key: Result<Path<String>, PathRejection>,
) -> Result<Json<LicenseResponse>, AppError> {
    let key = extract_key(key)?;
    let license = state.admin.get_license(&key)?;
    Ok(Json(license.into()))
}

/// GET /v1/licenses: List licenses, optionally by status.
#[utoipa::path(
    get,
    path = "/v1/licenses",
    params(ListLicensesQuery),
    responses(
        (status = 200, description = "Licenses", body = LicenseListResponse),
        (status = 422, description = "Unknown status", body = crate::error::ErrorBody),
    ),
    tag = "licenses"
)]
pub async fn list_licenses(
    State(state): State<AppState>,
    query: Result<Query<ListLicensesQuery>, QueryRejection>,
) -> Result<Json<LicenseListResponse>, AppError> {
    let query = extract_query(query)?;
    let status = match query.status.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(raw.parse::<LicenseStatus>().map_err(AppError::Validation)?),
    };
    let licenses: Vec<LicenseResponse> = state
        .admin
        .list_licenses(status)?
        .into_iter()
        .map(LicenseResponse::from)
        .collect();
    Ok(Json(LicenseListResponse {
        total: licenses.len(),
        licenses,
    }))
}

/// GET /v1/licenses/{key}/history: Transition log, oldest first.
#[utoipa::path(
    get,
    path = "/v1/licenses/{key}/history",
    params(("key" = String, Path, description = "License key")),
    responses(
        (status = 200, description = "Transition log", body = LicenseHistoryResponse),
        (status = 404, description = "Unknown key", body = crate::error::ErrorBody),
    ),
    tag = "licenses"
)]
pub async fn license_history(
    State(state): State<AppState>,
    key: Result<Path<String>, PathRejection>,
) -> Result<Json<LicenseHistoryResponse>, AppError> {
    let key = extract_key(key)?;
    let events = state.admin.license_history(&key)?;
    Ok(Json(LicenseHistoryResponse { key, events }))
}
