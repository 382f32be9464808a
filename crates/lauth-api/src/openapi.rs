//! # OpenAPI Specification Assembly
//!
//! Assembles the utoipa-documented routes into a single OpenAPI document,
//! served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// Assembled OpenAPI spec for the admin API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "License Authority Admin API",
        description = "Issue, extend and revoke software licenses identified by opaque keys."
    ),
    paths(
        crate::routes::licenses::create_license,
        crate::routes::licenses::list_licenses,
        crate::routes::licenses::get_license,
        crate::routes::licenses::extend_license,
        crate::routes::licenses::revoke_license,
        crate::routes::licenses::license_history,
    ),
    components(schemas(
        crate::routes::licenses::CreateLicenseRequest,
        crate::routes::licenses::ExtendLicenseRequest,
        crate::routes::licenses::LicenseResponse,
        crate::routes::licenses::LicenseListResponse,
        crate::routes::licenses::LicenseHistoryResponse,
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "licenses", description = "License lifecycle administration"),
    )
)]
pub struct ApiDoc;

/// Build the OpenAPI router.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json: Return the generated OpenAPI specification.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_spec_generates_successfully() {
        let spec = ApiDoc::openapi();
        assert_eq!(spec.info.title, "License Authority Admin API");
    }

    #[test]
    fn test_openapi_spec_has_license_paths() {
        let spec = ApiDoc::openapi();
        for path in [
            "/v1/licenses",
            "/v1/licenses/{key}",
            "/v1/licenses/{key}/extend",
            "/v1/licenses/{key}/revoke",
            "/v1/licenses/{key}/history",
        ] {
            assert!(spec.paths.paths.contains_key(path), "missing {path}");
        }
    }

    #[test]
    fn test_openapi_spec_has_schemas() {
        let spec = ApiDoc::openapi();
        let components = spec.components.expect("components");
        assert!(components.schemas.contains_key("LicenseResponse"));
        assert!(components.schemas.contains_key("ErrorBody"));
    }
}
