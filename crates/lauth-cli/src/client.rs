//! # HTTP Admin Client
//!
//! [`HttpAdminClient`] implements the admin contracts against a running
//! `lauth-api` server, so CLI commands are written once against
//! [`LicenseAdmin`] and [`LicenseLookup`] and do not care whether the
//! authority is remote or in-process.
//!
//! Server error bodies (`{"error": {"code", "message"}}`) are mapped back to
//! the [`AdminError`] variant carrying the same code. Transport failures,
//! rejected credentials and unknown codes all surface as
//! [`AdminError::Internal`].

use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use url::Url;

use lauth_core::{LicenseKey, Timestamp};
use lauth_crypto::SecretToken;
use lauth_registry::{AdminError, License, LicenseAdmin, LicenseLookup, NewLicense};
use lauth_state::{LicenseEvent, LicenseStatus};

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Blocking HTTP client for the license admin API.
#[derive(Debug, Clone)]
pub struct HttpAdminClient {
    http: Client,
    base_url: Url,
}

impl HttpAdminClient {
    /// Create a client for the server at `base_url`.
    ///
    /// When `token` is given it is sent as a bearer token on every request.
    pub fn new(
        base_url: &str,
        token: Option<&SecretToken>,
        timeout: Duration,
    ) -> Result<Self, AdminError> {
        let base_url = Url::parse(base_url.trim())
            .map_err(|e| AdminError::InvalidInput(format!("server URL {base_url:?}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(AdminError::InvalidInput(format!(
                "server URL {base_url} cannot carry a path"
            )));
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(token) = token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose()))
                .map_err(|_| AdminError::InvalidInput("admin token contains invalid characters".into()))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let http = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| AdminError::Internal(format!("building HTTP client: {e}")))?;

        Ok(Self { http, base_url })
    }

    /// The server base URL, without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// Append path segments to the base URL, percent-encoding each one.
    fn url<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Result<Url, AdminError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                AdminError::InvalidInput(format!("server URL {} cannot carry a path", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn collection_url(&self) -> Result<Url, AdminError> {
        self.url(["v1", "licenses"])
    }

    /// URL of one license, optionally followed by an action segment.
    ///
    /// The key always travels as a single encoded segment, so `/`, `?`, `#`
    /// and `%` inside it never change which resource is addressed.
    fn license_url(&self, key: &LicenseKey, action: Option<&str>) -> Result<Url, AdminError> {
        // Dot segments are dropped by URL normalization and are never minted.
        if matches!(key.as_str(), "." | "..") {
            return Err(AdminError::NotFound(key.clone()));
        }
        self.url(["v1", "licenses", key.as_str()].into_iter().chain(action))
    }
}

// ─── Wire Types ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorPayload,
}

#[derive(Debug, Deserialize)]
struct ErrorPayload {
    code: String,
    message: String,
}

#[derive(Debug, Deserialize)]
struct LicenseList {
    licenses: Vec<License>,
}

#[derive(Debug, Deserialize)]
struct LicenseHistory {
    events: Vec<LicenseEvent>,
}

// ─── Response Handling ───────────────────────────────────────────────

/// Map a server error response back onto the admin error taxonomy.
///
/// `key` is the license the request addressed, if any; it is needed to
/// rebuild `NotFound` and `AlreadyRevoked`.
pub fn admin_error_from_response(status: u16, body: &str, key: Option<&LicenseKey>) -> AdminError {
    let Ok(ErrorEnvelope { error }) = serde_json::from_str::<ErrorEnvelope>(body) else {
        return AdminError::Internal(format!("server returned HTTP {status}: {}", body.trim()));
    };

    match (error.code.as_str(), key) {
        ("VALIDATION_ERROR" | "BAD_REQUEST", _) => AdminError::InvalidInput(error.message),
        ("NOT_FOUND", Some(key)) => AdminError::NotFound(key.clone()),
        ("ALREADY_REVOKED", Some(key)) => AdminError::AlreadyRevoked(key.clone()),
        ("INVALID_EXTENSION", _) => AdminError::InvalidExtension(error.message),
        ("UNAUTHORIZED", _) => {
            AdminError::Internal(format!("server rejected credentials: {}", error.message))
        }
        (code, _) => AdminError::Internal(format!("{code}: {}", error.message)),
    }
}

fn send(
    request: reqwest::blocking::RequestBuilder,
    endpoint: &str,
) -> Result<Response, AdminError> {
    tracing::debug!(endpoint, "sending admin request");
    request
        .send()
        .map_err(|e| AdminError::Internal(format!("{endpoint}: {e}")))
}

fn decode<T: serde::de::DeserializeOwned>(
    response: Response,
    endpoint: &str,
    key: Option<&LicenseKey>,
) -> Result<T, AdminError> {
    let status = response.status();
    let body = response
        .text()
        .map_err(|e| AdminError::Internal(format!("{endpoint}: reading response: {e}")))?;

    if !status.is_success() {
        tracing::debug!(endpoint, status = status.as_u16(), "admin request failed");
        return Err(admin_error_from_response(status.as_u16(), &body, key));
    }

    serde_json::from_str(&body)
        .map_err(|e| AdminError::Internal(format!("{endpoint}: unexpected response body: {e}")))
}

// ─── Contract Implementations ────────────────────────────────────────

impl LicenseAdmin for HttpAdminClient {
    fn create_license(&self, request: NewLicense) -> Result<License, AdminError> {
        let endpoint = "POST /v1/licenses";
        let response = send(self.http.post(self.collection_url()?).json(&request), endpoint)?;
        decode(response, endpoint, None)
    }

    fn extend_license(
        &self,
        key: &LicenseKey,
        new_expiration: Timestamp,
    ) -> Result<License, AdminError> {
        let endpoint = "POST /v1/licenses/{key}/extend";
        let body = serde_json::json!({ "expiration_date": new_expiration });
        let response = send(
            self.http.post(self.license_url(key, Some("extend"))?).json(&body),
            endpoint,
        )?;
        decode(response, endpoint, Some(key))
    }

    fn revoke_license(&self, key: &LicenseKey) -> Result<License, AdminError> {
        let endpoint = "POST /v1/licenses/{key}/revoke";
        let response = send(self.http.post(self.license_url(key, Some("revoke"))?), endpoint)?;
        decode(response, endpoint, Some(key))
    }
}

impl LicenseLookup for HttpAdminClient {
    fn get_license(&self, key: &LicenseKey) -> Result<License, AdminError> {
        let endpoint = "GET /v1/licenses/{key}";
        let response = send(self.http.get(self.license_url(key, None)?), endpoint)?;
        decode(response, endpoint, Some(key))
    }

    fn list_licenses(&self, status: Option<LicenseStatus>) -> Result<Vec<License>, AdminError> {
        let endpoint = "GET /v1/licenses";
        let mut request = self.http.get(self.collection_url()?);
        if let Some(status) = status {
            request = request.query(&[("status", status.as_str())]);
        }
        let list: LicenseList = decode(send(request, endpoint)?, endpoint, None)?;
        Ok(list.licenses)
    }

    fn license_history(&self, key: &LicenseKey) -> Result<Vec<LicenseEvent>, AdminError> {
        let endpoint = "GET /v1/licenses/{key}/history";
        let response = send(self.http.get(self.license_url(key, Some("history"))?), endpoint)?;
        let history: LicenseHistory = decode(response, endpoint, Some(key))?;
        Ok(history.events)
    }
}
