//! # Admin Interface
//!
//! The transport-independent operation contract through which trusted
//! callers administer licenses.
//!
//! [`LicenseAdmin`] is the capability: exactly create, extend and revoke.
//! [`LicenseLookup`] is the separate read side. Both speak only in value
//! types (`License`, `LicenseKey`, `LicenseEvent`) and report failures as
//! [`AdminError`], whose lifecycle variants are the stable taxonomy every
//! transport maps to and from.
//!
//! [`AdminService`] implements both contracts in-process over a shared
//! [`LicenseRegistry`]. It validates argument shapes before delegating, so
//! the registry only ever sees sensible timestamps.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use lauth_core::{ExtraData, LicenseKey, Timestamp, ValidationError};
use lauth_state::{LicenseError, LicenseEvent, LicenseStatus};

use crate::registry::{LicenseRegistry, LicenseSnapshot, RegistryError};

// ─── Value Types ─────────────────────────────────────────────────────

/// Caller input for CreateLicense.
///
/// There is no `revoked` field: a license can only become revoked through
/// [`LicenseAdmin::revoke_license`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLicense {
    /// When the license stops being valid. `None` means it never expires.
    #[serde(default)]
    pub expiration_date: Option<Timestamp>,
    /// Opaque caller payload, stored and returned verbatim.
    #[serde(default)]
    pub extra_data: Option<ExtraData>,
}

impl NewLicense {
    /// Reject structurally invalid input.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(expiration) = &self.expiration_date {
            expiration.ensure_sensible()?;
        }
        Ok(())
    }
}

/// A license as seen by admin callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct License {
    pub key: LicenseKey,
    pub expiration_date: Option<Timestamp>,
    pub extra_data: Option<ExtraData>,
    /// Status at the moment the license was read.
    pub status: LicenseStatus,
    pub created_at: Timestamp,
    pub revoked_at: Option<Timestamp>,
}

impl License {
    /// Build the caller view of a registry snapshot.
    pub fn from_snapshot(snapshot: LicenseSnapshot) -> Self {
        let record = snapshot.record;
        Self {
            key: record.key().clone(),
            expiration_date: record.expiration_date(),
            extra_data: record.extra_data().cloned(),
            status: snapshot.status,
            created_at: record.created_at(),
            revoked_at: record.revoked_at(),
        }
    }
}

// ─── Errors ──────────────────────────────────────────────────────────

/// Failures surfaced to admin callers.
///
/// The first four variants are the lifecycle taxonomy. `Storage` and
/// `Internal` report infrastructure faults and are never produced for a
/// lifecycle condition.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdminError {
    /// The request is structurally invalid.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The key was never issued by this authority.
    #[error("license {0} not found")]
    NotFound(LicenseKey),

    /// The license is revoked and cannot be extended.
    #[error("license {0} is revoked")]
    AlreadyRevoked(LicenseKey),

    /// The new expiration does not move the license strictly forward.
    #[error("invalid extension: {0}")]
    InvalidExtension(String),

    /// The license store failed; nothing was applied.
    #[error("storage failure: {0}")]
    Storage(String),

    /// Any other fault inside the authority or the transport.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AdminError {
    /// Stable machine-readable code, shared by every transport.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "VALIDATION_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::AlreadyRevoked(_) => "ALREADY_REVOKED",
            Self::InvalidExtension(_) => "INVALID_EXTENSION",
            Self::Storage(_) | Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<ValidationError> for AdminError {
    fn from(err: ValidationError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}

impl From<RegistryError> for AdminError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotFound(key) => Self::NotFound(key),
            RegistryError::Lifecycle(LicenseError::AlreadyRevoked { key }) => {
                Self::AlreadyRevoked(key)
            }
            RegistryError::Lifecycle(e @ LicenseError::InvalidExtension { .. }) => {
                Self::InvalidExtension(e.to_string())
            }
            RegistryError::Store(e) => Self::Storage(e.to_string()),
            e @ RegistryError::KeyGeneration { .. } => Self::Internal(e.to_string()),
        }
    }
}

// ─── Contracts ───────────────────────────────────────────────────────

/// The admin capability: the three lifecycle mutations.
pub trait LicenseAdmin {
    /// Issue a license under a fresh unique key.
    ///
    /// # Errors
    ///
    /// [`AdminError::InvalidInput`] if `request` is structurally invalid.
    fn create_license(&self, request: NewLicense) -> Result<License, AdminError>;

    /// Move the expiration of `key` strictly forward.
    ///
    /// # Errors
    ///
    /// - [`AdminError::InvalidInput`] if `new_expiration` is not sensible.
    /// - [`AdminError::NotFound`] if `key` was never issued.
    /// - [`AdminError::AlreadyRevoked`] if the license is revoked.
    /// - [`AdminError::InvalidExtension`] if `new_expiration` is not later
    ///   than the current expiration, or the license never expires.
    fn extend_license(
        &self,
        key: &LicenseKey,
        new_expiration: Timestamp,
    ) -> Result<License, AdminError>;

    /// Revoke `key` permanently. Succeeds again on an already revoked
    /// license without changing it.
    ///
    /// # Errors
    ///
    /// [`AdminError::NotFound`] if `key` was never issued.
    fn revoke_license(&self, key: &LicenseKey) -> Result<License, AdminError>;
}

/// Read-only queries over the registry.
pub trait LicenseLookup {
    /// The license for `key`, with its status as of now.
    fn get_license(&self, key: &LicenseKey) -> Result<License, AdminError>;

    /// Every license, optionally only those with `status`.
    fn list_licenses(&self, status: Option<LicenseStatus>) -> Result<Vec<License>, AdminError>;

    /// The transitions applied to `key`, oldest first.
    fn license_history(&self, key: &LicenseKey) -> Result<Vec<LicenseEvent>, AdminError>;
}

// ─── In-Process Service ──────────────────────────────────────────────

/// In-process implementation of [`LicenseAdmin`] and [`LicenseLookup`].
#[derive(Debug, Clone)]
pub struct AdminService {
    registry: Arc<LicenseRegistry>,
}

impl AdminService {
    /// Serve admin operations from `registry`.
    pub fn new(registry: Arc<LicenseRegistry>) -> Self {
        Self { registry }
    }

    /// The registry behind this service.
    pub fn registry(&self) -> &Arc<LicenseRegistry> {
        &self.registry
    }
}

impl LicenseAdmin for AdminService {
    fn create_license(&self, request: NewLicense) -> Result<License, AdminError> {
        request.validate()?;
        let snapshot = self
            .registry
            .create(request.expiration_date, request.extra_data)?;
        let license = License::from_snapshot(snapshot);
        tracing::info!(
            key = %license.key,
            expiration_date = ?license.expiration_date.map(|t| t.to_iso8601()),
            status = %license.status,
            "license created"
        );
        Ok(license)
    }

    fn extend_license(
        &self,
        key: &LicenseKey,
        new_expiration: Timestamp,
    ) -> Result<License, AdminError> {
        new_expiration.ensure_sensible()?;
        let license = License::from_snapshot(self.registry.extend(key, new_expiration)?);
        tracing::info!(
            key = %key,
            expiration_date = %new_expiration,
            status = %license.status,
            "license extended"
        );
        Ok(license)
    }

    fn revoke_license(&self, key: &LicenseKey) -> Result<License, AdminError> {
        let (snapshot, outcome) = self.registry.revoke(key)?;
        match outcome {
            lauth_state::RevokeOutcome::Revoked => tracing::info!(key = %key, "license revoked"),
            lauth_state::RevokeOutcome::AlreadyRevoked => {
                tracing::debug!(key = %key, "license already revoked")
            }
        }
        Ok(License::from_snapshot(snapshot))
    }
}

impl LicenseLookup for AdminService {
    fn get_license(&self, key: &LicenseKey) -> Result<License, AdminError> {
        Ok(License::from_snapshot(self.registry.get(key)?))
    }

    fn list_licenses(&self, status: Option<LicenseStatus>) -> Result<Vec<License>, AdminError> {
        Ok(self
            .registry
            .list(status)?
            .into_iter()
            .map(License::from_snapshot)
            .collect())
    }

    fn license_history(&self, key: &LicenseKey) -> Result<Vec<LicenseEvent>, AdminError> {
        Ok(self.registry.history(key)?)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use lauth_core::FixedClock;

    use super::*;

    fn ts(s: &str) -> Timestamp {
        Timestamp::parse(s).unwrap()
    }

    fn service_at(now: &str) -> (AdminService, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::new(ts(now)));
        let registry = LicenseRegistry::builder().clock(clock.clone()).build();
        (AdminService::new(Arc::new(registry)), clock)
    }

    fn create_expiring(service: &AdminService, at: &str) -> License {
        service
            .create_license(NewLicense {
                expiration_date: Some(ts(at)),
                extra_data: None,
            })
            .unwrap()
    }

    #[test]
    fn test_scenario_create_with_expiration() {
        let (service, _) = service_at("2024-12-01T00:00:00Z");
        let license = create_expiring(&service, "2025-01-01T00:00:00Z");

        assert!(license.key.is_minted_format());
        assert_eq!(license.expiration_date, Some(ts("2025-01-01T00:00:00Z")));
        assert_eq!(license.extra_data, None);
        assert_eq!(license.status, LicenseStatus::Active);
        assert_eq!(license.revoked_at, None);
    }

    #[test]
    fn test_scenarios_extend_forward_then_backward() {
        let (service, _) = service_at("2024-12-01T00:00:00Z");
        let key = create_expiring(&service, "2025-01-01T00:00:00Z").key;

        let extended = service
            .extend_license(&key, ts("2025-06-01T00:00:00Z"))
            .unwrap();
        assert_eq!(extended.expiration_date, Some(ts("2025-06-01T00:00:00Z")));

        let err = service
            .extend_license(&key, ts("2025-02-01T00:00:00Z"))
            .unwrap_err();
        assert!(matches!(err, AdminError::InvalidExtension(_)));
        assert_eq!(
            service.get_license(&key).unwrap().expiration_date,
            Some(ts("2025-06-01T00:00:00Z"))
        );
    }

    #[test]
    fn test_scenario_extend_after_revoke() {
        let (service, _) = service_at("2024-12-01T00:00:00Z");
        let key = create_expiring(&service, "2025-01-01T00:00:00Z").key;

        service.revoke_license(&key).unwrap();
        let err = service
            .extend_license(&key, ts("2099-01-01T00:00:00Z"))
            .unwrap_err();
        assert_eq!(err, AdminError::AlreadyRevoked(key));
    }

    #[test]
    fn test_scenario_revoke_unknown_key() {
        let (service, _) = service_at("2024-12-01T00:00:00Z");
        let unknown = LicenseKey::parse("0000-never-issued").unwrap();
        assert_eq!(
            service.revoke_license(&unknown).unwrap_err(),
            AdminError::NotFound(unknown)
        );
    }

    #[test]
    fn test_revoke_is_idempotent() {
        let (service, clock) = service_at("2024-12-01T00:00:00Z");
        let key = create_expiring(&service, "2025-01-01T00:00:00Z").key;

        let first = service.revoke_license(&key).unwrap();
        clock.advance_secs(86_400);
        let second = service.revoke_license(&key).unwrap();

        assert_eq!(first.status, LicenseStatus::Revoked);
        assert_eq!(first, second);
        assert_eq!(service.license_history(&key).unwrap().len(), 2);
    }

    #[test]
    fn test_extend_never_expiring_is_invalid_extension() {
        let (service, _) = service_at("2024-12-01T00:00:00Z");
        let key = service
            .create_license(NewLicense::default())
            .unwrap()
            .key;
        let err = service
            .extend_license(&key, ts("2030-01-01T00:00:00Z"))
            .unwrap_err();
        assert!(matches!(err, AdminError::InvalidExtension(msg) if msg.contains("never expires")));
    }

    #[test]
    fn test_extend_expired_license_reactivates() {
        let (service, _) = service_at("2025-03-01T00:00:00Z");
        let license = create_expiring(&service, "2025-01-01T00:00:00Z");
        assert_eq!(license.status, LicenseStatus::Expired);

        let extended = service
            .extend_license(&license.key, ts("2026-01-01T00:00:00Z"))
            .unwrap();
        assert_eq!(extended.status, LicenseStatus::Active);
    }

    #[test]
    fn test_create_rejects_out_of_range_expiration() {
        let (service, _) = service_at("2024-12-01T00:00:00Z");
        let err = service
            .create_license(NewLicense {
                expiration_date: Some(Timestamp::from_epoch_secs(-1).unwrap()),
                extra_data: None,
            })
            .unwrap_err();
        assert!(matches!(err, AdminError::InvalidInput(_)));
        assert!(service.registry().is_empty().unwrap());
    }

    #[test]
    fn test_extend_rejects_out_of_range_expiration_before_lookup() {
        let (service, _) = service_at("2024-12-01T00:00:00Z");
        let unknown = LicenseKey::parse("unknown").unwrap();
        let err = service
            .extend_license(&unknown, Timestamp::from_epoch_secs(-60).unwrap())
            .unwrap_err();
        assert!(matches!(err, AdminError::InvalidInput(_)));
    }

    #[test]
    fn test_extra_data_returned_verbatim() {
        let (service, _) = service_at("2024-12-01T00:00:00Z");
        let text = r#"{ "features": ["a","b"],  "seats": 5 }"#;
        let created = service
            .create_license(NewLicense {
                expiration_date: None,
                extra_data: Some(ExtraData::from_json_text(text).unwrap()),
            })
            .unwrap();
        let fetched = service.get_license(&created.key).unwrap();
        assert_eq!(fetched.extra_data.as_ref().map(ExtraData::as_str), Some(text));
    }

    #[test]
    fn test_list_licenses_by_status() {
        let (service, _) = service_at("2024-12-01T00:00:00Z");
        create_expiring(&service, "2025-01-01T00:00:00Z");
        let revoked = create_expiring(&service, "2025-01-01T00:00:00Z").key;
        service.revoke_license(&revoked).unwrap();

        assert_eq!(service.list_licenses(None).unwrap().len(), 2);
        let only_revoked = service
            .list_licenses(Some(LicenseStatus::Revoked))
            .unwrap();
        assert_eq!(only_revoked.len(), 1);
        assert_eq!(only_revoked[0].key, revoked);
    }

    #[test]
    fn test_new_license_json_defaults() {
        let parsed: NewLicense = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed, NewLicense::default());

        let parsed: NewLicense =
            serde_json::from_str(r#"{"expiration_date":"2025-01-01T00:00:00Z","extra_data":null}"#)
                .unwrap();
        assert_eq!(parsed.expiration_date, Some(ts("2025-01-01T00:00:00Z")));
        assert_eq!(parsed.extra_data, None);
    }

    #[test]
    fn test_error_codes() {
        let key = LicenseKey::parse("k").unwrap();
        assert_eq!(AdminError::InvalidInput("x".into()).code(), "VALIDATION_ERROR");
        assert_eq!(AdminError::NotFound(key.clone()).code(), "NOT_FOUND");
        assert_eq!(AdminError::AlreadyRevoked(key).code(), "ALREADY_REVOKED");
        assert_eq!(AdminError::InvalidExtension("x".into()).code(), "INVALID_EXTENSION");
        assert_eq!(AdminError::Storage("x".into()).code(), "INTERNAL_ERROR");
        assert_eq!(AdminError::Internal("x".into()).code(), "INTERNAL_ERROR");
    }

    #[test]
    fn test_key_generation_failure_is_internal() {
        let err = AdminError::from(RegistryError::KeyGeneration {
            generator: "g".into(),
            attempts: 64,
        });
        assert!(matches!(err, AdminError::Internal(_)));
    }
}
