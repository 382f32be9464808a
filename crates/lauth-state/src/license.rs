//! # License Lifecycle
//!
//! Models one issued license from creation through extension and
//! revocation.
//!
//! ## Status derivation
//!
//! | `revoked` | `expiration_date`     | status    |
//! |-----------|-----------------------|-----------|
//! | true      | anything              | Revoked   |
//! | false     | absent                | Active    |
//! | false     | present, `> now`      | Active    |
//! | false     | present, `<= now`     | Expired   |
//!
//! Revocation dominates: it is checked first by every query and every
//! mutation.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use lauth_core::{ExtraData, LicenseKey, Timestamp};

// ─── License Status ──────────────────────────────────────────────────

/// The lifecycle status of a license at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LicenseStatus {
    /// Not revoked, and either never expires or expires in the future.
    Active,
    /// Not revoked, and the expiration date is not in the future.
    Expired,
    /// Permanently invalidated (terminal).
    Revoked,
}

impl LicenseStatus {
    /// Whether this status is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Revoked)
    }

    /// Whether the license grants use rights at this instant.
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// Lower-case wire name, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Expired => "expired",
            Self::Revoked => "revoked",
        }
    }
}

impl std::fmt::Display for LicenseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Active => "ACTIVE",
            Self::Expired => "EXPIRED",
            Self::Revoked => "REVOKED",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for LicenseStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "expired" => Ok(Self::Expired),
            "revoked" => Ok(Self::Revoked),
            other => Err(format!(
                "unknown license status {other:?} (expected active, expired or revoked)"
            )),
        }
    }
}

// ─── Errors ──────────────────────────────────────────────────────────

/// Errors that can occur during license lifecycle transitions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LicenseError {
    /// The license is revoked; no further transition is possible.
    #[error("license {key} is revoked")]
    AlreadyRevoked {
        /// The revoked license.
        key: LicenseKey,
    },

    /// The requested expiration does not move the license strictly forward.
    #[error("{}", describe_invalid_extension(.key, .current, .requested))]
    InvalidExtension {
        /// The license that was asked to extend.
        key: LicenseKey,
        /// Its expiration before the request, `None` if it never expires.
        current: Option<Timestamp>,
        /// The rejected new expiration.
        requested: Timestamp,
    },
}

fn describe_invalid_extension(
    key: &LicenseKey,
    current: &Option<Timestamp>,
    requested: &Timestamp,
) -> String {
    match current {
        Some(current) => format!(
            "cannot extend license {key} to {requested}: must be later than current expiration {current}"
        ),
        None => format!("cannot extend license {key} to {requested}: license never expires"),
    }
}

// ─── Transition History ──────────────────────────────────────────────

/// What happened to a license.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LicenseEventKind {
    /// The license was issued.
    Created {
        /// Expiration at issue time.
        expiration_date: Option<Timestamp>,
    },
    /// The expiration moved forward.
    Extended {
        /// Previous expiration.
        from: Timestamp,
        /// New expiration.
        to: Timestamp,
    },
    /// The license was revoked.
    Revoked,
}

/// Record of one lifecycle transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseEvent {
    /// Unique event identifier.
    pub id: Uuid,
    /// When the transition was applied.
    pub at: Timestamp,
    /// The transition.
    #[serde(flatten)]
    pub kind: LicenseEventKind,
}

impl LicenseEvent {
    fn new(at: Timestamp, kind: LicenseEventKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            at,
            kind,
        }
    }
}

/// Result of a revoke request that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevokeOutcome {
    /// This call revoked the license.
    Revoked,
    /// The license was already revoked; nothing changed.
    AlreadyRevoked,
}

// ─── License Record ──────────────────────────────────────────────────

/// One issued license with its lifecycle state and transition history.
///
/// The key, creation time and extra data are fixed at issue. The
/// expiration only moves forward. The revoked marker only goes from
/// `false` to `true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseRecord {
    key: LicenseKey,
    expiration_date: Option<Timestamp>,
    extra_data: Option<ExtraData>,
    revoked: bool,
    created_at: Timestamp,
    revoked_at: Option<Timestamp>,
    history: Vec<LicenseEvent>,
}

impl LicenseRecord {
    /// Issue a new, unrevoked license.
    ///
    /// An expiration in the past is allowed; the license is then Expired
    /// from the moment it is created.
    pub fn issue(
        key: LicenseKey,
        expiration_date: Option<Timestamp>,
        extra_data: Option<ExtraData>,
        now: Timestamp,
    ) -> Self {
        Self {
            key,
            expiration_date,
            extra_data,
            revoked: false,
            created_at: now,
            revoked_at: None,
            history: vec![LicenseEvent::new(
                now,
                LicenseEventKind::Created { expiration_date },
            )],
        }
    }

    /// Derive the status at instant `now`.
    pub fn status_at(&self, now: Timestamp) -> LicenseStatus {
        if self.revoked {
            return LicenseStatus::Revoked;
        }
        match self.expiration_date {
            Some(expiry) if expiry <= now => LicenseStatus::Expired,
            _ => LicenseStatus::Active,
        }
    }

    /// Move the expiration forward to `new_expiration`.
    ///
    /// # Errors
    ///
    /// - [`LicenseError::AlreadyRevoked`] if the license is revoked, whatever
    ///   the requested date.
    /// - [`LicenseError::InvalidExtension`] if the license never expires or
    ///   `new_expiration` is not strictly later than the current expiration.
    ///
    /// On error the record is unchanged.
    pub fn extend(
        &mut self,
        new_expiration: Timestamp,
        now: Timestamp,
    ) -> Result<(), LicenseError> {
        self.require_not_revoked()?;
        let current = match self.expiration_date {
            Some(current) if new_expiration > current => current,
            current => {
                return Err(LicenseError::InvalidExtension {
                    key: self.key.clone(),
                    current,
                    requested: new_expiration,
                })
            }
        };
        self.expiration_date = Some(new_expiration);
        self.history.push(LicenseEvent::new(
            now,
            LicenseEventKind::Extended {
                from: current,
                to: new_expiration,
            },
        ));
        Ok(())
    }

    /// Revoke the license permanently.
    ///
    /// Revoking an already revoked license is a successful no-op: the
    /// desired end state already holds, and neither `revoked_at` nor the
    /// history changes.
    pub fn revoke(&mut self, now: Timestamp) -> RevokeOutcome {
        if self.revoked {
            return RevokeOutcome::AlreadyRevoked;
        }
        self.revoked = true;
        self.revoked_at = Some(now);
        self.history
            .push(LicenseEvent::new(now, LicenseEventKind::Revoked));
        RevokeOutcome::Revoked
    }

    /// The license key.
    pub fn key(&self) -> &LicenseKey {
        &self.key
    }

    /// Current expiration, `None` if the license never expires.
    pub fn expiration_date(&self) -> Option<Timestamp> {
        self.expiration_date
    }

    /// The opaque payload supplied at creation.
    pub fn extra_data(&self) -> Option<&ExtraData> {
        self.extra_data.as_ref()
    }

    /// Whether the license has been revoked.
    pub fn is_revoked(&self) -> bool {
        self.revoked
    }

    /// When the license was issued.
    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// When the license was revoked, if it was.
    pub fn revoked_at(&self) -> Option<Timestamp> {
        self.revoked_at
    }

    /// Ordered log of all transitions, oldest first.
    pub fn history(&self) -> &[LicenseEvent] {
        &self.history
    }

    fn require_not_revoked(&self) -> Result<(), LicenseError> {
        if self.revoked {
            return Err(LicenseError::AlreadyRevoked {
                key: self.key.clone(),
            });
        }
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
