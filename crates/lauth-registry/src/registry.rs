//! # License Registry
//!
//! Owns every license record and applies the lifecycle state machine under
//! a single exclusive lock.
//!
//! ## Invariants
//!
//! - A key is assigned only after the store confirms it was never issued,
//!   and the check and the insert happen under the same lock acquisition.
//! - Mutations work on a copy of the stored record and commit it back
//!   before the lock is released. A failed transition or a failed commit
//!   leaves the stored record untouched.
//! - Status is computed from one clock reading per operation, never stored.

use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;

use lauth_core::{Clock, ExtraData, LicenseKey, SystemClock, Timestamp};
use lauth_crypto::{KeyGenerator, OsKeyGenerator};
use lauth_state::{LicenseError, LicenseEvent, LicenseRecord, LicenseStatus, RevokeOutcome};

use crate::store::{LicenseStore, MemoryStore, StoreError};

/// How many candidate keys create will try before declaring the generator
/// broken. With 128-bit keys a single collision is already astronomically
/// unlikely.
pub const DEFAULT_MAX_KEY_ATTEMPTS: usize = 64;

/// Errors returned by [`LicenseRegistry`] operations.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// No license has ever been issued under this key.
    #[error("license {0} not found")]
    NotFound(LicenseKey),

    /// The state machine rejected the transition.
    #[error(transparent)]
    Lifecycle(#[from] LicenseError),

    /// The backing store failed; the operation was not applied.
    #[error("license store failure: {0}")]
    Store(#[from] StoreError),

    /// Every candidate key collided with an issued key.
    #[error("key generator {generator} produced {attempts} colliding keys in a row")]
    KeyGeneration {
        /// Name of the generator that failed.
        generator: String,
        /// Candidates tried.
        attempts: usize,
    },
}

/// A license record together with its status at one observed instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LicenseSnapshot {
    /// Copy of the stored record.
    pub record: LicenseRecord,
    /// Status derived at `observed_at`.
    pub status: LicenseStatus,
    /// The clock reading the status was derived from.
    pub observed_at: Timestamp,
}

impl LicenseSnapshot {
    fn at(record: LicenseRecord, now: Timestamp) -> Self {
        Self {
            status: record.status_at(now),
            record,
            observed_at: now,
        }
    }
}

/// The authority's record keeper.
pub struct LicenseRegistry {
    store: Mutex<Box<dyn LicenseStore>>,
    keys: Box<dyn KeyGenerator>,
    clock: Arc<dyn Clock>,
    max_key_attempts: usize,
}

impl std::fmt::Debug for LicenseRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LicenseRegistry")
            .field("key_generator", &self.keys.generator_name())
            .field("max_key_attempts", &self.max_key_attempts)
            .finish_non_exhaustive()
    }
}

impl LicenseRegistry {
    /// Start configuring a registry.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// A registry over an in-memory store, OS key generator and system clock.
    pub fn in_memory() -> Self {
        Self::builder().build()
    }

    /// The registry's current time.
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Issue a new license under a freshly generated, never-issued key.
    ///
    /// Key collisions are retried transparently. The caller is responsible
    /// for validating `expiration_date` (see `NewLicense::validate`).
    pub fn create(
        &self,
        expiration_date: Option<Timestamp>,
        extra_data: Option<ExtraData>,
    ) -> Result<LicenseSnapshot, RegistryError> {
        let mut store = self.store.lock();
        let key = self.fresh_key(store.as_ref())?;
        let now = self.clock.now();
        let record = LicenseRecord::issue(key, expiration_date, extra_data, now);
        store.insert(record.clone())?;
        Ok(LicenseSnapshot::at(record, now))
    }

    /// Move the expiration of `key` forward to `new_expiration`.
    pub fn extend(
        &self,
        key: &LicenseKey,
        new_expiration: Timestamp,
    ) -> Result<LicenseSnapshot, RegistryError> {
        let mut store = self.store.lock();
        let mut record = load(store.as_ref(), key)?;
        let now = self.clock.now();
        record.extend(new_expiration, now)?;
        store.replace(record.clone())?;
        Ok(LicenseSnapshot::at(record, now))
    }

    /// Revoke `key`. Revoking an already revoked license succeeds without
    /// touching the store.
    pub fn revoke(
        &self,
        key: &LicenseKey,
    ) -> Result<(LicenseSnapshot, RevokeOutcome), RegistryError> {
        let mut store = self.store.lock();
        let mut record = load(store.as_ref(), key)?;
        let now = self.clock.now();
        let outcome = record.revoke(now);
        if outcome == RevokeOutcome::Revoked {
            store.replace(record.clone())?;
        }
        Ok((LicenseSnapshot::at(record, now), outcome))
    }

    /// Fetch a copy of the license for `key`.
    pub fn get(&self, key: &LicenseKey) -> Result<LicenseSnapshot, RegistryError> {
        let store = self.store.lock();
        let record = load(store.as_ref(), key)?;
        Ok(LicenseSnapshot::at(record, self.clock.now()))
    }

    /// The transition history of `key`, oldest first.
    pub fn history(&self, key: &LicenseKey) -> Result<Vec<LicenseEvent>, RegistryError> {
        let store = self.store.lock();
        Ok(load(store.as_ref(), key)?.history().to_vec())
    }

    /// Copies of every license, optionally restricted to one status,
    /// ordered by creation time then key.
    pub fn list(
        &self,
        status: Option<LicenseStatus>,
    ) -> Result<Vec<LicenseSnapshot>, RegistryError> {
        let records = self.store.lock().all()?;
        let now = self.clock.now();
        let mut snapshots: Vec<LicenseSnapshot> = records
            .into_iter()
            .map(|record| LicenseSnapshot::at(record, now))
            .filter(|snap| status.map_or(true, |wanted| snap.status == wanted))
            .collect();
        snapshots.sort_by(|a, b| {
            a.record
                .created_at()
                .cmp(&b.record.created_at())
                .then_with(|| a.record.key().cmp(b.record.key()))
        });
        Ok(snapshots)
    }

    /// Number of licenses ever issued.
    pub fn len(&self) -> Result<usize, RegistryError> {
        Ok(self.store.lock().len()?)
    }

    /// Whether no license has been issued yet.
    pub fn is_empty(&self) -> Result<bool, RegistryError> {
        Ok(self.len()? == 0)
    }

    /// Draw candidates until one has never been issued.
    ///
    /// Must be called with the store lock held.
    fn fresh_key(&self, store: &dyn LicenseStore) -> Result<LicenseKey, RegistryError> {
        for attempt in 1..=self.max_key_attempts {
            let candidate = self.keys.generate();
            if !store.contains(&candidate)? {
                return Ok(candidate);
            }
            tracing::warn!(
                attempt,
                generator = self.keys.generator_name(),
                "generated license key collides with an issued key; retrying"
            );
        }
        Err(RegistryError::KeyGeneration {
            generator: self.keys.generator_name().to_string(),
            attempts: self.max_key_attempts,
        })
    }
}

fn load(store: &dyn LicenseStore, key: &LicenseKey) -> Result<LicenseRecord, RegistryError> {
    store
        .get(key)?
        .ok_or_else(|| RegistryError::NotFound(key.clone()))
}

// ─── Builder ─────────────────────────────────────────────────────────

/// Assembles a [`LicenseRegistry`] from its collaborators.
///
/// Unset collaborators default to [`MemoryStore`], [`OsKeyGenerator`] and
/// [`SystemClock`].
pub struct RegistryBuilder {
    store: Option<Box<dyn LicenseStore>>,
    keys: Option<Box<dyn KeyGenerator>>,
    clock: Option<Arc<dyn Clock>>,
    max_key_attempts: usize,
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self {
            store: None,
            keys: None,
            clock: None,
            max_key_attempts: DEFAULT_MAX_KEY_ATTEMPTS,
        }
    }
}

impl RegistryBuilder {
    /// Use `store` for persistence.
    pub fn store(mut self, store: impl LicenseStore + 'static) -> Self {
        self.store = Some(Box::new(store));
        self
    }

    /// Use `keys` to mint license keys.
    pub fn key_generator(mut self, keys: impl KeyGenerator + 'static) -> Self {
        self.keys = Some(Box::new(keys));
        self
    }

    /// Read the current time from `clock`.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Cap on consecutive colliding candidates (at least 1).
    pub fn max_key_attempts(mut self, attempts: usize) -> Self {
        self.max_key_attempts = attempts.max(1);
        self
    }

    /// Finish construction.
    pub fn build(self) -> LicenseRegistry {
        LicenseRegistry {
            store: Mutex::new(self.store.unwrap_or_else(|| Box::new(MemoryStore::new()))),
            keys: self.keys.unwrap_or_else(|| Box::new(OsKeyGenerator::new())),
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            max_key_attempts: self.max_key_attempts,
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
