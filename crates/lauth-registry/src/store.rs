//! # License Stores
//!
//! The persistence seam under the registry. The registry serializes every
//! call, so implementations need no locking of their own.
//!
//! - [`MemoryStore`]: records in a `BTreeMap`. The default; state dies with
//!   the process.
//! - [`JsonFileStore`]: the same map, rewritten to a JSON snapshot file on
//!   every commit (temp file + rename, so readers never see a torn file).
//!
//! ## Store Contract
//!
//! `insert` and `replace` are all-or-nothing: if they return an error, the
//! store's contents are exactly what they were before the call. The
//! registry relies on this to guarantee that no operation is partially
//! applied.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use lauth_core::LicenseKey;
use lauth_state::LicenseRecord;

/// Snapshot file format version written by [`JsonFileStore`].
pub const SNAPSHOT_VERSION: u32 = 1;

/// Errors raised by a [`LicenseStore`].
#[derive(Error, Debug)]
pub enum StoreError {
    /// `insert` was called for a key the store already holds.
    #[error("license {0} already exists in store")]
    Duplicate(LicenseKey),

    /// `replace` was called for a key the store does not hold.
    #[error("license {0} does not exist in store")]
    Missing(LicenseKey),

    /// Reading or writing the backing file failed.
    #[error("store io error at {path}: {source}")]
    Io {
        /// File being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The backing file exists but cannot be understood.
    #[error("corrupt store at {path}: {reason}")]
    Corrupt {
        /// File being read.
        path: PathBuf,
        /// What was wrong with it.
        reason: String,
    },
}

/// Persistence backend for license records.
pub trait LicenseStore: Send {
    /// Whether a record exists for `key`. Records are never deleted, so this
    /// answers "was this key ever issued".
    fn contains(&self, key: &LicenseKey) -> Result<bool, StoreError>;

    /// Fetch a copy of the record for `key`.
    fn get(&self, key: &LicenseKey) -> Result<Option<LicenseRecord>, StoreError>;

    /// Add a record for a key not yet present.
    fn insert(&mut self, record: LicenseRecord) -> Result<(), StoreError>;

    /// Overwrite the record for a key already present.
    fn replace(&mut self, record: LicenseRecord) -> Result<(), StoreError>;

    /// Copies of every record, ordered by key.
    fn all(&self) -> Result<Vec<LicenseRecord>, StoreError>;

    /// Number of records held.
    fn len(&self) -> Result<usize, StoreError>;

    /// Human-readable name for this store (for diagnostics/logging).
    fn store_name(&self) -> &str;
}

// ─── MemoryStore ─────────────────────────────────────────────────────

/// In-process store for development and testing.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: BTreeMap<LicenseKey, LicenseRecord>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl LicenseStore for MemoryStore {
    fn contains(&self, key: &LicenseKey) -> Result<bool, StoreError> {
        Ok(self.records.contains_key(key))
    }

    fn get(&self, key: &LicenseKey) -> Result<Option<LicenseRecord>, StoreError> {
        Ok(self.records.get(key).cloned())
    }

    fn insert(&mut self, record: LicenseRecord) -> Result<(), StoreError> {
        insert_new(&mut self.records, record).map(|_| ())
    }

    fn replace(&mut self, record: LicenseRecord) -> Result<(), StoreError> {
        replace_existing(&mut self.records, record).map(|_| ())
    }

    fn all(&self) -> Result<Vec<LicenseRecord>, StoreError> {
        Ok(self.records.values().cloned().collect())
    }

    fn len(&self) -> Result<usize, StoreError> {
        Ok(self.records.len())
    }

    fn store_name(&self) -> &str {
        "MemoryStore"
    }
}

fn insert_new(
    records: &mut BTreeMap<LicenseKey, LicenseRecord>,
    record: LicenseRecord,
) -> Result<LicenseKey, StoreError> {
    let key = record.key().clone();
    if records.contains_key(&key) {
        return Err(StoreError::Duplicate(key));
    }
    records.insert(key.clone(), record);
    Ok(key)
}

/// Returns the record that was replaced.
fn replace_existing(
    records: &mut BTreeMap<LicenseKey, LicenseRecord>,
    record: LicenseRecord,
) -> Result<LicenseRecord, StoreError> {
    match records.get_mut(record.key()) {
        Some(slot) => Ok(std::mem::replace(slot, record)),
        None => Err(StoreError::Missing(record.key().clone())),
    }
}

// ─── JsonFileStore ───────────────────────────────────────────────────

#[derive(Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    licenses: Vec<LicenseRecord>,
}

/// Store that keeps every record in memory and mirrors them to one JSON
/// snapshot file after each commit.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    records: BTreeMap<LicenseKey, LicenseRecord>,
}

impl JsonFileStore {
    /// Open the snapshot at `path`, or start empty if it does not exist.
    ///
    /// The parent directory is created if needed. An empty file is treated
    /// as an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let records = match fs::read(&path) {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => BTreeMap::new(),
            Ok(bytes) => load_snapshot(&path, &bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        tracing::debug!(path = %path.display(), licenses = records.len(), "opened license snapshot");
        Ok(Self { path, records })
    }

    /// The snapshot file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<(), StoreError> {
        let snapshot = Snapshot {
            version: SNAPSHOT_VERSION,
            licenses: self.records.values().cloned().collect(),
        };
        let bytes = serde_json::to_vec_pretty(&snapshot).map_err(|e| StoreError::Corrupt {
            path: self.path.clone(),
            reason: format!("failed to encode snapshot: {e}"),
        })?;

        // The temp file must be on disk before the rename makes it visible,
        // otherwise a crash can publish an empty or partial snapshot.
        let tmp = self.path.with_extension("tmp");
        write_synced(&tmp, &bytes).map_err(|source| StoreError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &self.path).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

/// Write `bytes` to `path` and flush them to stable storage.
fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

fn load_snapshot(
    path: &Path,
    bytes: &[u8],
) -> Result<BTreeMap<LicenseKey, LicenseRecord>, StoreError> {
    let snapshot: Snapshot = serde_json::from_slice(bytes).map_err(|e| StoreError::Corrupt {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    if snapshot.version != SNAPSHOT_VERSION {
        return Err(StoreError::Corrupt {
            path: path.to_path_buf(),
            reason: format!(
                "unsupported snapshot version {} (expected {SNAPSHOT_VERSION})",
                snapshot.version
            ),
        });
    }

    let mut records = BTreeMap::new();
    for record in snapshot.licenses {
        if let Err(StoreError::Duplicate(key)) = insert_new(&mut records, record) {
            return Err(StoreError::Corrupt {
                path: path.to_path_buf(),
                reason: format!("duplicate license key {key}"),
            });
        }
    }
    Ok(records)
}

impl LicenseStore for JsonFileStore {
    fn contains(&self, key: &LicenseKey) -> Result<bool, StoreError> {
        Ok(self.records.contains_key(key))
    }

    fn get(&self, key: &LicenseKey) -> Result<Option<LicenseRecord>, StoreError> {
        Ok(self.records.get(key).cloned())
    }

    fn insert(&mut self, record: LicenseRecord) -> Result<(), StoreError> {
        let key = insert_new(&mut self.records, record)?;
        if let Err(e) = self.persist() {
            self.records.remove(&key);
            return Err(e);
        }
        Ok(())
    }

    fn replace(&mut self, record: LicenseRecord) -> Result<(), StoreError> {
        let previous = replace_existing(&mut self.records, record)?;
        if let Err(e) = self.persist() {
            self.records.insert(previous.key().clone(), previous);
            return Err(e);
        }
        Ok(())
    }

    fn all(&self) -> Result<Vec<LicenseRecord>, StoreError> {
        Ok(self.records.values().cloned().collect())
    }

    fn len(&self) -> Result<usize, StoreError> {
        Ok(self.records.len())
    }

    fn store_name(&self) -> &str {
        "JsonFileStore"
    }
}
