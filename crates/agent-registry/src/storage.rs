//! Registry snapshot persistence.
//!
//! A registry is stored as a single JSON file holding the configuration and
//! every account record:
//!
//! ```json
//! {
//!   "version": 1,
//!   "config": { "registrar": "...", "attestors": [...], "max_attestation_level": 3 },
//!   "accounts": [ { "owner": "...", "agent": "...", "attestation_level": 1, ... } ]
//! }
//! ```
//!
//! Files are written to a uniquely named temporary sibling and renamed into
//! place. Loading rebuilds both indexes and re-checks every record against
//! the configuration, so a hand-edited file cannot smuggle in a broken
//! binding.
//!
//! Processes that load, mutate and save the same snapshot serialize on an
//! advisory lock held on `<snapshot>.lock` (see [`RegistryStore::lock`]).

use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use serde::{Deserialize, Serialize};

use crate::account::AccountRecord;
use crate::config::RegistryConfig;
use crate::error::{RegistryError, Result};
use crate::event::EventLog;
use crate::registry::Registry;
use crate::store::AccountStore;

// ── File format constants ─────────────────────────────────────────────────────

const REGISTRY_FILE_VERSION: u32 = 1;

// ── On-disk structures ────────────────────────────────────────────────────────

/// Wrapper written to disk for a registry snapshot.
#[derive(Debug, Serialize, Deserialize)]
struct RegistryFile {
    /// Format version number.
    version: u32,
    /// The immutable configuration.
    config: RegistryConfig,
    /// Every account record, in owner order.
    accounts: Vec<AccountRecord>,
}

// ── RegistryStore ─────────────────────────────────────────────────────────────

/// Filesystem-backed store for one registry snapshot.
pub struct RegistryStore {
    path: PathBuf,
}

impl RegistryStore {
    /// Create a store for the snapshot at `path`. Nothing is read or written.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The snapshot path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Return `true` if a snapshot file exists.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Path of the lock file guarding this snapshot.
    pub fn lock_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("registry"));
        name.push(".lock");
        self.path.with_file_name(name)
    }

    /// Block until this process holds the exclusive snapshot lock.
    ///
    /// Hold the returned guard from `load` through `save` so that concurrent
    /// writers apply their changes one after another instead of
    /// overwriting each other.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::Io` if the lock file cannot be created or
    /// locked.
    pub fn lock(&self) -> Result<StoreLock> {
        self.ensure_parent()?;
        let path = self.lock_path();
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&path)?;
        file.lock_exclusive()?;
        log::debug!("acquired registry lock {}", path.display());
        Ok(StoreLock { path, file })
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    fn ensure_parent(&self) -> Result<()> {
        std::fs::create_dir_all(self.parent_dir())?;
        Ok(())
    }

    /// Write `registry` to disk, creating the parent directory if needed.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::SerializationError` if serialization fails, or
    /// `RegistryError::Io` for filesystem errors.
    pub fn save<S>(&self, registry: &Registry<S>) -> Result<()> {
        let file = RegistryFile {
            version: REGISTRY_FILE_VERSION,
            config: registry.get_registry_config().clone(),
            accounts: registry.accounts().iter().cloned().collect(),
        };

        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| RegistryError::SerializationError(e.to_string()))?;

        self.ensure_parent()?;
        let mut tmp = tempfile::NamedTempFile::new_in(self.parent_dir())?;
        tmp.write_all(json.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;

        log::debug!(
            "saved {} account(s) to {}",
            file.accounts.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Load the snapshot into a registry that buffers events in an
    /// [`EventLog`].
    ///
    /// # Errors
    ///
    /// See [`RegistryStore::load_with_sink`].
    pub fn load(&self) -> Result<Registry<EventLog>> {
        self.load_with_sink(EventLog::new())
    }

    /// Load the snapshot into a registry that emits into `sink`.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::Io` if the file cannot be read, or
    /// `RegistryError::InvalidFileFormat` if it is malformed, has an unknown
    /// version, or breaks any registry invariant.
    pub fn load_with_sink<S>(&self, sink: S) -> Result<Registry<S>> {
        let bytes = std::fs::read(&self.path)?;
        let file: RegistryFile = serde_json::from_slice(&bytes).map_err(|e| {
            self.invalid(format!(
                "failed to parse registry file {}: {e}",
                self.path.display()
            ))
        })?;

        if file.version != REGISTRY_FILE_VERSION {
            return Err(self.invalid(format!(
                "unsupported registry file version {} (expected {REGISTRY_FILE_VERSION})",
                file.version
            )));
        }

        let accounts = AccountStore::from_records(file.accounts)
            .map_err(|e| self.invalid(format!("conflicting bindings: {e}")))?;

        Registry::from_parts(file.config, accounts, sink).map_err(|e| {
            log::warn!("rejected registry snapshot {}: {e}", self.path.display());
            e
        })
    }

    /// Build an `InvalidFileFormat` error and log it.
    fn invalid(&self, msg: String) -> RegistryError {
        log::warn!("rejected registry snapshot {}: {msg}", self.path.display());
        RegistryError::InvalidFileFormat(msg)
    }
}

// ── StoreLock ─────────────────────────────────────────────────────────────────

/// Exclusive lock on a snapshot, released on drop. The lock file is never
/// removed.
#[derive(Debug)]
pub struct StoreLock {
    path: PathBuf,
    file: File,
}

impl StoreLock {
    /// The lock file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
        log::debug!("released registry lock {}", self.path.display());
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
