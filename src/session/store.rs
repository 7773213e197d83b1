// ABOUTME: Injectable token store holding the access/refresh token pair
// ABOUTME: Provides an in-memory concurrent store and a JSON file store for the CLI
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 College Fee Client Contributors

//! Token storage.
//!
//! The store is the only shared mutable state of the guard. Writers do not
//! coordinate: concurrent `set` calls on the same key leave whichever value
//! was written last.

use crate::constants::storage_keys;
use crate::models::TokenPair;
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::debug;

/// Session file permissions (owner read/write only)
#[cfg(unix)]
const SESSION_FILE_MODE: u32 = 0o600;

/// Which token of the pair an operation refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Bearer credential sent on every guarded request
    Access,
    /// Credential exchanged for a new access token
    Refresh,
}

impl TokenKind {
    /// Persisted key name
    #[must_use]
    pub const fn storage_key(self) -> &'static str {
        match self {
            Self::Access => storage_keys::ACCESS_TOKEN,
            Self::Refresh => storage_keys::REFRESH_TOKEN,
        }
    }
}

/// Token store failures
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed
    #[error("session file {} could not be accessed", .path.display())]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The backing file does not contain a JSON object of strings
    #[error("session file {} is corrupt", .path.display())]
    Corrupt {
        /// File involved
        path: PathBuf,
        /// Underlying JSON error
        #[source]
        source: serde_json::Error,
    },
}

/// Persistence for the token pair
///
/// Implementations must be safe to share between concurrent requests; the
/// guard holds them behind an `Arc`.
pub trait SessionStore: Send + Sync {
    /// Read one token
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read
    fn get(&self, kind: TokenKind) -> Result<Option<String>, StoreError>;

    /// Overwrite one token
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written
    fn set(&self, kind: TokenKind, value: &str) -> Result<(), StoreError>;

    /// Remove both tokens
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written
    fn clear(&self) -> Result<(), StoreError>;

    /// Read both tokens; `None` unless both are present
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read
    fn token_pair(&self) -> Result<Option<TokenPair>, StoreError> {
        let access = self.get(TokenKind::Access)?;
        let refresh = self.get(TokenKind::Refresh)?;
        Ok(access
            .zip(refresh)
            .map(|(access_token, refresh_token)| TokenPair {
                access_token,
                refresh_token,
            }))
    }

    /// Replace both tokens
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written
    fn store_pair(&self, pair: &TokenPair) -> Result<(), StoreError> {
        self.set(TokenKind::Access, &pair.access_token)?;
        self.set(TokenKind::Refresh, &pair.refresh_token)
    }
}

/// Process-local store, the default for embedded use and tests
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    tokens: DashMap<TokenKind, String>,
}

impl MemorySessionStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store already holding `pair`
    #[must_use]
    pub fn with_tokens(pair: &TokenPair) -> Self {
        let store = Self::new();
        store
            .tokens
            .insert(TokenKind::Access, pair.access_token.clone());
        store
            .tokens
            .insert(TokenKind::Refresh, pair.refresh_token.clone());
        store
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, kind: TokenKind) -> Result<Option<String>, StoreError> {
        Ok(self.tokens.get(&kind).map(|entry| entry.value().clone()))
    }

    fn set(&self, kind: TokenKind, value: &str) -> Result<(), StoreError> {
        self.tokens.insert(kind, value.to_owned());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.tokens.clear();
        Ok(())
    }
}

/// JSON file store keyed like browser local storage (`accessToken`, `refreshToken`)
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process
    lock: Mutex<()>,
}

impl FileSessionStore {
    /// Store backed by `path`; the file is created on first write
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Backing file location
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<BTreeMap<String, String>, StoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&raw).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let io_err = |source: io::Error| StoreError::Io {
            path: self.path.clone(),
            source,
        };

        if entries.is_empty() {
            return match fs::remove_file(&self.path) {
                Err(e) if e.kind() != io::ErrorKind::NotFound => Err(io_err(e)),
                _ => Ok(()),
            };
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let body = serde_json::to_vec_pretty(entries).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })?;
        let staging = self.path.with_extension("json.tmp");
        write_private(&staging, &body).map_err(io_err)?;
        fs::rename(&staging, &self.path).map_err(io_err)?;
        debug!(path = %self.path.display(), "session file written");
        Ok(())
    }
}

/// Create `path` readable and writable by the owner only, then write `body`
fn write_private(path: &Path, body: &[u8]) -> io::Result<()> {
    // A leftover staging file would keep its old mode
    if let Err(e) = fs::remove_file(path) {
        if e.kind() != io::ErrorKind::NotFound {
            return Err(e);
        }
    }
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(SESSION_FILE_MODE);
    }
    let mut file = options.open(path)?;
    file.write_all(body)?;
    file.sync_all()
}

impl SessionStore for FileSessionStore {
    fn get(&self, kind: TokenKind) -> Result<Option<String>, StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.read_entries()?.remove(kind.storage_key()))
    }

    fn set(&self, kind: TokenKind, value: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.read_entries()?;
        entries.insert(kind.storage_key().to_owned(), value.to_owned());
        self.write_entries(&entries)
    }

    fn clear(&self) -> Result<(), StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.read_entries().unwrap_or_default();
        entries.remove(TokenKind::Access.storage_key());
        entries.remove(TokenKind::Refresh.storage_key());
        self.write_entries(&entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> TokenPair {
        TokenPair {
            access_token: "access-1".into(),
            refresh_token: "refresh-1".into(),
        }
    }

    #[test]
    fn test_memory_store_roundtrip_and_clear() {
        let store = MemorySessionStore::new();
        assert_eq!(store.token_pair().unwrap(), None);

        store.store_pair(&pair()).unwrap();
        assert_eq!(store.token_pair().unwrap(), Some(pair()));

        store.set(TokenKind::Access, "access-2").unwrap();
        assert_eq!(
            store.get(TokenKind::Access).unwrap().as_deref(),
            Some("access-2")
        );

        store.clear().unwrap();
        assert_eq!(store.get(TokenKind::Access).unwrap(), None);
        assert_eq!(store.get(TokenKind::Refresh).unwrap(), None);
    }

    #[test]
    fn test_token_pair_requires_both_tokens() {
        let store = MemorySessionStore::new();
        store.set(TokenKind::Access, "only-access").unwrap();
        assert_eq!(store.token_pair().unwrap(), None);
    }

    #[test]
    fn test_file_store_uses_local_storage_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");
        let store = FileSessionStore::new(&path);

        store.store_pair(&pair()).unwrap();
        let raw: BTreeMap<String, String> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw.get("accessToken").map(String::as_str), Some("access-1"));
        assert_eq!(raw.get("refreshToken").map(String::as_str), Some("refresh-1"));

        // A second handle on the same file sees the same tokens
        let reopened = FileSessionStore::new(&path);
        assert_eq!(reopened.token_pair().unwrap(), Some(pair()));

        store.clear().unwrap();
        assert!(!path.exists());
        assert_eq!(reopened.token_pair().unwrap(), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_file_store_is_private_to_owner() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        // Pre-existing world-readable file and staging leftover
        fs::write(&path, "{}").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();
        fs::write(path.with_extension("json.tmp"), "stale").unwrap();

        let store = FileSessionStore::new(&path);
        store.store_pair(&pair()).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o077, 0, "session file mode is {mode:o}");
        assert_eq!(store.token_pair().unwrap(), Some(pair()));
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_file_store_reports_corruption() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "not json").unwrap();

        let store = FileSessionStore::new(&path);
        assert!(matches!(
            store.get(TokenKind::Access),
            Err(StoreError::Corrupt { .. })
        ));
        // Clearing a corrupt file still succeeds and leaves nothing behind
        store.clear().unwrap();
        assert_eq!(store.get(TokenKind::Access).unwrap(), None);
    }
}
