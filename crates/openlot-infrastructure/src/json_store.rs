//! File-backed JSON profile store.
//!
//! One file per store key under the profile root. Writes are atomic
//! (temporary file, fsync, rename) so a crash mid-write never leaves a
//! half-written entry behind; the store is last-writer-wins and every
//! write rewrites the full value.
//!
//! A corrupt entry on read is logged and treated as absent. Persisted
//! profile state is always recoverable by defaulting, never by failing.

use crate::paths::default_profile_root;
use openlot_core::error::{LotError, Result};
use openlot_core::store::{ProfileStore, StoreKey};
use std::fs::{self, File};
use std::io::Write as IoWrite;
use std::path::{Path, PathBuf};

/// Durable [`ProfileStore`] over JSON files.
pub struct JsonProfileStore {
    root: PathBuf,
}

impl JsonProfileStore {
    /// Creates a store rooted at the platform profile directory.
    pub fn new() -> Self {
        Self::with_root(default_profile_root())
    }

    /// Creates a store rooted at an explicit directory (tests, overrides).
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &StoreKey) -> PathBuf {
        let stem = match &key.identity {
            Some(identity) => format!(
                "{}.{}",
                key.namespace.as_str(),
                sanitize_identity(identity)
            ),
            None => key.namespace.as_str().to_string(),
        };
        self.root.join(format!("{stem}.json"))
    }

    fn write_atomic(&self, path: &Path, content: &str) -> std::io::Result<()> {
        fs::create_dir_all(&self.root)?;
        let tmp = path.with_extension("json.tmp");
        {
            let mut file = File::create(&tmp)?;
            file.write_all(content.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp, path)?;
        Ok(())
    }
}

impl Default for JsonProfileStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Reduces an identity to a filesystem-safe token.
///
/// Keeps alphanumerics, `-` and `_`; everything else becomes `_`. A hash
/// of the raw identity is appended so identities that sanitize to the
/// same text (`"a.b"` and `"a_b"`) still get distinct stems. Scoped file
/// names cannot collide with the unscoped ones, which use the bare
/// namespace stem.
fn sanitize_identity(identity: &str) -> String {
    let safe: String = identity
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{safe}-{:08x}", fnv1a(identity.as_bytes()))
}

/// 32-bit FNV-1a. Stable across runs, which file names require; the
/// std hasher is not.
fn fnv1a(bytes: &[u8]) -> u32 {
    let mut hash: u32 = 0x811c_9dc5;
    for &byte in bytes {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(0x0100_0193);
    }
    hash
}

impl ProfileStore for JsonProfileStore {
    fn read_value(&self, key: &StoreKey) -> Option<serde_json::Value> {
        let path = self.path_for(key);
        let content = fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&content) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %err,
                    "corrupt profile entry, treating as absent"
                );
                None
            }
        }
    }

    fn write_value(&self, key: &StoreKey, value: serde_json::Value) -> Result<()> {
        let content = serde_json::to_string_pretty(&value)?;
        self.write_atomic(&self.path_for(key), &content)
            .map_err(|e| LotError::storage(format!("failed to persist {:?}: {e}", key.namespace)))
    }

    fn remove(&self, key: &StoreKey) -> Result<()> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use openlot_core::store::{ProfileStoreExt, StoreNamespace};

    fn temp_store() -> (tempfile::TempDir, JsonProfileStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonProfileStore::with_root(dir.path());
        (dir, store)
    }

    #[test]
    fn write_then_read_round_trips() {
        let (_dir, store) = temp_store();
        let key = StoreKey::global(StoreNamespace::Currency);
        store.write(&key, &"EUR".to_string()).unwrap();
        let read: String = store.read(&key);
        assert_eq!(read, "EUR");
    }

    #[test]
    fn corrupt_json_degrades_to_default() {
        let (dir, store) = temp_store();
        let key = StoreKey::global(StoreNamespace::Currency);
        fs::write(dir.path().join("currency.json"), "{not json").unwrap();

        let read: String = store.read(&key);
        assert_eq!(read, String::default());
    }

    #[test]
    fn missing_key_reads_as_default() {
        let (_dir, store) = temp_store();
        let read: Vec<u64> = store.read(&StoreKey::global(StoreNamespace::ChatSessions));
        assert!(read.is_empty());
    }

    #[test]
    fn identity_scoped_keys_do_not_collide() {
        let (_dir, store) = temp_store();
        let global = StoreKey::global(StoreNamespace::ChatSessions);
        let user_a = StoreKey::scoped(StoreNamespace::ChatSessions, "user-a");
        let user_b = StoreKey::scoped(StoreNamespace::ChatSessions, "user-b");

        store.write(&global, &vec![0u64]).unwrap();
        store.write(&user_a, &vec![1u64]).unwrap();
        store.write(&user_b, &vec![2u64]).unwrap();

        assert_eq!(store.read::<Vec<u64>>(&global), vec![0]);
        assert_eq!(store.read::<Vec<u64>>(&user_a), vec![1]);
        assert_eq!(store.read::<Vec<u64>>(&user_b), vec![2]);
    }

    #[test]
    fn identities_with_identical_sanitized_text_do_not_collide() {
        let (_dir, store) = temp_store();
        let dotted = StoreKey::scoped(StoreNamespace::ChatSessions, "a.b");
        let underscored = StoreKey::scoped(StoreNamespace::ChatSessions, "a_b");

        store.write(&dotted, &1u64).unwrap();
        store.write(&underscored, &2u64).unwrap();

        assert_eq!(store.read::<u64>(&dotted), 1);
        assert_eq!(store.read::<u64>(&underscored), 2);
    }

    #[test]
    fn hostile_identity_is_sanitized() {
        let (_dir, store) = temp_store();
        let key = StoreKey::scoped(StoreNamespace::AuthUser, "../../etc/passwd");
        store.write(&key, &"safe".to_string()).unwrap();
        assert_eq!(store.read::<String>(&key), "safe");
    }

    #[test]
    fn remove_is_idempotent() {
        let (_dir, store) = temp_store();
        let key = StoreKey::global(StoreNamespace::Theme);
        store.write(&key, &"dark".to_string()).unwrap();
        store.remove(&key).unwrap();
        store.remove(&key).unwrap();
        assert!(store.read_value(&key).is_none());
    }
}
