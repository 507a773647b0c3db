//! Durable profile store abstraction.
//!
//! The browser-profile key-value store is modeled as a synchronous,
//! last-writer-wins store of JSON values, keyed by a structured
//! `(namespace, identity)` tuple instead of concatenated strings so that
//! anonymous/authenticated transitions cannot collide on a key.
//!
//! Corrupt JSON on read degrades to the type's default value, never an
//! error: a damaged profile entry must not take down the view.

use crate::error::Result;
use serde::{Serialize, de::DeserializeOwned};

/// Logical namespaces of persisted profile state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreNamespace {
    AuthToken,
    AuthUser,
    Currency,
    Theme,
    ChatSessions,
    ServiceMode,
}

impl StoreNamespace {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthToken => "auth_token",
            Self::AuthUser => "auth_user",
            Self::Currency => "currency",
            Self::Theme => "theme",
            Self::ChatSessions => "chat_sessions",
            Self::ServiceMode => "service_mode",
        }
    }
}

/// Structured store key: a namespace plus an optional identity scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoreKey {
    pub namespace: StoreNamespace,
    pub identity: Option<String>,
}

impl StoreKey {
    /// Key shared by all identities (and anonymous visitors).
    pub fn global(namespace: StoreNamespace) -> Self {
        Self {
            namespace,
            identity: None,
        }
    }

    /// Key scoped to one authenticated identity.
    pub fn scoped(namespace: StoreNamespace, identity: impl Into<String>) -> Self {
        Self {
            namespace,
            identity: Some(identity.into()),
        }
    }
}

/// A durable, synchronous key-value store over JSON values.
///
/// Writes always rewrite the full value (no partial updates); reads of
/// missing or corrupt entries return `None`. Object-safe; use
/// [`ProfileStoreExt`] for typed access.
pub trait ProfileStore: Send + Sync {
    /// Reads the raw JSON value for a key, `None` when absent or corrupt.
    fn read_value(&self, key: &StoreKey) -> Option<serde_json::Value>;

    /// Rewrites the full value for a key.
    fn write_value(&self, key: &StoreKey, value: serde_json::Value) -> Result<()>;

    /// Removes a key. Removing a missing key is not an error.
    fn remove(&self, key: &StoreKey) -> Result<()>;
}

/// Typed helpers over [`ProfileStore`].
pub trait ProfileStoreExt: ProfileStore {
    /// Reads and deserializes a value, degrading to `T::default()` when the
    /// entry is missing or does not deserialize.
    fn read<T: DeserializeOwned + Default>(&self, key: &StoreKey) -> T {
        self.read_value(key)
            .and_then(|value| serde_json::from_value(value).ok())
            .unwrap_or_default()
    }

    /// Reads a value that has no meaningful default.
    fn read_opt<T: DeserializeOwned>(&self, key: &StoreKey) -> Option<T> {
        self.read_value(key)
            .and_then(|value| serde_json::from_value(value).ok())
    }

    /// Serializes and rewrites the full value for a key.
    fn write<T: Serialize>(&self, key: &StoreKey, value: &T) -> Result<()> {
        let value = serde_json::to_value(value)?;
        self.write_value(key, value)
    }
}

impl<S: ProfileStore + ?Sized> ProfileStoreExt for S {}
