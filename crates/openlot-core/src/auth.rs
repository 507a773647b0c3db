//! Authenticated identity context.
//!
//! Token acquisition and verification are handled by a collaborator; this
//! module only models what the state layer needs: the token, the user
//! snapshot, and the identity key that scopes per-identity persisted
//! state. Login/signup/logout flows live outside the core.

use crate::error::{LotError, Result};
use crate::store::{ProfileStore, ProfileStoreExt, StoreKey, StoreNamespace};
use serde::{Deserialize, Serialize};

/// Snapshot of the authenticated user, as last reported by the service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserSnapshot {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// The current identity, or anonymous when `token` is `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthContext {
    pub token: Option<String>,
    pub user: Option<UserSnapshot>,
}

impl AuthContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// The identity key scoping per-identity persisted state.
    pub fn identity(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.id.as_str())
    }

    /// Returns the bearer token, or the auth-required short circuit.
    ///
    /// This is the only check that runs before an optimistic apply: when it
    /// fails, no state change has happened at all.
    pub fn require_token(&self) -> Result<&str> {
        self.token.as_deref().ok_or(LotError::AuthRequired)
    }

    /// Restores the persisted identity from the profile store.
    pub fn load(store: &dyn ProfileStore) -> Self {
        Self {
            token: store.read_opt(&StoreKey::global(StoreNamespace::AuthToken)),
            user: store.read_opt(&StoreKey::global(StoreNamespace::AuthUser)),
        }
    }

    /// Persists the identity to the profile store.
    pub fn persist(&self, store: &dyn ProfileStore) -> Result<()> {
        match &self.token {
            Some(token) => store.write(&StoreKey::global(StoreNamespace::AuthToken), token)?,
            None => store.remove(&StoreKey::global(StoreNamespace::AuthToken))?,
        }
        match &self.user {
            Some(user) => store.write(&StoreKey::global(StoreNamespace::AuthUser), user)?,
            None => store.remove(&StoreKey::global(StoreNamespace::AuthUser))?,
        }
        Ok(())
    }
}
