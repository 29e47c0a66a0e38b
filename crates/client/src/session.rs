//! Per-role session persistence.
//!
//! Sessions for the user, shop and admin roles live side by side in one
//! [`KeyValueStore`] under role-specific keys, so logging in as a shop never
//! disturbs a user session and vice versa.

use std::sync::Arc;

use marketlink_core::{ClearScope, Role, Session, Shape, extract_string};
use secrecy::SecretString;
use serde_json::Value;

use crate::store::{KeyValueStore, MemoryStore, StoreError};

/// Storage keys used for session data.
pub mod keys {
    /// User bearer token.
    pub const USER_TOKEN: &str = "userToken";

    /// Single-key token written by older clients. Read as a fallback for the
    /// user role and removed on every fresh login.
    pub const LEGACY_TOKEN: &str = "token";

    /// User principal (JSON).
    pub const USER: &str = "user";

    /// Shop bearer token.
    pub const SHOP_TOKEN: &str = "shopToken";

    /// Shop principal (JSON).
    pub const SHOP: &str = "shop";

    /// Shop id, extracted from the principal.
    pub const SHOP_ID: &str = "shopId";

    /// Shop contact email, extracted from the principal.
    pub const SHOP_EMAIL: &str = "shopEmail";

    /// Admin bearer token.
    pub const ADMIN_TOKEN: &str = "adminToken";

    /// Admin principal (JSON).
    pub const ADMIN: &str = "admin";

    /// UI mode marker owned by the app shell.
    pub const MODE: &str = "mode";

    /// Active role marker.
    pub const ROLE: &str = "role";

    /// Every key a full sign-out removes.
    pub const ALL: [&str; 11] = [
        SHOP_TOKEN,
        SHOP_ID,
        SHOP_EMAIL,
        SHOP,
        USER_TOKEN,
        LEGACY_TOKEN,
        USER,
        ADMIN_TOKEN,
        ADMIN,
        MODE,
        ROLE,
    ];
}

const ID_SHAPES: &[Shape] = &[Shape::Field("_id"), Shape::Field("id"), Shape::Field("shopId")];
const EMAIL_SHAPES: &[Shape] = &[Shape::Field("email")];

/// Keys owned by one role.
struct RoleKeys {
    token: &'static str,
    principal: &'static str,
    id: Option<&'static str>,
    email: Option<&'static str>,
}

impl RoleKeys {
    const fn of(role: Role) -> Self {
        match role {
            Role::User => Self {
                token: keys::USER_TOKEN,
                principal: keys::USER,
                id: None,
                email: None,
            },
            Role::Shop => Self {
                token: keys::SHOP_TOKEN,
                principal: keys::SHOP,
                id: Some(keys::SHOP_ID),
                email: Some(keys::SHOP_EMAIL),
            },
            Role::Admin => Self {
                token: keys::ADMIN_TOKEN,
                principal: keys::ADMIN,
                id: None,
                email: None,
            },
        }
    }
}

/// Reads and writes per-role sessions.
///
/// Cheap to clone; clones share the underlying store.
#[derive(Clone)]
pub struct SessionStore {
    store: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore").finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Wrap a key-value store.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// A session store backed by a fresh [`MemoryStore`].
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Persist `session` as the live session for its role.
    ///
    /// Overwrites the role's token, principal and auxiliary keys, marks the
    /// role as active, and removes the legacy single-key token.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the store rejects a write.
    pub fn set_session(&self, session: &Session) -> Result<(), StoreError> {
        use secrecy::ExposeSecret;

        let role = session.role();
        let role_keys = RoleKeys::of(role);
        let principal = session.principal();

        self.store.set(role_keys.token, session.token().expose_secret())?;
        self.store.set(role_keys.principal, &principal.to_string())?;
        self.write_aux(role_keys.id, extract_string(principal, ID_SHAPES))?;
        self.write_aux(role_keys.email, extract_string(principal, EMAIL_SHAPES))?;
        self.store.set(keys::ROLE, role.as_str())?;
        self.store.remove(keys::LEGACY_TOKEN)?;

        tracing::debug!(role = %role, "Session stored");
        Ok(())
    }

    fn write_aux(&self, key: Option<&'static str>, value: Option<String>) -> Result<(), StoreError> {
        match (key, value) {
            (Some(key), Some(value)) => self.store.set(key, &value),
            // Stale values from a previous principal must not survive.
            (Some(key), None) => self.store.remove(key),
            (None, _) => Ok(()),
        }
    }

    /// Read the live session for `role`, if it has a token.
    ///
    /// A missing or unreadable principal is returned as `{}`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the store cannot be read.
    pub fn get_session(&self, role: Role) -> Result<Option<Session>, StoreError> {
        let Some(token) = self.raw_token(role)? else {
            return Ok(None);
        };

        let principal_key = RoleKeys::of(role).principal;
        let principal = match self.store.get(principal_key)? {
            Some(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
                tracing::debug!(role = %role, error = %e, "Stored principal is not JSON");
                Value::Null
            }),
            None => Value::Null,
        };

        Ok(Some(Session::new(role, token, principal)))
    }

    /// Bearer token for `role`, if present.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the store cannot be read.
    pub fn token(&self, role: Role) -> Result<Option<SecretString>, StoreError> {
        Ok(self.raw_token(role)?.map(SecretString::from))
    }

    fn raw_token(&self, role: Role) -> Result<Option<String>, StoreError> {
        let token = self
            .store
            .get(RoleKeys::of(role).token)?
            .filter(|t| !t.is_empty());

        match (token, role) {
            (Some(token), _) => Ok(Some(token)),
            (None, Role::User) => Ok(self
                .store
                .get(keys::LEGACY_TOKEN)?
                .filter(|t| !t.is_empty())),
            (None, _) => Ok(None),
        }
    }

    /// The stored shop id, if a shop session recorded one.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the store cannot be read.
    pub fn shop_id(&self) -> Result<Option<String>, StoreError> {
        self.store.get(keys::SHOP_ID)
    }

    /// The role marked active by the last `set_session`, defaulting to user.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the store cannot be read.
    pub fn active_role(&self) -> Result<Role, StoreError> {
        Ok(self
            .store
            .get(keys::ROLE)?
            .and_then(|r| r.parse().ok())
            .unwrap_or_default())
    }

    /// Remove only `role`'s keys.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the store rejects a removal.
    pub fn clear_session(&self, role: Role) -> Result<(), StoreError> {
        let role_keys = RoleKeys::of(role);

        self.store.remove(role_keys.token)?;
        self.store.remove(role_keys.principal)?;
        for key in [role_keys.id, role_keys.email].into_iter().flatten() {
            self.store.remove(key)?;
        }
        if role == Role::User {
            self.store.remove(keys::LEGACY_TOKEN)?;
        }

        tracing::debug!(role = %role, "Session cleared");
        Ok(())
    }

    /// Remove every role's keys and the shared markers.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the store rejects a removal.
    pub fn clear_all_sessions(&self) -> Result<(), StoreError> {
        for key in keys::ALL {
            self.store.remove(key)?;
        }

        tracing::debug!("All sessions cleared");
        Ok(())
    }

    /// Clear the sessions selected by `scope`, relative to `role`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the store rejects a removal.
    pub fn clear_scoped(&self, role: Role, scope: ClearScope) -> Result<(), StoreError> {
        match scope {
            ClearScope::ActiveRole => self.clear_session(role),
            ClearScope::AllRoles => self.clear_all_sessions(),
        }
    }
}
