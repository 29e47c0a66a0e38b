//! Per-role authenticated session.

use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;

use super::Role;

/// A role's bearer token and the principal (profile) object cached with it.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct Session {
    role: Role,
    token: SecretString,
    principal: Value,
}

impl Session {
    /// Create a session for `role`.
    ///
    /// A `null` principal is stored as an empty object.
    #[must_use]
    pub fn new(role: Role, token: impl Into<String>, principal: Value) -> Self {
        let principal = if principal.is_null() {
            Value::Object(serde_json::Map::new())
        } else {
            principal
        };

        Self {
            role,
            token: SecretString::from(token.into()),
            principal,
        }
    }

    /// The role this session authenticates.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// The bearer token.
    #[must_use]
    pub const fn token(&self) -> &SecretString {
        &self.token
    }

    /// The cached principal object.
    #[must_use]
    pub const fn principal(&self) -> &Value {
        &self.principal
    }

    /// Consume the session, returning the principal.
    #[must_use]
    pub fn into_principal(self) -> Value {
        self.principal
    }
}

impl PartialEq for Session {
    fn eq(&self, other: &Self) -> bool {
        self.role == other.role
            && self.token.expose_secret() == other.token.expose_secret()
            && self.principal == other.principal
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("role", &self.role)
            .field("token", &"[REDACTED]")
            .field("principal", &self.principal)
            .finish()
    }
}
