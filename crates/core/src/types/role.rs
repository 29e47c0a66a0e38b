//! Authentication roles and session clear scopes.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a string does not name a known [`Role`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid role: {0} (expected user, shop or admin)")]
pub struct RoleParseError(pub String);

/// An isolated authentication context.
///
/// Each role keeps its own token and principal; a session for one role never
/// reads or overwrites another role's keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// A shopper or referral member.
    #[default]
    User,
    /// A seller account operating a shop.
    Shop,
    /// Platform administrator.
    Admin,
}

impl Role {
    /// Every role, in the order sessions are cleared.
    pub const ALL: [Self; 3] = [Self::Shop, Self::User, Self::Admin];

    /// The lowercase wire/storage name of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Shop => "shop",
            Self::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Self::User),
            "shop" | "seller" => Ok(Self::Shop),
            "admin" => Ok(Self::Admin),
            _ => Err(RoleParseError(s.to_string())),
        }
    }
}

/// Which sessions a genuine authentication failure clears.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ClearScope {
    /// Only the role the failed request was made as.
    #[default]
    ActiveRole,
    /// Every role's session plus the shared markers.
    AllRoles,
}
