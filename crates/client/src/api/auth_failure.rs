//! Classification of 401 responses.
//!
//! Some backend deployments answer unimplemented routes with a 401 whose body
//! is an Express-style "Cannot GET /api/..." page or a "route not found"
//! message. Clearing the session on those would log the user out every time
//! the UI probes an endpoint that does not exist yet, so they are told apart
//! from genuine authentication failures by their text.

use marketlink_core::{ClearScope, Role};
use serde_json::Value;

use crate::error::add_breadcrumb;
use crate::session::SessionStore;

/// Lower-case fragments that mark a 401 as a missing route.
pub const ROUTE_MISSING_MARKERS: [&str; 4] =
    ["api route not found", "route not found", "cannot get", "cannot post"];

/// How a failed response relates to authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    /// Not a 401.
    NotApplicable,
    /// A 401 describing a missing route. Sessions are left alone.
    RouteMissing,
    /// A real authentication failure.
    Genuine,
}

/// Classify a failed response. Pure; never touches sessions.
#[must_use]
pub fn classify(status: u16, data: &Value) -> AuthFailure {
    if status != 401 {
        return AuthFailure::NotApplicable;
    }

    let text = ["message", "error", "raw"]
        .iter()
        .filter_map(|key| data.get(key))
        .map(|value| match value {
            Value::String(s) => s.to_lowercase(),
            other => other.to_string().to_lowercase(),
        })
        .collect::<Vec<_>>()
        .join(" ");

    if ROUTE_MISSING_MARKERS.iter().any(|marker| text.contains(marker)) {
        AuthFailure::RouteMissing
    } else {
        AuthFailure::Genuine
    }
}

/// Classify a failed response and clear sessions on a genuine failure.
///
/// `role` is the role the request was authenticated as. Storage errors while
/// clearing are logged; the caller still reports the original 401.
pub fn apply(
    sessions: &SessionStore,
    role: Role,
    status: u16,
    data: &Value,
    scope: ClearScope,
) -> AuthFailure {
    let outcome = classify(status, data);

    match outcome {
        AuthFailure::Genuine => {
            tracing::warn!(role = %role, ?scope, "Authentication rejected; clearing session");
            add_breadcrumb(
                "auth",
                "Session cleared after 401",
                Some(&[("role", role.as_str())]),
            );
            if let Err(e) = sessions.clear_scoped(role, scope) {
                tracing::error!(error = %e, role = %role, "Failed to clear session");
            }
        }
        AuthFailure::RouteMissing => {
            tracing::debug!(role = %role, "401 describes a missing route; session kept");
        }
        AuthFailure::NotApplicable => {}
    }

    outcome
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use marketlink_core::Session;
    use serde_json::json;

    use super::*;

    fn logged_in_everywhere() -> SessionStore {
        let sessions = SessionStore::in_memory();
        for role in Role::ALL {
            sessions
                .set_session(&Session::new(role, format!("{role}-token"), json!({})))
                .unwrap();
        }
        sessions
    }

    fn live_roles(sessions: &SessionStore) -> Vec<Role> {
        Role::ALL
            .into_iter()
            .filter(|role| sessions.get_session(*role).unwrap().is_some())
            .collect()
    }

    #[test]
    fn test_only_401_is_classified() {
        assert_eq!(classify(403, &json!({"message": "nope"})), AuthFailure::NotApplicable);
        assert_eq!(classify(404, &json!({})), AuthFailure::NotApplicable);
        assert_eq!(classify(401, &json!({})), AuthFailure::Genuine);
    }

    #[test]
    fn test_route_missing_phrases_any_case() {
        for data in [
            json!({"message": "API Route Not Found"}),
            json!({"error": "Route not found: /api/returns/my"}),
            json!({"raw": "<pre>Cannot GET /api/referrals/tree</pre>"}),
            json!({"message": "x", "raw": "CANNOT POST /api/returns"}),
        ] {
            assert_eq!(classify(401, &data), AuthFailure::RouteMissing, "{data}");
        }
    }

    #[test]
    fn test_route_missing_401_leaves_sessions_untouched() {
        let sessions = logged_in_everywhere();

        let outcome = apply(
            &sessions,
            Role::Shop,
            401,
            &json!({"message": "Route Not Found"}),
            ClearScope::AllRoles,
        );

        assert_eq!(outcome, AuthFailure::RouteMissing);
        assert_eq!(live_roles(&sessions), Role::ALL.to_vec());
    }

    #[test]
    fn test_genuine_401_clears_only_active_role() {
        let sessions = logged_in_everywhere();

        apply(
            &sessions,
            Role::Shop,
            401,
            &json!({"message": "Invalid token"}),
            ClearScope::ActiveRole,
        );

        assert_eq!(live_roles(&sessions), vec![Role::User, Role::Admin]);
    }

    #[test]
    fn test_genuine_401_clears_all_roles_when_scoped() {
        let sessions = logged_in_everywhere();

        apply(
            &sessions,
            Role::User,
            401,
            &json!({"error": "jwt expired"}),
            ClearScope::AllRoles,
        );

        assert!(live_roles(&sessions).is_empty());
    }

    #[test]
    fn test_non_401_never_clears() {
        let sessions = logged_in_everywhere();
        apply(&sessions, Role::User, 500, &json!({}), ClearScope::AllRoles);
        assert_eq!(live_roles(&sessions), Role::ALL.to_vec());
    }
}
