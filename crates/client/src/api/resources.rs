//! Resource operations built on candidate-endpoint resolution.
//!
//! [`endpoints`] holds the candidate lists; the typed wrappers on
//! [`ApiClient`] resolve them and pull the payload out of whatever envelope
//! the backend used.

use marketlink_core::{Role, Session, Shape, extract, extract_list, extract_string};
use reqwest::Method;
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{info, instrument};

use super::fallback::{CallParams, Candidate, CandidateEndpointList, OperationKind};
use super::ApiClient;
use crate::error::ApiError;

/// Candidate lists for every operation whose route varies by deployment.
pub mod endpoints {
    use super::{Candidate, CandidateEndpointList, Method, OperationKind, Role};

    #[must_use]
    pub fn my_returns() -> CandidateEndpointList {
        CandidateEndpointList::from_paths(
            "my returns",
            OperationKind::Read,
            &["/returns/my", "/returns/mine", "/users/me/returns", "/orders/returns"],
        )
    }

    /// Routes keyed by shop id are only tried when a shop id is known.
    #[must_use]
    pub fn shop_returns() -> CandidateEndpointList {
        CandidateEndpointList::from_paths(
            "shop returns",
            OperationKind::Read,
            &["/shops/{shopId}/returns", "/returns/shop/{shopId}", "/shop/returns"],
        )
    }

    #[must_use]
    pub fn create_return() -> CandidateEndpointList {
        CandidateEndpointList::new(
            "create return",
            OperationKind::Mutate,
            [
                Candidate::new("/returns"),
                Candidate::new("/orders/{orderId}/return").when(|p| p.has("orderId")),
                Candidate::new("/returns/request"),
            ],
        )
    }

    #[must_use]
    pub fn update_return_status() -> CandidateEndpointList {
        CandidateEndpointList::new(
            "update return status",
            OperationKind::Mutate,
            [
                Candidate::new("/returns/{returnId}/status").method(Method::PATCH),
                Candidate::new("/returns/{returnId}").method(Method::PATCH),
            ],
        )
    }

    #[must_use]
    pub fn my_orders() -> CandidateEndpointList {
        CandidateEndpointList::from_paths(
            "my orders",
            OperationKind::Read,
            &["/orders/my", "/orders/mine", "/users/me/orders"],
        )
    }

    #[must_use]
    pub fn referral_tree() -> CandidateEndpointList {
        CandidateEndpointList::from_paths(
            "referral tree",
            OperationKind::Read,
            &["/referrals/tree", "/referrals/my", "/users/me/referrals"],
        )
    }

    #[must_use]
    pub fn my_commissions() -> CandidateEndpointList {
        CandidateEndpointList::from_paths(
            "my commissions",
            OperationKind::Read,
            &["/commissions/my", "/commissions/mine", "/users/me/commissions"],
        )
    }

    #[must_use]
    pub fn notifications() -> CandidateEndpointList {
        CandidateEndpointList::from_paths(
            "notifications",
            OperationKind::Read,
            &["/notifications", "/notifications/my", "/users/me/notifications"],
        )
    }

    #[must_use]
    pub fn login(role: Role) -> CandidateEndpointList {
        let paths: &[&str] = match role {
            Role::User => &["/auth/login", "/users/login"],
            Role::Shop => &["/shops/login", "/shop/login", "/auth/shop/login"],
            Role::Admin => &["/admin/login", "/auth/admin/login"],
        };
        CandidateEndpointList::from_paths(format!("{role} login"), OperationKind::Mutate, paths)
    }

    #[must_use]
    pub fn register(role: Role) -> CandidateEndpointList {
        let paths: &[&str] = match role {
            Role::User => &["/auth/register", "/users/register"],
            Role::Shop => &["/shops/register", "/shop/register"],
            Role::Admin => &["/admin/register"],
        };
        CandidateEndpointList::from_paths(format!("{role} register"), OperationKind::Mutate, paths)
    }
}

// =============================================================================
// Payload shapes
// =============================================================================

const RETURN_SHAPES: &[Shape] = &[
    Shape::Root,
    Shape::Field("returns"),
    Shape::Path(&["data", "returns"]),
    Shape::Field("data"),
    Shape::Field("items"),
    Shape::Field("results"),
];

const ORDER_SHAPES: &[Shape] = &[
    Shape::Root,
    Shape::Field("orders"),
    Shape::Path(&["data", "orders"]),
    Shape::Field("data"),
    Shape::Field("items"),
    Shape::Field("results"),
];

const COMMISSION_SHAPES: &[Shape] = &[
    Shape::Root,
    Shape::Field("commissions"),
    Shape::Path(&["data", "commissions"]),
    Shape::Field("data"),
    Shape::Field("items"),
    Shape::Field("results"),
];

const NOTIFICATION_SHAPES: &[Shape] = &[
    Shape::Root,
    Shape::Field("notifications"),
    Shape::Path(&["data", "notifications"]),
    Shape::Field("data"),
    Shape::Field("items"),
    Shape::Field("results"),
];

const TREE_SHAPES: &[Shape] = &[
    Shape::Field("tree"),
    Shape::Path(&["data", "tree"]),
    Shape::Field("data"),
    Shape::Root,
];

/// Single-record envelopes for mutations.
const RECORD_SHAPES: &[Shape] = &[
    Shape::Field("return"),
    Shape::Path(&["data", "return"]),
    Shape::Field("data"),
    Shape::Root,
];

const TOKEN_SHAPES: &[Shape] = &[
    Shape::Field("token"),
    Shape::Field("accessToken"),
    Shape::Path(&["data", "token"]),
    Shape::Path(&["data", "accessToken"]),
];

const USER_PRINCIPAL_SHAPES: &[Shape] = &[
    Shape::Field("user"),
    Shape::Path(&["data", "user"]),
    Shape::Field("data"),
];

const SHOP_PRINCIPAL_SHAPES: &[Shape] = &[
    Shape::Field("shop"),
    Shape::Path(&["data", "shop"]),
    Shape::Field("user"),
    Shape::Field("data"),
];

const ADMIN_PRINCIPAL_SHAPES: &[Shape] = &[
    Shape::Field("admin"),
    Shape::Path(&["data", "admin"]),
    Shape::Field("user"),
    Shape::Field("data"),
];

const fn principal_shapes(role: Role) -> &'static [Shape] {
    match role {
        Role::User => USER_PRINCIPAL_SHAPES,
        Role::Shop => SHOP_PRINCIPAL_SHAPES,
        Role::Admin => ADMIN_PRINCIPAL_SHAPES,
    }
}

/// Build a session from a login or registration payload.
///
/// # Errors
///
/// Returns `ApiError::MissingToken` if no token shape matches.
pub fn session_from_auth_payload(
    role: Role,
    operation: &str,
    data: &Value,
) -> Result<Session, ApiError> {
    let token = extract_string(data, TOKEN_SHAPES).ok_or_else(|| ApiError::MissingToken {
        operation: operation.to_string(),
    })?;

    let principal = extract(data, principal_shapes(role))
        .filter(|v| v.is_object())
        .cloned()
        .unwrap_or_else(|| json!({}));

    Ok(Session::new(role, token, principal))
}

fn record(data: &Value) -> Value {
    extract(data, RECORD_SHAPES).cloned().unwrap_or_else(|| json!({}))
}

// =============================================================================
// Typed wrappers
// =============================================================================

impl ApiClient {
    /// Returns requested by the signed-in user.
    ///
    /// # Errors
    ///
    /// Any non-404 failure from the backend.
    #[instrument(skip(self))]
    pub async fn my_returns(&self) -> Result<Vec<Value>, ApiError> {
        let data = self
            .resolve(&endpoints::my_returns(), &CallParams::new().as_role(Role::User))
            .await?;
        Ok(extract_list(&data, RETURN_SHAPES))
    }

    /// Returns filed against a shop.
    ///
    /// Falls back to the stored shop id when `shop_id` is `None`. Without
    /// either, only routes that need no id are tried.
    ///
    /// # Errors
    ///
    /// Any non-404 failure from the backend, or a session store error.
    #[instrument(skip(self))]
    pub async fn shop_returns(&self, shop_id: Option<&str>) -> Result<Vec<Value>, ApiError> {
        let shop_id = match shop_id {
            Some(id) => Some(id.to_string()),
            None => self.sessions().shop_id()?,
        };

        let mut params = CallParams::new().as_role(Role::Shop);
        if let Some(id) = shop_id {
            params = params.param("shopId", id);
        }

        let data = self.resolve(&endpoints::shop_returns(), &params).await?;
        Ok(extract_list(&data, RETURN_SHAPES))
    }

    /// File a return request.
    ///
    /// # Errors
    ///
    /// `ApiError::EndpointNotFound` if no candidate route exists, or any
    /// other backend failure.
    #[instrument(skip(self, body))]
    pub async fn create_return(
        &self,
        order_id: Option<&str>,
        body: &impl Serialize,
    ) -> Result<Value, ApiError> {
        let mut params = CallParams::new()
            .as_role(Role::User)
            .json(serde_json::to_value(body)?);
        if let Some(order_id) = order_id {
            params = params.param("orderId", order_id);
        }

        let data = self.resolve(&endpoints::create_return(), &params).await?;
        Ok(record(&data))
    }

    /// Move a return to a new status. Sent as the shop.
    ///
    /// # Errors
    ///
    /// `ApiError::EndpointNotFound` if no candidate route exists, or any
    /// other backend failure.
    #[instrument(skip(self))]
    pub async fn update_return_status(&self, return_id: &str, status: &str) -> Result<Value, ApiError> {
        let params = CallParams::new()
            .as_role(Role::Shop)
            .param("returnId", return_id)
            .json(json!({ "status": status }));

        let data = self.resolve(&endpoints::update_return_status(), &params).await?;
        Ok(record(&data))
    }

    /// Orders placed by the signed-in user.
    ///
    /// # Errors
    ///
    /// Any non-404 failure from the backend.
    #[instrument(skip(self))]
    pub async fn my_orders(&self) -> Result<Vec<Value>, ApiError> {
        let data = self
            .resolve(&endpoints::my_orders(), &CallParams::new().as_role(Role::User))
            .await?;
        Ok(extract_list(&data, ORDER_SHAPES))
    }

    /// The signed-in user's referral tree, as returned by the backend.
    ///
    /// `[]` when no referral route exists.
    ///
    /// # Errors
    ///
    /// Any non-404 failure from the backend.
    #[instrument(skip(self))]
    pub async fn referral_tree(&self) -> Result<Value, ApiError> {
        let data = self
            .resolve(&endpoints::referral_tree(), &CallParams::new().as_role(Role::User))
            .await?;
        Ok(extract(&data, TREE_SHAPES).cloned().unwrap_or(data))
    }

    /// Commissions earned by the signed-in user.
    ///
    /// # Errors
    ///
    /// Any non-404 failure from the backend.
    #[instrument(skip(self))]
    pub async fn my_commissions(&self) -> Result<Vec<Value>, ApiError> {
        let data = self
            .resolve(&endpoints::my_commissions(), &CallParams::new().as_role(Role::User))
            .await?;
        Ok(extract_list(&data, COMMISSION_SHAPES))
    }

    /// Notifications for the active role.
    ///
    /// # Errors
    ///
    /// Any non-404 failure from the backend.
    #[instrument(skip(self))]
    pub async fn notifications(&self) -> Result<Vec<Value>, ApiError> {
        let data = self
            .resolve(&endpoints::notifications(), &CallParams::new())
            .await?;
        Ok(extract_list(&data, NOTIFICATION_SHAPES))
    }

    /// Log in as `role` and store the resulting session.
    ///
    /// Other roles' sessions are left as they are.
    ///
    /// # Errors
    ///
    /// - `ApiError::MissingToken` if the response carried no token
    /// - `ApiError::EndpointNotFound` if no login route exists
    /// - any other backend or store failure
    #[instrument(skip(self, credentials), fields(role = %role))]
    pub async fn login(&self, role: Role, credentials: &impl Serialize) -> Result<Session, ApiError> {
        self.authenticate(endpoints::login(role), role, credentials).await
    }

    /// Register as `role` and store the resulting session.
    ///
    /// # Errors
    ///
    /// Same as [`login`](Self::login).
    #[instrument(skip(self, details), fields(role = %role))]
    pub async fn register(&self, role: Role, details: &impl Serialize) -> Result<Session, ApiError> {
        self.authenticate(endpoints::register(role), role, details).await
    }

    async fn authenticate(
        &self,
        list: CandidateEndpointList,
        role: Role,
        body: &impl Serialize,
    ) -> Result<Session, ApiError> {
        let params = CallParams::new()
            .without_auth()
            .as_role(role)
            .json(serde_json::to_value(body)?);

        let data = self.resolve(&list, &params).await?;
        let session = session_from_auth_payload(role, list.operation(), &data)?;
        self.sessions().set_session(&session)?;

        info!(role = %role, "Session established");
        Ok(session)
    }

    /// Drop the session for `role` only.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Store` if the store rejects a removal.
    pub fn logout(&self, role: Role) -> Result<(), ApiError> {
        self.sessions().clear_session(role)?;
        info!(role = %role, "Logged out");
        Ok(())
    }

    /// Drop every role's session.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Store` if the store rejects a removal.
    pub fn logout_all(&self) -> Result<(), ApiError> {
        self.sessions().clear_all_sessions()?;
        info!("Logged out of all roles");
        Ok(())
    }
}
