//! Unified error handling for the API client.
//!
//! Every public client operation returns `Result<T, ApiError>`. Parse failures
//! and route-missing 404s inside a fallback chain never reach this type; they
//! are recovered where they happen.

use serde_json::Value;
use thiserror::Error;

use crate::store::StoreError;

/// Errors surfaced by the API client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (DNS, TLS, connection reset, ...).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A 401 that was classified as a genuine authentication failure.
    /// The affected sessions have already been cleared.
    #[error("{message}")]
    Unauthorized {
        status: u16,
        message: String,
        data: Value,
    },

    /// Any other non-2xx response.
    #[error("{message}")]
    Api {
        status: u16,
        message: String,
        data: Value,
    },

    /// Every candidate endpoint for a mutating operation returned 404.
    #[error("{operation} endpoint not found on backend")]
    EndpointNotFound { operation: String },

    /// A login or registration response carried no token.
    #[error("{operation} response did not include a token")]
    MissingToken { operation: String },

    /// Session storage failed.
    #[error("Session store error: {0}")]
    Store(#[from] StoreError),

    /// A request body could not be encoded.
    #[error("JSON encode error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// A successful response did not have the expected shape.
    #[error("Unexpected response shape: {0}")]
    Decode(String),

    /// A caller-supplied header name or value is not valid HTTP.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),
}

impl ApiError {
    /// HTTP status of a response-backed error.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { status, .. } | Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Parsed response body of a response-backed error.
    #[must_use]
    pub const fn data(&self) -> Option<&Value> {
        match self {
            Self::Unauthorized { data, .. } | Self::Api { data, .. } => Some(data),
            _ => None,
        }
    }

    /// Whether sessions were cleared because of this error, so the UI should
    /// prompt for a fresh login.
    #[must_use]
    pub const fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}

/// Result type alias for `ApiError`.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Add a breadcrumb for client-side events.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of events
/// leading up to an error. A no-op when Sentry is not initialised.
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
