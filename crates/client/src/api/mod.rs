//! MarketLink REST API client.
//!
//! # Architecture
//!
//! - [`ApiClient::execute`] issues one request described by a
//!   [`RequestDescriptor`] and returns a [`ResponseEnvelope`] or an
//!   [`ApiError`](crate::error::ApiError)
//! - [`ApiClient::resolve`] walks a [`CandidateEndpointList`] for operations
//!   whose route name differs between backend deployments
//! - 401 responses pass through the [`auth_failure`] classifier before the
//!   error is built, so session clearing happens exactly once per failure
//!
//! # Example
//!
//! ```rust,ignore
//! use marketlink_client::api::{ApiClient, RequestDescriptor};
//!
//! let client = ApiClient::new(&config, sessions)?;
//!
//! // Stable route
//! let me = client.execute(&RequestDescriptor::get("/users/me")).await?;
//!
//! // Unstable route, tried in order until one exists
//! let returns = client.my_returns().await?;
//! ```

pub mod auth_failure;
mod fallback;
mod request;
pub mod resources;
mod response;

pub use fallback::{
    Applicability, CallParams, Candidate, CandidateEndpointList, OperationKind, render_template,
};
pub use request::{MultipartForm, RequestBody, RequestDescriptor};
pub use response::{ResponseEnvelope, error_message, parse_body};

use std::sync::Arc;

use marketlink_core::Role;
use reqwest::header::{
    ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue,
};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{Instrument, debug, info_span};
use uuid::Uuid;

use crate::config::{BaseUrls, ClientConfig};
use crate::error::ApiError;
use crate::session::SessionStore;

use auth_failure::AuthFailure;

/// Header carrying the per-call correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Result of one attempt, before it is turned into a public result.
///
/// Keeps "this route does not exist here" apart from real failures so the
/// fallback loop can match on it.
#[derive(Debug)]
pub(crate) enum Attempt {
    Success(ResponseEnvelope),
    RouteMissing { status: u16, data: Value },
    Failed(ApiError),
}

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the MarketLink REST backend.
///
/// Cheaply cloneable; clones share the HTTP connection pool, cookie jar and
/// session store.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    urls: BaseUrls,
    sessions: SessionStore,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// The underlying HTTP client keeps a cookie jar so credentials set by
    /// the backend are sent on every call.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the HTTP client fails to build.
    pub fn new(config: &ClientConfig, sessions: SessionStore) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().cookie_store(true).build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                urls: config.urls.clone(),
                sessions,
            }),
        })
    }

    /// Backend and API roots in use.
    #[must_use]
    pub fn urls(&self) -> &BaseUrls {
        &self.inner.urls
    }

    /// The session store requests authenticate from.
    #[must_use]
    pub fn sessions(&self) -> &SessionStore {
        &self.inner.sessions
    }

    /// Execute one request.
    ///
    /// # Errors
    ///
    /// - `ApiError::Http` if no response was received
    /// - `ApiError::Unauthorized` for a genuine 401 (sessions already cleared)
    /// - `ApiError::Api` for any other non-2xx status
    /// - `ApiError::InvalidHeader` / `ApiError::Store` / `ApiError::Serialize`
    ///   if the request could not be assembled
    pub async fn execute(&self, descriptor: &RequestDescriptor) -> Result<ResponseEnvelope, ApiError> {
        match self.attempt(descriptor).await {
            Attempt::Success(envelope) => Ok(envelope),
            Attempt::RouteMissing { status, data } => Err(ApiError::Api {
                message: error_message(status, &data),
                status,
                data,
            }),
            Attempt::Failed(err) => Err(err),
        }
    }

    /// Execute one request and deserialize the response body.
    ///
    /// # Errors
    ///
    /// Everything [`execute`](Self::execute) returns, plus `ApiError::Decode`
    /// if the body does not deserialize into `T`.
    pub async fn execute_json<T: DeserializeOwned>(
        &self,
        descriptor: &RequestDescriptor,
    ) -> Result<T, ApiError> {
        let envelope = self.execute(descriptor).await?;
        serde_json::from_value(envelope.data).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Send one request and tag the outcome.
    pub(crate) async fn attempt(&self, descriptor: &RequestDescriptor) -> Attempt {
        let role = match descriptor.role() {
            Some(role) => role,
            None => match self.inner.sessions.active_role() {
                Ok(role) => role,
                Err(e) => return Attempt::Failed(e.into()),
            },
        };

        let request_id = Uuid::new_v4();
        let url = self.inner.urls.resolve(descriptor.path());
        let span = info_span!(
            "api_request",
            method = %descriptor.method(),
            url = %url,
            role = %role,
            request_id = %request_id,
        );

        async {
            match self.send(descriptor, &url, role, request_id).await {
                Ok(envelope) if envelope.ok => Attempt::Success(envelope),
                Ok(envelope) => self.reject(descriptor, role, envelope),
                Err(err) => {
                    debug!(error = %err, "Request failed before a response");
                    Attempt::Failed(err)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn send(
        &self,
        descriptor: &RequestDescriptor,
        url: &str,
        role: Role,
        request_id: Uuid,
    ) -> Result<ResponseEnvelope, ApiError> {
        let headers = self.build_headers(descriptor, role, request_id)?;

        let mut request = self
            .inner
            .client
            .request(descriptor.method().clone(), url)
            .headers(headers);

        request = match descriptor.body_ref() {
            None => request,
            Some(RequestBody::Json(value)) => request.body(serde_json::to_vec(value)?),
            Some(RequestBody::Text(text)) => request.body(text.clone()),
            Some(RequestBody::Multipart(form)) => request.multipart(form.to_form()?),
        };

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        debug!(status = status.as_u16(), bytes = text.len(), "Response received");

        Ok(ResponseEnvelope {
            ok: status.is_success(),
            status: status.as_u16(),
            data: parse_body(&text),
        })
    }

    fn build_headers(
        &self,
        descriptor: &RequestDescriptor,
        role: Role,
        request_id: Uuid,
    ) -> Result<HeaderMap, ApiError> {
        let mut headers = HeaderMap::new();

        for (name, value) in descriptor.header_pairs() {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| ApiError::InvalidHeader(name.clone()))?;
            let header_value =
                HeaderValue::from_str(value).map_err(|_| ApiError::InvalidHeader(name.clone()))?;
            headers.insert(header_name, header_value);
        }

        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            REQUEST_ID_HEADER,
            HeaderValue::from_str(&request_id.to_string())
                .map_err(|_| ApiError::InvalidHeader(REQUEST_ID_HEADER.to_string()))?,
        );

        if descriptor.is_authenticated()
            && let Some(token) = self.inner.sessions.token(role)?
        {
            let mut bearer = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
                .map_err(|_| ApiError::InvalidHeader(AUTHORIZATION.to_string()))?;
            bearer.set_sensitive(true);
            headers.insert(AUTHORIZATION, bearer);
        }

        if descriptor.body_ref().is_some()
            && !descriptor.is_multipart()
            && !descriptor.has_content_type()
        {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }

        Ok(headers)
    }

    /// Turn a non-2xx envelope into an attempt outcome.
    fn reject(&self, descriptor: &RequestDescriptor, role: Role, envelope: ResponseEnvelope) -> Attempt {
        let ResponseEnvelope { status, data, .. } = envelope;

        let auth = auth_failure::apply(&self.inner.sessions, role, status, &data, descriptor.scope());

        if status == 404 {
            return Attempt::RouteMissing { status, data };
        }

        let message = error_message(status, &data);
        debug!(status, message = %message, "Request rejected");

        let err = if auth == AuthFailure::Genuine {
            ApiError::Unauthorized {
                status,
                message,
                data,
            }
        } else {
            ApiError::Api {
                status,
                message,
                data,
            }
        };
        Attempt::Failed(err)
    }
}
