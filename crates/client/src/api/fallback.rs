//! Candidate-endpoint resolution.
//!
//! Some operations live under a different route on each backend deployment.
//! A [`CandidateEndpointList`] names every known shape of the route in order;
//! [`ApiClient::resolve`] tries them one at a time and stops at the first
//! that exists.

use std::collections::BTreeMap;

use marketlink_core::{ClearScope, Role};
use reqwest::Method;
use serde_json::{Value, json};
use tracing::{debug, instrument, warn};

use super::request::{MultipartForm, RequestBody, RequestDescriptor};
use super::{ApiClient, Attempt};
use crate::error::ApiError;

/// Predicate deciding whether a candidate applies to a call.
pub type Applicability = fn(&CallParams) -> bool;

/// What an exhausted candidate list degrades to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    /// Read or list. Degrades to `[]`.
    Read,
    /// Create or update. Degrades to `ApiError::EndpointNotFound`.
    Mutate,
}

impl OperationKind {
    fn default_method(self) -> Method {
        match self {
            Self::Read => Method::GET,
            Self::Mutate => Method::POST,
        }
    }
}

/// One path template among several for the same operation.
///
/// Templates use `{name}` placeholders filled from [`CallParams::param`].
#[derive(Debug, Clone)]
pub struct Candidate {
    template: String,
    method: Option<Method>,
    applicable: Option<Applicability>,
}

impl Candidate {
    #[must_use]
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            method: None,
            applicable: None,
        }
    }

    /// Pin the HTTP method for this candidate.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Only try this candidate when `predicate` holds.
    #[must_use]
    pub fn when(mut self, predicate: Applicability) -> Self {
        self.applicable = Some(predicate);
        self
    }

    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    fn applies(&self, params: &CallParams) -> bool {
        self.applicable.is_none_or(|predicate| predicate(params))
    }
}

/// Ordered candidates for one logical operation.
#[derive(Debug, Clone)]
pub struct CandidateEndpointList {
    operation: String,
    kind: OperationKind,
    candidates: Vec<Candidate>,
}

impl CandidateEndpointList {
    #[must_use]
    pub fn new(
        operation: impl Into<String>,
        kind: OperationKind,
        candidates: impl IntoIterator<Item = Candidate>,
    ) -> Self {
        Self {
            operation: operation.into(),
            kind,
            candidates: candidates.into_iter().collect(),
        }
    }

    /// Build a list from bare path templates.
    #[must_use]
    pub fn from_paths(operation: impl Into<String>, kind: OperationKind, paths: &[&str]) -> Self {
        Self::new(operation, kind, paths.iter().map(|p| Candidate::new(*p)))
    }

    #[must_use]
    pub fn operation(&self) -> &str {
        &self.operation
    }

    #[must_use]
    pub const fn kind(&self) -> OperationKind {
        self.kind
    }

    #[must_use]
    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }
}

/// Per-call inputs shared by every candidate.
#[derive(Debug, Clone)]
pub struct CallParams {
    method: Option<Method>,
    params: BTreeMap<String, String>,
    body: Option<RequestBody>,
    headers: Vec<(String, String)>,
    requires_auth: bool,
    clear_scope: ClearScope,
    role: Option<Role>,
}

impl Default for CallParams {
    fn default() -> Self {
        Self {
            method: None,
            params: BTreeMap::new(),
            body: None,
            headers: Vec::new(),
            requires_auth: true,
            clear_scope: ClearScope::default(),
            role: None,
        }
    }
}

impl CallParams {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a template parameter.
    #[must_use]
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Attach a JSON body.
    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(RequestBody::Json(body));
        self
    }

    /// Attach a multipart form.
    #[must_use]
    pub fn multipart(mut self, form: MultipartForm) -> Self {
        self.body = Some(RequestBody::Multipart(form));
        self
    }

    /// Override the operation's default method.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub const fn without_auth(mut self) -> Self {
        self.requires_auth = false;
        self
    }

    #[must_use]
    pub const fn clear_scope(mut self, scope: ClearScope) -> Self {
        self.clear_scope = scope;
        self
    }

    #[must_use]
    pub const fn as_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    /// Template parameter by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Whether a non-empty template parameter is set.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some_and(|v| !v.is_empty())
    }

    fn descriptor(&self, method: Method, path: String) -> RequestDescriptor {
        let descriptor = RequestDescriptor::new(method, path)
            .body(self.body.clone())
            .headers(self.headers.clone())
            .requires_auth(self.requires_auth)
            .clear_scope(self.clear_scope);

        match self.role {
            Some(role) => descriptor.as_role(role),
            None => descriptor,
        }
    }
}

/// Fill `{name}` placeholders. `None` if a placeholder has no non-empty value.
#[must_use]
pub fn render_template(template: &str, params: &CallParams) -> Option<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        let (head, tail) = rest.split_at(start);
        out.push_str(head);

        let end = tail.find('}')?;
        let name = tail.get(1..end)?;
        let value = params.get(name).filter(|v| !v.is_empty())?;
        out.push_str(&urlencoding::encode(value));

        rest = tail.get(end + 1..)?;
    }

    out.push_str(rest);
    Some(out)
}

impl ApiClient {
    /// Try each candidate in order and return the first success's payload.
    ///
    /// A 404 moves on to the next candidate; any other failure stops the
    /// walk and is returned as-is. When every candidate is missing, reads
    /// yield `[]` and mutations yield `ApiError::EndpointNotFound`.
    ///
    /// # Errors
    ///
    /// The first non-404 failure, or `ApiError::EndpointNotFound` for an
    /// exhausted mutation.
    #[instrument(skip(self, list, params), fields(operation = %list.operation()))]
    pub async fn resolve(
        &self,
        list: &CandidateEndpointList,
        params: &CallParams,
    ) -> Result<Value, ApiError> {
        for candidate in list.candidates() {
            if !candidate.applies(params) {
                debug!(template = candidate.template(), "Candidate not applicable");
                continue;
            }

            let Some(path) = render_template(candidate.template(), params) else {
                debug!(template = candidate.template(), "Candidate missing a parameter");
                continue;
            };

            let method = candidate
                .method
                .clone()
                .or_else(|| params.method.clone())
                .unwrap_or_else(|| list.kind().default_method());

            match self.attempt(&params.descriptor(method, path)).await {
                Attempt::Success(envelope) => return Ok(envelope.data),
                Attempt::RouteMissing { .. } => {
                    debug!(template = candidate.template(), "Route missing; trying next");
                }
                Attempt::Failed(err) => return Err(err),
            }
        }

        match list.kind() {
            OperationKind::Read => {
                warn!(operation = list.operation(), "No candidate endpoint found; returning empty list");
                Ok(json!([]))
            }
            OperationKind::Mutate => {
                warn!(operation = list.operation(), "No candidate endpoint found");
                Err(ApiError::EndpointNotFound {
                    operation: list.operation().to_string(),
                })
            }
        }
    }
}
