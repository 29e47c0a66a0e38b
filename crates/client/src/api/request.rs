//! Request descriptors.
//!
//! A [`RequestDescriptor`] is assembled with builder methods and then handed
//! to the client by reference; the client never modifies it.

use marketlink_core::{ClearScope, Role};
use reqwest::Method;
use reqwest::multipart::{Form, Part};
use serde_json::Value;

use crate::error::ApiError;

/// Request body variants.
#[derive(Debug, Clone)]
pub enum RequestBody {
    /// Serialized as JSON.
    Json(Value),
    /// Sent verbatim.
    Text(String),
    /// Sent as `multipart/form-data`; the content type carries the boundary.
    Multipart(MultipartForm),
}

/// Owned multipart form.
///
/// Unlike `reqwest::multipart::Form` this is `Clone`, so the same form can be
/// sent to several candidate endpoints.
#[derive(Debug, Clone, Default)]
pub struct MultipartForm {
    parts: Vec<FormPart>,
}

#[derive(Debug, Clone)]
enum FormPart {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        file_name: String,
        mime: Option<String>,
        bytes: Vec<u8>,
    },
}

impl MultipartForm {
    /// Create an empty form.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a text field.
    #[must_use]
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(FormPart::Text {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Add a file field.
    #[must_use]
    pub fn file(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        bytes: Vec<u8>,
        mime: Option<&str>,
    ) -> Self {
        self.parts.push(FormPart::File {
            name: name.into(),
            file_name: file_name.into(),
            mime: mime.map(str::to_string),
            bytes,
        });
        self
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Whether the form has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Build a fresh `reqwest` form for one send.
    pub(crate) fn to_form(&self) -> Result<Form, ApiError> {
        let mut form = Form::new();
        for part in &self.parts {
            form = match part {
                FormPart::Text { name, value } => form.text(name.clone(), value.clone()),
                FormPart::File {
                    name,
                    file_name,
                    mime,
                    bytes,
                } => {
                    let mut file = Part::bytes(bytes.clone()).file_name(file_name.clone());
                    if let Some(mime) = mime {
                        file = file.mime_str(mime)?;
                    }
                    form.part(name.clone(), file)
                }
            };
        }
        Ok(form)
    }
}

/// Everything needed to issue one HTTP call.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    path: String,
    method: Method,
    body: Option<RequestBody>,
    headers: Vec<(String, String)>,
    requires_auth: bool,
    clear_scope: ClearScope,
    role: Option<Role>,
}

impl RequestDescriptor {
    /// Describe a request. Authentication is attached by default.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method,
            body: None,
            headers: Vec::new(),
            requires_auth: true,
            clear_scope: ClearScope::default(),
            role: None,
        }
    }

    /// `GET path`
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// `POST path`
    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// `PUT path`
    #[must_use]
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    /// `PATCH path`
    #[must_use]
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    /// `DELETE path`
    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Attach a JSON body.
    #[must_use]
    pub fn json(self, body: Value) -> Self {
        self.body(Some(RequestBody::Json(body)))
    }

    /// Attach a body sent verbatim.
    #[must_use]
    pub fn text(self, body: impl Into<String>) -> Self {
        self.body(Some(RequestBody::Text(body.into())))
    }

    /// Attach a multipart form.
    #[must_use]
    pub fn multipart(self, form: MultipartForm) -> Self {
        self.body(Some(RequestBody::Multipart(form)))
    }

    /// Replace the body.
    #[must_use]
    pub fn body(mut self, body: Option<RequestBody>) -> Self {
        self.body = body;
        self
    }

    /// Add a header. Later values for the same name win.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Add several headers.
    #[must_use]
    pub fn headers(mut self, headers: impl IntoIterator<Item = (String, String)>) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Whether to attach the bearer token.
    #[must_use]
    pub const fn requires_auth(mut self, requires_auth: bool) -> Self {
        self.requires_auth = requires_auth;
        self
    }

    /// Send without an `Authorization` header.
    #[must_use]
    pub const fn without_auth(self) -> Self {
        self.requires_auth(false)
    }

    /// Which sessions a genuine 401 clears.
    #[must_use]
    pub const fn clear_scope(mut self, scope: ClearScope) -> Self {
        self.clear_scope = scope;
        self
    }

    /// Authenticate as `role` instead of the active role.
    #[must_use]
    pub const fn as_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    /// Request path or absolute URL.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Request body, if any.
    #[must_use]
    pub const fn body_ref(&self) -> Option<&RequestBody> {
        self.body.as_ref()
    }

    /// Caller-supplied headers.
    #[must_use]
    pub fn header_pairs(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Whether the bearer token is attached.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.requires_auth
    }

    /// Whether the body is a multipart form.
    #[must_use]
    pub const fn is_multipart(&self) -> bool {
        matches!(self.body, Some(RequestBody::Multipart(_)))
    }

    /// Clear scope for a genuine 401.
    #[must_use]
    pub const fn scope(&self) -> ClearScope {
        self.clear_scope
    }

    /// Explicit role override.
    #[must_use]
    pub const fn role(&self) -> Option<Role> {
        self.role
    }

    /// Whether the caller set a `Content-Type` header.
    pub(crate) fn has_content_type(&self) -> bool {
        self.headers
            .iter()
            .any(|(name, _)| name.eq_ignore_ascii_case("content-type"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_defaults() {
        let request = RequestDescriptor::get("/users/me");
        assert_eq!(request.method(), &Method::GET);
        assert!(request.is_authenticated());
        assert!(!request.is_multipart());
        assert_eq!(request.scope(), ClearScope::ActiveRole);
        assert_eq!(request.role(), None);
        assert!(request.body_ref().is_none());
    }

    #[test]
    fn test_builder() {
        let request = RequestDescriptor::post("/returns")
            .json(json!({"reason": "damaged"}))
            .header("Content-Type", "application/vnd.api+json")
            .without_auth()
            .clear_scope(ClearScope::AllRoles)
            .as_role(Role::Shop);

        assert!(matches!(request.body_ref(), Some(RequestBody::Json(_))));
        assert!(request.has_content_type());
        assert!(!request.is_authenticated());
        assert_eq!(request.scope(), ClearScope::AllRoles);
        assert_eq!(request.role(), Some(Role::Shop));
    }

    #[test]
    fn test_multipart_is_flagged_and_reusable() {
        let form = MultipartForm::new()
            .text("caption", "new drop")
            .file("image", "a.png", vec![0x89, 0x50], Some("image/png"));
        let request = RequestDescriptor::post("/posts").multipart(form.clone());

        assert!(request.is_multipart());
        assert_eq!(form.len(), 2);
        assert!(form.to_form().is_ok());
        assert!(form.to_form().is_ok());
    }

    #[test]
    fn test_invalid_mime_is_rejected() {
        let form = MultipartForm::new().file("f", "a.bin", vec![1], Some("not a mime"));
        assert!(matches!(form.to_form(), Err(ApiError::Http(_))));
    }
}
