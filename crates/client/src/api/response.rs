//! Response envelopes and defensive body parsing.

use marketlink_core::{Shape, extract_string};
use serde::Serialize;
use serde_json::{Value, json};

/// Fields consulted, in order, for a human-readable error message.
const MESSAGE_SHAPES: &[Shape] = &[
    Shape::Field("message"),
    Shape::Field("error"),
    Shape::Field("raw"),
];

/// Outcome of one HTTP exchange.
///
/// Always produced, whatever the body looked like.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseEnvelope {
    /// Whether the status was 2xx.
    pub ok: bool,
    /// HTTP status code.
    pub status: u16,
    /// Parsed body.
    pub data: Value,
}

/// Parse a response body without ever failing.
///
/// - empty or whitespace-only → `{}`
/// - valid JSON → the parsed value
/// - anything else → `{ "raw": text, "message": text }`
#[must_use]
pub fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return json!({});
    }

    serde_json::from_str(text).unwrap_or_else(|_| json!({ "raw": text, "message": text }))
}

/// Pick the message for a failed response.
///
/// `message`, then `error`, then `raw`, then `"Request failed (<status>)"`.
#[must_use]
pub fn error_message(status: u16, data: &Value) -> String {
    extract_string(data, MESSAGE_SHAPES).unwrap_or_else(|| format!("Request failed ({status})"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_body() {
        assert_eq!(parse_body(""), json!({}));
        assert_eq!(parse_body("  \n"), json!({}));
    }

    #[test]
    fn test_parse_json_body() {
        assert_eq!(parse_body(r#"{"x":1}"#), json!({"x": 1}));
        assert_eq!(parse_body("[1,2]"), json!([1, 2]));
    }

    #[test]
    fn test_parse_html_body() {
        let html = "<pre>Cannot GET /api/returns/my</pre>";
        assert_eq!(parse_body(html), json!({"raw": html, "message": html}));
    }

    #[test]
    fn test_error_message_priority() {
        assert_eq!(
            error_message(400, &json!({"message": "m", "error": "e", "raw": "r"})),
            "m"
        );
        assert_eq!(error_message(400, &json!({"message": "", "error": "e"})), "e");
        assert_eq!(error_message(502, &json!({"raw": "Bad Gateway"})), "Bad Gateway");
        assert_eq!(error_message(500, &json!({})), "Request failed (500)");
        assert_eq!(error_message(500, &json!([1])), "Request failed (500)");
    }
}
