//! Body serialization utilities.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Result;

/// Content type for request bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    /// JSON content type (`application/json`).
    Json,
    /// Binary content type (`application/octet-stream`).
    OctetStream,
    /// CSV exports (`text/csv`).
    Csv,
}

impl ContentType {
    /// Get the MIME type string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::OctetStream => "application/octet-stream",
            Self::Csv => "text/csv",
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Body of a 204 response, or of any endpoint that answers `{}`.
///
/// Typed calls decode `{}` when the API answers 204, so `T` must accept an
/// empty object. `serde_json::Value` and `Empty` both do; `()` does not.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Empty {}

/// The body substituted for a 204 response.
pub(crate) const NO_CONTENT_BODY: &[u8] = b"{}";

/// Serialize a value to JSON bytes.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
///
/// # Example
///
/// ```
/// use satchel_core::to_json;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Login { username: String }
///
/// let login = Login { username: "registrar".to_string() };
/// let bytes = to_json(&login).expect("serialize");
/// assert_eq!(bytes.as_ref(), br#"{"username":"registrar"}"#);
/// ```
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<Bytes> {
    serde_json::to_vec(value)
        .map(Bytes::from)
        .map_err(Into::into)
}

/// Deserialize JSON bytes to a value with path-aware error messages.
///
/// # Errors
///
/// Returns an error if JSON deserialization fails, with the error message
/// including the path to the problematic field (e.g., `results[3].grade`).
///
/// # Example
///
/// ```
/// use satchel_core::from_json;
/// use serde::Deserialize;
///
/// #[derive(Debug, PartialEq, Deserialize)]
/// struct Classroom { name: String }
///
/// let bytes = br#"{"name":"Year 4 Blue"}"#;
/// let room: Classroom = from_json(bytes).expect("deserialize");
/// assert_eq!(room, Classroom { name: "Year 4 Blue".to_string() });
/// ```
pub fn from_json<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let mut deserializer = serde_json::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
        crate::Error::json_deserialization(e.path().to_string(), e.inner().to_string())
    })
}

/// Parse an error response body, tolerating anything that is not JSON.
///
/// Error pages, empty bodies and truncated JSON all become `{}` so that a
/// typed HTTP error can always be built.
#[must_use]
pub fn error_payload(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes).unwrap_or_else(|e| {
        tracing::debug!(error = %e, len = bytes.len(), "error body is not JSON, using {{}}");
        Value::Object(serde_json::Map::new())
    })
}

/// Pick the human-readable message for an error response.
///
/// Prefers the server's `detail` field; a non-string detail (validation
/// lists, nested objects) is rendered as JSON. Falls back to `status_text`.
#[must_use]
pub fn error_message(payload: &Value, status_text: &str) -> String {
    match payload.get("detail") {
        Some(Value::String(detail)) if !detail.is_empty() => detail.clone(),
        Some(detail) if is_meaningful(detail) => detail.to_string(),
        _ => status_text.to_string(),
    }
}

fn is_meaningful(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => false,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|n| n.abs() > 0.0),
        Value::Bool(true) | Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};
    use serde_json::json;

    use super::*;

    #[test]
    fn content_type_as_str() {
        check!(ContentType::Json.as_str() == "application/json");
        check!(ContentType::Csv.to_string() == "text/csv");
    }

    #[test]
    fn empty_decodes_from_no_content_body() {
        let empty: Empty = from_json(NO_CONTENT_BODY).expect("decode");
        check!(empty == Empty {});

        let value: Value = from_json(NO_CONTENT_BODY).expect("decode");
        check!(value == json!({}));
    }

    #[test]
    fn unit_does_not_decode_from_empty_object() {
        let result: Result<()> = from_json(NO_CONTENT_BODY);
        check!(result.is_err());
    }

    #[test]
    fn from_json_reports_field_path() {
        #[derive(Debug, serde::Deserialize)]
        struct Guardian {
            #[allow(dead_code)]
            email: String,
        }

        #[derive(Debug, serde::Deserialize)]
        struct Student {
            #[allow(dead_code)]
            guardian: Guardian,
        }

        let result: Result<Student> = from_json(br#"{"guardian":{}}"#);
        let_assert!(Err(err) = result);
        let msg = err.to_string();
        check!(msg.contains("guardian"));
        check!(msg.contains("email"));
    }

    #[test]
    fn error_payload_falls_back_to_empty_object() {
        check!(error_payload(b"<html><body>Server Error</body></html>") == json!({}));
        check!(error_payload(b"") == json!({}));
        check!(error_payload(br#"{"detail":"nope"}"#) == json!({"detail": "nope"}));
    }

    #[test]
    fn error_message_prefers_detail() {
        check!(error_message(&json!({"detail": "bad input"}), "Bad Request") == "bad input");
        check!(error_message(&json!({}), "Internal Server Error") == "Internal Server Error");
        check!(error_message(&json!({"detail": ""}), "Forbidden") == "Forbidden");
        check!(error_message(&json!({"detail": null}), "Forbidden") == "Forbidden");
        check!(
            error_message(&json!({"detail": ["term closed"]}), "Conflict") == r#"["term closed"]"#
        );
    }
}
