//! HTTP response handling.
//!
//! [`Response`] provides access to status, headers, and body with JSON deserialization.
//! [`Response::into_result`] applies the API's success/error contract:
//! 204 decodes as `{}`, other 2xx decode the body, anything else becomes an
//! [`Error::Http`](crate::Error::Http).

use std::collections::HashMap;

use bytes::Bytes;

use crate::body::NO_CONTENT_BODY;
use crate::{Error, Result, error_message, error_payload};

/// HTTP response with status, headers, and body.
#[derive(Debug, Clone)]
pub struct Response<B = Bytes> {
    status: u16,
    headers: HashMap<String, String>,
    body: B,
}

impl<B> Response<B> {
    /// Creates a new response. Header names are stored lowercased.
    #[must_use]
    pub fn new(status: u16, headers: HashMap<String, String>, body: B) -> Self {
        let headers = headers
            .into_iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value))
            .collect();
        Self {
            status,
            headers,
            body,
        }
    }

    /// HTTP status code.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Canonical reason phrase for the status (`"Not Found"`), or
    /// `"HTTP <status>"` for codes without one.
    #[must_use]
    pub fn status_text(&self) -> String {
        http::StatusCode::from_u16(self.status)
            .ok()
            .and_then(|status| status.canonical_reason())
            .map_or_else(|| format!("HTTP {}", self.status), str::to_string)
    }

    /// Response headers, keyed by lowercase name.
    #[must_use]
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Single header value by name (any case).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Response body.
    #[must_use]
    pub const fn body(&self) -> &B {
        &self.body
    }

    /// Consume into body.
    #[must_use]
    pub fn into_body(self) -> B {
        self.body
    }

    /// Status is 2xx.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Status is 204 No Content.
    #[must_use]
    pub const fn is_no_content(&self) -> bool {
        self.status == 204
    }

    /// Status is 401 Unauthorized.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        self.status == 401
    }
}

impl Response<Bytes> {
    /// Deserialize the response body as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        crate::from_json(&self.body)
    }

    /// Build the typed error for a non-2xx response.
    ///
    /// The body is parsed as JSON when possible and `{}` otherwise; the
    /// message is the `detail` field or the status text.
    #[must_use]
    pub fn to_error(&self) -> Error {
        let payload = error_payload(&self.body);
        let message = error_message(&payload, &self.status_text());
        Error::http_with_payload(self.status, message, payload)
    }

    /// Fail with the typed error unless the status is 2xx.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] for any non-2xx status.
    pub fn error_for_status(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(self.to_error())
        }
    }

    /// Apply the API contract and decode the body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] for non-2xx responses and
    /// [`Error::JsonDeserialization`] when a 2xx body does not match `T`.
    pub fn into_result<T: serde::de::DeserializeOwned>(self) -> Result<T> {
        let response = self.error_for_status()?;
        if response.is_no_content() {
            return crate::from_json(NO_CONTENT_BODY);
        }
        response.json()
    }
}
