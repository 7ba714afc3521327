//! Error types for satchel.

use derive_more::{Display, Error, From};
use serde_json::Value;

// ============================================================================
// Error Kind
// ============================================================================

/// Classification of an [`Error`] by where it came from.
///
/// Useful for callers that branch on the failure origin instead of on the
/// concrete variant (see `satchel::Outcome`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ErrorKind {
    /// The API answered 401: the session was invalid or expired.
    #[display("unauthorized")]
    Unauthorized,
    /// The API rejected the request (4xx other than 401).
    #[display("client error")]
    Client,
    /// The API failed (5xx).
    #[display("server error")]
    Server,
    /// The API answered a status outside 2xx, 4xx and 5xx, e.g. a redirect.
    #[display("unexpected status")]
    UnexpectedStatus,
    /// The request never completed.
    #[display("transport error")]
    Transport,
    /// A successful response could not be decoded.
    #[display("decode error")]
    Decode,
    /// The request could not be built, or local session storage failed.
    #[display("invalid request")]
    Invalid,
}

// ============================================================================
// Error Type
// ============================================================================

/// Main error type for satchel operations.
#[derive(Debug, Display, Error, From)]
pub enum Error {
    /// The API answered with a non-2xx status.
    ///
    /// `message` is the server-supplied `detail` when present, the status
    /// text otherwise. `payload` is the parsed error body, `{}` when the body
    /// was empty or not JSON.
    #[display("HTTP error {status}: {message}")]
    #[from(skip)]
    Http {
        /// HTTP status code.
        status: u16,
        /// Human-readable message.
        message: String,
        /// Parsed error body.
        #[error(not(source))]
        payload: Value,
    },

    /// Network/connection errors.
    #[display("connection error: {_0}")]
    #[from(skip)]
    Connection(#[error(not(source))] String),

    /// TLS/SSL errors.
    #[display("TLS error: {_0}")]
    #[from(skip)]
    Tls(#[error(not(source))] String),

    /// Invalid request configuration.
    #[display("invalid request: {_0}")]
    #[from(skip)]
    InvalidRequest(#[error(not(source))] String),

    /// JSON serialization error.
    #[display("JSON serialization error: {_0}")]
    #[from]
    JsonSerialization(serde_json::Error),

    /// JSON deserialization error with path context.
    #[display("JSON deserialization error at '{path}': {message}")]
    #[from(skip)]
    JsonDeserialization {
        /// JSON path to the error (e.g., "results[2].guardian.email").
        path: String,
        /// Error message.
        message: String,
    },

    /// URL parsing error.
    #[display("invalid URL: {_0}")]
    #[from]
    InvalidUrl(url::ParseError),

    /// The token store could not be read or written.
    #[display("token store error: {_0}")]
    #[from(skip)]
    TokenStore(#[error(not(source))] String),
}

/// Result type alias using [`crate::Error`].
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an HTTP error with an empty payload.
    #[must_use]
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::http_with_payload(status, message, Value::Object(serde_json::Map::new()))
    }

    /// Create an HTTP error carrying the parsed error body.
    #[must_use]
    pub fn http_with_payload(status: u16, message: impl Into<String>, payload: Value) -> Self {
        Self::Http {
            status,
            message: message.into(),
            payload,
        }
    }

    /// Create a connection error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create a TLS error.
    #[must_use]
    pub fn tls(message: impl Into<String>) -> Self {
        Self::Tls(message.into())
    }

    /// Create an invalid request error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Create a JSON deserialization error with path context.
    #[must_use]
    pub fn json_deserialization(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::JsonDeserialization {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a token store error.
    #[must_use]
    pub fn token_store(message: impl Into<String>) -> Self {
        Self::TokenStore(message.into())
    }

    /// Returns the HTTP status code if this is an HTTP error.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns the HTTP error message, if this is an HTTP error.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Http { message, .. } => Some(message),
            _ => None,
        }
    }

    /// Returns the parsed error body if this is an HTTP error.
    #[must_use]
    pub const fn payload(&self) -> Option<&Value> {
        match self {
            Self::Http { payload, .. } => Some(payload),
            _ => None,
        }
    }

    /// Returns `true` if the API answered 401.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Returns `true` if this is a client error (4xx).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        self.status().is_some_and(|s| (400..500).contains(&s))
    }

    /// Returns `true` if this is a server error (5xx).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status().is_some_and(|s| (500..600).contains(&s))
    }

    /// Returns `true` if the request never completed.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Tls(_))
    }

    /// Classify this error by origin.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Http { status: 401, .. } => ErrorKind::Unauthorized,
            Self::Http { status, .. } if (400..500).contains(status) => ErrorKind::Client,
            Self::Http { status, .. } if (500..600).contains(status) => ErrorKind::Server,
            Self::Http { .. } => ErrorKind::UnexpectedStatus,
            Self::Connection(_) | Self::Tls(_) => ErrorKind::Transport,
            Self::JsonDeserialization { .. } => ErrorKind::Decode,
            Self::JsonSerialization(_)
            | Self::InvalidRequest(_)
            | Self::InvalidUrl(_)
            | Self::TokenStore(_) => ErrorKind::Invalid,
        }
    }

    /// Decode the error payload into a caller-specific type.
    ///
    /// Returns `None` for non-HTTP errors. Field-level validation errors are
    /// the usual target:
    ///
    /// ```ignore
    /// #[derive(Deserialize)]
    /// struct EnrollmentErrors {
    ///     #[serde(default)]
    ///     student: Vec<String>,
    /// }
    ///
    /// if let Some(Ok(errors)) = err.decode_payload::<EnrollmentErrors>() {
    ///     show_inline(errors.student);
    /// }
    /// ```
    pub fn decode_payload<T: serde::de::DeserializeOwned>(&self) -> Option<Result<T>> {
        self.payload().map(|payload| {
            serde_path_to_error::deserialize(payload).map_err(|e| {
                Self::json_deserialization(e.path().to_string(), e.inner().to_string())
            })
        })
    }
}
