//! HTTP methods used by the API client.

use derive_more::Display;

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Method {
    /// Read a resource or a filtered list.
    #[display("GET")]
    Get,
    /// Create a resource or trigger an action.
    #[display("POST")]
    Post,
    /// Replace a resource.
    #[display("PUT")]
    Put,
    /// Partially update a resource.
    #[display("PATCH")]
    Patch,
    /// Remove a resource.
    #[display("DELETE")]
    Delete,
}

impl Method {
    /// Returns `true` if repeating the call has no additional effect.
    #[must_use]
    pub const fn is_idempotent(&self) -> bool {
        matches!(self, Self::Get | Self::Put | Self::Delete)
    }
}

impl From<Method> for http::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => Self::GET,
            Method::Post => Self::POST,
            Method::Put => Self::PUT,
            Method::Patch => Self::PATCH,
            Method::Delete => Self::DELETE,
        }
    }
}

impl TryFrom<http::Method> for Method {
    type Error = crate::Error;

    fn try_from(method: http::Method) -> Result<Self, Self::Error> {
        match method {
            http::Method::GET => Ok(Self::Get),
            http::Method::POST => Ok(Self::Post),
            http::Method::PUT => Ok(Self::Put),
            http::Method::PATCH => Ok(Self::Patch),
            http::Method::DELETE => Ok(Self::Delete),
            other => Err(crate::Error::invalid_request(format!(
                "unsupported HTTP method: {other}"
            ))),
        }
    }
}
