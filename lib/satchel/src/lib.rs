//! Typed REST client for the school-management API.
//!
//! [`ApiClient`] attaches the session's bearer token, encodes JSON bodies and
//! query strings, normalizes error responses into [`Error::Http`], signs the
//! user out on a 401, and handles binary downloads and multipart uploads.
//!
//! # Example
//!
//! ```ignore
//! use satchel::prelude::*;
//!
//! #[derive(Debug, Deserialize)]
//! struct Student {
//!     id: u64,
//!     name: String,
//! }
//!
//! let api = ApiClient::builder(ClientConfig::from_env()?)
//!     .token_store(FileTokenStore::in_dir(".satchel"))
//!     .build();
//!
//! let students: Vec<Student> = api
//!     .get_list("/students/", &QueryParams::new().param("grade", 5))
//!     .await?;
//! ```

mod api_client;
mod config;
mod connector;
pub mod middleware;
mod outcome;
pub mod prelude;
mod transport;

pub use api_client::{ApiClient, ApiClientBuilder, Call};
pub use config::{
    API_URL_VAR, ClientConfig, ClientConfigBuilder, DEFAULT_LOGIN_ROUTE, LOGIN_ROUTE_VAR,
    TransportConfig,
};
pub use outcome::{IntoOutcome, Outcome};
pub use transport::{BoxedService, HyperClient, HyperClientBuilder, ServiceFuture};

// Re-export tower for middleware composition
pub use tower;

pub use satchel_core::{
    AUTHORIZATION, Blob, CONTENT_TYPE, ContentType, Empty, Error, ErrorKind, FileTokenStore, Form,
    HttpClient, ListEnvelope, MemoryTokenStore, Method, Navigator, Part, QueryParams, QueryValue,
    Request, RequestBuilder, Response, Result, Session, SessionState, TOKEN_KEY, TokenStore,
    from_json, to_json,
};

// Re-export http types for status codes and headers
pub use satchel_core::{StatusCode, header};

pub use url;
