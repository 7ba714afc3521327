//! Core types for the satchel school-management API client.
//!
//! This crate provides the transport-agnostic pieces used by `satchel`:
//! - [`Method`] - HTTP method enum
//! - [`Request`] and [`RequestBuilder`] - HTTP request types
//! - [`Response`] - HTTP response type and the success/error contract
//! - [`Error`], [`ErrorKind`] and [`Result`] - Error handling
//! - [`QueryParams`] - Query parameters with empty-value filtering
//! - [`Form`] and [`Part`] - Multipart uploads
//! - [`Blob`] - Binary downloads
//! - [`ListEnvelope`] - Normalization of list response shapes
//! - [`Session`], [`TokenStore`] and [`Navigator`] - Token lifecycle
//! - [`HttpClient`] - Transport trait

mod blob;
mod body;
mod client;
mod envelope;
mod error;
mod method;
mod multipart;
pub mod prelude;
mod query;
mod request;
mod response;
mod session;

pub use blob::Blob;
pub use body::{ContentType, Empty, error_message, error_payload, from_json, to_json};
pub use client::HttpClient;
pub use envelope::ListEnvelope;
pub use error::{Error, ErrorKind, Result};
pub use method::Method;
pub use multipart::{Form, Part};
pub use query::{QueryParams, QueryValue};
pub use request::{AUTHORIZATION, CONTENT_TYPE, Request, RequestBuilder};
pub use response::Response;
pub use session::{
    FileTokenStore, MemoryTokenStore, Navigator, Session, SessionState, TOKEN_KEY, TokenStore,
};

// Re-export http crate types for status codes and headers
pub use http::{StatusCode, header};
