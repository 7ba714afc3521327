//! The transport seam.
//!
//! [`HttpClient`] executes one fully built request. `satchel` ships a
//! hyper-based implementation; tests and embedders can provide their own.

use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;

use crate::{Request, Response, Result};

/// Core HTTP client trait.
///
/// Implementations make exactly one attempt per call: no retries, no
/// timeouts. A request that never completes must surface as
/// [`Error::Connection`](crate::Error::Connection) or
/// [`Error::Tls`](crate::Error::Tls), and every response that does arrive,
/// whatever its status, must be returned as `Ok`.
pub trait HttpClient: Send + Sync {
    /// Execute an HTTP request and return the response.
    ///
    /// # Errors
    ///
    /// Returns an error if the request does not complete:
    /// - Network errors
    /// - TLS errors
    /// - Invalid request
    fn execute(
        &self,
        request: Request<Bytes>,
    ) -> impl Future<Output = Result<Response<Bytes>>> + Send;
}

impl<C: HttpClient> HttpClient for Arc<C> {
    fn execute(
        &self,
        request: Request<Bytes>,
    ) -> impl Future<Output = Result<Response<Bytes>>> + Send {
        (**self).execute(request)
    }
}
