//! Request/response logging middleware.
//!
//! Logs each call through `tracing` with its status and elapsed time. At
//! debug level the request headers are logged too, with the bearer token
//! replaced by a placeholder.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use bytes::Bytes;
use tower::{Layer, Service};
use tracing::{Instrument, Level, debug, info, span, warn};

use crate::{AUTHORIZATION, Error, Request, Response, Result};

const REDACTED: &str = "<redacted>";

/// Layer that adds request/response logging.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingLayer {
    level: LogLevel,
}

/// Log level for the logging middleware.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    /// Log at debug level, including request headers.
    Debug,
    /// Log at info level (summary only).
    #[default]
    Info,
}

impl LoggingLayer {
    /// Create a new logging layer with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a logging layer that logs at debug level.
    #[must_use]
    pub fn debug() -> Self {
        Self {
            level: LogLevel::Debug,
        }
    }

    /// Configured level.
    #[must_use]
    pub const fn level(&self) -> LogLevel {
        self.level
    }
}

impl<S> Layer<S> for LoggingLayer {
    type Service = Logging<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Logging {
            inner,
            level: self.level,
        }
    }
}

/// Service that logs requests and responses.
#[derive(Debug, Clone)]
pub struct Logging<S> {
    inner: S,
    level: LogLevel,
}

impl<S> Logging<S> {
    /// Create a new logging service wrapping the given service.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            level: LogLevel::Info,
        }
    }
}

/// Request headers in a stable order, with credentials masked.
fn loggable_headers(request: &Request<Bytes>) -> BTreeMap<&str, &str> {
    request
        .headers()
        .iter()
        .map(|(name, value)| {
            let value = if name == AUTHORIZATION {
                REDACTED
            } else {
                value.as_str()
            };
            (name.as_str(), value)
        })
        .collect()
}

impl<S> Service<Request<Bytes>> for Logging<S>
where
    S: Service<Request<Bytes>, Response = Response<Bytes>, Error = Error> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response<Bytes>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<()>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Bytes>) -> Self::Future {
        let method = request.method();
        let url = request.url().to_string();
        let authenticated = request.header(AUTHORIZATION).is_some();

        let span = span!(Level::INFO, "api_request", %method, %url);

        match self.level {
            LogLevel::Debug => {
                let headers = loggable_headers(&request);
                let _guard = span.enter();
                debug!(?headers, authenticated, "sending request");
            }
            LogLevel::Info => {
                let _guard = span.enter();
                info!(authenticated, "sending request");
            }
        }

        let mut inner = self.inner.clone();
        Box::pin(
            async move {
                let start = Instant::now();
                let result = inner.call(request).await;

                // Saturating conversion to u64
                let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

                match &result {
                    Ok(response) if response.is_success() => {
                        info!(status = response.status(), elapsed_ms, "request completed");
                    }
                    Ok(response) => {
                        warn!(
                            status = response.status(),
                            elapsed_ms, "request failed with HTTP error"
                        );
                    }
                    Err(err) => {
                        warn!(error = %err, elapsed_ms, "request failed");
                    }
                }

                result
            }
            .instrument(span),
        )
    }
}

#[cfg(test)]
mod tests {
    use assert2::check;

    use super::*;
    use crate::Method;

    #[test]
    fn logging_layer_default() {
        check!(LoggingLayer::new().level() == LogLevel::Info);
    }

    #[test]
    fn logging_layer_debug() {
        check!(LoggingLayer::debug().level() == LogLevel::Debug);
    }

    #[test]
    fn authorization_is_redacted() {
        let url = url::Url::parse("https://api.school.test/api/me/").expect("url");
        let request = Request::<Bytes>::builder(Method::Get, url)
            .bearer_auth("secret-token")
            .header("Accept", "application/json")
            .build();

        let headers = loggable_headers(&request);
        check!(headers.get("authorization") == Some(&REDACTED));
        check!(headers.get("accept") == Some(&"application/json"));
        check!(!format!("{headers:?}").contains("secret-token"));
    }
}
