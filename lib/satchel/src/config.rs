//! Client configuration types.
//!
//! The API root and login route are deployment settings; they are usually
//! read from the environment with [`ClientConfig::from_env`].

use std::time::Duration;

use url::Url;

use crate::{Error, Result};

/// Environment variable holding the API root URL.
pub const API_URL_VAR: &str = "SATCHEL_API_URL";

/// Environment variable overriding the login route.
pub const LOGIN_ROUTE_VAR: &str = "SATCHEL_LOGIN_ROUTE";

/// Route the user is sent to when the API rejects the session.
pub const DEFAULT_LOGIN_ROUTE: &str = "/login";

/// Connection settings for [`HyperClient`](crate::HyperClient).
///
/// There is deliberately no request timeout: a call resolves or fails on its
/// own.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Maximum idle connections per host.
    pub pool_idle_per_host: usize,
    /// Idle connection timeout.
    pub pool_idle_timeout: Duration,
    /// `User-Agent` sent with every request.
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            pool_idle_per_host: 32,
            pool_idle_timeout: Duration::from_secs(90),
            user_agent: concat!("satchel/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Configuration for [`ApiClient`](crate::ApiClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API root; request paths are appended to it.
    pub base_url: Url,
    /// Route passed to the navigator after a 401.
    pub login_route: String,
    /// Connection settings.
    pub transport: TransportConfig,
}

impl ClientConfig {
    /// Create a configuration for the given API root.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        Self::builder(base_url).build()
    }

    /// Create a new configuration builder.
    #[must_use]
    pub fn builder(base_url: impl AsRef<str>) -> ClientConfigBuilder {
        ClientConfigBuilder::new(base_url)
    }

    /// Read the configuration from `SATCHEL_API_URL` and, optionally,
    /// `SATCHEL_LOGIN_ROUTE`.
    ///
    /// # Errors
    ///
    /// Returns an error if `SATCHEL_API_URL` is unset or not a valid URL.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let base_url = lookup(API_URL_VAR)
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| Error::invalid_request(format!("{API_URL_VAR} is not set")))?;

        let mut builder = Self::builder(base_url.trim());
        if let Some(route) = lookup(LOGIN_ROUTE_VAR).filter(|route| !route.is_empty()) {
            builder = builder.login_route(route);
        }
        builder.build()
    }

    /// Absolute URL for an API path.
    ///
    /// The path is appended to the base URL as-is, so a base of
    /// `https://school.test/api` and a path of `/students/` give
    /// `https://school.test/api/students/`.
    ///
    /// # Errors
    ///
    /// Returns an error if the result is not a valid URL.
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let url = if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        };
        Url::parse(&url).map_err(Error::InvalidUrl)
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug, Clone)]
pub struct ClientConfigBuilder {
    base_url: String,
    login_route: Option<String>,
    pool_idle_per_host: Option<usize>,
    pool_idle_timeout: Option<Duration>,
    user_agent: Option<String>,
}

impl ClientConfigBuilder {
    /// Start a builder for the given API root.
    #[must_use]
    pub fn new(base_url: impl AsRef<str>) -> Self {
        Self {
            base_url: base_url.as_ref().to_string(),
            login_route: None,
            pool_idle_per_host: None,
            pool_idle_timeout: None,
            user_agent: None,
        }
    }

    /// Set the login route.
    #[must_use]
    pub fn login_route(mut self, route: impl Into<String>) -> Self {
        self.login_route = Some(route.into());
        self
    }

    /// Set the maximum idle connections per host.
    #[must_use]
    pub const fn pool_idle_per_host(mut self, count: usize) -> Self {
        self.pool_idle_per_host = Some(count);
        self
    }

    /// Set the idle connection timeout.
    #[must_use]
    pub const fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = Some(timeout);
        self
    }

    /// Set the `User-Agent` header.
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Build the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL cannot be parsed or is not
    /// `http`/`https`.
    pub fn build(self) -> Result<ClientConfig> {
        let base_url = Url::parse(&self.base_url)?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(Error::invalid_request(format!(
                "API URL must be http or https, got `{}`",
                base_url.scheme()
            )));
        }

        let defaults = TransportConfig::default();
        Ok(ClientConfig {
            base_url,
            login_route: self
                .login_route
                .unwrap_or_else(|| DEFAULT_LOGIN_ROUTE.to_string()),
            transport: TransportConfig {
                pool_idle_per_host: self
                    .pool_idle_per_host
                    .unwrap_or(defaults.pool_idle_per_host),
                pool_idle_timeout: self.pool_idle_timeout.unwrap_or(defaults.pool_idle_timeout),
                user_agent: self.user_agent.unwrap_or(defaults.user_agent),
            },
        })
    }
}
