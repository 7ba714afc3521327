//! The API client.
//!
//! [`ApiClient`] is the single path between the application and the API.
//! Every call is built and sent the same way:
//!
//! 1. resolves the path against the configured base URL and appends the
//!    non-empty query parameters,
//! 2. sets `content-type: application/json` (multipart for form uploads),
//!    merges caller headers, then adds `authorization: Bearer <token>` when
//!    the session holds a token,
//! 3. sends the request once,
//! 4. on a 401, clears the session and navigates to the login route before
//!    the error is returned.
//!
//! Typed calls decode 2xx bodies into `T`, with 204 decoding as `{}`; every
//! other status becomes [`Error::Http`](crate::Error::Http).
//!
//! ```ignore
//! use satchel::{ApiClient, ClientConfig, FileTokenStore, QueryParams};
//!
//! let api = ApiClient::builder(ClientConfig::from_env()?)
//!     .token_store(FileTokenStore::in_dir(data_dir))
//!     .navigator(|route: &str| router.push(route))
//!     .build();
//!
//! let login: LoginResponse = api.post("/auth/login/", &credentials).await?;
//! api.set_token(Some(&login.token))?;
//!
//! let students: Vec<Student> = api
//!     .get_list("/students/", &QueryParams::new().param("class_id", class_id))
//!     .await?;
//! ```

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::{
    Blob, CONTENT_TYPE, ClientConfig, ContentType, Form, HttpClient, HyperClient,
    ListEnvelope, Method, Navigator, QueryParams, Request, Response, Result, Session,
    SessionState, TokenStore, config::TransportConfig, middleware::LoggingLayer,
};

// ============================================================================
// Client
// ============================================================================

/// Typed client for the school-management API.
///
/// Cloning is cheap: clones share the transport, the session and the
/// navigator.
pub struct ApiClient<C = HyperClient> {
    transport: C,
    config: Arc<ClientConfig>,
    session: Arc<Session>,
    navigator: Option<Arc<dyn Navigator>>,
}

impl<C: Clone> Clone for ApiClient<C> {
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
            config: Arc::clone(&self.config),
            session: Arc::clone(&self.session),
            navigator: self.navigator.clone(),
        }
    }
}

impl<C> fmt::Debug for ApiClient<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.config.base_url.as_str())
            .field("login_route", &self.config.login_route)
            .field("session", &self.session)
            .field("navigator", &self.navigator.is_some())
            .finish_non_exhaustive()
    }
}

impl ApiClient<HyperClient> {
    /// Create a client over the default transport with an in-memory session
    /// and no navigator.
    #[must_use]
    pub fn new(config: ClientConfig) -> Self {
        Self::builder(config).build()
    }

    /// Create a client from `SATCHEL_API_URL` and `SATCHEL_LOGIN_ROUTE`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be read.
    pub fn from_env() -> Result<Self> {
        ClientConfig::from_env().map(Self::new)
    }

    /// Create a new client builder.
    #[must_use]
    pub fn builder(config: ClientConfig) -> ApiClientBuilder {
        ApiClientBuilder::new(config)
    }
}

impl<C> ApiClient<C> {
    /// Client configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The shared session.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// The transport.
    #[must_use]
    pub const fn transport(&self) -> &C {
        &self.transport
    }

    /// Store a new token, or sign out with `None`.
    ///
    /// Subsequent calls carry (or stop carrying) the bearer header.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TokenStore`](crate::Error::TokenStore) if the token
    /// could not be persisted; the in-memory session is updated regardless.
    pub fn set_token(&self, token: Option<&str>) -> Result<()> {
        self.session.set(token)
    }

    /// The current token, read from storage on first use.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.session.token()
    }

    /// Sign out. Equivalent to `set_token(None)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TokenStore`](crate::Error::TokenStore) if the stored
    /// token could not be removed.
    pub fn logout(&self) -> Result<()> {
        self.session.clear()
    }

    /// Current session state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    /// Start a call with full control over query, headers and body.
    pub fn request(&self, method: Method, path: impl Into<String>) -> Call<'_, C> {
        Call::new(self, method, path.into())
    }

    fn prepare(
        &self,
        method: Method,
        path: &str,
        query: &QueryParams,
        headers: &[(String, String)],
        body: Payload,
    ) -> Result<Request<Bytes>> {
        let url = self.config.endpoint(path)?;

        let mut builder = Request::builder(method, url).query(query);
        if !matches!(body, Payload::Form(_)) {
            builder = builder.header(CONTENT_TYPE, ContentType::Json.as_str());
        }
        builder = builder.headers(headers.iter().map(|(name, value)| (name, value.clone())));

        builder = match body {
            Payload::Empty => builder,
            Payload::Json(bytes) => builder.body(bytes),
            Payload::Form(form) => builder.multipart(form),
        };

        // Read at call time so a token set or cleared meanwhile is honored
        if let Some(token) = self.session.token() {
            builder = builder.bearer_auth(&token);
        }

        Ok(builder.build())
    }

    fn handle_unauthorized(&self) {
        warn!(
            login_route = %self.config.login_route,
            "API rejected the session, signing out"
        );
        if let Err(error) = self.session.clear() {
            warn!(%error, "could not remove stored session token");
        }
        if let Some(navigator) = &self.navigator {
            navigator.navigate(&self.config.login_route);
        }
    }
}

impl<C: HttpClient> ApiClient<C> {
    /// Send a prepared request once and apply the session side effects of
    /// the response.
    ///
    /// The response is returned whatever its status; callers decide how to
    /// decode it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`](crate::Error::Connection) or
    /// [`Error::Tls`](crate::Error::Tls) if the request did not complete.
    pub async fn dispatch(&self, request: Request<Bytes>) -> Result<Response<Bytes>> {
        let method = request.method();
        let response = self.transport.execute(request).await?;
        if response.is_unauthorized() {
            self.handle_unauthorized();
        } else if !response.is_success() {
            debug!(%method, status = response.status(), "API returned an error status");
        }
        Ok(response)
    }

    /// `GET` a resource.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`](crate::Error::Http) for non-2xx responses, a
    /// transport error if the request did not complete, or a decode error if
    /// the body does not match `T`.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.request(Method::Get, path).send().await
    }

    /// `GET` a resource with query parameters. Absent and empty values are
    /// left out of the URL.
    ///
    /// # Errors
    ///
    /// See [`get`](Self::get).
    pub async fn get_query<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &QueryParams,
    ) -> Result<T> {
        self.request(Method::Get, path).query(params).send().await
    }

    /// `GET` a list, accepting any of the API's list envelopes.
    ///
    /// A 204 yields an empty list.
    ///
    /// # Errors
    ///
    /// See [`get`](Self::get).
    pub async fn get_list<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &QueryParams,
    ) -> Result<Vec<T>> {
        let response = self
            .request(Method::Get, path)
            .query(params)
            .send_raw()
            .await?
            .error_for_status()?;
        if response.is_no_content() {
            return Ok(Vec::new());
        }
        ListEnvelope::decode(response.body()).map(ListEnvelope::into_items)
    }

    /// `POST` a JSON body.
    ///
    /// # Errors
    ///
    /// See [`get`](Self::get); also fails if `body` cannot be serialized.
    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::Post, path).json(body).send().await
    }

    /// `POST` without a body.
    ///
    /// # Errors
    ///
    /// See [`get`](Self::get).
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.request(Method::Post, path).send().await
    }

    /// `PUT` a JSON body.
    ///
    /// # Errors
    ///
    /// See [`post`](Self::post).
    pub async fn put<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::Put, path).json(body).send().await
    }

    /// `PATCH` a JSON body.
    ///
    /// # Errors
    ///
    /// See [`post`](Self::post).
    pub async fn patch<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::Patch, path).json(body).send().await
    }

    /// `DELETE` a resource. Most deletes answer 204, so `T` is usually
    /// [`Empty`](crate::Empty).
    ///
    /// # Errors
    ///
    /// See [`get`](Self::get).
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.request(Method::Delete, path).send().await
    }

    /// `POST` a multipart form. The request never carries a JSON content
    /// type.
    ///
    /// # Errors
    ///
    /// See [`get`](Self::get).
    pub async fn post_form_data<T: DeserializeOwned>(&self, path: &str, form: Form) -> Result<T> {
        self.request(Method::Post, path).send_form(form).await
    }

    /// `GET` a binary download.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`](crate::Error::Http) for non-2xx responses or
    /// a transport error.
    pub async fn get_blob(&self, path: &str) -> Result<Blob> {
        self.request(Method::Get, path).send_blob().await
    }

    /// `GET` a binary download with query parameters.
    ///
    /// # Errors
    ///
    /// See [`get_blob`](Self::get_blob).
    pub async fn get_blob_query(&self, path: &str, params: &QueryParams) -> Result<Blob> {
        self.request(Method::Get, path)
            .query(params)
            .send_blob()
            .await
    }
}

// ============================================================================
// Call
// ============================================================================

enum Payload {
    Empty,
    Json(Bytes),
    Form(Form),
}

/// A single API call under construction.
///
/// Created by [`ApiClient::request`].
///
/// ```ignore
/// let updated: Enrollment = api
///     .request(Method::Patch, format!("/enrollments/{id}/"))
///     .header("If-Match", etag)
///     .json(&changes)
///     .send()
///     .await?;
/// ```
#[must_use = "a call does nothing until it is sent"]
pub struct Call<'a, C> {
    client: &'a ApiClient<C>,
    method: Method,
    path: String,
    query: QueryParams,
    headers: Vec<(String, String)>,
    body: Result<Option<Bytes>>,
}

impl<C> fmt::Debug for Call<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Call")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("query", &self.query)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

impl<'a, C> Call<'a, C> {
    fn new(client: &'a ApiClient<C>, method: Method, path: String) -> Self {
        Self {
            client,
            method,
            path,
            query: QueryParams::new(),
            headers: Vec::new(),
            body: Ok(None),
        }
    }

    /// Add query parameters.
    pub fn query(mut self, params: &QueryParams) -> Self {
        self.query.extend_from(params);
        self
    }

    /// Add a header. Later values for the same name win.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set a JSON body. Serialization errors are reported when the call is
    /// sent.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Self {
        self.body = crate::to_json(body).map(Some);
        self
    }

    fn into_request(self, form: Option<Form>) -> Result<(&'a ApiClient<C>, Request<Bytes>)> {
        let payload = match (form, self.body?) {
            (Some(form), _) => Payload::Form(form),
            (None, Some(bytes)) => Payload::Json(bytes),
            (None, None) => Payload::Empty,
        };
        let request =
            self.client
                .prepare(self.method, &self.path, &self.query, &self.headers, payload)?;
        Ok((self.client, request))
    }
}

impl<C: HttpClient> Call<'_, C> {
    /// Send and return the raw response, whatever its status.
    ///
    /// A 401 still clears the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be built or does not complete.
    pub async fn send_raw(self) -> Result<Response<Bytes>> {
        let (client, request) = self.into_request(None)?;
        client.dispatch(request).await
    }

    /// Send and decode the response into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`](crate::Error::Http) for non-2xx responses, a
    /// transport error, or a decode error.
    pub async fn send<T: DeserializeOwned>(self) -> Result<T> {
        self.send_raw().await?.into_result()
    }

    /// Send `form` as a multipart body and decode the response into `T`.
    ///
    /// Any JSON body set on the call is dropped, and the multipart content
    /// type replaces any caller content type.
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send).
    pub async fn send_form<T: DeserializeOwned>(self, form: Form) -> Result<T> {
        let (client, request) = self.into_request(Some(form))?;
        client.dispatch(request).await?.into_result()
    }

    /// Send and return the response body as a [`Blob`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`](crate::Error::Http) for non-2xx responses or
    /// a transport error.
    pub async fn send_blob(self) -> Result<Blob> {
        Blob::from_response(self.send_raw().await?)
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`ApiClient`].
pub struct ApiClientBuilder {
    config: ClientConfig,
    session: Option<Arc<Session>>,
    navigator: Option<Arc<dyn Navigator>>,
    logging: bool,
}

impl fmt::Debug for ApiClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClientBuilder")
            .field("config", &self.config)
            .field("session", &self.session)
            .field("navigator", &self.navigator.is_some())
            .field("logging", &self.logging)
            .finish()
    }
}

impl ApiClientBuilder {
    /// Start a builder with the given configuration.
    #[must_use]
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            session: None,
            navigator: None,
            logging: true,
        }
    }

    /// Persist the session token through `store`.
    #[must_use]
    pub fn token_store(mut self, store: impl TokenStore + 'static) -> Self {
        self.session = Some(Arc::new(Session::new(store)));
        self
    }

    /// Share an existing session, e.g. with another client.
    #[must_use]
    pub fn session(mut self, session: Arc<Session>) -> Self {
        self.session = Some(session);
        self
    }

    /// Where to send the user after a 401.
    #[must_use]
    pub fn navigator(mut self, navigator: impl Navigator + 'static) -> Self {
        self.navigator = Some(Arc::new(navigator));
        self
    }

    /// Disable the request logging layer of the default transport.
    #[must_use]
    pub const fn without_logging(mut self) -> Self {
        self.logging = false;
        self
    }

    /// Build a client over the default hyper transport.
    #[must_use]
    pub fn build(self) -> ApiClient<HyperClient> {
        let transport = transport_for(&self.config.transport, self.logging);
        self.build_with_transport(transport)
    }

    /// Build a client over a custom transport.
    #[must_use]
    pub fn build_with_transport<C: HttpClient>(self, transport: C) -> ApiClient<C> {
        ApiClient {
            transport,
            config: Arc::new(self.config),
            session: self
                .session
                .unwrap_or_else(|| Arc::new(Session::ephemeral())),
            navigator: self.navigator,
        }
    }
}

fn transport_for(config: &TransportConfig, logging: bool) -> HyperClient {
    let builder = HyperClient::builder().config(config.clone());
    if logging {
        builder.layer(LoggingLayer::new()).build()
    } else {
        builder.build()
    }
}
