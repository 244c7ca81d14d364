//! Session lifecycle.
//!
//! A [`Session`] is either *disconnected* (no credentials) or *connected*
//! (session id, CSRF token and cookie all present). [`Session::connect`] and
//! [`Session::disconnect`] move between the two states; every other request
//! goes through [`Session::request`] and its typed helpers.
//!
//! # Locking
//!
//! State lives behind a [`tokio::sync::RwLock`]. Lifecycle transitions hold
//! the write lock for their whole exchange with the server, and ordinary
//! requests hold the read lock for theirs. A request therefore always sees a
//! complete credential set, and a connect or disconnect waits for in-flight
//! requests to finish.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::dispatch::{Dispatcher, Scope, TransportOptions};
use crate::endpoint::{self, Endpoint};
use crate::error::{Error, Result};
use crate::types::{
    AUTH_CONNECTION_REQUEST_TYPE, ConnectParams, ConnectionRequest, ConnectionResponse,
    Credentials, Reply, SessionInfo, Verb,
};

/// Default application name sent to the server.
pub const DEFAULT_APPLICATION: &str = "icws_client";

/// Default `Accept-Language`.
pub const DEFAULT_LANGUAGE: &str = "en-US";

/// Path of the connection resource.
pub const CONNECTION_PATH: &str = "/connection";

/// Informational fields returned by the server at connect time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ServerMetadata {
    pub alternate_hosts: Vec<String>,
    pub user_id: Option<String>,
    pub user_display_name: Option<String>,
    pub server_name: Option<String>,
}

/// Mutable state of a session.
#[derive(Debug, Clone)]
pub(crate) struct SessionState {
    /// Set by the first successful connect; kept across disconnects.
    pub endpoint: Option<Endpoint>,
    pub application: String,
    pub language: String,
    /// Present iff connected.
    pub credentials: Option<Credentials>,
    pub server: Option<ServerMetadata>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            endpoint: None,
            application: DEFAULT_APPLICATION.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            credentials: None,
            server: None,
        }
    }
}

impl SessionState {
    fn info(&self) -> Option<SessionInfo> {
        let credentials = self.credentials.as_ref()?;
        let server = self.server.clone().unwrap_or_default();

        Some(SessionInfo {
            session_id: credentials.session_id.clone(),
            base_url: self
                .endpoint
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
            user_id: server.user_id,
            user_display_name: server.user_display_name,
            server_name: server.server_name,
            alternate_hosts: server.alternate_hosts,
            application: self.application.clone(),
            language: self.language.clone(),
        })
    }
}

/// Result of [`Session::disconnect`].
///
/// Local credentials are cleared in every case; the variants only describe
/// what happened on the server side.
#[derive(Debug)]
#[must_use]
pub enum DisconnectOutcome {
    /// The session was not connected; nothing was sent.
    NotConnected,
    /// The server acknowledged the disconnect.
    Closed,
    /// The server could not be told. The session may linger there until it
    /// times out.
    RemoteFailed(Error),
}

impl DisconnectOutcome {
    /// True unless the remote teardown failed.
    pub fn is_clean(&self) -> bool {
        !matches!(self, DisconnectOutcome::RemoteFailed(_))
    }

    /// The remote failure, if any.
    pub fn remote_error(&self) -> Option<&Error> {
        match self {
            DisconnectOutcome::RemoteFailed(e) => Some(e),
            _ => None,
        }
    }
}

/// ICWS session.
///
/// Cloning is cheap and clones share the same connection.
///
/// # Example
///
/// ```no_run
/// use icws_client::{ConnectParams, Session, Verb};
///
/// # async fn example() -> icws_client::Result<()> {
/// let session = Session::new()?;
/// let info = session
///     .connect(ConnectParams::new("https://cic.example.com:8019", "agent", "1234"))
///     .await?;
/// println!("connected as session {}", info.session_id);
///
/// let reply = session.request(Verb::Get, "/status/user-statuses", None).await?;
/// println!("{:?}", reply.body());
///
/// let _ = session.disconnect().await;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

#[derive(Debug)]
struct SessionInner {
    dispatcher: Dispatcher,
    state: RwLock<SessionState>,
}

impl Session {
    /// Create a new session builder.
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    /// Create a session with default settings.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Connect to a server.
    ///
    /// The address is validated first, then the user and password. No request
    /// is sent if any of them is rejected. On success the session holds fresh
    /// credentials; on failure its previous state is left untouched.
    pub async fn connect(&self, params: ConnectParams) -> Result<SessionInfo> {
        let endpoint = endpoint::resolve(&params.address)?;
        self.connect_to(endpoint, &params).await
    }

    pub(crate) async fn connect_to(
        &self,
        endpoint: Endpoint,
        params: &ConnectParams,
    ) -> Result<SessionInfo> {
        if is_blank(&params.user) {
            return Err(Error::EmptyUser);
        }
        if is_blank(&params.password) {
            return Err(Error::EmptyPassword);
        }

        let mut state = self.inner.state.write().await;

        let mut next = SessionState {
            endpoint: Some(endpoint),
            server: None,
            ..state.clone()
        };
        if let Some(application) = params.application.as_deref().filter(|s| !is_blank(s)) {
            next.application = application.to_string();
        }
        if let Some(language) = params.language.as_deref().filter(|s| !is_blank(s)) {
            next.language = language.to_string();
        }

        let request = ConnectionRequest {
            kind: AUTH_CONNECTION_REQUEST_TYPE,
            application_name: &next.application,
            user_id: &params.user,
            password: &params.password,
            market_place_application_license_name: params
                .marketplace
                .as_ref()
                .map(|m| m.license_name.as_str()),
            market_place_application_code: params
                .marketplace
                .as_ref()
                .map(|m| m.application_code.as_str()),
        };
        let body = serde_json::to_value(&request)?;

        info!(
            server = %next.endpoint.as_ref().map(ToString::to_string).unwrap_or_default(),
            user = %params.user,
            application = %next.application,
            "connecting to ICWS server"
        );

        let reply = self
            .inner
            .dispatcher
            .dispatch(&next, Verb::Post, CONNECTION_PATH, Scope::Unscoped, Some(&body))
            .await?;

        let status = reply.status().as_u16();
        let path = format!("{}{}", crate::dispatch::PATH_PREFIX, CONNECTION_PATH);
        let invalid = |reason: String| Error::InvalidResponse {
            verb: Verb::Post,
            path: path.clone(),
            status,
            reason,
        };

        let cookie = reply
            .cookie()
            .map(str::to_string)
            .ok_or_else(|| Error::MissingCookie {
                verb: Verb::Post,
                path: path.clone(),
                status,
            })?;
        let response: ConnectionResponse = reply.json().map_err(|e| invalid(e.to_string()))?;

        if is_blank(&response.session_id) {
            return Err(invalid("sessionId is missing".to_string()));
        }
        if is_blank(&response.csrf_token) {
            return Err(invalid("csrfToken is missing".to_string()));
        }

        if let Some(previous) = &state.credentials {
            debug!(previous = %previous.session_id, "replacing existing session");
        }

        next.credentials = Some(Credentials {
            session_id: response.session_id,
            csrf_token: response.csrf_token,
            cookie,
        });
        next.server = Some(ServerMetadata {
            alternate_hosts: response.alternate_host_list,
            user_id: response.user_id,
            user_display_name: response.user_display_name,
            server_name: response.ic_server,
        });
        *state = next;

        let info = state.info().ok_or(Error::NotConnected)?;
        info!(
            session_id = %info.session_id,
            server = info.server_name.as_deref().unwrap_or("unknown"),
            "connected to ICWS server"
        );
        Ok(info)
    }

    /// Disconnect from the server.
    ///
    /// Local credentials are cleared before the server is contacted, so the
    /// session is disconnected once this returns (or if the future is
    /// dropped). A failed remote teardown is reported, not raised.
    pub async fn disconnect(&self) -> DisconnectOutcome {
        let mut state = self.inner.state.write().await;
        if state.credentials.is_none() {
            return DisconnectOutcome::NotConnected;
        }

        let previous = state.clone();
        state.credentials = None;
        state.server = None;

        let session_id = previous
            .credentials
            .as_ref()
            .map(|c| c.session_id.clone())
            .unwrap_or_default();
        info!(session_id = %session_id, "disconnecting from ICWS server");

        match self
            .inner
            .dispatcher
            .dispatch(&previous, Verb::Delete, CONNECTION_PATH, Scope::Session, None)
            .await
        {
            Ok(_) => {
                info!(session_id = %session_id, "disconnected");
                DisconnectOutcome::Closed
            }
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "server did not acknowledge disconnect");
                DisconnectOutcome::RemoteFailed(e)
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // State
    // ─────────────────────────────────────────────────────────────────────────

    /// True iff the session holds credentials.
    pub async fn is_connected(&self) -> bool {
        self.inner.state.read().await.credentials.is_some()
    }

    /// Snapshot of the connected session, `None` when disconnected.
    pub async fn info(&self) -> Option<SessionInfo> {
        self.inner.state.read().await.info()
    }

    /// Current credentials, `None` when disconnected.
    pub async fn credentials(&self) -> Option<Credentials> {
        self.inner.state.read().await.credentials.clone()
    }

    /// Current session id.
    pub async fn session_id(&self) -> Option<String> {
        self.credentials().await.map(|c| c.session_id)
    }

    /// Current CSRF token.
    pub async fn csrf_token(&self) -> Option<String> {
        self.credentials().await.map(|c| c.csrf_token)
    }

    /// Current session cookie.
    pub async fn session_cookie(&self) -> Option<String> {
        self.credentials().await.map(|c| c.cookie)
    }

    /// Server of the last successful connect.
    pub async fn endpoint(&self) -> Option<Endpoint> {
        self.inner.state.read().await.endpoint.clone()
    }

    /// Application name sent to the server.
    pub async fn application(&self) -> String {
        self.inner.state.read().await.application.clone()
    }

    /// Language sent in `Accept-Language`.
    pub async fn language(&self) -> String {
        self.inner.state.read().await.language.clone()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Requests
    // ─────────────────────────────────────────────────────────────────────────

    /// Send a request.
    ///
    /// `path` is relative to `/icws/<session id>` when connected, and to
    /// `/icws` otherwise. Fails with [`Error::NotConnected`] if no connect has
    /// ever succeeded, since there is no server to send to.
    pub async fn request(&self, verb: Verb, path: &str, body: Option<&Value>) -> Result<Reply> {
        let state = self.inner.state.read().await;
        self.inner
            .dispatcher
            .dispatch(&state, verb, path, Scope::Session, body)
            .await
    }

    /// Send a GET request and decode the reply.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let reply = self.request(Verb::Get, path, None).await?;
        decode(Verb::Get, path, reply)
    }

    /// Send a POST request and decode the reply.
    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_json(Verb::Post, path, body).await
    }

    /// Send a PUT request and decode the reply.
    pub async fn put<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_json(Verb::Put, path, body).await
    }

    /// Send a PATCH request and decode the reply.
    pub async fn patch<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_json(Verb::Patch, path, body).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, path: &str) -> Result<()> {
        self.request(Verb::Delete, path, None).await?;
        Ok(())
    }

    async fn send_json<T, B>(&self, verb: Verb, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_value(body)?;
        let reply = self.request(verb, path, Some(&body)).await?;
        decode(verb, path, reply)
    }
}

fn decode<T: DeserializeOwned>(verb: Verb, path: &str, reply: Reply) -> Result<T> {
    let status = reply.status().as_u16();
    reply.json().map_err(|e| Error::InvalidResponse {
        verb,
        path: path.to_string(),
        status,
        reason: e.to_string(),
    })
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Builder for creating a [`Session`].
#[derive(Debug)]
pub struct SessionBuilder {
    application: String,
    language: String,
    accept_invalid_certs: bool,
    timeout: Option<Duration>,
    user_agent: Option<String>,
}

impl SessionBuilder {
    /// Create a new builder with defaults.
    pub fn new() -> Self {
        Self {
            application: DEFAULT_APPLICATION.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            accept_invalid_certs: true,
            timeout: None,
            user_agent: None,
        }
    }

    /// Set the default application name.
    pub fn application(mut self, application: impl Into<String>) -> Self {
        self.application = application.into();
        self
    }

    /// Set the default language.
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Accept server certificates that cannot be verified.
    ///
    /// Defaults to `true`: ICWS servers typically present self-signed
    /// certificates. Set to `false` to require a trusted certificate chain.
    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Set a per-request timeout. No timeout is applied by default.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set a custom user agent.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Build the session.
    pub fn build(self) -> Result<Session> {
        let user_agent = self
            .user_agent
            .unwrap_or_else(|| format!("icws-client/{}", env!("CARGO_PKG_VERSION")));

        let dispatcher = Dispatcher::new(&TransportOptions {
            accept_invalid_certs: self.accept_invalid_certs,
            timeout: self.timeout,
            user_agent,
        })?;

        let state = SessionState {
            application: non_blank_or(self.application, DEFAULT_APPLICATION),
            language: non_blank_or(self.language, DEFAULT_LANGUAGE),
            ..SessionState::default()
        };

        Ok(Session {
            inner: Arc::new(SessionInner {
                dispatcher,
                state: RwLock::new(state),
            }),
        })
    }
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn non_blank_or(value: String, default: &str) -> String {
    if is_blank(&value) {
        default.to_string()
    } else {
        value
    }
}
