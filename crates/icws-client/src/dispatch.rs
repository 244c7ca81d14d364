//! Request dispatcher.
//!
//! Turns one `(verb, path, body)` triple into a single HTTP exchange against
//! the session's server, then classifies the response into a [`Reply`] or an
//! [`Error`].

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{
    ACCEPT_LANGUAGE, CONTENT_LENGTH, CONTENT_TYPE, COOKIE, HeaderMap, HeaderName, HeaderValue,
    SET_COOKIE,
};
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::error::{Error, Result, classify_failure};
use crate::session::SessionState;
use crate::types::{Reply, Verb};

/// Root of every ICWS resource path.
pub const PATH_PREFIX: &str = "/icws";

/// Anti-forgery header carried by every authenticated request.
pub const CSRF_TOKEN_HEADER: HeaderName = HeaderName::from_static("inin-icws-csrf-token");

/// Whether a path lives under the session id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Scope {
    /// `/icws/<path>`, used to create a connection.
    Unscoped,
    /// `/icws/<session id>/<path>` once connected, `/icws/<path>` otherwise.
    Session,
}

/// Transport settings.
#[derive(Debug, Clone)]
pub(crate) struct TransportOptions {
    pub accept_invalid_certs: bool,
    pub timeout: Option<Duration>,
    pub user_agent: String,
}

/// Performs HTTP exchanges on behalf of a session.
#[derive(Debug)]
pub(crate) struct Dispatcher {
    http: reqwest::Client,
    timeout: Option<Duration>,
}

impl Dispatcher {
    /// Build the HTTP client.
    ///
    /// With `accept_invalid_certs` set, server certificates are not verified.
    /// ICWS servers are commonly deployed with self-signed certificates.
    /// Redirects are never followed: a 3xx is returned to the classifier like
    /// any other non-2xx status.
    pub(crate) fn new(options: &TransportOptions) -> Result<Self> {
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(options.accept_invalid_certs)
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(options.user_agent.as_str())
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            timeout: options.timeout,
        })
    }

    /// Send one request and classify the response.
    pub(crate) async fn dispatch(
        &self,
        state: &SessionState,
        verb: Verb,
        path: &str,
        scope: Scope,
        body: Option<&Value>,
    ) -> Result<Reply> {
        let endpoint = state.endpoint.as_ref().ok_or(Error::NotConnected)?;
        let full_path = resolve_path(state, path, scope);
        let url = endpoint.join(&full_path)?;

        let payload = body.map(serde_json::to_vec).transpose()?;
        let headers = build_headers(state, payload.as_ref().map(Vec::len))?;

        let method = reqwest::Method::from_bytes(verb.as_str().as_bytes())
            .map_err(|e| Error::Config(format!("unsupported verb {}: {}", verb, e)))?;

        debug!(verb = %verb, path = %full_path, "sending ICWS request");

        let mut request = self.http.request(method, url).headers(headers);
        if let Some(payload) = payload {
            request = request.body(payload);
        }
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(|source| Error::Transport {
            verb,
            path: full_path.clone(),
            source,
        })?;

        classify(verb, full_path, response).await
    }
}

/// Build the request path: `/icws`, the session id when connected and scoped,
/// then the caller's path.
pub(crate) fn resolve_path(state: &SessionState, path: &str, scope: Scope) -> String {
    let mut full = String::from(PATH_PREFIX);

    if scope == Scope::Session
        && let Some(credentials) = &state.credentials
    {
        full.push('/');
        full.push_str(&credentials.session_id);
    }

    if !path.starts_with('/') {
        full.push('/');
    }
    full.push_str(path);
    full
}

/// Build request headers from the session state.
pub(crate) fn build_headers(state: &SessionState, body_len: Option<usize>) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT_LANGUAGE, header_value("Accept-Language", &state.language)?);

    if let Some(len) = body_len {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_LENGTH, HeaderValue::from(len));
    }

    if let Some(credentials) = &state.credentials {
        headers.insert(
            CSRF_TOKEN_HEADER,
            header_value("ININ-ICWS-CSRF-Token", &credentials.csrf_token)?,
        );
        headers.insert(COOKIE, header_value("Cookie", &credentials.cookie)?);
    }

    Ok(headers)
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|_| Error::Config(format!("value for header {} is not valid", name)))
}

/// Classify a response by status code.
async fn classify(verb: Verb, path: String, response: reqwest::Response) -> Result<Reply> {
    let status = response.status();
    let cookie = response
        .headers()
        .get(SET_COOKIE)
        .map(|value| value.to_str().map(str::to_string));

    let bytes = match response.bytes().await {
        Ok(bytes) => bytes,
        Err(source) => return Err(Error::Transport { verb, path, source }),
    };

    debug!(verb = %verb, path = %path, status = status.as_u16(), "ICWS response");
    trace!(bytes = bytes.len(), "ICWS response body");

    if !status.is_success() {
        let body = serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::Object(Map::new()));
        return Err(classify_failure(verb, path, status.as_u16(), body));
    }

    if status == StatusCode::NO_CONTENT {
        return Ok(Reply::new(status, None, None));
    }

    if status != StatusCode::CREATED {
        let body = decode_success(verb, &path, status, &bytes)?;
        return Ok(Reply::new(status, Some(body), None));
    }

    // A 201 without a session cookie is rejected whatever its body holds.
    let cookie = match cookie {
        Some(Ok(cookie)) => cookie,
        Some(Err(_)) => {
            return Err(Error::InvalidResponse {
                verb,
                path,
                status: status.as_u16(),
                reason: "Set-Cookie header is not valid text".to_string(),
            });
        }
        None => {
            return Err(Error::MissingCookie {
                verb,
                path,
                status: status.as_u16(),
            });
        }
    };

    let mut body = decode_success(verb, &path, status, &bytes)?;
    if let Value::Object(map) = &mut body {
        map.insert("cookie".to_string(), Value::String(cookie.clone()));
    }

    Ok(Reply::new(status, Some(body), Some(cookie)))
}

fn decode_success(verb: Verb, path: &str, status: StatusCode, bytes: &[u8]) -> Result<Value> {
    decode_body(bytes).map_err(|e| Error::InvalidResponse {
        verb,
        path: path.to_string(),
        status: status.as_u16(),
        reason: e.to_string(),
    })
}

/// Decode a 2xx body; an empty body is an empty object.
fn decode_body(bytes: &[u8]) -> serde_json::Result<Value> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Map::new()));
    }
    serde_json::from_slice(bytes)
}
