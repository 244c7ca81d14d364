//! Request and response types for the ICWS API.
//!
//! These types mirror the server's connection contract.

use std::fmt;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `__type` discriminator of a user/password connection request.
pub const AUTH_CONNECTION_REQUEST_TYPE: &str =
    "urn:inin.com:connection:icAuthConnectionRequestSettings";

// ─────────────────────────────────────────────────────────────────────────────
// Verbs
// ─────────────────────────────────────────────────────────────────────────────

/// HTTP verb of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    Post,
    Put,
    Patch,
    /// Non-standard `UPDATE` method accepted by some resources.
    Update,
    Delete,
}

impl Verb {
    /// Method token as sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Post => "POST",
            Verb::Put => "PUT",
            Verb::Patch => "PATCH",
            Verb::Update => "UPDATE",
            Verb::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Verb {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Verb::Get),
            "POST" => Ok(Verb::Post),
            "PUT" => Ok(Verb::Put),
            "PATCH" => Ok(Verb::Patch),
            "UPDATE" => Ok(Verb::Update),
            "DELETE" => Ok(Verb::Delete),
            other => Err(format!("unsupported verb '{}'", other)),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Replies
// ─────────────────────────────────────────────────────────────────────────────

/// A successful, classified response.
#[derive(Debug, Clone)]
pub struct Reply {
    status: StatusCode,
    body: Option<Value>,
    cookie: Option<String>,
}

impl Reply {
    pub(crate) fn new(status: StatusCode, body: Option<Value>, cookie: Option<String>) -> Self {
        Self {
            status,
            body,
            cookie,
        }
    }

    /// HTTP status of the response.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Decoded body, `None` for `204 No Content`.
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Consume the reply and return its body.
    pub fn into_body(self) -> Option<Value> {
        self.body
    }

    /// `Set-Cookie` value of a `201 Created` response.
    pub fn cookie(&self) -> Option<&str> {
        self.cookie.as_deref()
    }

    /// True when the server sent no body.
    pub fn is_empty(&self) -> bool {
        self.body.is_none()
    }

    /// Decode the body into a typed value.
    ///
    /// An empty reply decodes as JSON `null`, so `()` and `Option<T>` work
    /// for `204` responses.
    pub fn json<T: DeserializeOwned>(self) -> serde_json::Result<T> {
        serde_json::from_value(self.body.unwrap_or(Value::Null))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Connection
// ─────────────────────────────────────────────────────────────────────────────

/// Body of `POST /icws/connection`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ConnectionRequest<'a> {
    #[serde(rename = "__type")]
    pub kind: &'static str,
    pub application_name: &'a str,
    #[serde(rename = "userID")]
    pub user_id: &'a str,
    pub password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_place_application_license_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_place_application_code: Option<&'a str>,
}

/// Body of a `201 Created` connect response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ConnectionResponse {
    #[serde(default)]
    pub csrf_token: String,
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub alternate_host_list: Vec<String>,
    #[serde(default, rename = "userID")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub user_display_name: Option<String>,
    #[serde(default)]
    pub ic_server: Option<String>,
}

/// Marketplace licence sent with a connect request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marketplace {
    /// `marketPlaceApplicationLicenseName`.
    pub license_name: String,
    /// `marketPlaceApplicationCode`.
    pub application_code: String,
}

/// Parameters of [`Session::connect`](crate::Session::connect).
#[derive(Debug, Clone)]
pub struct ConnectParams {
    pub(crate) address: String,
    pub(crate) user: String,
    pub(crate) password: String,
    pub(crate) application: Option<String>,
    pub(crate) language: Option<String>,
    pub(crate) marketplace: Option<Marketplace>,
}

impl ConnectParams {
    /// Connect to `address` as `user`.
    pub fn new(
        address: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            address: address.into(),
            user: user.into(),
            password: password.into(),
            application: None,
            language: None,
            marketplace: None,
        }
    }

    /// Override the application name. Blank values are ignored.
    pub fn application(mut self, application: impl Into<String>) -> Self {
        self.application = Some(application.into());
        self
    }

    /// Override the language. Blank values are ignored.
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Attach a marketplace licence.
    pub fn marketplace(
        mut self,
        license_name: impl Into<String>,
        application_code: impl Into<String>,
    ) -> Self {
        self.marketplace = Some(Marketplace {
            license_name: license_name.into(),
            application_code: application_code.into(),
        });
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Session state
// ─────────────────────────────────────────────────────────────────────────────

/// Credentials issued by a successful connect.
///
/// The three values only exist together; a session either has all of them
/// or none.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Session id, used as the first path segment of every scoped request.
    pub session_id: String,
    /// Value of the `ININ-ICWS-CSRF-Token` header.
    pub csrf_token: String,
    /// Value of the `Cookie` header.
    pub cookie: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("session_id", &self.session_id)
            .field("csrf_token", &"<redacted>")
            .field("cookie", &"<redacted>")
            .finish()
    }
}

/// Snapshot of a connected session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionInfo {
    /// Session id.
    pub session_id: String,
    /// Base URL of the server.
    pub base_url: String,
    /// User the session belongs to, as reported by the server.
    pub user_id: Option<String>,
    /// Display name of the user.
    pub user_display_name: Option<String>,
    /// Server name.
    pub server_name: Option<String>,
    /// Hosts the server lists for fail-over.
    pub alternate_hosts: Vec<String>,
    /// Application name sent on every request.
    pub application: String,
    /// Language sent in `Accept-Language`.
    pub language: String,
}
