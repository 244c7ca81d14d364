//! Client error types.
//!
//! Every failure the client can report is a variant of [`Error`]. Variants fall
//! into five categories, exposed through [`Error::kind`]:
//!
//! - **Validation**: detected locally, before any network traffic.
//! - **Transport**: the HTTP exchange itself failed (DNS, refused, timeout).
//! - **Protocol**: the server answered, but not in the shape the protocol requires.
//! - **Application**: the server rejected the request for a business reason.
//! - **Config**: the underlying HTTP client could not be built.

use serde_json::Value;
use thiserror::Error;

use crate::types::Verb;

/// Server error id for an unsupported request.
pub const ERROR_ID_UNSUPPORTED: &str = "error.request.unsupported";

/// Server error id for a verb the resource does not allow.
pub const ERROR_ID_METHOD_NOT_ALLOWED: &str = "error.request.accessDenied.httpMethodNotAllowed";

/// Server error id for rejected credentials at connect time.
pub const ERROR_ID_AUTHENTICATION_FAILURE: &str = "error.request.connection.authenticationFailure";

/// Server error code for an unknown session.
pub const ERROR_CODE_SESSION_NOT_FOUND: i64 = 2;

/// Server error code for a denied access.
pub const ERROR_CODE_ACCESS_DENIED: i64 = 7;

/// Client error type.
#[derive(Debug, Error)]
pub enum Error {
    /// The server address is blank.
    #[error("server address is empty")]
    EmptyAddress,

    /// The user id is blank.
    #[error("user is empty")]
    EmptyUser,

    /// The password is blank.
    #[error("password is empty")]
    EmptyPassword,

    /// The server address could not be parsed.
    #[error("invalid server address '{address}': {reason}")]
    InvalidAddress {
        /// Address as given by the caller.
        address: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The address scheme is neither `http` nor `https`.
    #[error("invalid scheme '{scheme}': expected http or https")]
    InvalidScheme {
        /// Scheme found in the address (empty when missing).
        scheme: String,
    },

    /// The port is not 8018/8019 or does not match the scheme.
    #[error("invalid port {port} for scheme {scheme}: expected http on 8018 or https on 8019")]
    InvalidPort {
        /// Scheme of the address.
        scheme: String,
        /// Port found (or defaulted) for the address.
        port: u16,
    },

    /// The request path could not be resolved against the server URL.
    #[error("invalid request path '{path}': {reason}")]
    InvalidPath {
        /// Path as given by the caller.
        path: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The request body could not be serialized to JSON.
    #[error("invalid request body: {0}")]
    InvalidBody(#[from] serde_json::Error),

    /// No server has been connected to yet.
    #[error("session is not connected")]
    NotConnected,

    /// The HTTP exchange failed before a response was received.
    #[error("{verb} {path} failed: {source}")]
    Transport {
        /// Verb of the failed request.
        verb: Verb,
        /// Full request path.
        path: String,
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// A `201 Created` response arrived without a `Set-Cookie` header.
    #[error("{verb} {path} returned {status} without a Set-Cookie header")]
    MissingCookie {
        /// Verb of the request.
        verb: Verb,
        /// Full request path.
        path: String,
        /// HTTP status code.
        status: u16,
    },

    /// A successful response body could not be interpreted.
    #[error("{verb} {path} returned an unreadable response ({status}): {reason}")]
    InvalidResponse {
        /// Verb of the request.
        verb: Verb,
        /// Full request path.
        path: String,
        /// HTTP status code.
        status: u16,
        /// What was wrong with the body.
        reason: String,
    },

    /// The server does not allow this verb on this resource.
    #[error("{verb} {path} is not allowed ({status}): {detail}")]
    MethodNotAllowed {
        /// Verb of the request.
        verb: Verb,
        /// Full request path.
        path: String,
        /// HTTP status code.
        status: u16,
        /// Error fields reported by the server.
        detail: ServerErrorDetail,
    },

    /// The server rejected the user id or password.
    #[error("invalid credentials ({status}): {detail}")]
    InvalidCredentials {
        /// Verb of the request.
        verb: Verb,
        /// Full request path.
        path: String,
        /// HTTP status code.
        status: u16,
        /// Error fields reported by the server.
        detail: ServerErrorDetail,
    },

    /// The server does not know the session, or denied it access.
    #[error("invalid session on {verb} {path} ({status}): {detail}")]
    InvalidSession {
        /// Verb of the request.
        verb: Verb,
        /// Full request path.
        path: String,
        /// HTTP status code.
        status: u16,
        /// Error fields reported by the server.
        detail: ServerErrorDetail,
    },

    /// Any other non-2xx response.
    #[error("{verb} {path} failed with status {status}: {detail}")]
    UnknownServerError {
        /// Verb of the request.
        verb: Verb,
        /// Full request path.
        path: String,
        /// HTTP status code.
        status: u16,
        /// Error fields reported by the server.
        detail: ServerErrorDetail,
        /// Raw decoded response body (empty object when absent or unparseable).
        body: Value,
    },

    /// The HTTP client could not be configured.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Category of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected locally before any network call.
    Validation,
    /// The network exchange failed.
    Transport,
    /// The server broke the protocol contract.
    Protocol,
    /// The server reported a business error.
    Application,
    /// The client could not be set up.
    Config,
}

impl Error {
    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::EmptyAddress
            | Error::EmptyUser
            | Error::EmptyPassword
            | Error::InvalidAddress { .. }
            | Error::InvalidScheme { .. }
            | Error::InvalidPort { .. }
            | Error::InvalidPath { .. }
            | Error::InvalidBody(_)
            | Error::NotConnected => ErrorKind::Validation,
            Error::Transport { .. } => ErrorKind::Transport,
            Error::MissingCookie { .. }
            | Error::InvalidResponse { .. }
            | Error::UnknownServerError { .. } => ErrorKind::Protocol,
            Error::MethodNotAllowed { .. }
            | Error::InvalidCredentials { .. }
            | Error::InvalidSession { .. } => ErrorKind::Application,
            Error::Config(_) => ErrorKind::Config,
        }
    }

    /// Check if this error was raised before any network call.
    pub fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }

    /// Check if the server rejected the login.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Error::InvalidCredentials { .. })
    }

    /// Check if the session is no longer usable and a reconnect is needed.
    pub fn is_session_error(&self) -> bool {
        matches!(self, Error::InvalidSession { .. } | Error::NotConnected)
    }

    /// HTTP status code of the response that caused this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::MissingCookie { status, .. }
            | Error::InvalidResponse { status, .. }
            | Error::MethodNotAllowed { status, .. }
            | Error::InvalidCredentials { status, .. }
            | Error::InvalidSession { status, .. }
            | Error::UnknownServerError { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Error fields reported by the server, for server-classified errors.
    pub fn server_detail(&self) -> Option<&ServerErrorDetail> {
        match self {
            Error::MethodNotAllowed { detail, .. }
            | Error::InvalidCredentials { detail, .. }
            | Error::InvalidSession { detail, .. }
            | Error::UnknownServerError { detail, .. } => Some(detail),
            _ => None,
        }
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error fields of a failed response body.
///
/// All fields are optional: the server omits them on some failures, and the
/// body may not be JSON at all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerErrorDetail {
    /// `errorId`, e.g. `error.request.connection.authenticationFailure`.
    pub error_id: Option<String>,
    /// Numeric `errorCode`.
    pub error_code: Option<i64>,
    /// Human readable `message`.
    pub message: Option<String>,
}

impl ServerErrorDetail {
    /// Extract the error fields from a decoded body.
    ///
    /// `errorCode` is accepted both as a number and as a numeric string.
    pub fn from_body(body: &Value) -> Self {
        let error_id = body
            .get("errorId")
            .and_then(Value::as_str)
            .map(str::to_string);
        let error_code = body.get("errorCode").and_then(|code| match code {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        });
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string);

        Self {
            error_id,
            error_code,
            message,
        }
    }
}

impl std::fmt::Display for ServerErrorDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.error_id, self.error_code, &self.message) {
            (None, None, None) => f.write_str("no error detail"),
            (id, code, message) => {
                let mut parts = Vec::new();
                if let Some(id) = id {
                    parts.push(id.clone());
                }
                if let Some(code) = code {
                    parts.push(format!("code {}", code));
                }
                if let Some(message) = message {
                    parts.push(message.clone());
                }
                f.write_str(&parts.join(", "))
            }
        }
    }
}

/// Map a non-2xx response to its error variant.
///
/// The checks run in a fixed order: method errors first, then authentication
/// failure, then session errors. Anything else is an unknown server error
/// that carries the raw body.
pub(crate) fn classify_failure(verb: Verb, path: String, status: u16, body: Value) -> Error {
    let detail = ServerErrorDetail::from_body(&body);

    match (detail.error_id.as_deref(), detail.error_code) {
        (Some(ERROR_ID_UNSUPPORTED | ERROR_ID_METHOD_NOT_ALLOWED), _) => Error::MethodNotAllowed {
            verb,
            path,
            status,
            detail,
        },
        (Some(ERROR_ID_AUTHENTICATION_FAILURE), _) => Error::InvalidCredentials {
            verb,
            path,
            status,
            detail,
        },
        (_, Some(ERROR_CODE_SESSION_NOT_FOUND | ERROR_CODE_ACCESS_DENIED)) => {
            Error::InvalidSession {
                verb,
                path,
                status,
                detail,
            }
        }
        _ => Error::UnknownServerError {
            verb,
            path,
            status,
            detail,
            body,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn classify(status: u16, body: Value) -> Error {
        classify_failure(Verb::Post, "/icws/connection".to_string(), status, body)
    }

    #[test]
    fn test_authentication_failure_is_invalid_credentials() {
        let err = classify(
            400,
            json!({"errorId": "error.request.connection.authenticationFailure"}),
        );
        assert!(matches!(err, Error::InvalidCredentials { status: 400, .. }));
        assert!(err.is_auth_error());
        assert_eq!(err.kind(), ErrorKind::Application);
    }

    #[test]
    fn test_unsupported_and_method_not_allowed() {
        let err = classify(400, json!({"errorId": "error.request.unsupported"}));
        assert!(matches!(err, Error::MethodNotAllowed { .. }));

        let err = classify(
            405,
            json!({"errorId": "error.request.accessDenied.httpMethodNotAllowed"}),
        );
        assert!(matches!(err, Error::MethodNotAllowed { status: 405, .. }));
    }

    #[test]
    fn test_error_codes_map_to_invalid_session() {
        for code in [2, 7] {
            let err = classify(401, json!({"errorCode": code, "message": "gone"}));
            assert!(matches!(err, Error::InvalidSession { .. }), "code {}", code);
            assert!(err.is_session_error());
        }

        let err = classify(401, json!({"errorCode": "2"}));
        assert!(matches!(err, Error::InvalidSession { .. }));
    }

    #[test]
    fn test_method_error_wins_over_session_code() {
        let err = classify(
            400,
            json!({"errorId": "error.request.unsupported", "errorCode": 2}),
        );
        assert!(matches!(err, Error::MethodNotAllowed { .. }));
    }

    #[test]
    fn test_unknown_error_keeps_raw_body() {
        let body = json!({"errorId": "error.something.else", "errorCode": 99});
        let err = classify(500, body.clone());
        match &err {
            Error::UnknownServerError {
                status,
                body: raw,
                detail,
                ..
            } => {
                assert_eq!(*status, 500);
                assert_eq!(raw, &body);
                assert_eq!(detail.error_code, Some(99));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(err.kind(), ErrorKind::Protocol);
        assert_eq!(err.status(), Some(500));
    }

    #[test]
    fn test_empty_body_is_unknown_error() {
        let err = classify(503, json!({}));
        assert!(matches!(err, Error::UnknownServerError { status: 503, .. }));
        assert_eq!(err.server_detail(), Some(&ServerErrorDetail::default()));
    }

    #[test]
    fn test_detail_display() {
        let detail = ServerErrorDetail::from_body(&json!({
            "errorId": "error.x",
            "errorCode": 7,
            "message": "denied"
        }));
        assert_eq!(detail.to_string(), "error.x, code 7, denied");
        assert_eq!(ServerErrorDetail::default().to_string(), "no error detail");
    }

    #[test]
    fn test_validation_kinds() {
        assert!(Error::EmptyAddress.is_validation());
        assert!(Error::EmptyUser.is_validation());
        assert!(
            Error::InvalidPort {
                scheme: "https".to_string(),
                port: 443
            }
            .is_validation()
        );
        assert!(Error::Config("x".to_string()).kind() == ErrorKind::Config);
    }
}
