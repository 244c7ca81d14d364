//! Server address validation.
//!
//! The ICWS server listens on a fixed pair of ports: plaintext HTTP on 8018 and
//! HTTPS on 8019. An address is accepted only if it uses one of those
//! combinations; a missing port is filled in from the scheme.

use std::fmt;

use http::Uri;
use url::Url;

use crate::error::{Error, Result};

/// Port of the plaintext listener.
pub const HTTP_PORT: u16 = 8018;

/// Port of the TLS listener.
pub const HTTPS_PORT: u16 = 8019;

/// A validated server base URL (scheme, host and port, no path).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    url: Url,
}

impl Endpoint {
    /// Validate a server address.
    ///
    /// See [`resolve`].
    pub fn resolve(address: &str) -> Result<Self> {
        resolve(address)
    }

    /// Wrap a URL without applying the port rules.
    ///
    /// Used by tests that talk to a mock server on an ephemeral port.
    #[cfg(test)]
    pub(crate) fn unchecked(url: &str) -> Self {
        Self {
            url: Url::parse(url).expect("valid test url"),
        }
    }

    /// Canonical base URL, e.g. `https://cic.example.com:8019/`.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// URL scheme (`http` or `https`).
    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }

    /// Host name or address.
    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    /// Port of the server.
    pub fn port(&self) -> u16 {
        self.url.port_or_known_default().unwrap_or_default()
    }

    /// True for HTTPS endpoints.
    pub fn is_secure(&self) -> bool {
        self.url.scheme() == "https"
    }

    /// Join an absolute request path onto the base URL.
    pub(crate) fn join(&self, path: &str) -> Result<Url> {
        self.url.join(path).map_err(|e| Error::InvalidPath {
            path: path.to_string(),
            reason: e.to_string(),
        })
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str().trim_end_matches('/'))
    }
}

/// Validate `address` and return its canonical endpoint.
///
/// Checks run in this order:
/// 1. blank address: [`Error::EmptyAddress`]
/// 2. unparseable address, missing host, user info or a port that is not a
///    number: [`Error::InvalidAddress`]
/// 3. scheme other than `http`/`https`: [`Error::InvalidScheme`]
/// 4. port other than 8018 for `http` or 8019 for `https`: [`Error::InvalidPort`]
///
/// An omitted port defaults to the one matching the scheme. An explicit port
/// is kept even when it is the scheme's well-known port, so
/// `https://host:443` is rejected rather than silently rewritten.
pub fn resolve(address: &str) -> Result<Endpoint> {
    let address = address.trim();
    if address.is_empty() {
        return Err(Error::EmptyAddress);
    }

    let uri: Uri = address.parse().map_err(|e: http::uri::InvalidUri| Error::InvalidAddress {
        address: address.to_string(),
        reason: e.to_string(),
    })?;

    let scheme = uri.scheme_str().unwrap_or_default();
    let expected_port = match scheme {
        "http" => HTTP_PORT,
        "https" => HTTPS_PORT,
        other => {
            return Err(Error::InvalidScheme {
                scheme: other.to_string(),
            });
        }
    };

    let authority = uri
        .authority()
        .map(|a| a.as_str())
        .ok_or_else(|| Error::InvalidAddress {
            address: address.to_string(),
            reason: "missing host".to_string(),
        })?;
    if authority.contains('@') {
        return Err(Error::InvalidAddress {
            address: address.to_string(),
            reason: "user info is not supported".to_string(),
        });
    }

    let host = uri
        .host()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| Error::InvalidAddress {
            address: address.to_string(),
            reason: "missing host".to_string(),
        })?;

    let port = match explicit_port(authority) {
        None => expected_port,
        Some(text) => text.parse::<u16>().map_err(|_| Error::InvalidAddress {
            address: address.to_string(),
            reason: format!("invalid port '{}'", text),
        })?,
    };
    if port != expected_port {
        return Err(Error::InvalidPort {
            scheme: scheme.to_string(),
            port,
        });
    }

    let url = Url::parse(&format!("{}://{}:{}/", scheme, host, port)).map_err(|e| {
        Error::InvalidAddress {
            address: address.to_string(),
            reason: e.to_string(),
        }
    })?;

    Ok(Endpoint { url })
}

/// The port text written after the host, if any. IPv6 literals are bracketed,
/// so only a colon after the closing bracket starts a port.
fn explicit_port(authority: &str) -> Option<&str> {
    let after_host = match authority.rfind(']') {
        Some(end) => &authority[end + 1..],
        None => authority,
    };
    after_host.rfind(':').map(|i| &after_host[i + 1..])
}
