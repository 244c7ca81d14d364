//! Session-oriented client for the Interaction Center Web Services (ICWS) API.
//!
//! A caller connects once with a user and password and receives a session id,
//! a CSRF token and a session cookie. Every later request must carry the
//! token and cookie and is addressed under `/icws/<session id>`. This crate
//! keeps those credentials, attaches them to each request, and maps the
//! server's responses onto a typed [`Error`].
//!
//! # Example
//!
//! ```no_run
//! use icws_client::{ConnectParams, Session, Verb};
//!
//! # async fn example() -> icws_client::Result<()> {
//! let session = Session::builder()
//!     .application("my_app")
//!     .accept_invalid_certs(false)
//!     .build()?;
//!
//! session
//!     .connect(ConnectParams::new("https://cic.example.com", "agent", "1234"))
//!     .await?;
//!
//! let reply = session.request(Verb::Get, "/connection/features", None).await?;
//! println!("{:?}", reply.body());
//!
//! if let Some(e) = session.disconnect().await.remote_error() {
//!     eprintln!("server did not acknowledge disconnect: {}", e);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Addresses
//!
//! Only `http` on port 8018 and `https` on port 8019 are accepted. A missing
//! port is filled in from the scheme; see [`endpoint::resolve`].
//!
//! # Certificates
//!
//! Server certificates are **not** verified by default, because ICWS
//! deployments commonly use self-signed certificates. Use
//! [`SessionBuilder::accept_invalid_certs`] to turn verification on.

mod dispatch;
pub mod endpoint;
pub mod error;
pub mod session;
pub mod types;

pub use dispatch::{CSRF_TOKEN_HEADER, PATH_PREFIX};
pub use endpoint::{Endpoint, HTTP_PORT, HTTPS_PORT};
pub use error::{Error, ErrorKind, Result, ServerErrorDetail};
pub use session::{
    CONNECTION_PATH, DEFAULT_APPLICATION, DEFAULT_LANGUAGE, DisconnectOutcome, Session,
    SessionBuilder,
};
pub use types::*;
