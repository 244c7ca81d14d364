//! CLI command handlers.

pub mod config;
pub mod connect;
pub mod request;

use std::time::Duration;

use anyhow::{Context as _, Result, anyhow};
use console::style;
use icws_client::{ConnectParams, DisconnectOutcome, Session};
use icws_config::ResolvedContext;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
    /// Connection settings from the command line.
    pub target: Target,
}

/// Connection settings given on the command line. They win over the
/// selected config context.
#[derive(Debug, Clone, Default)]
pub struct Target {
    pub server: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub context: Option<String>,
    pub application: Option<String>,
    pub language: Option<String>,
    pub strict_tls: bool,
}

/// Build a session and its connect parameters from the command line and the
/// client config file.
pub fn prepare_session(ctx: &Context) -> Result<(Session, ConnectParams)> {
    let target = &ctx.target;
    let config = icws_config::load_client_config()?;

    let resolved: Option<ResolvedContext> = match (&target.context, &config.current_context) {
        (Some(name), _) => Some(config.resolve(Some(name))?),
        (None, Some(_)) => Some(config.resolve(None)?),
        (None, None) => None,
    };

    let server = target
        .server
        .clone()
        .or_else(|| resolved.as_ref().map(|r| r.server.clone()))
        .ok_or_else(|| anyhow!("no server given: pass --server or select a context"))?;
    let user = target
        .user
        .clone()
        .or_else(|| resolved.as_ref().and_then(|r| r.user.clone()))
        .ok_or_else(|| anyhow!("no user given: pass --user or set one in the context"))?;
    // Reject a bad address before asking for a password.
    icws_client::Endpoint::resolve(&server)?;

    let password = match &target.password {
        Some(password) => password.clone(),
        None => rpassword::prompt_password(format!("Password for {}: ", user))
            .context("failed to read password")?,
    };

    let mut builder = Session::builder();
    if let Some(resolved) = &resolved {
        builder = builder
            .application(resolved.application.as_str())
            .language(resolved.language.as_str())
            .accept_invalid_certs(resolved.accept_invalid_certs);
        if let Some(secs) = resolved.timeout {
            builder = builder.timeout(Duration::from_secs(secs));
        }
    }
    if target.strict_tls {
        builder = builder.accept_invalid_certs(false);
    }
    let session = builder.build()?;

    let mut params = ConnectParams::new(server, user, password);
    if let Some(application) = &target.application {
        params = params.application(application.as_str());
    }
    if let Some(language) = &target.language {
        params = params.language(language.as_str());
    }

    Ok((session, params))
}

/// Close the session and report a failed teardown on stderr.
pub async fn close(session: &Session, ctx: &Context) {
    match session.disconnect().await {
        DisconnectOutcome::RemoteFailed(e) => {
            eprintln!(
                "{} server did not acknowledge disconnect: {}",
                style("warning:").yellow().bold(),
                e
            );
        }
        DisconnectOutcome::Closed if ctx.verbose => {
            eprintln!("{}", style("session closed").dim());
        }
        _ => {}
    }
}
