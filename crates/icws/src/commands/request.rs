//! Request command - sends one request within a fresh session.

use anyhow::{Context as _, Result};
use clap::Args;
use icws_client::Verb;
use serde_json::Value;

use super::Context;

/// Arguments for the request command.
#[derive(Args, Debug)]
pub struct RequestArgs {
    /// HTTP verb: GET, POST, PUT, PATCH, UPDATE or DELETE
    #[arg(value_parser = parse_verb)]
    pub verb: Verb,

    /// Resource path relative to the session, e.g. /status/user-statuses
    pub path: String,

    /// JSON request body
    #[arg(long)]
    pub body: Option<String>,
}

fn parse_verb(s: &str) -> std::result::Result<Verb, String> {
    s.parse()
}

/// Run the request command.
pub async fn run(args: RequestArgs, ctx: &Context) -> Result<()> {
    let body: Option<Value> = args
        .body
        .as_deref()
        .map(serde_json::from_str::<Value>)
        .transpose()
        .context("--body is not valid JSON")?;

    let (session, params) = super::prepare_session(ctx)?;
    session.connect(params).await?;

    let result = session.request(args.verb, &args.path, body.as_ref()).await;
    super::close(&session, ctx).await;
    let reply = result?;

    match reply.body() {
        Some(body) if ctx.json_output => println!("{}", serde_json::to_string(body)?),
        Some(body) => println!("{}", serde_json::to_string_pretty(body)?),
        None if ctx.verbose => eprintln!("{} (no content)", reply.status()),
        None => {}
    }

    Ok(())
}
