//! icws - command-line client for Interaction Center Web Services.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{config, connect, request};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// icws - talk to an Interaction Center Web Services server
#[derive(Parser)]
#[command(name = "icws")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// Server address, e.g. https://cic.example.com:8019
    #[arg(long, global = true, env = "ICWS_SERVER")]
    pub server: Option<String>,

    /// User to connect as
    #[arg(short, long, global = true, env = "ICWS_USER")]
    pub user: Option<String>,

    /// Password (prompted for when omitted)
    #[arg(long, global = true, env = "ICWS_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Named context from the client config file
    #[arg(long, global = true)]
    pub context: Option<String>,

    /// Application name sent to the server
    #[arg(long, global = true)]
    pub application: Option<String>,

    /// Language sent in Accept-Language
    #[arg(long, global = true)]
    pub language: Option<String>,

    /// Verify server certificates instead of accepting self-signed ones
    #[arg(long, global = true)]
    pub strict_tls: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Open a session, show it, and close it again
    Connect(connect::ConnectArgs),

    /// Send one request within a fresh session
    Request(request::RequestArgs),

    /// Manage connection contexts
    Config(config::ConfigArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "icws=debug,icws_client=debug,icws_config=debug,info"
    } else {
        "icws=info,icws_client=info,warn"
    };

    // Logs go to stderr so that --json output stays parseable.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(cli.verbose)
        .init();

    let ctx = commands::Context {
        json_output: cli.json,
        verbose: cli.verbose,
        target: commands::Target {
            server: cli.server,
            user: cli.user,
            password: cli.password,
            context: cli.context,
            application: cli.application,
            language: cli.language,
            strict_tls: cli.strict_tls,
        },
    };

    match cli.command {
        Commands::Connect(args) => connect::run(args, &ctx).await,
        Commands::Request(args) => request::run(args, &ctx).await,
        Commands::Config(args) => config::run(args, &ctx).await,
    }
}
