//! Config command - connection context management.

use anyhow::{Result, anyhow};
use clap::{Args, Subcommand};

use icws_config::Context as ClientContext;

use super::Context;

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show configuration file path
    Path,

    /// Show the current context name
    CurrentContext,

    /// List available contexts
    GetContexts,

    /// Switch to a different context
    UseContext {
        /// Context name to switch to
        name: String,
    },

    /// Create or update a context
    SetContext {
        /// Context name
        name: String,

        /// Server address (e.g., https://cic.example.com:8019)
        #[arg(long)]
        server: Option<String>,

        /// User to connect as
        #[arg(long)]
        user: Option<String>,

        /// Application name
        #[arg(long)]
        application: Option<String>,

        /// Language
        #[arg(long)]
        language: Option<String>,

        /// Accept self-signed server certificates
        #[arg(long)]
        accept_invalid_certs: Option<bool>,

        /// Request timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Delete a context
    DeleteContext {
        /// Context name to delete
        name: String,
    },
}

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Path => cmd_path(),
        ConfigCommand::CurrentContext => cmd_current_context(),
        ConfigCommand::GetContexts => cmd_get_contexts(ctx),
        ConfigCommand::UseContext { name } => cmd_use_context(&name),
        ConfigCommand::SetContext {
            name,
            server,
            user,
            application,
            language,
            accept_invalid_certs,
            timeout,
        } => {
            let update = ClientContext {
                name,
                server: server.unwrap_or_default(),
                user,
                application,
                language,
                accept_invalid_certs,
                timeout,
            };
            cmd_set_context(update)
        }
        ConfigCommand::DeleteContext { name } => cmd_delete_context(&name),
    }
}

fn cmd_path() -> Result<()> {
    let path = icws_config::client_config_path()
        .ok_or_else(|| anyhow!("could not determine config directory"))?;
    println!("{}", path.display());
    Ok(())
}

fn cmd_current_context() -> Result<()> {
    let config = icws_config::load_client_config()?;

    match &config.current_context {
        Some(name) => println!("{}", name),
        None => {
            println!("No current context set. Use 'icws config use-context <name>' to set one.")
        }
    }

    Ok(())
}

fn cmd_get_contexts(ctx: &Context) -> Result<()> {
    let config = icws_config::load_client_config()?;

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&config.contexts)?);
        return Ok(());
    }

    if config.contexts.is_empty() {
        println!("No contexts configured.");
        println!();
        println!("Create one with:");
        println!("  icws config set-context lab --server=https://cic.lab.local --user=agent");
        return Ok(());
    }

    let current = config.current_context.as_deref();

    println!("CURRENT   NAME            USER            SERVER");
    for context in &config.contexts {
        let marker = if current == Some(context.name.as_str()) {
            "*"
        } else {
            " "
        };
        println!(
            "{}         {:<15} {:<15} {}",
            marker,
            context.name,
            context.user.as_deref().unwrap_or("-"),
            context.server
        );
    }

    Ok(())
}

fn cmd_use_context(name: &str) -> Result<()> {
    let mut config = icws_config::load_client_config()?;

    config.use_context(name)?;
    icws_config::save_client_config(&config)?;

    println!("Switched to context \"{}\".", name);

    Ok(())
}

/// Create a context, or merge the given fields into an existing one.
fn cmd_set_context(update: ClientContext) -> Result<()> {
    let mut config = icws_config::load_client_config()?;
    let name = update.name.clone();

    match config.get_context_mut(&name) {
        Some(existing) => {
            if !update.server.is_empty() {
                existing.server = update.server;
            }
            existing.user = update.user.or(existing.user.take());
            existing.application = update.application.or(existing.application.take());
            existing.language = update.language.or(existing.language.take());
            existing.accept_invalid_certs =
                update.accept_invalid_certs.or(existing.accept_invalid_certs);
            existing.timeout = update.timeout.or(existing.timeout);
            println!("Context \"{}\" updated.", name);
        }
        None => {
            if update.server.is_empty() {
                return Err(anyhow!("--server is required when creating a new context"));
            }
            icws_client::Endpoint::resolve(&update.server)?;
            config.set_context(update);
            println!("Context \"{}\" created.", name);
        }
    }

    if config.current_context.is_none() {
        config.current_context = Some(name.clone());
    }

    icws_config::save_client_config(&config)?;
    Ok(())
}

fn cmd_delete_context(name: &str) -> Result<()> {
    let mut config = icws_config::load_client_config()?;

    if config.remove_context(name).is_none() {
        return Err(anyhow!("context \"{}\" not found", name));
    }
    icws_config::save_client_config(&config)?;

    println!("Context \"{}\" deleted.", name);
    Ok(())
}
