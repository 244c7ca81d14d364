//! Connect command - opens a session and shows what the server returned.

use anyhow::Result;
use clap::Args;
use console::{Style, style};

use super::Context;

/// Arguments for the connect command.
#[derive(Args, Debug)]
pub struct ConnectArgs {}

/// Run the connect command.
pub async fn run(_args: ConnectArgs, ctx: &Context) -> Result<()> {
    let (session, params) = super::prepare_session(ctx)?;
    let info = session.connect(params).await?;

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        let dim = Style::new().dim();
        let green = Style::new().green();

        println!();
        println!("{}", style("ICWS Session").bold());
        println!("{}", dim.apply_to("─".repeat(40)));
        println!();
        println!("  {} {}", dim.apply_to("Status:"), green.apply_to("● connected"));
        println!("  {} {}", dim.apply_to("Server:"), info.base_url);
        println!("  {} {}", dim.apply_to("Session:"), info.session_id);
        if let Some(name) = &info.server_name {
            println!("  {} {}", dim.apply_to("IC server:"), name);
        }
        if let Some(user) = &info.user_id {
            println!("  {} {}", dim.apply_to("User:"), user);
        }
        if !info.alternate_hosts.is_empty() {
            println!(
                "  {} {}",
                dim.apply_to("Alternates:"),
                info.alternate_hosts.join(", ")
            );
        }
        if ctx.verbose {
            println!("  {} {}", dim.apply_to("Application:"), info.application);
            println!("  {} {}", dim.apply_to("Language:"), info.language);
        }
        println!();
    }

    super::close(&session, ctx).await;

    Ok(())
}
