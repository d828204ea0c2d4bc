//! Nexus operator CLI.
//!
//! Drives the admission gate and model cascade from the shell. Point
//! `NEXUS_REDIS_URL` at the deployment's Redis to inspect or act on the
//! shared state the web workers use.

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;
mod services;

use cli::{Cli, Commands};
use services::Services;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    nexus_core::logging::init_logging(&cli.log_level)?;
    nexus_core::prometheus::init_metrics();

    let config = nexus_core::config::load_config()?;
    let services = Services::connect(config).await?;

    match cli.command {
        Commands::Ask { message, actor, context_file, documents, json } => {
            let args = commands::AskArgs { message, actor, context_file, documents, json };
            commands::ask(&services, args).await
        },
        Commands::Admit { actor, kind, count } => {
            commands::admit(&services, &actor, kind.into(), count).await
        },
        Commands::Status { json } => commands::status(&services, json).await,
        Commands::Models => {
            commands::models(&services);
            Ok(())
        },
        Commands::Config => commands::show_config(&services),
        Commands::ResetExhaustion => {
            commands::reset_exhaustion(&services).await;
            Ok(())
        },
        Commands::Metrics => {
            commands::metrics(&services).await;
            Ok(())
        },
    }
}
