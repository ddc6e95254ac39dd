mod cli;
mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries the host response
    hookgate_runtime::init_logging();

    let cli = Cli::parse();

    // Handle init command early (doesn't need config)
    if let Commands::Init { path } = &cli.command {
        return commands::init::run_init(path);
    }

    let settings = config::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Init { .. } => unreachable!(),
        Commands::Run { key, host } => {
            commands::run::execute(&key, host, settings).await?;
        }
        Commands::List => {
            commands::list::execute(settings)?;
        }
    }

    Ok(())
}
