mod cli;
mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands, PluginCommands};

#[tokio::main]
async fn main() -> Result<()> {
    wups_runtime::init_logging();

    let cli = Cli::parse();

    // Init doesn't need a config
    if let Commands::Init { path } = &cli.command {
        return commands::init::run_init(path);
    }

    let config = config::load_config(cli.config.as_deref())?;
    let plugin_dir = cli
        .plugin_dir
        .clone()
        .unwrap_or_else(|| config.loader.plugin_dir.clone());

    match cli.command {
        Commands::Init { .. } => unreachable!(),
        Commands::Inspect {
            image,
            section,
            json,
        } => {
            commands::inspect::execute(&image, section.as_deref(), json, &config)?;
        }
        Commands::Run { events } => {
            let events = if events.is_empty() {
                config.lifecycle.events.clone()
            } else {
                events
            };
            commands::run::execute(&plugin_dir, &events).await?;
        }
        Commands::Plugin { action } => {
            let action = match action {
                PluginCommands::List { json } => commands::plugin::PluginAction::List { json },
            };
            commands::plugin::execute(action, &plugin_dir).await?;
        }
    }

    Ok(())
}
