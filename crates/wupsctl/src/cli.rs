use clap::{Parser, Subcommand};
use std::path::PathBuf;
use wups_runtime::HookTag;

#[derive(Subcommand)]
pub enum PluginCommands {
    /// Load every plugin in the plugin directory and list it
    List {
        /// Print the summaries as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Parser)]
#[command(name = "wupsctl")]
#[command(about = "WUPS hook table inspector and plugin loader", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override the plugin directory from the config
    #[arg(long)]
    pub plugin_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new config file
    Init {
        /// Path for new config file
        #[arg(default_value = "wups.toml")]
        path: PathBuf,
    },
    /// Decode the hook table of a plugin image without loading it
    Inspect {
        /// Path to the plugin image
        image: PathBuf,
        /// Section holding the hook records (defaults to the config value)
        #[arg(long)]
        section: Option<String>,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Load all plugins, drive them through an event script and unload them
    Run {
        /// Host events to deliver, in order (defaults to the config script)
        #[arg(long, value_delimiter = ',', value_parser = parse_event)]
        events: Vec<HookTag>,
    },
    /// Manage plugins
    Plugin {
        #[command(subcommand)]
        action: PluginCommands,
    },
}

fn parse_event(s: &str) -> Result<HookTag, String> {
    let tag: HookTag = s.parse()?;
    if !tag.is_broadcast_event() {
        return Err(format!("'{}' is not a host event", s));
    }
    Ok(tag)
}
