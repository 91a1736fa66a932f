use anyhow::Result;
use std::path::Path;
use wups_runtime::{HostServices, PluginManager};

/// Plugin subcommand actions
pub enum PluginAction {
    List { json: bool },
}

pub async fn execute(action: PluginAction, plugin_dir: &Path) -> Result<()> {
    let manager = PluginManager::new(HostServices::process());

    match action {
        PluginAction::List { json } => {
            manager.load_all(plugin_dir).await?;
            let plugins = manager.list_plugins().await;

            if json {
                println!("{}", serde_json::to_string_pretty(&plugins)?);
            } else if plugins.is_empty() {
                println!("No plugins installed.");
                println!("Plugin directory: {:?}", plugin_dir);
            } else {
                println!("Installed plugins:");
                for plugin in &plugins {
                    println!(
                        "  {} ({}) {} hook(s), {:?}",
                        plugin.name, plugin.version, plugin.hooks, plugin.phase
                    );
                }
            }

            manager.unload_all().await;
        }
    }

    Ok(())
}
