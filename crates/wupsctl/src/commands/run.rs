use anyhow::Result;
use std::path::Path;
use tracing::{info, warn};
use wups_runtime::{HookTag, HostServices, PluginManager};

/// Load every plugin, deliver `events` in order, then tear everything down.
pub async fn execute(plugin_dir: &Path, events: &[HookTag]) -> Result<()> {
    let manager = PluginManager::new(HostServices::process());

    let loaded = manager.load_all(plugin_dir).await?;
    if loaded == 0 {
        println!("No plugins loaded from {:?}", plugin_dir);
        return Ok(());
    }
    info!(loaded, events = events.len(), "Running event script");

    for &event in events {
        let delivered = manager.broadcast(event).await?;
        if delivered < loaded {
            warn!(event = %event, delivered, loaded, "Event not accepted by every plugin");
        }
        println!("{:<28} -> {}/{} plugin(s)", event, delivered, loaded);
    }

    let plugins = manager.list_plugins().await;
    let mut traces = Vec::with_capacity(plugins.len());
    for plugin in &plugins {
        traces.push((plugin.name.clone(), manager.trace(&plugin.name).await?));
    }

    let unloaded = manager.unload_all().await;
    println!("Unloaded {}/{} plugin(s)", unloaded, loaded);

    for (name, trace) in traces {
        let tags: Vec<&str> = trace.iter().map(|t| t.name()).collect();
        println!("{}: {}", name, tags.join(" "));
    }

    Ok(())
}
