use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Plugin manifest (parsed from plugin.toml)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginManifest {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub description: String,
    /// Path to the plugin image relative to the manifest dir
    pub entry_point: String,
    /// Storage namespace the plugin's storage-init hook is bound to
    #[serde(default)]
    pub storage_id: Option<String>,
}

impl PluginManifest {
    /// Load manifest from plugin.toml file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read plugin manifest: {:?}", path))?;
        let manifest: Self =
            toml::from_str(&content).context(format!("Failed to parse manifest: {:?}", path))?;
        Ok(manifest)
    }

    /// Resolve entry point path relative to manifest directory
    pub fn resolve_entry_point(&self, manifest_dir: &Path) -> std::path::PathBuf {
        manifest_dir.join(&self.entry_point)
    }
}

/// Discover plugins by walking a directory for plugin.toml files
pub fn discover_plugins(plugin_dir: &Path) -> Result<Vec<(PluginManifest, std::path::PathBuf)>> {
    let mut plugins = Vec::new();

    if !plugin_dir.exists() {
        return Ok(plugins);
    }

    for entry in std::fs::read_dir(plugin_dir)? {
        let entry = entry?;
        let manifest_path = entry.path().join("plugin.toml");
        if manifest_path.exists() {
            match PluginManifest::load(&manifest_path) {
                Ok(manifest) => {
                    plugins.push((manifest, entry.path()));
                }
                Err(e) => {
                    tracing::warn!(path = ?manifest_path, error = %e, "Skipping invalid plugin");
                }
            }
        }
    }

    plugins.sort_by(|a, b| a.0.name.cmp(&b.0.name));
    Ok(plugins)
}
