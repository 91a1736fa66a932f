use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use wups_runtime::abi::HOOK_SECTION;
use wups_runtime::HookTag;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub loader: LoaderConfig,

    #[serde(default)]
    pub lifecycle: LifecycleConfig,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct LoaderConfig {
    #[serde(default = "default_plugin_dir")]
    pub plugin_dir: PathBuf,

    #[serde(default = "default_section")]
    pub section: String,

    /// Treat a hook table with problems as an error instead of a warning
    #[serde(default = "default_strict")]
    pub strict: bool,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct LifecycleConfig {
    /// Events `wupsctl run` delivers when none are given on the command line
    #[serde(default = "default_events")]
    pub events: Vec<HookTag>,
}

fn default_plugin_dir() -> PathBuf {
    PathBuf::from("./plugins")
}

fn default_section() -> String {
    HOOK_SECTION.to_string()
}

fn default_strict() -> bool {
    true
}

fn default_events() -> Vec<HookTag> {
    vec![
        HookTag::ApplicationStarts,
        HookTag::ReleaseForeground,
        HookTag::AcquiredForeground,
        HookTag::ApplicationRequestsExit,
        HookTag::ApplicationEnds,
    ]
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            plugin_dir: default_plugin_dir(),
            section: default_section(),
            strict: default_strict(),
        }
    }
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            events: default_events(),
        }
    }
}

/// Load config from file or use defaults
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };

    let content =
        fs::read_to_string(path).context(format!("Failed to read config file: {:?}", path))?;
    let config: Config = toml::from_str(&content).context("Failed to parse TOML config")?;

    if let Some(event) = config
        .lifecycle
        .events
        .iter()
        .find(|e| !e.is_broadcast_event())
    {
        anyhow::bail!("Config lists '{}' as an event, but it cannot be broadcast", event);
    }

    Ok(config)
}
