use anyhow::Result;
use std::path::Path;

pub const DEFAULT_CONFIG: &str = r#"# wupsctl configuration

[loader]
# Directories below this one holding a plugin.toml are loaded
plugin_dir = "./plugins"
# Section the hook records are aggregated into
section = "linkme_WUPS_HOOKS"
# Refuse images whose hook table breaks the contract
strict = true

[lifecycle]
# Host events `wupsctl run` delivers, in order
events = [
    "application-starts",
    "release-foreground",
    "acquired-foreground",
    "application-requests-exit",
    "application-ends",
]
"#;

/// Initialize a new config file
pub fn run_init(path: &Path) -> Result<()> {
    if path.exists() {
        anyhow::bail!("Config already exists at {:?}", path);
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, DEFAULT_CONFIG)?;
    println!("Created config at {:?}", path);
    Ok(())
}
