use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::hooks::{ConfigHandle, HookTable, HookTag, StorageInitArgs};
use crate::host::HostServices;
use crate::lifecycle::{Dispatcher, LifecyclePhase};

use super::ffi_bridge::PluginHandle;
use super::manifest::{discover_plugins, PluginManifest};

/// One plugin under the manager's control.
///
/// `dispatcher` borrows the records mapped by `handle`; fields drop in
/// declaration order, so the dispatcher goes first.
pub struct PluginInstance {
    name: String,
    version: String,
    dispatcher: Dispatcher<'static>,
    handle: Option<PluginHandle>,
}

impl PluginInstance {
    fn native(manifest: &PluginManifest, handle: PluginHandle) -> Self {
        // SAFETY: `handle` is stored next to the dispatcher and outlives it.
        let table = unsafe { handle.table_unbounded() };
        Self {
            name: manifest.name.clone(),
            version: manifest.version.clone(),
            dispatcher: Dispatcher::new(manifest.name.clone(), table),
            handle: Some(handle),
        }
    }

    fn linked_in(name: &str, version: &str, table: HookTable<'static>) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
            dispatcher: Dispatcher::new(name, table),
            handle: None,
        }
    }

    pub fn phase(&self) -> LifecyclePhase {
        self.dispatcher.phase()
    }

    pub fn trace(&self) -> &[HookTag] {
        self.dispatcher.trace()
    }

    fn summary(&self) -> PluginSummary {
        PluginSummary {
            name: self.name.clone(),
            version: self.version.clone(),
            phase: self.dispatcher.phase(),
            hooks: self.dispatcher.table().len(),
            native: self.handle.is_some(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PluginSummary {
    pub name: String,
    pub version: String,
    pub phase: LifecyclePhase,
    pub hooks: usize,
    pub native: bool,
}

/// Discovers plugin images, walks their tables through the lifecycle and
/// fans host events out to them.
///
/// Each plugin sits behind its own mutex: events for one plugin never
/// overlap, while different plugins are independent.
pub struct PluginManager {
    plugins: DashMap<String, Arc<Mutex<PluginInstance>>>,
    services: HostServices,
    storage: StorageInitArgs,
}

impl PluginManager {
    pub fn new(services: HostServices) -> Self {
        Self {
            plugins: DashMap::new(),
            services,
            storage: StorageInitArgs::default(),
        }
    }

    /// Arguments forwarded to every plugin's storage-init hook.
    pub fn with_storage(mut self, storage: StorageInitArgs) -> Self {
        self.storage = storage;
        self
    }

    /// Discover and load all plugins from a directory
    pub async fn load_all(&self, plugin_dir: &Path) -> Result<usize> {
        let discovered = discover_plugins(plugin_dir)?;
        let mut loaded = 0;

        for (manifest, dir) in discovered {
            match self.load_plugin(&manifest, &dir).await {
                Ok(()) => {
                    loaded += 1;
                    info!(plugin = %manifest.name, version = %manifest.version, "Plugin loaded");
                }
                Err(e) => {
                    warn!(plugin = %manifest.name, error = %e, "Failed to load plugin");
                }
            }
        }

        Ok(loaded)
    }

    /// Map a native plugin image, link its table and bring it up.
    pub async fn load_plugin(&self, manifest: &PluginManifest, plugin_dir: &Path) -> Result<()> {
        self.ensure_free(&manifest.name)?;

        let entry_path = manifest.resolve_entry_point(plugin_dir);
        if !entry_path.exists() {
            return Err(anyhow!("Plugin entry point not found: {:?}", entry_path));
        }

        let handle = PluginHandle::load(&entry_path, &self.services)
            .with_context(|| format!("Plugin '{}' could not be mapped", manifest.name))?;
        self.activate(PluginInstance::native(manifest, handle))
            .await
    }

    /// Bring up a plugin whose table is linked into this process.
    pub async fn load_static(
        &self,
        name: &str,
        version: &str,
        table: HookTable<'static>,
    ) -> Result<()> {
        self.ensure_free(name)?;
        self.activate(PluginInstance::linked_in(name, version, table))
            .await
    }

    fn ensure_free(&self, name: &str) -> Result<()> {
        if self.plugins.contains_key(name) {
            bail!("Plugin '{}' already loaded", name);
        }
        Ok(())
    }

    async fn activate(&self, mut instance: PluginInstance) -> Result<()> {
        let name = instance.name.clone();

        instance
            .dispatcher
            .link()
            .with_context(|| format!("Plugin '{}' hook table refused", name))?;
        instance
            .dispatcher
            .initialize(self.storage)
            .with_context(|| format!("Plugin '{}' failed to initialize", name))?;

        match self.plugins.entry(name.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                if let Err(e) = instance.dispatcher.deinitialize() {
                    warn!(plugin = %name, error = %e, "Deinit of duplicate plugin failed");
                }
                bail!("Plugin '{}' already loaded", name);
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(Arc::new(Mutex::new(instance)));
            }
        }

        info!(plugin = %name, "Plugin running");
        Ok(())
    }

    fn instance(&self, name: &str) -> Result<Arc<Mutex<PluginInstance>>> {
        self.plugins
            .get(name)
            .map(|p| p.value().clone())
            .ok_or_else(|| anyhow!("Plugin '{}' not found", name))
    }

    fn instances(&self) -> Vec<Arc<Mutex<PluginInstance>>> {
        self.plugins.iter().map(|p| p.value().clone()).collect()
    }

    /// Deliver a host event to every running plugin.
    ///
    /// A plugin whose hook fails is logged and skipped; the others still
    /// receive the event. Returns how many plugins accepted it.
    pub async fn broadcast(&self, event: HookTag) -> Result<usize> {
        if !event.is_broadcast_event() {
            bail!("'{}' cannot be broadcast", event);
        }

        let mut delivered = 0;
        for plugin in self.instances() {
            let mut plugin = plugin.lock().await;
            match plugin.dispatcher.dispatch(event) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    warn!(plugin = %plugin.name, event = %event, error = %e, "Event dispatch failed");
                }
            }
        }
        Ok(delivered)
    }

    /// Open one plugin's config menu.
    pub async fn open_config(&self, name: &str) -> Result<Option<ConfigHandle>> {
        let plugin = self.instance(name)?;
        let mut plugin = plugin.lock().await;
        Ok(plugin.dispatcher.get_config()?)
    }

    pub async fn close_config(&self, name: &str) -> Result<()> {
        let plugin = self.instance(name)?;
        let mut plugin = plugin.lock().await;
        Ok(plugin.dispatcher.dispatch(HookTag::ConfigClosed)?)
    }

    /// Tear a plugin down and unmap it.
    pub async fn unload_plugin(&self, name: &str) -> Result<()> {
        let (_, plugin) = self
            .plugins
            .remove(name)
            .ok_or_else(|| anyhow!("Plugin '{}' not found", name))?;

        let mut plugin = plugin.lock().await;
        if plugin.phase().is_running() {
            plugin
                .dispatcher
                .deinitialize()
                .with_context(|| format!("Plugin '{}' failed to deinitialize", name))?;
        }
        plugin.dispatcher.unload()?;

        info!(plugin = name, "Plugin unloaded");
        Ok(())
    }

    /// Unload every plugin, logging failures. Returns how many went down cleanly.
    pub async fn unload_all(&self) -> usize {
        let names: Vec<String> = self.plugins.iter().map(|p| p.key().clone()).collect();
        let mut unloaded = 0;
        for name in names {
            match self.unload_plugin(&name).await {
                Ok(()) => unloaded += 1,
                Err(e) => warn!(plugin = %name, error = %e, "Failed to unload plugin"),
            }
        }
        unloaded
    }

    /// Hooks invoked so far for one plugin
    pub async fn trace(&self, name: &str) -> Result<Vec<HookTag>> {
        let plugin = self.instance(name)?;
        let plugin = plugin.lock().await;
        Ok(plugin.trace().to_vec())
    }

    /// List all loaded plugins, sorted by name
    pub async fn list_plugins(&self) -> Vec<PluginSummary> {
        let mut list = Vec::new();
        for plugin in self.instances() {
            list.push(plugin.lock().await.summary());
        }
        list.sort_by(|a, b| a.name.cmp(&b.name));
        list
    }
}
