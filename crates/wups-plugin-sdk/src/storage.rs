//! Sink for the storage-init hook.
//!
//! The plugin's only job on storage init is to keep the arguments where the
//! storage API can find them; the storage subsystem itself lives elsewhere.

use std::sync::RwLock;

use tracing::debug;
use wups_runtime::hooks::StorageInitArgs;

#[derive(Clone, Copy)]
struct StorageBinding {
    id: &'static str,
    args: StorageInitArgs,
}

static STORAGE: RwLock<Option<StorageBinding>> = RwLock::new(None);

/// Forward the loader's storage arguments. A later call replaces the binding.
pub fn init_storage(id: &'static str, args: StorageInitArgs) {
    let mut slot = STORAGE.write().unwrap_or_else(|e| e.into_inner());
    *slot = Some(StorageBinding { id, args });
    debug!(storage_id = id, "Storage arguments bound");
}

fn binding() -> Option<StorageBinding> {
    *STORAGE.read().unwrap_or_else(|e| e.into_inner())
}

pub fn storage_args() -> Option<StorageInitArgs> {
    binding().map(|b| b.args)
}

pub fn storage_id() -> Option<&'static str> {
    binding().map(|b| b.id)
}

pub fn is_initialized() -> bool {
    binding().is_some()
}
