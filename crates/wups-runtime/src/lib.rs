//! Hook table ABI and loader-side lifecycle dispatch for WUPS plugins.
//!
//! The plugin side (declaring hooks) lives in `wups-plugin-sdk`; this crate
//! holds the types both sides agree on and everything the loader does with a
//! table once it has one.

pub mod abi;
pub mod error;
pub mod hooks;
pub mod host;
pub mod lifecycle;
pub mod plugin;

pub use error::{LifecycleError, TableError};
pub use hooks::{
    ConfigHandle, HookRecord, HookSignature, HookTable, HookTag, RawHookRecord, RecordLayout,
    RuntimePair, StorageInitArgs,
};
pub use host::{HostServices, RuntimeSupport};
pub use lifecycle::{Dispatcher, LifecyclePhase};
pub use plugin::{
    inspect_image, ImageReport, PluginHandle, PluginManager, PluginManifest, PluginSummary,
};

/// Initialize structured JSON logging
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    fmt()
        .json()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
}
