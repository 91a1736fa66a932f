pub mod ffi_bridge;
pub mod image;
pub mod loader;
pub mod manifest;

pub use ffi_bridge::PluginHandle;
pub use image::{inspect_bytes, inspect_image, ImageReport};
pub use loader::{PluginInstance, PluginManager, PluginSummary};
pub use manifest::{discover_plugins, PluginManifest};
