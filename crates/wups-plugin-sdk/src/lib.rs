//! WUPS Plugin SDK
//!
//! Plugins declare hooks with the macros in this crate. Every declaration
//! contributes one record to [`WUPS_HOOKS`] at link time; nothing runs when a
//! hook is declared. The loader finds the table through the section bounds or
//! through the symbols `wups_plugin!` exports.
//!
//! ```ignore
//! use wups_plugin_sdk::*;
//!
//! wups_plugin!("screenshot");
//! wups_use_wut_malloc!();
//! wups_use_storage!("screenshot");
//!
//! initialize_plugin! {
//!     tracing::info!("screenshot plugin ready");
//! }
//!
//! on_application_start! {
//!     // per-application setup
//! }
//! ```

pub mod host;
mod macros;
pub mod runtime;
pub mod storage;

use linkme::distributed_slice;

pub use wups_runtime::hooks::{
    ConfigHandle, HookRecord, HookTable, HookTag, RuntimePair, StorageInitArgs,
};
pub use wups_runtime::host::HostServices;

/// Every hook record contributed by this image, in link order.
#[distributed_slice]
pub static WUPS_HOOKS: [HookRecord] = [..];

/// Run by the init wrapper, in link order.
#[distributed_slice]
pub static WUPS_CONSTRUCTORS: [fn()] = [..];

/// Run by the fini wrapper, in reverse link order.
#[distributed_slice]
pub static WUPS_DESTRUCTORS: [fn()] = [..];

/// The aggregated hook table of this image.
pub fn hook_table() -> HookTable<'static> {
    HookTable::new(&WUPS_HOOKS)
}

#[doc(hidden)]
pub mod __private {
    pub use linkme;
    pub use wups_runtime::abi::RawHookSlice;
    pub use wups_runtime::hooks::{HookRecord, HookTag};
}
