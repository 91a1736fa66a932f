//! Symbols a native plugin exports next to its hook table.

use std::ffi::c_char;

use crate::hooks::HookRecord;
use crate::host::HostServices;

/// Returns the bounds of the plugin's hook section.
pub const TABLE_SYMBOL: &[u8] = b"_wups_hook_table\0";
/// Receives the host services before the table is walked.
pub const BIND_HOST_SYMBOL: &[u8] = b"_wups_bind_host\0";
/// Returns the plugin's NUL-terminated name.
pub const NAME_SYMBOL: &[u8] = b"_wups_plugin_name\0";

/// Section the plugin SDK aggregates hook records into (ELF naming).
pub const HOOK_SECTION: &str = "linkme_WUPS_HOOKS";

/// Start and length of a contiguous run of records.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawHookSlice {
    pub ptr: *const HookRecord,
    pub len: usize,
}

impl RawHookSlice {
    pub fn from_slice(records: &'static [HookRecord]) -> Self {
        Self {
            ptr: records.as_ptr(),
            len: records.len(),
        }
    }
}

pub type TableFn = extern "C" fn() -> RawHookSlice;
pub type BindHostFn = extern "C" fn(services: *const HostServices);
pub type NameFn = extern "C" fn() -> *const c_char;
