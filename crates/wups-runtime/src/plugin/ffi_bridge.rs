//! FFI bridge for native plugins (.so/.dylib) via libloading.
//!
//! The loader touches exactly three exported symbols: the table bounds, the
//! host binding slot and the plugin name. Everything else goes through the
//! hook table.

use std::ffi::CStr;
use std::mem::{align_of, size_of};
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use libloading::Library;
use tracing::debug;

use crate::abi::{
    BindHostFn, NameFn, RawHookSlice, TableFn, BIND_HOST_SYMBOL, NAME_SYMBOL, TABLE_SYMBOL,
};
use crate::hooks::{parse_records, HookRecord, HookTable, RecordLayout};
use crate::host::HostServices;

/// A loaded plugin image and the bounds of its hook table.
///
/// The records live inside the mapped library, so `_library` must outlive
/// every table view handed out. Fields drop in declaration order.
pub struct PluginHandle {
    name: String,
    records: *const HookRecord,
    len: usize,
    _library: Library,
}

// SAFETY: the records are immutable data in the mapped image; the handle
// never writes through the pointer.
unsafe impl Send for PluginHandle {}
unsafe impl Sync for PluginHandle {}

impl std::fmt::Debug for PluginHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginHandle")
            .field("name", &self.name)
            .field("records", &self.len)
            .finish()
    }
}

impl PluginHandle {
    /// Load a native plugin, bind `services` into it and locate its table.
    pub fn load(path: &Path, services: &HostServices) -> Result<Self> {
        let lib = unsafe { Library::new(path) }
            .with_context(|| format!("Failed to load library: {}", path.display()))?;

        let table_fn = *unsafe { lib.get::<TableFn>(TABLE_SYMBOL) }
            .with_context(|| format!("Symbol _wups_hook_table not found in {}", path.display()))?;
        let bind_fn = *unsafe { lib.get::<BindHostFn>(BIND_HOST_SYMBOL) }
            .with_context(|| format!("Symbol _wups_bind_host not found in {}", path.display()))?;
        let name_fn = unsafe { lib.get::<NameFn>(NAME_SYMBOL) }.ok().map(|f| *f);

        bind_fn(services);

        let raw = table_fn();
        // SAFETY: the SDK returns the bounds of its own hook section, which
        // stays mapped as long as `lib`.
        unsafe { check_raw_table(&raw) }
            .with_context(|| format!("Hook table of {} refused", path.display()))?;

        let name = name_fn
            .map(|f| f())
            .filter(|p| !p.is_null())
            // SAFETY: the SDK exports a pointer to a static C string.
            .map(|p| unsafe { CStr::from_ptr(p) }.to_string_lossy().into_owned())
            .or_else(|| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .unwrap_or_else(|| "unnamed".to_string());

        debug!(plugin = %name, records = raw.len, "Native plugin image mapped");

        Ok(Self {
            name,
            records: raw.ptr,
            len: raw.len,
            _library: lib,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table(&self) -> HookTable<'_> {
        // SAFETY: bounded by the borrow of `self`, which keeps the library mapped.
        unsafe { self.table_unbounded() }
    }

    /// Table view not tied to the borrow of `self`.
    ///
    /// # Safety
    /// The caller must drop every view before this handle.
    pub unsafe fn table_unbounded<'a>(&self) -> HookTable<'a> {
        if self.len == 0 {
            return HookTable::new(&[]);
        }
        HookTable::new(std::slice::from_raw_parts(self.records, self.len))
    }
}

/// Check a table handed over by a plugin before it is viewed as records.
///
/// Every tag word must name a known tag; anything else is not a valid
/// `HookTag` and must never be read as one.
///
/// # Safety
/// When `raw.ptr` is non-null and aligned, `raw.len` records must be
/// readable from it.
unsafe fn check_raw_table(raw: &RawHookSlice) -> Result<()> {
    if raw.len == 0 {
        return Ok(());
    }
    if raw.ptr.is_null() {
        bail!("_wups_hook_table returned a null table of {} records", raw.len);
    }
    if raw.ptr.align_offset(align_of::<HookRecord>()) != 0 {
        bail!("_wups_hook_table returned a misaligned table at {:p}", raw.ptr);
    }
    let len = raw
        .len
        .checked_mul(size_of::<HookRecord>())
        .ok_or_else(|| anyhow!("_wups_hook_table length {} overflows", raw.len))?;

    let bytes = std::slice::from_raw_parts(raw.ptr.cast::<u8>(), len);
    let records = parse_records(bytes, RecordLayout::native())?;
    debug!(records = records.len(), "Hook table words verified");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TableError;

    fn slice_of(words: &'static [[usize; 2]]) -> RawHookSlice {
        RawHookSlice {
            ptr: words.as_ptr().cast(),
            len: words.len(),
        }
    }

    #[test]
    fn test_unknown_tag_word_refused() {
        static WORDS: [[usize; 2]; 2] = [[15, 0], [99, 0]];
        let err = unsafe { check_raw_table(&slice_of(&WORDS)) }.unwrap_err();
        assert_eq!(
            err.downcast_ref::<TableError>(),
            Some(&TableError::UnknownTag { index: 1, value: 99 })
        );
    }

    #[test]
    fn test_known_tag_words_accepted() {
        static WORDS: [[usize; 2]; 2] = [[15, 0], [16, 0]];
        assert!(unsafe { check_raw_table(&slice_of(&WORDS)) }.is_ok());

        let empty = RawHookSlice {
            ptr: std::ptr::null(),
            len: 0,
        };
        assert!(unsafe { check_raw_table(&empty) }.is_ok());
    }

    #[test]
    fn test_null_or_misaligned_table_refused() {
        static WORDS: [[usize; 2]; 2] = [[15, 0], [16, 0]];

        let null = RawHookSlice {
            ptr: std::ptr::null(),
            len: 1,
        };
        assert!(unsafe { check_raw_table(&null) }.is_err());

        let shifted = RawHookSlice {
            ptr: WORDS.as_ptr().cast::<u8>().wrapping_add(1).cast(),
            len: 1,
        };
        let err = unsafe { check_raw_table(&shifted) }.unwrap_err();
        assert!(err.to_string().contains("misaligned"));
    }

    #[test]
    fn test_load_nonexistent_library() {
        let result = PluginHandle::load(
            Path::new("/nonexistent/libfoo.so"),
            &HostServices::process(),
        );
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Failed to load"));
    }

    #[test]
    fn test_load_invalid_library() {
        let dir = tempfile::tempdir().unwrap();
        let fake_lib = dir.path().join("libfake.so");
        std::fs::write(&fake_lib, b"not a real library").unwrap();

        let result = PluginHandle::load(&fake_lib, &HostServices::process());
        assert!(result.is_err());
    }
}
