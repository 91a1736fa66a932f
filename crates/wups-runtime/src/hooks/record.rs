use std::ffi::{c_char, c_void};
use std::fmt;

use crate::error::TableError;

use super::tag::{HookSignature, HookTag};

/// Target of most tags.
pub type VoidHook = extern "C-unwind" fn();
/// Target of [`HookTag::InitStorage`].
pub type StorageInitHook = extern "C-unwind" fn(StorageInitArgs);
/// Target of [`HookTag::GetConfig`].
pub type GetConfigHook = extern "C-unwind" fn() -> ConfigHandle;

pub type OpenStorageFn = extern "C" fn(storage_id: *const c_char, root: *mut *mut c_void) -> i32;
pub type CloseStorageFn = extern "C" fn(storage_id: *const c_char) -> i32;

/// Argument record handed to the storage-init hook.
///
/// Opaque to the hook table: the plugin forwards it to the storage subsystem
/// untouched.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct StorageInitArgs {
    pub context: *mut c_void,
    pub open_storage: Option<OpenStorageFn>,
    pub close_storage: Option<CloseStorageFn>,
}

// SAFETY: `context` belongs to the storage subsystem, which outlives every
// plugin it serves; the record itself is never mutated after creation.
unsafe impl Send for StorageInitArgs {}
unsafe impl Sync for StorageInitArgs {}

impl Default for StorageInitArgs {
    fn default() -> Self {
        Self {
            context: std::ptr::null_mut(),
            open_storage: None,
            close_storage: None,
        }
    }
}

/// Opaque handle returned by a plugin's get-config hook.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConfigHandle(pub usize);

/// Function address stored in a record, one machine word.
///
/// Which field is live is decided by the owning record's tag; a null word
/// means a weak target that was not linked in.
#[repr(C)]
#[derive(Clone, Copy)]
pub union HookTarget {
    void: Option<VoidHook>,
    storage: Option<StorageInitHook>,
    config: Option<GetConfigHook>,
}

impl HookTarget {
    pub const NULL: HookTarget = HookTarget { void: None };

    pub fn is_present(&self) -> bool {
        // SAFETY: every field is a nullable function pointer of the same size,
        // so reading any of them is valid for the null check.
        unsafe { self.void.is_some() }
    }

    /// Raw function address, 0 when absent.
    pub fn address(&self) -> usize {
        // SAFETY: see `is_present`.
        unsafe { self.void.map(|f| f as usize).unwrap_or(0) }
    }
}

/// One registration: a lifecycle tag and the function to call for it.
///
/// Exactly two machine words, laid out `{tag, target}` with no padding.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct HookRecord {
    pub tag: HookTag,
    target: HookTarget,
}

impl HookRecord {
    /// Record for a tag with a `fn()` target.
    ///
    /// Evaluated in a `static` initializer, a tag of another signature fails
    /// the build:
    ///
    /// ```compile_fail
    /// use wups_runtime::{HookRecord, HookTag};
    ///
    /// extern "C-unwind" fn menu() {}
    /// static RECORD: HookRecord = HookRecord::void(HookTag::GetConfig, menu);
    /// ```
    pub const fn void(tag: HookTag, target: VoidHook) -> Self {
        assert!(
            matches!(tag.signature(), HookSignature::Void),
            "hook tag does not take a fn() target"
        );
        Self {
            tag,
            target: HookTarget { void: Some(target) },
        }
    }

    pub const fn storage(tag: HookTag, target: StorageInitHook) -> Self {
        assert!(
            matches!(tag.signature(), HookSignature::StorageInit),
            "hook tag does not take a storage-init target"
        );
        Self {
            tag,
            target: HookTarget {
                storage: Some(target),
            },
        }
    }

    pub const fn config(tag: HookTag, target: GetConfigHook) -> Self {
        assert!(
            matches!(tag.signature(), HookSignature::GetConfig),
            "hook tag does not take a get-config target"
        );
        Self {
            tag,
            target: HookTarget {
                config: Some(target),
            },
        }
    }

    /// Record whose weak target was not linked in.
    pub const fn absent(tag: HookTag) -> Self {
        Self {
            tag,
            target: HookTarget::NULL,
        }
    }

    pub fn target(&self) -> HookTarget {
        self.target
    }

    pub fn is_present(&self) -> bool {
        self.target.is_present()
    }

    fn expect(&self, actual: HookSignature) -> Result<(), TableError> {
        let expected = self.tag.signature();
        if expected != actual {
            return Err(TableError::SignatureMismatch {
                tag: self.tag,
                expected,
                actual,
            });
        }
        Ok(())
    }

    /// Call a `fn()` target. `Ok(false)` when the target is absent.
    pub fn invoke_void(&self) -> Result<bool, TableError> {
        self.expect(HookSignature::Void)?;
        // SAFETY: the constructors only store `void` for Void-signature tags.
        match unsafe { self.target.void } {
            Some(f) => {
                f();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn invoke_storage(&self, args: StorageInitArgs) -> Result<bool, TableError> {
        self.expect(HookSignature::StorageInit)?;
        // SAFETY: only `HookRecord::storage` writes this field for InitStorage.
        match unsafe { self.target.storage } {
            Some(f) => {
                f(args);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn invoke_get_config(&self) -> Result<Option<ConfigHandle>, TableError> {
        self.expect(HookSignature::GetConfig)?;
        // SAFETY: only `HookRecord::config` writes this field for GetConfig.
        Ok(unsafe { self.target.config }.map(|f| f()))
    }
}

impl fmt::Debug for HookRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookRecord")
            .field("tag", &self.tag)
            .field("target", &format_args!("{:#x}", self.target.address()))
            .finish()
    }
}

impl PartialEq for HookRecord {
    fn eq(&self, other: &Self) -> bool {
        self.tag == other.tag && self.target.address() == other.target.address()
    }
}

impl Eq for HookRecord {}
