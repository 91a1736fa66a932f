//! Services the loader binds into a plugin before walking its table.
//!
//! This stands in for import relocation: the plugin reaches the host only
//! through these function pointers, and the host reaches the plugin only
//! through its hook table.

use std::cell::RefCell;
use std::collections::HashMap;
use std::ffi::{c_char, CStr, CString};

use tracing::{debug, error};

use crate::hooks::RuntimePair;

/// Thread-specific slot the hooking process fills before the init wrapper.
pub const THREAD_MARKER_ID: i32 = 0x1337_1337;
/// Value the init wrapper expects to find in that slot.
pub const THREAD_MARKER_VALUE: u32 = 0x4242_4242;

pub type ThreadSpecificFn = extern "C" fn(id: i32) -> u32;
pub type FatalFn = extern "C-unwind" fn(message: *const c_char) -> !;
pub type RuntimeHookFn = extern "C" fn();

/// Init/fini entry points of one runtime-support subsystem. Either may be
/// absent when the subsystem is not linked in.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeSupport {
    pub init: Option<RuntimeHookFn>,
    pub fini: Option<RuntimeHookFn>,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct HostServices {
    pub get_thread_specific: Option<ThreadSpecificFn>,
    pub fatal: FatalFn,
    /// Indexed by [`RuntimePair::index`].
    pub runtime: [RuntimeSupport; 5],
}

impl HostServices {
    /// Services backed by this process: thread context from
    /// [`get_thread_specific`], faults from [`host_fatal`].
    ///
    /// The process runtime is already up, so the required pairs are bound to
    /// entry points that only log. Sockets stay unbound.
    pub fn process() -> Self {
        let in_process = RuntimeSupport {
            init: Some(in_process_init),
            fini: Some(in_process_fini),
        };
        let mut runtime = [RuntimeSupport::default(); 5];
        for pair in RuntimePair::ALL {
            if pair != RuntimePair::Sockets {
                runtime[pair.index()] = in_process;
            }
        }
        Self {
            get_thread_specific: Some(get_thread_specific),
            fatal: host_fatal,
            runtime,
        }
    }

    pub fn with_runtime(mut self, pair: RuntimePair, support: RuntimeSupport) -> Self {
        self.runtime[pair.index()] = support;
        self
    }

    pub fn runtime(&self, pair: RuntimePair) -> RuntimeSupport {
        self.runtime[pair.index()]
    }

    /// Invoke the host fault function. Never returns.
    pub fn fatal(&self, message: &str) -> ! {
        let message = CString::new(message.replace('\0', " ")).unwrap_or_default();
        (self.fatal)(message.as_ptr())
    }
}

thread_local! {
    static THREAD_SPECIFIC: RefCell<HashMap<i32, u32>> = RefCell::new(HashMap::new());
}

pub fn set_thread_specific(id: i32, value: u32) {
    THREAD_SPECIFIC.with(|slots| {
        slots.borrow_mut().insert(id, value);
    });
}

pub fn clear_thread_specific(id: i32) {
    THREAD_SPECIFIC.with(|slots| {
        slots.borrow_mut().remove(&id);
    });
}

/// Read a slot of the calling thread, 0 when unset.
pub extern "C" fn get_thread_specific(id: i32) -> u32 {
    THREAD_SPECIFIC.with(|slots| slots.borrow().get(&id).copied().unwrap_or(0))
}

/// Mark the calling thread as one the loader dispatches hooks from.
pub fn establish_hook_context() {
    set_thread_specific(THREAD_MARKER_ID, THREAD_MARKER_VALUE);
}

/// Production host fault: log and abort the process.
pub fn report_fatal(message: &str) -> ! {
    error!(message, "Plugin raised a host fault");
    std::process::abort()
}

extern "C" fn in_process_init() {
    debug!("Runtime support provided by the host process");
}

extern "C" fn in_process_fini() {
    debug!("Runtime support stays with the host process");
}

extern "C-unwind" fn host_fatal(message: *const c_char) -> ! {
    let text = if message.is_null() {
        String::from("(no message)")
    } else {
        // SAFETY: plugins pass a NUL-terminated string that lives for the call.
        unsafe { CStr::from_ptr(message) }
            .to_string_lossy()
            .into_owned()
    };
    report_fatal(&text)
}
