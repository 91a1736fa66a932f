//! Bodies of the init/fini wrappers and the runtime-pair hooks.

use thiserror::Error;
use tracing::debug;
use wups_runtime::host::{HostServices, ThreadSpecificFn, THREAD_MARKER_ID, THREAD_MARKER_VALUE};
use wups_runtime::hooks::{PairSide, RuntimePair};

use crate::host;

/// Appended to the plugin name when the init wrapper finds no hook context.
pub const LINKING_ORDER_MESSAGE: &str =
    "plugin was started outside the hooking process; check that the WUPS loader mapped it \
     and that the SDK is linked before any other runtime library";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegrityError {
    #[error("thread-specific lookup is not bound")]
    LookupUnavailable,
    #[error("thread marker is {found:#x}, expected {expected:#x}")]
    MarkerMismatch { found: u32, expected: u32 },
}

/// Confirm the calling thread was prepared by the hooking process.
pub fn check_thread_marker(lookup: Option<ThreadSpecificFn>) -> Result<(), IntegrityError> {
    let lookup = lookup.ok_or(IntegrityError::LookupUnavailable)?;
    match lookup(THREAD_MARKER_ID) {
        THREAD_MARKER_VALUE => Ok(()),
        found => Err(IntegrityError::MarkerMismatch {
            found,
            expected: THREAD_MARKER_VALUE,
        }),
    }
}

/// Init wrapper: verify the hook context, then run the constructors.
///
/// On an integrity failure the host fault fires and never returns, so no
/// constructor runs.
pub fn run_init_wrapper(services: Option<&HostServices>, plugin: &str, constructors: &[fn()]) {
    if let Err(e) = check_thread_marker(services.and_then(|s| s.get_thread_specific)) {
        fault(
            services,
            &format!("{}: {} ({})", plugin, LINKING_ORDER_MESSAGE, e),
        );
    }

    debug!(plugin, count = constructors.len(), "Running constructors");
    for constructor in constructors {
        constructor();
    }
}

/// Fini wrapper: destructors in reverse registration order.
pub fn run_fini_wrapper(destructors: &[fn()]) {
    for destructor in destructors.iter().rev() {
        destructor();
    }
}

pub fn init_runtime(pair: RuntimePair) {
    call_runtime(host::services(), pair, PairSide::Init);
}

pub fn fini_runtime(pair: RuntimePair) {
    call_runtime(host::services(), pair, PairSide::Fini);
}

/// Forward a runtime-pair hook to the host's implementation.
///
/// Sockets are optional: an unbound socket entry point is skipped. Every
/// other pair must be bound.
fn call_runtime(services: Option<&HostServices>, pair: RuntimePair, side: PairSide) {
    let support = services.map(|s| s.runtime(pair)).unwrap_or_default();
    let entry = match side {
        PairSide::Init => support.init,
        PairSide::Fini => support.fini,
    };

    match entry {
        Some(entry) => entry(),
        None if pair == RuntimePair::Sockets => {
            debug!(?side, "Socket runtime not linked, skipping");
        }
        None => fault(
            services,
            &format!("runtime support {:?} {:?} is not bound", pair, side),
        ),
    }
}

fn fault(services: Option<&HostServices>, message: &str) -> ! {
    match services {
        Some(services) => services.fatal(message),
        None => host::fatal(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::{c_char, CStr};
    use std::panic::{catch_unwind, AssertUnwindSafe};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wups_runtime::host::RuntimeSupport;

    extern "C" fn marker_present(id: i32) -> u32 {
        if id == THREAD_MARKER_ID {
            THREAD_MARKER_VALUE
        } else {
            0
        }
    }

    extern "C" fn marker_missing(_id: i32) -> u32 {
        0
    }

    extern "C-unwind" fn panicking_fatal(message: *const c_char) -> ! {
        let text = unsafe { CStr::from_ptr(message) }.to_string_lossy().into_owned();
        panic!("host fault: {}", text);
    }

    fn services(lookup: Option<ThreadSpecificFn>) -> HostServices {
        HostServices {
            get_thread_specific: lookup,
            fatal: panicking_fatal,
            runtime: [RuntimeSupport::default(); 5],
        }
    }

    static CONSTRUCTED: AtomicUsize = AtomicUsize::new(0);

    fn constructor() {
        CONSTRUCTED.fetch_add(1, Ordering::SeqCst);
    }

    #[test]
    fn test_check_thread_marker() {
        assert_eq!(check_thread_marker(Some(marker_present)), Ok(()));
        assert_eq!(
            check_thread_marker(Some(marker_missing)),
            Err(IntegrityError::MarkerMismatch {
                found: 0,
                expected: THREAD_MARKER_VALUE
            })
        );
        assert_eq!(
            check_thread_marker(None),
            Err(IntegrityError::LookupUnavailable)
        );
    }

    #[test]
    fn test_loader_thread_context_passes_check() {
        wups_runtime::host::establish_hook_context();
        assert!(check_thread_marker(Some(wups_runtime::host::get_thread_specific)).is_ok());
    }

    #[test]
    fn test_init_wrapper_faults_without_marker() {
        static REACHED: AtomicUsize = AtomicUsize::new(0);
        fn must_not_run() {
            REACHED.fetch_add(1, Ordering::SeqCst);
        }
        let services = services(Some(marker_missing));

        let result = catch_unwind(AssertUnwindSafe(|| {
            run_init_wrapper(Some(&services), "demo", &[must_not_run]);
        }));

        let payload = result.unwrap_err();
        let message = payload.downcast_ref::<String>().unwrap();
        assert!(message.contains("demo: plugin was started outside the hooking process"));
        assert_eq!(REACHED.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_init_wrapper_runs_constructors() {
        let services = services(Some(marker_present));
        run_init_wrapper(Some(&services), "demo", &[constructor, constructor]);
        assert_eq!(CONSTRUCTED.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_fini_wrapper_runs_in_reverse() {
        use std::sync::Mutex;
        static ORDER: Mutex<Vec<u8>> = Mutex::new(Vec::new());
        fn first() {
            ORDER.lock().unwrap().push(1);
        }
        fn second() {
            ORDER.lock().unwrap().push(2);
        }

        run_fini_wrapper(&[first, second]);
        assert_eq!(*ORDER.lock().unwrap(), vec![2, 1]);
    }

    #[test]
    fn test_unbound_sockets_are_skipped() {
        let services = services(Some(marker_present));
        call_runtime(Some(&services), RuntimePair::Sockets, PairSide::Init);
        call_runtime(Some(&services), RuntimePair::Sockets, PairSide::Fini);
    }

    #[test]
    fn test_unbound_required_runtime_faults() {
        let services = services(Some(marker_present));
        let result = catch_unwind(AssertUnwindSafe(|| {
            call_runtime(Some(&services), RuntimePair::Malloc, PairSide::Init);
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_bound_runtime_is_called() {
        static CALLED: AtomicUsize = AtomicUsize::new(0);
        extern "C" fn newlib_init() {
            CALLED.fetch_add(1, Ordering::SeqCst);
        }
        let services = services(None).with_runtime(
            RuntimePair::Newlib,
            RuntimeSupport {
                init: Some(newlib_init),
                fini: None,
            },
        );
        call_runtime(Some(&services), RuntimePair::Newlib, PairSide::Init);
        assert_eq!(CALLED.load(Ordering::SeqCst), 1);
    }
}
