//! Hook declaration macros.
//!
//! `wups_hook!` is the only primitive; everything else is sugar that defines
//! an `extern "C-unwind"` function and registers it for a fixed tag.

/// Register `function` for `tag` in this image's hook table.
///
/// The record lives in a hidden module named after the function, so
/// registering the same function twice in one module does not compile.
/// Tags that may appear only once per image also claim an unmangled guard
/// symbol, so a second registration anywhere in the image fails the build.
///
/// ```
/// use wups_plugin_sdk::wups_hook;
///
/// extern "C-unwind" fn on_menu_closed() {}
/// wups_hook!(ConfigClosed, on_menu_closed);
/// # fn main() {
/// #     assert_eq!(wups_plugin_sdk::hook_table().len(), 1);
/// # }
/// ```
///
/// A second hook for a tag that may appear only once is rejected:
///
/// ```compile_fail
/// use wups_plugin_sdk::wups_hook;
///
/// extern "C-unwind" fn first() {}
/// extern "C-unwind" fn second() {}
/// wups_hook!(InitPlugin, first);
/// wups_hook!(InitPlugin, second);
/// # fn main() {}
/// ```
///
/// So is a function whose signature does not match the tag:
///
/// ```compile_fail
/// use wups_plugin_sdk::wups_hook;
///
/// extern "C-unwind" fn menu() {}
/// wups_hook!(GetConfig, menu);
/// # fn main() {}
/// ```
#[macro_export]
macro_rules! wups_hook {
    ($tag:ident, $function:ident) => {
        $crate::__wups_unique_guard!($tag);

        #[doc(hidden)]
        #[allow(non_snake_case)]
        mod $function {
            #[$crate::__private::linkme::distributed_slice($crate::WUPS_HOOKS)]
            #[linkme(crate = $crate::__private::linkme)]
            static RECORD: $crate::__private::HookRecord =
                $crate::__wups_record!($tag, super::$function);
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __wups_record {
    (InitStorage, $function:path) => {
        $crate::__private::HookRecord::storage(
            $crate::__private::HookTag::InitStorage,
            $function,
        )
    };
    (GetConfig, $function:path) => {
        $crate::__private::HookRecord::config($crate::__private::HookTag::GetConfig, $function)
    };
    ($tag:ident, $function:path) => {
        $crate::__private::HookRecord::void($crate::__private::HookTag::$tag, $function)
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __wups_unique_guard {
    (InitWutMalloc) => {};
    (FiniWutMalloc) => {};
    (InitWutNewlib) => {};
    (FiniWutNewlib) => {};
    (InitWutStdcpp) => {};
    (FiniWutStdcpp) => {};
    (InitWutDevoptab) => {};
    (FiniWutDevoptab) => {};
    (InitWutSockets) => {};
    (FiniWutSockets) => {};
    (InitWrapper) => {
        $crate::__wups_guard_symbol!("wups_hook_unique_init_wrapper");
    };
    (FiniWrapper) => {
        $crate::__wups_guard_symbol!("wups_hook_unique_fini_wrapper");
    };
    (GetConfig) => {
        $crate::__wups_guard_symbol!("wups_hook_unique_get_config");
    };
    (ConfigClosed) => {
        $crate::__wups_guard_symbol!("wups_hook_unique_config_closed");
    };
    (InitStorage) => {
        $crate::__wups_guard_symbol!("wups_hook_unique_init_storage");
    };
    (InitPlugin) => {
        $crate::__wups_guard_symbol!("wups_hook_unique_init_plugin");
    };
    (DeinitPlugin) => {
        $crate::__wups_guard_symbol!("wups_hook_unique_deinit_plugin");
    };
    (ApplicationStarts) => {
        $crate::__wups_guard_symbol!("wups_hook_unique_application_starts");
    };
    (ReleaseForeground) => {
        $crate::__wups_guard_symbol!("wups_hook_unique_release_foreground");
    };
    (AcquiredForeground) => {
        $crate::__wups_guard_symbol!("wups_hook_unique_acquired_foreground");
    };
    (ApplicationRequestsExit) => {
        $crate::__wups_guard_symbol!("wups_hook_unique_application_requests_exit");
    };
    (ApplicationEnds) => {
        $crate::__wups_guard_symbol!("wups_hook_unique_application_ends");
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __wups_guard_symbol {
    ($symbol:literal) => {
        const _: () = {
            #[used]
            #[export_name = $symbol]
            static GUARD: u8 = 0;
        };
    };
}

/// Add a function to the constructors the init wrapper runs.
#[macro_export]
macro_rules! wups_constructor {
    ($function:path) => {
        const _: () = {
            #[$crate::__private::linkme::distributed_slice($crate::WUPS_CONSTRUCTORS)]
            #[linkme(crate = $crate::__private::linkme)]
            static CONSTRUCTOR: fn() = $function;
        };
    };
}

/// Add a function to the destructors the fini wrapper runs.
#[macro_export]
macro_rules! wups_destructor {
    ($function:path) => {
        const _: () = {
            #[$crate::__private::linkme::distributed_slice($crate::WUPS_DESTRUCTORS)]
            #[linkme(crate = $crate::__private::linkme)]
            static DESTRUCTOR: fn() = $function;
        };
    };
}

/// Declare the plugin: init/fini wrappers plus the symbols the loader
/// resolves. Use exactly once per image.
#[macro_export]
macro_rules! wups_plugin {
    ($name:literal) => {
        extern "C-unwind" fn __wups_init_wrapper() {
            $crate::runtime::run_init_wrapper(
                $crate::host::services(),
                $name,
                &$crate::WUPS_CONSTRUCTORS,
            );
        }
        $crate::wups_hook!(InitWrapper, __wups_init_wrapper);

        extern "C-unwind" fn __wups_fini_wrapper() {
            $crate::runtime::run_fini_wrapper(&$crate::WUPS_DESTRUCTORS);
        }
        $crate::wups_hook!(FiniWrapper, __wups_fini_wrapper);

        #[no_mangle]
        pub extern "C" fn _wups_hook_table() -> $crate::__private::RawHookSlice {
            $crate::__private::RawHookSlice::from_slice($crate::hook_table().records())
        }

        #[no_mangle]
        pub extern "C" fn _wups_bind_host(services: *const $crate::HostServices) {
            // SAFETY: the loader passes a valid pointer for the duration of the call.
            if let Some(services) = unsafe { services.as_ref() } {
                $crate::host::bind(*services);
            }
        }

        #[no_mangle]
        pub extern "C" fn _wups_plugin_name() -> *const ::std::ffi::c_char {
            concat!($name, "\0").as_ptr().cast()
        }
    };
}

/// Called once the plugin is initialized, after storage is available.
#[macro_export]
macro_rules! initialize_plugin {
    ($($body:tt)*) => {
        extern "C-unwind" fn init_plugin() {
            $($body)*
        }
        $crate::wups_hook!(InitPlugin, init_plugin);
    };
}

/// Called once before the runtime pairs are torn down.
#[macro_export]
macro_rules! deinitialize_plugin {
    ($($body:tt)*) => {
        extern "C-unwind" fn deinit_plugin() {
            $($body)*
        }
        $crate::wups_hook!(DeinitPlugin, deinit_plugin);
    };
}

#[macro_export]
macro_rules! on_application_start {
    ($($body:tt)*) => {
        extern "C-unwind" fn on_app_starting() {
            $($body)*
        }
        $crate::wups_hook!(ApplicationStarts, on_app_starting);
    };
}

/// Called when the application is about to leave the foreground.
#[macro_export]
macro_rules! on_release_foreground {
    ($($body:tt)*) => {
        extern "C-unwind" fn on_release_foreground() {
            $($body)*
        }
        $crate::wups_hook!(ReleaseForeground, on_release_foreground);
    };
}

/// Called when the application (re)gains the foreground.
#[macro_export]
macro_rules! on_acquired_foreground {
    ($($body:tt)*) => {
        extern "C-unwind" fn on_acquired_foreground() {
            $($body)*
        }
        $crate::wups_hook!(AcquiredForeground, on_acquired_foreground);
    };
}

#[macro_export]
macro_rules! on_application_requests_exit {
    ($($body:tt)*) => {
        extern "C-unwind" fn on_app_requests_exit() {
            $($body)*
        }
        $crate::wups_hook!(ApplicationRequestsExit, on_app_requests_exit);
    };
}

#[macro_export]
macro_rules! on_application_ends {
    ($($body:tt)*) => {
        extern "C-unwind" fn on_app_ending() {
            $($body)*
        }
        $crate::wups_hook!(ApplicationEnds, on_app_ending);
    };
}

/// Called when the config menu opens. The body evaluates to a
/// [`ConfigHandle`](crate::ConfigHandle).
#[macro_export]
macro_rules! wups_get_config {
    ($($body:tt)*) => {
        extern "C-unwind" fn on_get_wups_config() -> $crate::ConfigHandle {
            $($body)*
        }
        $crate::wups_hook!(GetConfig, on_get_wups_config);
    };
}

#[macro_export]
macro_rules! wups_config_closed {
    ($($body:tt)*) => {
        extern "C-unwind" fn on_wups_config_closed() {
            $($body)*
        }
        $crate::wups_hook!(ConfigClosed, on_wups_config_closed);
    };
}

/// Bind the plugin to a storage namespace. The generated hook only forwards
/// the loader's arguments to [`storage::init_storage`](crate::storage::init_storage).
#[macro_export]
macro_rules! wups_use_storage {
    ($id:literal) => {
        extern "C-unwind" fn init_storage(args: $crate::StorageInitArgs) {
            $crate::storage::init_storage($id, args);
        }
        $crate::wups_hook!(InitStorage, init_storage);
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __wups_runtime_pair {
    ($pair:ident, $init_tag:ident, $init:ident, $fini_tag:ident, $fini:ident) => {
        extern "C-unwind" fn $init() {
            $crate::runtime::init_runtime($crate::RuntimePair::$pair);
        }
        $crate::wups_hook!($init_tag, $init);

        extern "C-unwind" fn $fini() {
            $crate::runtime::fini_runtime($crate::RuntimePair::$pair);
        }
        $crate::wups_hook!($fini_tag, $fini);
    };
}

/// Use the host's allocator.
#[macro_export]
macro_rules! wups_use_wut_malloc {
    () => {
        $crate::__wups_runtime_pair!(
            Malloc,
            InitWutMalloc,
            on_init_wut_malloc,
            FiniWutMalloc,
            on_fini_wut_malloc
        );
    };
}

#[macro_export]
macro_rules! wups_use_wut_newlib {
    () => {
        $crate::__wups_runtime_pair!(
            Newlib,
            InitWutNewlib,
            on_init_wut_newlib,
            FiniWutNewlib,
            on_fini_wut_newlib
        );
    };
}

#[macro_export]
macro_rules! wups_use_wut_stdcpp {
    () => {
        $crate::__wups_runtime_pair!(
            Stdcpp,
            InitWutStdcpp,
            on_init_wut_stdcpp,
            FiniWutStdcpp,
            on_fini_wut_stdcpp
        );
    };
}

#[macro_export]
macro_rules! wups_use_wut_devoptab {
    () => {
        $crate::__wups_runtime_pair!(
            Devoptab,
            InitWutDevoptab,
            on_init_wut_devoptab,
            FiniWutDevoptab,
            on_fini_wut_devoptab
        );
    };
}

/// Use the host's sockets when they are linked in; skipped otherwise.
#[macro_export]
macro_rules! wups_use_wut_sockets {
    () => {
        $crate::__wups_runtime_pair!(
            Sockets,
            InitWutSockets,
            on_init_wut_sockets,
            FiniWutSockets,
            on_fini_wut_sockets
        );
    };
}
