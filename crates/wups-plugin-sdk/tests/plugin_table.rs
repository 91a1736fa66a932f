use std::collections::BTreeMap;
use std::sync::Mutex;

use wups_plugin_sdk::*;
use wups_runtime::host::RuntimeSupport;
use wups_runtime::{Dispatcher, LifecyclePhase};

static LOG: Mutex<Vec<&'static str>> = Mutex::new(Vec::new());

fn log(entry: &'static str) {
    LOG.lock().unwrap().push(entry);
}

wups_plugin!("demo");
wups_use_wut_malloc!();
wups_use_wut_sockets!();
wups_use_storage!("demo");

fn constructor() {
    log("ctor");
}
wups_constructor!(constructor);

fn destructor() {
    log("dtor");
}
wups_destructor!(destructor);

initialize_plugin! {
    log("plugin-init");
}

deinitialize_plugin! {
    log("plugin-deinit");
}

on_application_start! {
    log("app-start");
}

on_release_foreground! {
    log("release-fg");
}

on_acquired_foreground! {
    log("acquire-fg");
}

on_application_requests_exit! {
    log("requests-exit");
}

on_application_ends! {
    log("app-ends");
}

wups_get_config! {
    log("get-config");
    ConfigHandle(7)
}

wups_config_closed! {
    log("config-closed");
}

extern "C" fn host_malloc_init() {
    log("malloc-init");
}

extern "C" fn host_malloc_fini() {
    log("malloc-fini");
}

fn bind_host() {
    host::bind(HostServices::process().with_runtime(
        RuntimePair::Malloc,
        RuntimeSupport {
            init: Some(host_malloc_init),
            fini: Some(host_malloc_fini),
        },
    ));
}

#[test]
fn test_one_record_per_declaration() {
    let table = hook_table();
    assert_eq!(table.len(), 16);

    let counts = table.counts();
    let expected: BTreeMap<HookTag, usize> = [
        HookTag::InitWrapper,
        HookTag::FiniWrapper,
        HookTag::InitWutMalloc,
        HookTag::FiniWutMalloc,
        HookTag::InitWutSockets,
        HookTag::FiniWutSockets,
        HookTag::InitStorage,
        HookTag::InitPlugin,
        HookTag::DeinitPlugin,
        HookTag::ApplicationStarts,
        HookTag::ReleaseForeground,
        HookTag::AcquiredForeground,
        HookTag::ApplicationRequestsExit,
        HookTag::ApplicationEnds,
        HookTag::GetConfig,
        HookTag::ConfigClosed,
    ]
    .into_iter()
    .map(|tag| (tag, 1))
    .collect();
    assert_eq!(counts, expected);

    assert!(table.validate().is_ok());
    assert!(table.iter().all(|record| record.is_present()));
}

#[test]
fn test_enumeration_is_idempotent() {
    let first = hook_table().tags();
    let second = hook_table().tags();
    assert_eq!(first, second);
}

#[test]
fn test_exported_table_matches_section() {
    let raw = _wups_hook_table();
    let table = hook_table();
    assert_eq!(raw.len, table.len());
    assert_eq!(raw.ptr, table.records().as_ptr());
}

#[test]
fn test_exported_plugin_name() {
    let name = unsafe { std::ffi::CStr::from_ptr(_wups_plugin_name()) };
    assert_eq!(name.to_str().unwrap(), "demo");
}

#[cfg(target_os = "linux")]
#[test]
fn test_hook_section_is_visible_in_image() {
    use wups_runtime::abi::HOOK_SECTION;

    let exe = std::env::current_exe().unwrap();
    let report = wups_runtime::inspect_image(&exe, HOOK_SECTION).unwrap();

    assert_eq!(report.records.len(), hook_table().len());
    assert_eq!(report.counts, hook_table().counts());
    assert!(report.is_valid(), "problems: {:?}", report.problems);
}

#[test]
fn test_full_lifecycle() {
    bind_host();

    let mut dispatcher = Dispatcher::new("demo", hook_table());
    dispatcher.link().unwrap();
    dispatcher.initialize(StorageInitArgs::default()).unwrap();
    assert_eq!(storage::storage_id(), Some("demo"));

    dispatcher.dispatch(HookTag::ApplicationStarts).unwrap();
    assert_eq!(dispatcher.get_config().unwrap(), Some(ConfigHandle(7)));
    dispatcher.dispatch(HookTag::ConfigClosed).unwrap();
    dispatcher.dispatch(HookTag::ReleaseForeground).unwrap();
    dispatcher.dispatch(HookTag::AcquiredForeground).unwrap();
    dispatcher.dispatch(HookTag::ApplicationRequestsExit).unwrap();
    dispatcher.dispatch(HookTag::ApplicationEnds).unwrap();
    dispatcher.deinitialize().unwrap();
    assert_eq!(dispatcher.phase(), LifecyclePhase::Deinitialized);

    assert_eq!(
        *LOG.lock().unwrap(),
        vec![
            "malloc-init",
            "ctor",
            "plugin-init",
            "app-start",
            "get-config",
            "config-closed",
            "release-fg",
            "acquire-fg",
            "requests-exit",
            "app-ends",
            "plugin-deinit",
            "dtor",
            "malloc-fini",
        ]
    );

    assert_eq!(
        &dispatcher.trace()[..5],
        &[
            HookTag::InitWutMalloc,
            HookTag::InitWutSockets,
            HookTag::InitWrapper,
            HookTag::InitStorage,
            HookTag::InitPlugin,
        ]
    );
}
