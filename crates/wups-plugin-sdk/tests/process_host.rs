use std::sync::atomic::{AtomicUsize, Ordering};

use wups_plugin_sdk::*;
use wups_runtime::{Dispatcher, LifecyclePhase};

static STARTED: AtomicUsize = AtomicUsize::new(0);

wups_plugin!("runtime-heavy");
wups_use_wut_malloc!();
wups_use_wut_newlib!();
wups_use_wut_stdcpp!();
wups_use_wut_devoptab!();
wups_use_wut_sockets!();

initialize_plugin! {
    STARTED.fetch_add(1, Ordering::SeqCst);
}

#[test]
fn test_process_host_serves_every_runtime_pair() {
    assert!(host::bind(HostServices::process()));

    let mut dispatcher = Dispatcher::new("runtime-heavy", hook_table());
    dispatcher.link().unwrap();
    dispatcher.initialize(StorageInitArgs::default()).unwrap();
    assert_eq!(STARTED.load(Ordering::SeqCst), 1);

    dispatcher.deinitialize().unwrap();
    assert_eq!(dispatcher.phase(), LifecyclePhase::Deinitialized);

    let trace = dispatcher.trace();
    for pair in RuntimePair::ALL {
        assert!(trace.contains(&pair.init_tag()), "{:?}", pair);
        assert!(trace.contains(&pair.fini_tag()), "{:?}", pair);
    }
}
