//! Host services as seen from inside the plugin.

use std::sync::OnceLock;

use tracing::debug;
use wups_runtime::host::{report_fatal, HostServices};

static SERVICES: OnceLock<HostServices> = OnceLock::new();

/// Store the services the loader hands over. Only the first binding counts.
pub fn bind(services: HostServices) -> bool {
    let bound = SERVICES.set(services).is_ok();
    if !bound {
        debug!("Host services already bound, keeping the first binding");
    }
    bound
}

pub fn services() -> Option<&'static HostServices> {
    SERVICES.get()
}

/// Raise a host fault. Falls back to aborting when nothing is bound.
pub fn fatal(message: &str) -> ! {
    match services() {
        Some(services) => services.fatal(message),
        None => report_fatal(message),
    }
}
