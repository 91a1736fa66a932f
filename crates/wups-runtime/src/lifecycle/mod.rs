pub mod dispatcher;
pub mod phase;

pub use dispatcher::{Dispatcher, TRACE_CAPACITY};
pub use phase::LifecyclePhase;
