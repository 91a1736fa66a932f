use std::panic::{catch_unwind, AssertUnwindSafe};

use tracing::{debug, info, warn};

use crate::error::LifecycleError;
use crate::hooks::{ConfigHandle, HookSignature, HookTable, HookTag, RuntimePair, StorageInitArgs};
use crate::host;

use super::phase::LifecyclePhase;

/// Most recent invocations kept by [`Dispatcher::trace`].
pub const TRACE_CAPACITY: usize = 128;

/// Walks one plugin's hook table through its lifecycle.
///
/// Hooks run one at a time on the caller's thread. A hook that panics
/// poisons the dispatcher: nothing else of that plugin runs afterwards.
pub struct Dispatcher<'a> {
    plugin: String,
    table: HookTable<'a>,
    phase: LifecyclePhase,
    trace: Vec<HookTag>,
    /// Runtime pairs with at least one init hook invoked, by [`RuntimePair::index`]
    pairs_up: [bool; 5],
    poisoned: bool,
}

impl<'a> Dispatcher<'a> {
    pub fn new(plugin: impl Into<String>, table: HookTable<'a>) -> Self {
        Self {
            plugin: plugin.into(),
            table,
            phase: LifecyclePhase::Unloaded,
            trace: Vec::new(),
            pairs_up: [false; 5],
            poisoned: false,
        }
    }

    pub fn phase(&self) -> LifecyclePhase {
        self.phase
    }

    pub fn table(&self) -> HookTable<'a> {
        self.table
    }

    /// The last [`TRACE_CAPACITY`] tags actually invoked, in call order.
    /// Absent targets are not recorded.
    pub fn trace(&self) -> &[HookTag] {
        let start = self.trace.len().saturating_sub(TRACE_CAPACITY);
        &self.trace[start..]
    }

    fn record(&mut self, tag: HookTag) {
        if self.trace.len() == 2 * TRACE_CAPACITY {
            self.trace.drain(..TRACE_CAPACITY);
        }
        self.trace.push(tag);
    }

    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    fn require(&self, ok: bool, action: &'static str) -> Result<(), LifecycleError> {
        if self.poisoned {
            return Err(LifecycleError::Poisoned);
        }
        if !ok {
            return Err(LifecycleError::InvalidTransition {
                from: self.phase,
                action,
            });
        }
        Ok(())
    }

    /// Accept the table. Fails on any structural violation.
    pub fn link(&mut self) -> Result<(), LifecycleError> {
        self.require(self.phase == LifecyclePhase::Unloaded, "link")?;
        self.table.validate()?;
        self.phase = LifecyclePhase::Linked;
        info!(plugin = %self.plugin, records = self.table.len(), "Hook table linked");
        Ok(())
    }

    /// Bring the plugin up: runtime pairs, init wrapper, storage, plugin init.
    pub fn initialize(&mut self, storage: StorageInitArgs) -> Result<(), LifecycleError> {
        self.require(self.phase == LifecyclePhase::Linked, "initialize")?;

        // The init wrapper refuses to run on a thread we did not mark.
        host::establish_hook_context();

        self.pairs_up = [false; 5];
        for pair in RuntimePair::ALL {
            let fired = self.fire(pair.init_tag(), storage)?;
            self.pairs_up[pair.index()] = fired.invoked > 0;
        }
        self.fire(HookTag::InitWrapper, storage)?;
        self.fire(HookTag::InitStorage, storage)?;
        self.fire(HookTag::InitPlugin, storage)?;

        self.phase = LifecyclePhase::Initialized;
        info!(plugin = %self.plugin, "Plugin initialized");
        Ok(())
    }

    /// Deliver a running-state event.
    pub fn dispatch(&mut self, event: HookTag) -> Result<(), LifecycleError> {
        if !event.is_running_event() {
            return Err(LifecycleError::NotAnEvent(event));
        }
        self.require(self.phase.is_running(), event.name())?;

        let fired = self.fire(event, StorageInitArgs::default())?;
        if let Some(handle) = fired.handle {
            debug!(plugin = %self.plugin, handle = handle.0, "Config handle returned");
        }
        self.phase = self.phase.after_event(event);
        Ok(())
    }

    /// Open the config menu: returns the plugin's handle, `None` when it has
    /// no get-config hook.
    pub fn get_config(&mut self) -> Result<Option<ConfigHandle>, LifecycleError> {
        self.require(self.phase.is_running(), "open config")?;
        Ok(self.fire(HookTag::GetConfig, StorageInitArgs::default())?.handle)
    }

    /// Tear down in reverse: plugin deinit, fini wrapper, runtime pairs.
    ///
    /// A pair's fini hooks only run when one of its init hooks ran.
    pub fn deinitialize(&mut self) -> Result<(), LifecycleError> {
        self.require(self.phase.is_running(), "deinitialize")?;

        let none = StorageInitArgs::default();
        self.fire(HookTag::DeinitPlugin, none)?;
        self.fire(HookTag::FiniWrapper, none)?;
        for pair in RuntimePair::ALL.into_iter().rev() {
            if !self.pairs_up[pair.index()] {
                debug!(plugin = %self.plugin, ?pair, "Runtime pair never came up, skipping fini");
                continue;
            }
            self.fire(pair.fini_tag(), none)?;
            self.pairs_up[pair.index()] = false;
        }

        self.phase = LifecyclePhase::Deinitialized;
        info!(plugin = %self.plugin, "Plugin deinitialized");
        Ok(())
    }

    pub fn unload(&mut self) -> Result<(), LifecycleError> {
        self.require(
            matches!(
                self.phase,
                LifecyclePhase::Linked | LifecyclePhase::Deinitialized
            ),
            "unload",
        )?;
        self.phase = LifecyclePhase::Unloaded;
        Ok(())
    }

    /// Invoke every record of `tag` in table order.
    fn fire(&mut self, tag: HookTag, storage: StorageInitArgs) -> Result<Fired, LifecycleError> {
        let mut fired = Fired::default();

        let table = self.table;
        for record in table.records_for(tag) {
            if !record.is_present() {
                debug!(plugin = %self.plugin, tag = %tag, "Skipping absent hook target");
                continue;
            }

            debug!(plugin = %self.plugin, tag = %tag, "Invoking hook");
            let result = catch_unwind(AssertUnwindSafe(|| match tag.signature() {
                HookSignature::Void => record.invoke_void().map(|_| None),
                HookSignature::StorageInit => record.invoke_storage(storage).map(|_| None),
                HookSignature::GetConfig => record.invoke_get_config(),
            }));

            match result {
                Ok(Ok(returned)) => {
                    self.record(tag);
                    fired.invoked += 1;
                    fired.handle = returned.or(fired.handle);
                }
                Ok(Err(e)) => return Err(e.into()),
                Err(_) => {
                    warn!(plugin = %self.plugin, tag = %tag, "Hook panicked");
                    self.poisoned = true;
                    return Err(LifecycleError::HookPanicked { tag });
                }
            }
        }

        Ok(fired)
    }
}

/// Outcome of firing one tag.
#[derive(Debug, Default)]
struct Fired {
    invoked: usize,
    handle: Option<ConfigHandle>,
}
