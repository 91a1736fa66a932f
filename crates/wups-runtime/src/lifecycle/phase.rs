use serde::Serialize;

use crate::hooks::HookTag;

/// Where a plugin instance is in the loader's lifecycle.
///
/// `Unloaded → Linked → Initialized → (Foregrounded ⇄ Backgrounded) →
/// Exiting → … → Deinitialized → Unloaded`. Initialized, Foregrounded,
/// Backgrounded and Exiting together make up the running state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LifecyclePhase {
    Unloaded,
    Linked,
    /// Plugin is up, no application in front of it
    Initialized,
    Foregrounded,
    Backgrounded,
    Exiting,
    Deinitialized,
}

impl LifecyclePhase {
    pub const fn is_running(self) -> bool {
        matches!(
            self,
            LifecyclePhase::Initialized
                | LifecyclePhase::Foregrounded
                | LifecyclePhase::Backgrounded
                | LifecyclePhase::Exiting
        )
    }

    /// Phase after a running event was delivered.
    ///
    /// Every event is legal from every running phase: the host decides the
    /// order, and a plugin can lose the foreground mid-application.
    pub const fn after_event(self, event: HookTag) -> LifecyclePhase {
        match event {
            HookTag::ApplicationStarts | HookTag::AcquiredForeground => {
                LifecyclePhase::Foregrounded
            }
            HookTag::ReleaseForeground => LifecyclePhase::Backgrounded,
            HookTag::ApplicationRequestsExit => LifecyclePhase::Exiting,
            HookTag::ApplicationEnds => LifecyclePhase::Initialized,
            _ => self,
        }
    }
}
