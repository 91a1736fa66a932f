use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Lifecycle event a hook is registered against.
///
/// Discriminants are part of the binary record layout and must never be
/// reordered. The representation is one machine word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[repr(usize)]
pub enum HookTag {
    InitWutMalloc = 0,
    FiniWutMalloc,
    InitWutNewlib,
    FiniWutNewlib,
    InitWutStdcpp,
    FiniWutStdcpp,
    InitWutDevoptab,
    FiniWutDevoptab,
    InitWutSockets,
    FiniWutSockets,

    /// Runs the plugin's constructors after the runtime pairs are up
    InitWrapper,
    /// Runs the plugin's destructors before the runtime pairs go down
    FiniWrapper,

    /// Config menu opened; returns the plugin's config handle
    GetConfig,
    /// Config menu closed
    ConfigClosed,

    /// Internal: hands the storage arguments to the plugin
    InitStorage,

    InitPlugin,
    DeinitPlugin,
    ApplicationStarts,
    ReleaseForeground,
    AcquiredForeground,
    ApplicationRequestsExit,
    ApplicationEnds,
}

/// Calling convention expected for a tag's target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HookSignature {
    /// `fn()`
    Void,
    /// `fn(StorageInitArgs)`
    StorageInit,
    /// `fn() -> ConfigHandle`
    GetConfig,
}

/// Runtime-support subsystem wrapped by an init/fini tag pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuntimePair {
    Malloc,
    Newlib,
    Stdcpp,
    Devoptab,
    Sockets,
}

/// Which half of a runtime pair a tag belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairSide {
    Init,
    Fini,
}

impl RuntimePair {
    /// Canonical bring-up order. Teardown walks it in reverse.
    pub const ALL: [RuntimePair; 5] = [
        RuntimePair::Malloc,
        RuntimePair::Newlib,
        RuntimePair::Stdcpp,
        RuntimePair::Devoptab,
        RuntimePair::Sockets,
    ];

    pub const fn init_tag(self) -> HookTag {
        match self {
            RuntimePair::Malloc => HookTag::InitWutMalloc,
            RuntimePair::Newlib => HookTag::InitWutNewlib,
            RuntimePair::Stdcpp => HookTag::InitWutStdcpp,
            RuntimePair::Devoptab => HookTag::InitWutDevoptab,
            RuntimePair::Sockets => HookTag::InitWutSockets,
        }
    }

    pub const fn fini_tag(self) -> HookTag {
        match self {
            RuntimePair::Malloc => HookTag::FiniWutMalloc,
            RuntimePair::Newlib => HookTag::FiniWutNewlib,
            RuntimePair::Stdcpp => HookTag::FiniWutStdcpp,
            RuntimePair::Devoptab => HookTag::FiniWutDevoptab,
            RuntimePair::Sockets => HookTag::FiniWutSockets,
        }
    }

    /// Position in `ALL`, used to index host runtime bindings.
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl HookTag {
    pub const ALL: [HookTag; 22] = [
        HookTag::InitWutMalloc,
        HookTag::FiniWutMalloc,
        HookTag::InitWutNewlib,
        HookTag::FiniWutNewlib,
        HookTag::InitWutStdcpp,
        HookTag::FiniWutStdcpp,
        HookTag::InitWutDevoptab,
        HookTag::FiniWutDevoptab,
        HookTag::InitWutSockets,
        HookTag::FiniWutSockets,
        HookTag::InitWrapper,
        HookTag::FiniWrapper,
        HookTag::GetConfig,
        HookTag::ConfigClosed,
        HookTag::InitStorage,
        HookTag::InitPlugin,
        HookTag::DeinitPlugin,
        HookTag::ApplicationStarts,
        HookTag::ReleaseForeground,
        HookTag::AcquiredForeground,
        HookTag::ApplicationRequestsExit,
        HookTag::ApplicationEnds,
    ];

    /// Decode a tag word read from an image.
    pub fn from_word(value: u64) -> Option<HookTag> {
        usize::try_from(value)
            .ok()
            .and_then(|index| Self::ALL.get(index).copied())
    }

    pub const fn as_word(self) -> usize {
        self as usize
    }

    /// Only runtime-pair tags may be contributed more than once per image.
    pub const fn is_repeatable(self) -> bool {
        self.runtime_pair().is_some()
    }

    pub const fn signature(self) -> HookSignature {
        match self {
            HookTag::InitStorage => HookSignature::StorageInit,
            HookTag::GetConfig => HookSignature::GetConfig,
            _ => HookSignature::Void,
        }
    }

    pub const fn runtime_pair(self) -> Option<(RuntimePair, PairSide)> {
        let pair = match self {
            HookTag::InitWutMalloc | HookTag::FiniWutMalloc => RuntimePair::Malloc,
            HookTag::InitWutNewlib | HookTag::FiniWutNewlib => RuntimePair::Newlib,
            HookTag::InitWutStdcpp | HookTag::FiniWutStdcpp => RuntimePair::Stdcpp,
            HookTag::InitWutDevoptab | HookTag::FiniWutDevoptab => RuntimePair::Devoptab,
            HookTag::InitWutSockets | HookTag::FiniWutSockets => RuntimePair::Sockets,
            _ => return None,
        };
        // Init tags sit on even discriminants.
        let side = if self.as_word() % 2 == 0 {
            PairSide::Init
        } else {
            PairSide::Fini
        };
        Some((pair, side))
    }

    /// Events the loader may deliver any number of times while running.
    pub const fn is_running_event(self) -> bool {
        matches!(
            self,
            HookTag::ApplicationStarts
                | HookTag::ReleaseForeground
                | HookTag::AcquiredForeground
                | HookTag::ApplicationRequestsExit
                | HookTag::ApplicationEnds
                | HookTag::GetConfig
                | HookTag::ConfigClosed
        )
    }

    /// Running events the host delivers to every plugin at once. Get-config
    /// returns a per-plugin handle and is only ever sent to one plugin.
    pub const fn is_broadcast_event(self) -> bool {
        self.is_running_event() && !matches!(self, HookTag::GetConfig)
    }

    pub const fn name(self) -> &'static str {
        match self {
            HookTag::InitWutMalloc => "init-wut-malloc",
            HookTag::FiniWutMalloc => "fini-wut-malloc",
            HookTag::InitWutNewlib => "init-wut-newlib",
            HookTag::FiniWutNewlib => "fini-wut-newlib",
            HookTag::InitWutStdcpp => "init-wut-stdcpp",
            HookTag::FiniWutStdcpp => "fini-wut-stdcpp",
            HookTag::InitWutDevoptab => "init-wut-devoptab",
            HookTag::FiniWutDevoptab => "fini-wut-devoptab",
            HookTag::InitWutSockets => "init-wut-sockets",
            HookTag::FiniWutSockets => "fini-wut-sockets",
            HookTag::InitWrapper => "init-wrapper",
            HookTag::FiniWrapper => "fini-wrapper",
            HookTag::GetConfig => "get-config",
            HookTag::ConfigClosed => "config-closed",
            HookTag::InitStorage => "init-storage",
            HookTag::InitPlugin => "init-plugin",
            HookTag::DeinitPlugin => "deinit-plugin",
            HookTag::ApplicationStarts => "application-starts",
            HookTag::ReleaseForeground => "release-foreground",
            HookTag::AcquiredForeground => "acquired-foreground",
            HookTag::ApplicationRequestsExit => "application-requests-exit",
            HookTag::ApplicationEnds => "application-ends",
        }
    }
}

impl fmt::Display for HookTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HookTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HookTag::ALL
            .into_iter()
            .find(|tag| tag.name() == s)
            .ok_or_else(|| format!("unknown hook tag '{}'", s))
    }
}
