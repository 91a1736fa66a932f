//! Error types for table parsing and lifecycle dispatch.
//!
//! Application-level code (manager, FFI bridge, CLI) wraps these in
//! `anyhow::Error` with context; the typed variants stay matchable in tests.

use thiserror::Error;

use crate::hooks::{HookSignature, HookTag};
use crate::lifecycle::LifecyclePhase;

/// A hook table that cannot be activated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("hook tag '{tag}' may appear at most once, found {count} records")]
    DuplicateTag { tag: HookTag, count: usize },

    #[error("hook table is {len} bytes, not a whole number of {record_size}-byte records")]
    TruncatedTable { len: usize, record_size: usize },

    #[error("record {index} carries unknown hook tag {value:#x}")]
    UnknownTag { index: usize, value: u64 },

    #[error("hook '{tag}' expects a {expected:?} target, called as {actual:?}")]
    SignatureMismatch {
        tag: HookTag,
        expected: HookSignature,
        actual: HookSignature,
    },

    #[error("section '{0}' not found in image")]
    SectionNotFound(String),
}

/// A loader step that violated the lifecycle contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("cannot {action} while plugin is {from:?}")]
    InvalidTransition {
        from: LifecyclePhase,
        action: &'static str,
    },

    #[error("'{0}' is not a running-state event")]
    NotAnEvent(HookTag),

    #[error(transparent)]
    Table(#[from] TableError),

    #[error("hook '{tag}' panicked")]
    HookPanicked { tag: HookTag },

    #[error("dispatcher is poisoned after a failed hook")]
    Poisoned,
}
