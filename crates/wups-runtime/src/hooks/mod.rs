pub mod raw;
pub mod record;
pub mod table;
pub mod tag;

pub use raw::{parse_records, Endian, RawHookRecord, RecordLayout, WordSize};
pub use record::{
    ConfigHandle, GetConfigHook, HookRecord, HookTarget, StorageInitArgs, StorageInitHook,
    VoidHook,
};
pub use table::HookTable;
pub use tag::{HookSignature, HookTag, PairSide, RuntimePair};
