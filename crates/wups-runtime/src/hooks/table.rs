use std::collections::BTreeMap;

use crate::error::TableError;

use super::record::HookRecord;
use super::tag::HookTag;

/// Read-only view over the hook records of one plugin image.
///
/// Membership is fixed when the image is linked; the view never inserts or
/// removes records, so enumerating it twice yields the same sequence.
#[derive(Debug, Clone, Copy)]
pub struct HookTable<'a> {
    records: &'a [HookRecord],
}

impl<'a> HookTable<'a> {
    pub const fn new(records: &'a [HookRecord]) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &'a [HookRecord] {
        self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a HookRecord> + 'a {
        self.records.iter()
    }

    /// All records for `tag`, in table order.
    pub fn records_for(&self, tag: HookTag) -> impl Iterator<Item = &'a HookRecord> + 'a {
        self.records.iter().filter(move |r| r.tag == tag)
    }

    pub fn first(&self, tag: HookTag) -> Option<&'a HookRecord> {
        self.records.iter().find(|r| r.tag == tag)
    }

    pub fn contains(&self, tag: HookTag) -> bool {
        self.first(tag).is_some()
    }

    /// Tags in table order, duplicates included.
    pub fn tags(&self) -> Vec<HookTag> {
        self.records.iter().map(|r| r.tag).collect()
    }

    /// Number of records per tag.
    pub fn counts(&self) -> BTreeMap<HookTag, usize> {
        count_tags(self.records.iter().map(|r| r.tag))
    }

    /// Reject tables that declare a non-repeatable tag more than once.
    pub fn validate(&self) -> Result<(), TableError> {
        check_duplicates(self.records.iter().map(|r| r.tag))
    }
}

impl<'a> IntoIterator for HookTable<'a> {
    type Item = &'a HookRecord;
    type IntoIter = std::slice::Iter<'a, HookRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

pub(crate) fn count_tags(tags: impl Iterator<Item = HookTag>) -> BTreeMap<HookTag, usize> {
    let mut counts = BTreeMap::new();
    for tag in tags {
        *counts.entry(tag).or_insert(0) += 1;
    }
    counts
}

pub(crate) fn check_duplicates(tags: impl Iterator<Item = HookTag>) -> Result<(), TableError> {
    match count_tags(tags)
        .into_iter()
        .find(|(tag, count)| *count > 1 && !tag.is_repeatable())
    {
        Some((tag, count)) => Err(TableError::DuplicateTag { tag, count }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    extern "C-unwind" fn noop() {}
    extern "C-unwind" fn other() {}

    #[test]
    fn test_enumerates_one_record_per_declaration() {
        let records = [
            HookRecord::void(HookTag::InitWutMalloc, noop),
            HookRecord::void(HookTag::InitPlugin, noop),
            HookRecord::void(HookTag::ApplicationStarts, other),
        ];
        let table = HookTable::new(&records);
        assert_eq!(table.len(), 3);
        assert_eq!(
            table.tags(),
            vec![
                HookTag::InitWutMalloc,
                HookTag::InitPlugin,
                HookTag::ApplicationStarts
            ]
        );
        assert!(table.contains(HookTag::InitPlugin));
        assert!(!table.contains(HookTag::DeinitPlugin));
    }

    #[test]
    fn test_duplicate_unique_tag_rejected() {
        let records = [
            HookRecord::void(HookTag::InitPlugin, noop),
            HookRecord::void(HookTag::InitPlugin, other),
        ];
        let err = HookTable::new(&records).validate().unwrap_err();
        assert_eq!(
            err,
            TableError::DuplicateTag {
                tag: HookTag::InitPlugin,
                count: 2
            }
        );
    }

    #[test]
    fn test_runtime_pairs_may_repeat_and_coexist() {
        let records = [
            HookRecord::void(HookTag::InitWutMalloc, noop),
            HookRecord::void(HookTag::InitWutMalloc, other),
            HookRecord::void(HookTag::InitWutNewlib, noop),
        ];
        let table = HookTable::new(&records);
        table.validate().unwrap();
        assert_eq!(table.records_for(HookTag::InitWutMalloc).count(), 2);
        assert_eq!(table.counts()[&HookTag::InitWutNewlib], 1);
    }

    #[test]
    fn test_enumeration_is_idempotent() {
        let records = [
            HookRecord::void(HookTag::InitWrapper, noop),
            HookRecord::absent(HookTag::InitWutSockets),
        ];
        let table = HookTable::new(&records);
        let first: Vec<_> = table.iter().copied().collect();
        let second: Vec<_> = table.into_iter().copied().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_records_are_contiguous() {
        let records = [
            HookRecord::void(HookTag::InitPlugin, noop),
            HookRecord::void(HookTag::DeinitPlugin, noop),
        ];
        let table = HookTable::new(&records);
        let base = table.records().as_ptr() as usize;
        for (i, record) in table.iter().enumerate() {
            let addr = record as *const HookRecord as usize;
            assert_eq!(addr - base, i * std::mem::size_of::<HookRecord>());
        }
    }
}
