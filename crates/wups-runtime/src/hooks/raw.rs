//! Decoding of hook tables read out of an image's bytes.
//!
//! Targets in a relocatable image are often left zero until relocation, so
//! the raw view is used for structural checks only and never for calls.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::TableError;

use super::table::{check_duplicates, count_tags};
use super::tag::HookTag;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Endian {
    Little,
    Big,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WordSize {
    #[serde(rename = "32")]
    W32,
    #[serde(rename = "64")]
    W64,
}

impl WordSize {
    pub const fn bytes(self) -> usize {
        match self {
            WordSize::W32 => 4,
            WordSize::W64 => 8,
        }
    }
}

/// Byte order and word width of the records in an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RecordLayout {
    pub word_size: WordSize,
    pub endian: Endian,
}

impl RecordLayout {
    /// Layout of records built for the current target.
    pub fn native() -> Self {
        let word_size = if std::mem::size_of::<usize>() == 8 {
            WordSize::W64
        } else {
            WordSize::W32
        };
        let endian = if cfg!(target_endian = "big") {
            Endian::Big
        } else {
            Endian::Little
        };
        Self { word_size, endian }
    }

    pub const fn record_size(&self) -> usize {
        2 * self.word_size.bytes()
    }

    fn read_word(&self, bytes: &[u8]) -> u64 {
        let mut buf = [0u8; 8];
        match (self.word_size, self.endian) {
            (WordSize::W32, Endian::Little) => {
                buf[..4].copy_from_slice(bytes);
                u64::from_le_bytes(buf)
            }
            (WordSize::W32, Endian::Big) => {
                buf[4..].copy_from_slice(bytes);
                u64::from_be_bytes(buf)
            }
            (WordSize::W64, Endian::Little) => {
                buf.copy_from_slice(bytes);
                u64::from_le_bytes(buf)
            }
            (WordSize::W64, Endian::Big) => {
                buf.copy_from_slice(bytes);
                u64::from_be_bytes(buf)
            }
        }
    }
}

/// A record decoded from image bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RawHookRecord {
    pub index: usize,
    pub tag: HookTag,
    pub target: u64,
}

/// Split `bytes` into fixed-size records.
///
/// The loader refuses a table that is not a whole number of records or that
/// carries a tag outside the closed set.
pub fn parse_records(bytes: &[u8], layout: RecordLayout) -> Result<Vec<RawHookRecord>, TableError> {
    let record_size = layout.record_size();
    if bytes.len() % record_size != 0 {
        return Err(TableError::TruncatedTable {
            len: bytes.len(),
            record_size,
        });
    }

    let word = layout.word_size.bytes();
    bytes
        .chunks_exact(record_size)
        .enumerate()
        .map(|(index, chunk)| {
            let value = layout.read_word(&chunk[..word]);
            let tag = HookTag::from_word(value).ok_or(TableError::UnknownTag { index, value })?;
            Ok(RawHookRecord {
                index,
                tag,
                target: layout.read_word(&chunk[word..]),
            })
        })
        .collect()
}

pub fn summarize(records: &[RawHookRecord]) -> BTreeMap<HookTag, usize> {
    count_tags(records.iter().map(|r| r.tag))
}

pub fn validate_raw(records: &[RawHookRecord]) -> Result<(), TableError> {
    check_duplicates(records.iter().map(|r| r.tag))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BE32: RecordLayout = RecordLayout {
        word_size: WordSize::W32,
        endian: Endian::Big,
    };

    fn be32_record(tag: u32, target: u32) -> Vec<u8> {
        let mut bytes = tag.to_be_bytes().to_vec();
        bytes.extend_from_slice(&target.to_be_bytes());
        bytes
    }

    #[test]
    fn test_parse_big_endian_32bit() {
        let mut bytes = be32_record(0, 0x0200_1000);
        bytes.extend(be32_record(15, 0x0200_2000));

        let records = parse_records(&bytes, BE32).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].tag, HookTag::InitWutMalloc);
        assert_eq!(records[0].target, 0x0200_1000);
        assert_eq!(records[1].tag, HookTag::InitPlugin);
        assert_eq!(records[1].index, 1);
    }

    #[test]
    fn test_parse_little_endian_64bit() {
        let layout = RecordLayout {
            word_size: WordSize::W64,
            endian: Endian::Little,
        };
        let mut bytes = 17u64.to_le_bytes().to_vec();
        bytes.extend_from_slice(&0xdead_beefu64.to_le_bytes());

        let records = parse_records(&bytes, layout).unwrap();
        assert_eq!(records[0].tag, HookTag::ApplicationStarts);
        assert_eq!(records[0].target, 0xdead_beef);
    }

    #[test]
    fn test_partial_record_rejected() {
        let mut bytes = be32_record(15, 1);
        bytes.extend_from_slice(&[0, 0, 0]);
        let err = parse_records(&bytes, BE32).unwrap_err();
        assert_eq!(
            err,
            TableError::TruncatedTable {
                len: 11,
                record_size: 8
            }
        );
    }

    #[test]
    fn test_unknown_tag_rejected() {
        let mut bytes = be32_record(15, 1);
        bytes.extend(be32_record(99, 1));
        let err = parse_records(&bytes, BE32).unwrap_err();
        assert_eq!(err, TableError::UnknownTag { index: 1, value: 99 });
    }

    #[test]
    fn test_empty_section_is_an_empty_table() {
        assert!(parse_records(&[], BE32).unwrap().is_empty());
    }

    #[test]
    fn test_validate_raw_duplicates() {
        let mut bytes = be32_record(16, 1);
        bytes.extend(be32_record(16, 2));
        let records = parse_records(&bytes, BE32).unwrap();
        assert!(validate_raw(&records).is_err());
        assert_eq!(summarize(&records)[&HookTag::DeinitPlugin], 2);
    }

    #[test]
    fn test_native_layout_matches_record() {
        let layout = RecordLayout::native();
        assert_eq!(
            layout.record_size(),
            std::mem::size_of::<crate::hooks::HookRecord>()
        );
    }
}
