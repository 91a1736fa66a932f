//! Static inspection of a plugin image's hook section.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use object::{Object, ObjectSection};
use serde::Serialize;
use tracing::debug;

use crate::error::TableError;
use crate::hooks::raw::{parse_records, summarize, validate_raw};
use crate::hooks::{Endian, HookTag, RawHookRecord, RecordLayout, WordSize};

#[derive(Debug, Clone, Serialize)]
pub struct ImageReport {
    pub path: PathBuf,
    pub section: String,
    pub layout: RecordLayout,
    pub records: Vec<RawHookRecord>,
    pub counts: BTreeMap<HookTag, usize>,
    /// Contract violations that make the loader refuse the image
    pub problems: Vec<String>,
}

impl ImageReport {
    pub fn is_valid(&self) -> bool {
        self.problems.is_empty()
    }
}

/// Read `path` and decode the records of `section`.
pub fn inspect_image(path: &Path, section: &str) -> Result<ImageReport> {
    let data =
        std::fs::read(path).with_context(|| format!("Failed to read image: {}", path.display()))?;
    let mut report = inspect_bytes(&data, section)
        .with_context(|| format!("Failed to inspect image: {}", path.display()))?;
    report.path = path.to_path_buf();
    Ok(report)
}

/// Decode the records of `section` from an in-memory object file.
///
/// Unparseable files and a missing section are errors. A table that parses
/// but breaks the contract yields a report listing the problems.
pub fn inspect_bytes(data: &[u8], section: &str) -> Result<ImageReport> {
    let file = object::File::parse(data).context("Not a recognised object file")?;

    let layout = RecordLayout {
        word_size: if file.is_64() {
            WordSize::W64
        } else {
            WordSize::W32
        },
        endian: if file.is_little_endian() {
            Endian::Little
        } else {
            Endian::Big
        },
    };

    let bytes = file
        .section_by_name(section)
        .ok_or_else(|| TableError::SectionNotFound(section.to_string()))?
        .data()
        .context("Failed to read hook section data")?;

    debug!(section, len = bytes.len(), ?layout, "Hook section located");

    let mut problems = Vec::new();
    let records = match parse_records(bytes, layout) {
        Ok(records) => records,
        Err(e) => {
            problems.push(e.to_string());
            Vec::new()
        }
    };
    if let Err(e) = validate_raw(&records) {
        problems.push(e.to_string());
    }

    Ok(ImageReport {
        path: PathBuf::new(),
        section: section.to_string(),
        layout,
        counts: summarize(&records),
        records,
        problems,
    })
}
