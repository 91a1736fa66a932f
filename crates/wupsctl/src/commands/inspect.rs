use anyhow::Result;
use std::path::Path;
use tracing::warn;
use wups_runtime::inspect_image;

use crate::config::Config;

/// Decode and print the hook table of an image.
pub fn execute(image: &Path, section: Option<&str>, json: bool, config: &Config) -> Result<()> {
    let section = section.unwrap_or(&config.loader.section);
    let report = inspect_image(image, section)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "{} [{}] {:?} {:?}, {} record(s)",
            image.display(),
            report.section,
            report.layout.word_size,
            report.layout.endian,
            report.records.len()
        );
        for record in &report.records {
            println!(
                "  #{:<3} {:<28} {:#x}",
                record.index,
                record.tag.name(),
                record.target
            );
        }
        for problem in &report.problems {
            println!("  problem: {}", problem);
        }
    }

    if !report.is_valid() {
        if config.loader.strict {
            anyhow::bail!(
                "Hook table of {:?} is invalid: {}",
                image,
                report.problems.join("; ")
            );
        }
        warn!(image = ?image, problems = report.problems.len(), "Hook table has problems");
    }

    Ok(())
}
