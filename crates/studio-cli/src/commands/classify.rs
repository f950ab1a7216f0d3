//! Import classification preview

use anyhow::Result;
use studio_catalog::{classify_import, custom_backdrop, CustomIdGenerator};

pub fn run(file: &str, mime: Option<&str>) -> Result<()> {
    let kind = classify_import(file, mime);
    let backdrop = custom_backdrop(CustomIdGenerator::new().next_id(), file, file, mime);
    println!("{}: {}", file, kind);
    println!("  name: {}", backdrop.name);
    if let Some(source) = backdrop.kind.source() {
        println!("  source: {}", source);
    }
    Ok(())
}
