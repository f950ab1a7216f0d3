//! Style descriptor preview

use anyhow::Result;
use studio_catalog::Catalog;
use studio_viewer::style_descriptor;

pub fn run(outfit: &str, tint: Option<&str>) -> Result<()> {
    let catalog = Catalog::builtin()?;
    let outfit = catalog.require_outfit(outfit)?;
    let tint = match tint {
        Some(name) => catalog.require_tint(name)?,
        None => catalog.default_tint(),
    };
    println!("{}", style_descriptor(Some(outfit), tint));
    Ok(())
}
