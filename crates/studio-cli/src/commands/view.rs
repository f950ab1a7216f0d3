//! Interactive studio viewer

use anyhow::{Context, Result};
use std::path::Path;
use studio_viewer::ViewerConfig;

pub fn run(model: Option<String>, config: Option<&Path>, backdrop: Option<String>) -> Result<()> {
    let config = ViewerConfig::load(config).context("Failed to load viewer config")?;
    studio_viewer::run(model, config, backdrop)
}
