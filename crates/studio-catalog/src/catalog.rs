//! The predefined stage and wardrobe catalog

use crate::types::{Backdrop, Outfit, Tint};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use studio_core::{Result, StudioError};

/// Table format version understood by this build
pub const CATALOG_VERSION: u32 = 1;

const BUILTIN_CATALOG: &str = include_str!("../data/catalog.toml");

/// Static catalog of backdrops, outfits and tints.
///
/// A constructed catalog always holds at least one backdrop and one tint, and
/// ids are unique within each table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    version: u32,
    #[serde(rename = "backdrop", default)]
    backdrops: Vec<Backdrop>,
    #[serde(rename = "outfit", default)]
    outfits: Vec<Outfit>,
    #[serde(rename = "tint", default)]
    tints: Vec<Tint>,
}

impl Catalog {
    /// The catalog shipped with the application
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(BUILTIN_CATALOG)
    }

    /// Parse and validate a catalog table
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let catalog: Catalog = toml::from_str(source)
            .map_err(|e| StudioError::CatalogError(format!("Failed to parse catalog: {}", e)))?;
        catalog.validate()?;
        log::debug!(
            "Loaded catalog v{}: {} backdrops, {} outfits, {} tints",
            catalog.version,
            catalog.backdrops.len(),
            catalog.outfits.len(),
            catalog.tints.len()
        );
        Ok(catalog)
    }

    fn validate(&self) -> Result<()> {
        if self.version != CATALOG_VERSION {
            return Err(StudioError::CatalogError(format!(
                "Unsupported catalog version {} (expected {})",
                self.version, CATALOG_VERSION
            )));
        }
        if self.backdrops.is_empty() {
            return Err(StudioError::CatalogError("Catalog has no backdrops".into()));
        }
        if self.tints.is_empty() {
            return Err(StudioError::CatalogError("Catalog has no tints".into()));
        }
        check_unique("backdrop", self.backdrops.iter().map(|b| b.id.as_str()))?;
        check_unique("outfit", self.outfits.iter().map(|o| o.id.as_str()))?;
        check_unique("tint", self.tints.iter().map(|t| t.name.as_str()))?;
        Ok(())
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn backdrops(&self) -> &[Backdrop] {
        &self.backdrops
    }

    pub fn outfits(&self) -> &[Outfit] {
        &self.outfits
    }

    pub fn tints(&self) -> &[Tint] {
        &self.tints
    }

    /// The backdrop a fresh scene starts on
    pub fn default_backdrop(&self) -> &Backdrop {
        &self.backdrops[0]
    }

    /// The swatch a fresh scene starts on
    pub fn default_tint(&self) -> &Tint {
        &self.tints[0]
    }

    pub fn backdrop(&self, id: &str) -> Option<&Backdrop> {
        self.backdrops.iter().find(|b| b.id == id)
    }

    pub fn outfit(&self, id: &str) -> Option<&Outfit> {
        self.outfits.iter().find(|o| o.id == id)
    }

    /// Look up a tint by display name, case-insensitive
    pub fn tint(&self, name: &str) -> Option<&Tint> {
        self.tints.iter().find(|t| t.name.eq_ignore_ascii_case(name))
    }

    pub fn require_backdrop(&self, id: &str) -> Result<&Backdrop> {
        self.backdrop(id).ok_or_else(|| StudioError::UnknownEntry {
            kind: "backdrop",
            id: id.to_string(),
        })
    }

    pub fn require_outfit(&self, id: &str) -> Result<&Outfit> {
        self.outfit(id).ok_or_else(|| StudioError::UnknownEntry {
            kind: "outfit",
            id: id.to_string(),
        })
    }

    pub fn require_tint(&self, name: &str) -> Result<&Tint> {
        self.tint(name).ok_or_else(|| StudioError::UnknownEntry {
            kind: "tint",
            id: name.to_string(),
        })
    }
}

fn check_unique<'a>(table: &str, ids: impl Iterator<Item = &'a str>) -> Result<()> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(StudioError::CatalogError(format!(
                "Duplicate {} id '{}'",
                table, id
            )));
        }
    }
    Ok(())
}
