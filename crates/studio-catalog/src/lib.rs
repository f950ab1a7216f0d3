//! Studio Catalog - Static stage and wardrobe tables
//!
//! Predefined backdrops, outfits and tints ship as an embedded, versioned TOML
//! table. This crate also classifies user imports into backdrop kinds and
//! implements the stage and wardrobe browsing filters.

mod catalog;
mod classify;
mod filter;
mod types;

pub use catalog::{Catalog, CATALOG_VERSION};
pub use classify::{classify_import, custom_backdrop, CustomIdGenerator, PLACEHOLDER_THUMBNAIL};
pub use filter::{filter_stage, filter_wardrobe, StageFilter, WardrobeFilter, WardrobeGroup};
pub use types::{Backdrop, BackdropKind, BackdropKindTag, Outfit, OutfitCategory, Tint};
