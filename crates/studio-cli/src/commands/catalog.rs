//! Catalog listing

use anyhow::{anyhow, Result};
use clap::ValueEnum;
use studio_catalog::{
    filter_stage, filter_wardrobe, BackdropKind, Catalog, OutfitCategory, StageFilter,
    WardrobeFilter,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Section {
    Backdrops,
    Wardrobe,
    Tints,
}

pub fn run(section: Section, filter: Option<&str>, search: Option<&str>) -> Result<()> {
    let catalog = Catalog::builtin()?;
    println!("Catalog v{}", catalog.version());

    match section {
        Section::Backdrops => {
            let filter = match filter {
                Some(name) => parse_stage_filter(name)?,
                None => StageFilter::All,
            };
            for backdrop in filter_stage(&[], catalog.backdrops(), filter) {
                let detail = match &backdrop.kind {
                    BackdropKind::Color(color) => format!("#{:06x}", color.to_hex()),
                    other => other.source().unwrap_or_default().to_string(),
                };
                println!(
                    "  {:<16} {:<22} {:<6} {}",
                    backdrop.id,
                    backdrop.name,
                    backdrop.kind.tag(),
                    detail
                );
            }
        }
        Section::Wardrobe => {
            let filter = match filter {
                Some(name) => WardrobeFilter::Category(parse_category(name)?),
                None => WardrobeFilter::All,
            };
            let groups = filter_wardrobe(catalog.outfits(), filter, search.unwrap_or(""));
            if groups.is_empty() {
                println!("  (no matching outfits)");
            }
            for group in groups {
                println!("{}:", group.category.label());
                for outfit in group.outfits {
                    println!(
                        "  {:<18} {:<22} {} / {} / {}",
                        outfit.id, outfit.name, outfit.material, outfit.texture, outfit.fit
                    );
                }
            }
        }
        Section::Tints => {
            let default = catalog.default_tint();
            for tint in catalog.tints() {
                let marker = if tint == default { " (default)" } else { "" };
                println!("  {:<10} #{:06x}{}", tint.name, tint.hex.to_hex(), marker);
            }
        }
    }
    Ok(())
}

fn parse_stage_filter(name: &str) -> Result<StageFilter> {
    StageFilter::ALL
        .into_iter()
        .find(|f| f.label().eq_ignore_ascii_case(name))
        .ok_or_else(|| {
            anyhow!("unknown backdrop filter '{}'; valid values: all, color, environment, motion", name)
        })
}

fn parse_category(name: &str) -> Result<OutfitCategory> {
    let wanted = name.to_ascii_lowercase().replace('-', "");
    OutfitCategory::ALL
        .into_iter()
        .find(|c| {
            let label = c.label().to_ascii_lowercase().replace('-', "");
            label == wanted || label.trim_end_matches('s') == wanted
        })
        .ok_or_else(|| {
            anyhow!("unknown outfit category '{}'; valid values: suits, hoodies, t-shirts, accessories", name)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_filters_parse_case_insensitively() {
        assert_eq!(parse_stage_filter("Motion").unwrap(), StageFilter::Motion);
        assert_eq!(parse_stage_filter("color").unwrap(), StageFilter::Color);
        assert!(parse_stage_filter("video").is_err());
    }

    #[test]
    fn categories_accept_singular_and_plural() {
        assert_eq!(parse_category("suits").unwrap(), OutfitCategory::Suit);
        assert_eq!(parse_category("hoodie").unwrap(), OutfitCategory::Hoodie);
        assert_eq!(parse_category("T-Shirts").unwrap(), OutfitCategory::Tshirt);
        assert_eq!(parse_category("tshirt").unwrap(), OutfitCategory::Tshirt);
        assert!(parse_category("shoes").is_err());
    }
}
