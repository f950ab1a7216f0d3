//! Stage and wardrobe browsing filters

use crate::types::{Backdrop, BackdropKind, Outfit, OutfitCategory};

/// Stage tab filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StageFilter {
    #[default]
    All,
    /// Flat colors
    Color,
    /// Panoramas and 3D sets
    Environment,
    /// Looping video
    Motion,
}

impl StageFilter {
    pub const ALL: [StageFilter; 4] = [
        StageFilter::All,
        StageFilter::Color,
        StageFilter::Environment,
        StageFilter::Motion,
    ];

    pub fn label(self) -> &'static str {
        match self {
            StageFilter::All => "All",
            StageFilter::Color => "Color",
            StageFilter::Environment => "Environment",
            StageFilter::Motion => "Motion",
        }
    }

    pub fn matches(self, kind: &BackdropKind) -> bool {
        match self {
            StageFilter::All => true,
            StageFilter::Color => matches!(kind, BackdropKind::Color(_)),
            StageFilter::Environment => matches!(
                kind,
                BackdropKind::StaticImage(_)
                    | BackdropKind::HdrEnvironment(_)
                    | BackdropKind::Environment3D(_)
            ),
            StageFilter::Motion => matches!(kind, BackdropKind::LoopingVideo(_)),
        }
    }
}

/// Imported backdrops (most recent first) followed by the predefined set
pub fn filter_stage<'a>(
    imported: &'a [Backdrop],
    predefined: &'a [Backdrop],
    filter: StageFilter,
) -> Vec<&'a Backdrop> {
    imported
        .iter()
        .chain(predefined)
        .filter(|b| filter.matches(&b.kind))
        .collect()
}

/// Wardrobe tab category filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WardrobeFilter {
    #[default]
    All,
    Category(OutfitCategory),
}

impl WardrobeFilter {
    pub fn label(self) -> &'static str {
        match self {
            WardrobeFilter::All => "All",
            WardrobeFilter::Category(c) => c.label(),
        }
    }
}

/// Outfits of one category, in catalog order
#[derive(Debug)]
pub struct WardrobeGroup<'a> {
    pub category: OutfitCategory,
    pub outfits: Vec<&'a Outfit>,
}

/// Apply the category filter and a case-insensitive name search, grouped by
/// category. Empty groups are omitted.
pub fn filter_wardrobe<'a>(
    outfits: &'a [Outfit],
    filter: WardrobeFilter,
    search: &str,
) -> Vec<WardrobeGroup<'a>> {
    let needle = search.trim().to_lowercase();
    OutfitCategory::ALL
        .iter()
        .copied()
        .filter(|c| match filter {
            WardrobeFilter::All => true,
            WardrobeFilter::Category(wanted) => *c == wanted,
        })
        .filter_map(|category| {
            let items: Vec<&Outfit> = outfits
                .iter()
                .filter(|o| o.category == category)
                .filter(|o| needle.is_empty() || o.name.to_lowercase().contains(&needle))
                .collect();
            (!items.is_empty()).then_some(WardrobeGroup {
                category,
                outfits: items,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::classify::custom_backdrop;

    #[test]
    fn stage_filter_partitions_builtin_set() {
        let catalog = Catalog::builtin().unwrap();
        let count = |f| filter_stage(&[], catalog.backdrops(), f).len();
        assert_eq!(count(StageFilter::All), 11);
        assert_eq!(count(StageFilter::Color), 4);
        assert_eq!(count(StageFilter::Environment), 3);
        assert_eq!(count(StageFilter::Motion), 4);
    }

    #[test]
    fn imported_backdrops_come_first() {
        let catalog = Catalog::builtin().unwrap();
        let imported = vec![custom_backdrop("c-9".into(), "loft.glb", "loft.glb", None)];
        let shown = filter_stage(&imported, catalog.backdrops(), StageFilter::Environment);
        assert_eq!(shown[0].id, "c-9");
        assert_eq!(shown.len(), 4);
    }

    #[test]
    fn wardrobe_groups_in_category_order() {
        let catalog = Catalog::builtin().unwrap();
        let groups = filter_wardrobe(catalog.outfits(), WardrobeFilter::All, "");
        let order: Vec<_> = groups.iter().map(|g| g.category).collect();
        assert_eq!(
            order,
            vec![
                OutfitCategory::Suit,
                OutfitCategory::Hoodie,
                OutfitCategory::Tshirt,
                OutfitCategory::Accessory
            ]
        );
        assert_eq!(groups[3].outfits.len(), 3);
        assert_eq!(groups[3].outfits[0].id, "silk-tie");
    }

    #[test]
    fn wardrobe_search_is_case_insensitive() {
        let catalog = Catalog::builtin().unwrap();
        let groups = filter_wardrobe(catalog.outfits(), WardrobeFilter::All, "  CHAIN ");
        assert_eq!(groups.len(), 1);
        let ids: Vec<_> = groups[0].outfits.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["cuban-chain", "figaro-chain"]);
    }

    #[test]
    fn wardrobe_category_filter_with_no_hits_is_empty() {
        let catalog = Catalog::builtin().unwrap();
        let groups = filter_wardrobe(
            catalog.outfits(),
            WardrobeFilter::Category(OutfitCategory::Hoodie),
            "suit",
        );
        assert!(groups.is_empty());
        let hoodies = filter_wardrobe(
            catalog.outfits(),
            WardrobeFilter::Category(OutfitCategory::Hoodie),
            "",
        );
        assert_eq!(hoodies.len(), 1);
        assert_eq!(hoodies[0].outfits.len(), 2);
    }
}
