//! Wardrobe tab: outfits by category, search and tint palette

use super::{color32, PanelAction};
use crate::runtime::{SceneRuntime, SceneUpdate};
use studio_catalog::{filter_wardrobe, Catalog, OutfitCategory, WardrobeFilter};

#[derive(Default)]
pub struct WardrobePanel {
    filter: WardrobeFilter,
    search: String,
}

impl WardrobePanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ui(
        &mut self,
        ui: &mut egui::Ui,
        catalog: &Catalog,
        runtime: &SceneRuntime,
        actions: &mut Vec<PanelAction>,
    ) {
        let state = runtime.state();
        ui.heading("Wardrobe");

        ui.horizontal_wrapped(|ui| {
            ui.selectable_value(&mut self.filter, WardrobeFilter::All, WardrobeFilter::All.label());
            for category in OutfitCategory::ALL {
                let filter = WardrobeFilter::Category(category);
                ui.selectable_value(&mut self.filter, filter, filter.label());
            }
        });
        ui.horizontal(|ui| {
            ui.label("\u{1F50D}");
            ui.text_edit_singleline(&mut self.search);
            if !self.search.is_empty() && ui.small_button("\u{2715}").clicked() {
                self.search.clear();
            }
        });
        ui.separator();

        let worn = state.outfit.as_ref().map(|o| o.id.as_str());
        if ui.selectable_label(worn.is_none(), "No outfit").clicked() && worn.is_some() {
            actions.push(PanelAction::Edit(SceneUpdate::outfit(None)));
        }

        egui::ScrollArea::vertical()
            .id_salt("wardrobe_list")
            .max_height((ui.available_height() - 140.0).max(80.0))
            .show(ui, |ui| {
                for group in filter_wardrobe(catalog.outfits(), self.filter, &self.search) {
                    ui.add_space(4.0);
                    ui.strong(group.category.label());
                    for outfit in group.outfits {
                        let selected = worn == Some(outfit.id.as_str());
                        let response = ui
                            .selectable_label(selected, &outfit.name)
                            .on_hover_text(&outfit.prompt_modifier);
                        if response.clicked() {
                            actions.push(PanelAction::Edit(SceneUpdate::outfit(Some(outfit.clone()))));
                        }
                    }
                }
            });

        ui.separator();
        if let Some(outfit) = &state.outfit {
            egui::Grid::new("outfit_details").num_columns(2).show(ui, |ui| {
                ui.label("Material");
                ui.label(&outfit.material);
                ui.end_row();
                ui.label("Texture");
                ui.label(&outfit.texture);
                ui.end_row();
                ui.label("Fit");
                ui.label(&outfit.fit);
                ui.end_row();
            });
        }

        ui.label(format!("Tint: {}", state.tint.name));
        ui.horizontal_wrapped(|ui| {
            for tint in catalog.tints() {
                let selected = tint == &state.tint;
                let mut swatch = egui::Button::new("")
                    .fill(color32(tint.hex))
                    .min_size(egui::vec2(22.0, 22.0));
                if selected {
                    swatch = swatch.stroke(egui::Stroke::new(2.0, egui::Color32::WHITE));
                }
                let response = ui
                    .add_enabled(state.outfit.is_some(), swatch)
                    .on_hover_text(&tint.name)
                    .on_disabled_hover_text("Pick an outfit to apply a tint");
                if response.clicked() {
                    actions.push(PanelAction::Edit(SceneUpdate::tint(tint.clone())));
                }
            }
        });
    }
}
