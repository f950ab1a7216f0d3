//! Stage tab: backdrop browser and file import

use super::{color32, PanelAction};
use crate::runtime::{SceneRuntime, SceneUpdate};
use std::path::PathBuf;
use studio_catalog::{filter_stage, BackdropKind, Catalog, StageFilter};

#[derive(Default)]
pub struct StagePanel {
    filter: StageFilter,
    import_path: String,
}

impl StagePanel {
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
        ui.heading("Stage");
        ui.horizontal(|ui| {
            for filter in StageFilter::ALL {
                ui.selectable_value(&mut self.filter, filter, filter.label());
            }
        });
        ui.separator();

        let active = &runtime.state().backdrop.id;
        egui::ScrollArea::vertical()
            .id_salt("stage_list")
            .max_height((ui.available_height() - 90.0).max(80.0))
            .show(ui, |ui| {
                for backdrop in filter_stage(runtime.user_backdrops(), catalog.backdrops(), self.filter) {
                    let selected = &backdrop.id == active;
                    ui.horizontal(|ui| {
                        let (rect, _) =
                            ui.allocate_exact_size(egui::vec2(14.0, 14.0), egui::Sense::hover());
                        let swatch = match &backdrop.kind {
                            BackdropKind::Color(color) => color32(*color),
                            _ => egui::Color32::from_gray(60),
                        };
                        ui.painter().rect_filled(rect, 2.0, swatch);

                        let text = format!("{}  ({})", backdrop.name, backdrop.kind.tag());
                        if ui.selectable_label(selected, text).clicked() && !selected {
                            actions.push(PanelAction::Edit(SceneUpdate::backdrop(backdrop.clone())));
                        }
                    });
                }
            });

        ui.separator();
        ui.label("Import backdrop");
        ui.horizontal(|ui| {
            ui.text_edit_singleline(&mut self.import_path);
            let path = self.import_path.trim();
            if ui
                .add_enabled(!path.is_empty(), egui::Button::new("Import"))
                .clicked()
            {
                actions.push(PanelAction::Import(PathBuf::from(path)));
                self.import_path.clear();
            }
        });
        ui.small("Or drop an image, HDR, video or glTF file on the window");
    }
}
