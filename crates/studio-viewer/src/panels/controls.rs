//! Bottom control bar: rotation, history, capture and stage sliders

use super::PanelAction;
use crate::input::{RotateDirection, SliderCommit};
use crate::runtime::{SceneRuntime, SceneUpdate};
use studio_render::MAX_BLUR_PX;

#[derive(Default)]
pub struct ControlBar {
    reflection: SliderCommit,
    grid: SliderCommit,
}

impl ControlBar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ui(
        &mut self,
        ui: &mut egui::Ui,
        runtime: &SceneRuntime,
        ready: bool,
        actions: &mut Vec<PanelAction>,
    ) {
        ui.horizontal(|ui| {
            rotate_button(ui, "\u{25C0} Rotate", RotateDirection::Left, actions);
            rotate_button(ui, "Rotate \u{25B6}", RotateDirection::Right, actions);
            ui.separator();

            let history = runtime.history();
            if ui.add_enabled(history.can_undo(), egui::Button::new("Undo")).clicked() {
                actions.push(PanelAction::Undo);
            }
            if ui.add_enabled(history.can_redo(), egui::Button::new("Redo")).clicked() {
                actions.push(PanelAction::Redo);
            }
            ui.separator();

            if ui
                .add_enabled(ready, egui::Button::new("\u{1F4F7} Capture"))
                .clicked()
            {
                actions.push(PanelAction::Capture);
            }
            ui.separator();

            let state = runtime.state();
            let mut reflection = state.reflection;
            let response = ui.add(egui::Slider::new(&mut reflection, 0.0..=1.0).text("Reflection"));
            if response.changed() {
                actions.push(PanelAction::PreviewReflection(reflection));
            }
            if self.reflection.update(response.changed(), response.dragged()) {
                actions.push(PanelAction::Edit(SceneUpdate::reflection(reflection)));
            }

            let mut grid = state.grid;
            let response = ui.add(egui::Slider::new(&mut grid, 0.0..=1.0).text("Grid"));
            if response.changed() {
                actions.push(PanelAction::PreviewGrid(grid));
            }
            if self.grid.update(response.changed(), response.dragged()) {
                actions.push(PanelAction::Edit(SceneUpdate::grid(grid)));
            }

            let mut blur = runtime.blur();
            let response = ui.add(
                egui::Slider::new(&mut blur, 0.0..=MAX_BLUR_PX)
                    .text("Focus blur")
                    .suffix(" px"),
            );
            if response.changed() {
                actions.push(PanelAction::SetBlur(blur));
            }
        });
    }
}

/// A click is one step; holding repeats until any button is released
fn rotate_button(
    ui: &mut egui::Ui,
    label: &str,
    direction: RotateDirection,
    actions: &mut Vec<PanelAction>,
) {
    let response = ui.button(label);
    if response.is_pointer_button_down_on() {
        actions.push(PanelAction::Hold(direction));
    }
    if response.clicked() {
        actions.push(PanelAction::Impulse(direction.impulse()));
    }
}
