//! Status bar and loading overlay

use super::color32;
use crate::backdrop::BackdropCompositor;
use crate::host::LoadState;
use crate::runtime::SceneRuntime;
use studio_core::{Color, LodLevel};

/// Label color per detail tier: green, yellow, red
pub fn lod_color(level: LodLevel) -> egui::Color32 {
    match level {
        LodLevel::HighFidelity => egui::Color32::from_rgb(0x4a, 0xde, 0x80),
        LodLevel::WireGhost => egui::Color32::from_rgb(0xfa, 0xcc, 0x15),
        LodLevel::SpatialProxy => egui::Color32::from_rgb(0xf8, 0x71, 0x71),
    }
}

pub fn status_bar(
    ui: &mut egui::Ui,
    runtime: &SceneRuntime,
    lod: Option<LodLevel>,
    compositor: &BackdropCompositor,
) {
    ui.horizontal(|ui| {
        ui.strong("SHARJAYS Studio");
        ui.separator();
        ui.label(runtime.stream_status());

        if let Some(level) = lod {
            ui.separator();
            ui.colored_label(lod_color(level), format!("LOD: {}", level));
        }

        if runtime.morph_indicator_active() {
            ui.separator();
            ui.colored_label(color32(Color::from_hex(0xD4AF37)), "Neural Morph Active...");
        }

        if compositor.is_loading() {
            ui.separator();
            ui.spinner();
            ui.label("Loading backdrop...");
        } else if let Some(error) = compositor.last_error() {
            ui.separator();
            ui.colored_label(egui::Color32::LIGHT_RED, "Backdrop unavailable")
                .on_hover_text(error);
        }
    });
}

/// Centered progress or failure notice while the subject is not ready
pub fn loading_overlay(ctx: &egui::Context, state: &LoadState) {
    if state.is_ready() {
        return;
    }
    egui::Area::new(egui::Id::new("subject_loading_overlay"))
        .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
        .interactable(false)
        .show(ctx, |ui| {
            egui::Frame::popup(ui.style()).show(ui, |ui| match state {
                LoadState::Loading { percent } => {
                    ui.label(format!("Mounting Neural Scene... ({}%)", percent));
                    ui.add(
                        egui::ProgressBar::new(*percent as f32 / 100.0)
                            .desired_width(240.0),
                    );
                }
                LoadState::Failed { message } => {
                    ui.colored_label(egui::Color32::LIGHT_RED, "Subject failed to load");
                    ui.small(message);
                }
                LoadState::Ready => {}
            });
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lod_colors_are_distinct() {
        let colors: Vec<_> = LodLevel::ALL.iter().map(|l| lod_color(*l)).collect();
        assert_ne!(colors[0], colors[1]);
        assert_ne!(colors[1], colors[2]);
        assert!(colors[0].g() > colors[0].r());
        assert!(colors[2].r() > colors[2].g());
    }
}
