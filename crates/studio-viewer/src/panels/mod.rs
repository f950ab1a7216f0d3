//! GUI panels for the studio viewer
//!
//! Panels never touch the scene directly. They read the runtime and push
//! `PanelAction`s that the app applies after the egui pass.

mod controls;
mod stage;
mod status;
mod wardrobe;

pub use controls::ControlBar;
pub use stage::StagePanel;
pub use status::{loading_overlay, lod_color, status_bar};
pub use wardrobe::WardrobePanel;

use crate::input::RotateDirection;
use crate::runtime::SceneUpdate;
use std::path::PathBuf;
use studio_core::Color;

/// A request from the UI, applied after the egui pass
#[derive(Debug, Clone)]
pub enum PanelAction {
    /// Recorded scene change
    Edit(SceneUpdate),
    PreviewReflection(f32),
    PreviewGrid(f32),
    SetBlur(f32),
    Undo,
    Redo,
    Capture,
    Import(PathBuf),
    /// One rotation step
    Impulse(f32),
    /// A rotate control is being held
    Hold(RotateDirection),
}

/// egui color for an sRGB studio color
pub fn color32(color: Color) -> egui::Color32 {
    let [r, g, b, _] = color.to_rgba8();
    egui::Color32::from_rgb(r, g, b)
}
