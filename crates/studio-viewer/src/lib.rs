//! Studio Viewer - Interactive model viewer
//!
//! Hosts the loaded subject on a wgpu stage and wires the studio controls
//! around it:
//! - `SceneHost` owns the renderer, camera, motion and level of detail
//! - `BackdropCompositor` swaps color, panorama, video and 3D environments
//! - `appearance` turns an outfit and tint into a material morph and a style descriptor
//! - `SceneHistory` gives linear undo/redo over `SceneState` snapshots
//! - `input` and `capture` translate gestures and export frames

pub mod app;
pub mod appearance;
pub mod backdrop;
pub mod capture;
pub mod config;
pub mod history;
pub mod hooks;
pub mod host;
pub mod input;
pub mod loader;
pub mod lod;
pub mod panels;
pub mod logging;
pub mod motion;
mod rng;
pub mod runtime;
pub mod video;

pub use app::run;
pub use appearance::{style_descriptor, tint_target};
pub use backdrop::{environment_placement, BackdropCompositor, BackdropTarget};
pub use capture::{encode_png_data_uri, write_png};
pub use config::ViewerConfig;
pub use history::{HistoryStep, SceneHistory, SceneState};
pub use hooks::{LoggingHooks, StudioHooks};
pub use host::{center_subject, LoadState, SceneHost, SubjectLoad};
pub use input::{map_shortcut, HoldRepeat, RotateDirection, ViewerCommand};
pub use loader::{load_asset, AssetKind, AssetLoader, LoadEvent, LoadedAsset};
pub use lod::{select_lod, LodThresholds};
pub use motion::{advance, SubjectMotion};
pub use runtime::{SceneEffects, SceneRuntime, SceneUpdate};
pub use video::{VideoError, VideoPlayer};
