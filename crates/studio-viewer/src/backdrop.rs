//! Backdrop compositor
//!
//! Switches the stage between flat colors, panoramas, looping video and
//! secondary 3D environments. Every switch first tears down the previous
//! backdrop, then applies the new one; slow sources load in the background
//! and only the newest request is ever applied.

use crate::config::VideoConfig;
use crate::loader::{AssetKind, AssetLoader, LoadEvent, LoadedAsset};
use crate::video::VideoPlayer;
use studio_catalog::{Backdrop, BackdropKind};
use studio_core::{mat4_mul, mat4_scale, mat4_translation, Color, Mat4};
use studio_import::{ImportResult, MeshBounds, PanoramaImage};

/// Largest horizontal extent a 3D environment is scaled to
pub const ENVIRONMENT_TARGET_SIZE: f32 = 20.0;

/// The stage surface a backdrop is drawn on. Only the scene host implements
/// this against GPU resources.
pub trait BackdropTarget {
    /// Drop every live backdrop resource and return to the default background
    fn reset_backdrop(&mut self);
    fn show_color(&mut self, color: Color);
    fn show_panorama(&mut self, image: &PanoramaImage);
    /// Prepare a streaming surface of the given size
    fn begin_video(&mut self, width: u32, height: u32);
    fn push_video_frame(&mut self, rgba: &[u8]);
    fn show_environment_model(&mut self, model: &ImportResult, placement: Mat4);
}

/// Uniform scale so the largest horizontal extent is `ENVIRONMENT_TARGET_SIZE`,
/// standing on its lowest vertex
pub fn environment_placement(bounds: Option<MeshBounds>) -> Mat4 {
    let Some(bounds) = bounds else {
        return studio_core::mat4_identity();
    };
    let size = bounds.size();
    let scale = ENVIRONMENT_TARGET_SIZE / size.x.max(size.z).max(1.0);
    mat4_mul(
        &mat4_translation(0.0, -bounds.min.y * scale, 0.0),
        &mat4_scale(scale, scale, scale),
    )
}

struct PendingLoad {
    ticket: u64,
    backdrop_id: String,
}

pub struct BackdropCompositor {
    loader: AssetLoader,
    pending: Option<PendingLoad>,
    video: Option<VideoPlayer>,
    video_config: VideoConfig,
    active: Option<Backdrop>,
    last_error: Option<String>,
}

impl BackdropCompositor {
    pub fn new(video_config: VideoConfig) -> Self {
        Self {
            loader: AssetLoader::new(),
            pending: None,
            video: None,
            video_config,
            active: None,
            last_error: None,
        }
    }

    /// Tear down the current backdrop and start showing `backdrop`
    pub fn apply(&mut self, backdrop: &Backdrop, target: &mut dyn BackdropTarget) {
        self.teardown(target);
        log::info!("Backdrop '{}' ({})", backdrop.id, backdrop.kind.tag());

        match &backdrop.kind {
            BackdropKind::Color(color) => target.show_color(*color),
            BackdropKind::StaticImage(source) | BackdropKind::HdrEnvironment(source) => {
                self.start_load(AssetKind::Panorama, source, &backdrop.id);
            }
            BackdropKind::LoopingVideo(source) => {
                let (width, height) = (self.video_config.width, self.video_config.height);
                target.begin_video(width, height);
                match VideoPlayer::spawn(source, &self.video_config) {
                    Ok(player) => self.video = Some(player),
                    Err(e) => log::warn!("Video backdrop playback blocked: {}", e),
                }
            }
            BackdropKind::Environment3D(source) => {
                self.start_load(AssetKind::EnvironmentModel, source, &backdrop.id);
            }
        }
        self.active = Some(backdrop.clone());
    }

    /// Stop any video, forget any in-flight load and reset the target
    pub fn teardown(&mut self, target: &mut dyn BackdropTarget) {
        if let Some(mut player) = self.video.take() {
            player.stop();
        }
        self.pending = None;
        self.last_error = None;
        self.active = None;
        target.reset_backdrop();
    }

    /// Apply finished loads and the newest video frame. Call once per frame.
    pub fn poll(&mut self, target: &mut dyn BackdropTarget) {
        for event in self.loader.poll() {
            let LoadEvent::Finished { ticket, result } = event else {
                continue;
            };
            let current = self.pending.as_ref().is_some_and(|p| p.ticket == ticket);
            if !current {
                log::debug!("Discarding stale backdrop load #{}", ticket);
                continue;
            }
            let Some(pending) = self.pending.take() else {
                continue;
            };
            match result {
                Ok(LoadedAsset::Panorama(image)) => target.show_panorama(&image),
                Ok(LoadedAsset::Model(model)) => {
                    let placement = environment_placement(model.bounds());
                    target.show_environment_model(&model, placement);
                }
                Err(e) => {
                    log::warn!("Backdrop '{}' failed to load: {}", pending.backdrop_id, e);
                    self.last_error = Some(e.to_string());
                }
            }
        }

        if let Some(frame) = self.video.as_ref().and_then(|v| v.latest_frame()) {
            target.push_video_frame(&frame);
        }
    }

    pub fn active(&self) -> Option<&Backdrop> {
        self.active.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    pub fn is_playing_video(&self) -> bool {
        self.video.is_some()
    }

    /// Why the current backdrop failed to load, if it did
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn start_load(&mut self, kind: AssetKind, source: &str, backdrop_id: &str) {
        let ticket = self.loader.request(kind, source);
        self.pending = Some(PendingLoad {
            ticket,
            backdrop_id: backdrop_id.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};
    use studio_core::Vec3;

    #[derive(Debug, Clone, PartialEq)]
    enum Op {
        Reset,
        Color(u32),
        Panorama(u32, u32),
        BeginVideo(u32, u32),
        VideoFrame,
        Environment,
    }

    #[derive(Default)]
    struct RecordingTarget {
        ops: Vec<Op>,
    }

    impl BackdropTarget for RecordingTarget {
        fn reset_backdrop(&mut self) {
            self.ops.push(Op::Reset);
        }
        fn show_color(&mut self, color: Color) {
            self.ops.push(Op::Color(color.to_hex()));
        }
        fn show_panorama(&mut self, image: &PanoramaImage) {
            self.ops.push(Op::Panorama(image.width, image.height));
        }
        fn begin_video(&mut self, width: u32, height: u32) {
            self.ops.push(Op::BeginVideo(width, height));
        }
        fn push_video_frame(&mut self, _rgba: &[u8]) {
            self.ops.push(Op::VideoFrame);
        }
        fn show_environment_model(&mut self, _model: &ImportResult, _placement: Mat4) {
            self.ops.push(Op::Environment);
        }
    }

    fn backdrop(id: &str, kind: BackdropKind) -> Backdrop {
        Backdrop {
            id: id.to_string(),
            name: id.to_string(),
            kind,
            thumbnail: String::new(),
        }
    }

    fn no_ffmpeg() -> VideoConfig {
        VideoConfig {
            ffmpeg: "/nonexistent/studio-ffmpeg".into(),
            width: 64,
            height: 36,
        }
    }

    fn temp_png(name: &str, w: u32, h: u32) -> String {
        let dir = std::env::temp_dir().join(format!("studio-backdrop-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        image::RgbaImage::from_pixel(w, h, image::Rgba([10, 200, 10, 255]))
            .save(&path)
            .unwrap();
        path.to_string_lossy().into_owned()
    }

    fn poll_until_idle(compositor: &mut BackdropCompositor, target: &mut RecordingTarget) {
        let deadline = Instant::now() + Duration::from_secs(10);
        while compositor.is_loading() && Instant::now() < deadline {
            compositor.poll(target);
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn color_then_video_tears_down_first() {
        let mut compositor = BackdropCompositor::new(no_ffmpeg());
        let mut target = RecordingTarget::default();

        compositor.apply(
            &backdrop("chroma-green", BackdropKind::Color(Color::from_hex(0x00ff00))),
            &mut target,
        );
        compositor.apply(
            &backdrop("vid", BackdropKind::LoopingVideo("clip.mp4".into())),
            &mut target,
        );

        assert_eq!(
            target.ops,
            vec![
                Op::Reset,
                Op::Color(0x00ff00),
                Op::Reset,
                Op::BeginVideo(64, 36),
            ]
        );
        // Blocked playback is logged, not raised
        assert!(!compositor.is_playing_video());
        assert_eq!(compositor.active().map(|b| b.id.as_str()), Some("vid"));
    }

    #[test]
    fn panorama_arrives_asynchronously() {
        let source = temp_png("stage.png", 16, 8);
        let mut compositor = BackdropCompositor::new(no_ffmpeg());
        let mut target = RecordingTarget::default();

        compositor.apply(&backdrop("img", BackdropKind::StaticImage(source)), &mut target);
        assert!(compositor.is_loading());
        poll_until_idle(&mut compositor, &mut target);

        assert_eq!(target.ops, vec![Op::Reset, Op::Panorama(16, 8)]);
    }

    #[test]
    fn superseded_load_is_never_applied() {
        let source = temp_png("late.png", 16, 8);
        let mut compositor = BackdropCompositor::new(no_ffmpeg());
        let mut target = RecordingTarget::default();

        compositor.apply(&backdrop("img", BackdropKind::StaticImage(source)), &mut target);
        compositor.apply(
            &backdrop("white", BackdropKind::Color(Color::WHITE)),
            &mut target,
        );

        // Give the worker time to finish, then drain
        std::thread::sleep(Duration::from_millis(300));
        for _ in 0..20 {
            compositor.poll(&mut target);
            std::thread::sleep(Duration::from_millis(10));
        }
        assert!(!target.ops.iter().any(|op| matches!(op, Op::Panorama(..))));
        assert_eq!(target.ops.last(), Some(&Op::Color(0xffffff)));
    }

    #[test]
    fn failed_load_is_reported_not_raised() {
        let mut compositor = BackdropCompositor::new(no_ffmpeg());
        let mut target = RecordingTarget::default();
        compositor.apply(
            &backdrop("env", BackdropKind::Environment3D("/nonexistent/loft.glb".into())),
            &mut target,
        );
        poll_until_idle(&mut compositor, &mut target);
        assert!(compositor.last_error().is_some());
        assert_eq!(target.ops, vec![Op::Reset]);
    }

    #[test]
    fn environment_is_scaled_and_grounded() {
        let bounds = MeshBounds {
            min: Vec3::new(-5.0, -2.0, -1.0),
            max: Vec3::new(5.0, 3.0, 1.0),
        };
        let m = environment_placement(Some(bounds));
        // 10 wide -> scale 2, lowest vertex lifted to y = 0
        assert!((m[0][0] - 2.0).abs() < 1e-5);
        assert!((m[3][1] - 4.0).abs() < 1e-5);
    }

    #[test]
    fn deep_environment_scales_by_its_largest_horizontal_extent() {
        let bounds = MeshBounds {
            min: Vec3::new(-1.0, 0.0, -20.0),
            max: Vec3::new(1.0, 2.0, 20.0),
        };
        let m = environment_placement(Some(bounds));
        // 40 deep -> scale 0.5, depth lands on the target size
        assert!((m[0][0] - 0.5).abs() < 1e-5);
        assert!((m[2][2] - 0.5).abs() < 1e-5);
        assert!((40.0 * m[2][2] - ENVIRONMENT_TARGET_SIZE).abs() < 1e-4);
    }

    #[test]
    fn narrow_environment_scale_is_capped() {
        let bounds = MeshBounds {
            min: Vec3::new(-0.1, 0.0, -0.1),
            max: Vec3::new(0.1, 1.0, 0.1),
        };
        let m = environment_placement(Some(bounds));
        assert!((m[0][0] - 20.0).abs() < 1e-5);
    }
}
