//! Scene graph host
//!
//! Owns every GPU resource of the stage through `StageRenderer`, plus the
//! camera, the runtime scene and the background loaders. Other components
//! only describe what they want; the host is the one that touches the GPU.

use crate::backdrop::{BackdropCompositor, BackdropTarget};
use crate::capture::encode_png_data_uri;
use crate::config::ViewerConfig;
use crate::history::SceneState;
use crate::hooks::StudioHooks;
use crate::loader::{AssetKind, AssetLoader, LoadEvent, LoadedAsset};
use crate::lod::{select_lod, LodThresholds};
use crate::runtime::{SceneEffects, SceneRuntime, SceneUpdate};
use std::path::Path;
use studio_core::{Color, LodLevel, Mat4, Result, StudioError, Vec3};
use studio_import::{ImportResult, MeshBounds, PanoramaImage};
use studio_render::{Camera, StageFrame, StageRenderer, ViewFilterSettings};

/// Subject loading progress
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState {
    Loading { percent: u8 },
    Ready,
    Failed { message: String },
}

impl LoadState {
    pub fn is_ready(&self) -> bool {
        matches!(self, LoadState::Ready)
    }
}

/// Tracks the one subject load that still counts.
///
/// Events for any other ticket belong to a superseded request and are dropped.
/// A failed load only flips the state; the frame loop keeps running.
#[derive(Debug)]
pub struct SubjectLoad {
    ticket: Option<u64>,
    state: LoadState,
}

impl Default for SubjectLoad {
    fn default() -> Self {
        Self {
            ticket: None,
            state: LoadState::Loading { percent: 0 },
        }
    }
}

impl SubjectLoad {
    pub fn new() -> Self {
        Self::default()
    }

    /// Follow `ticket` from now on, forgetting any earlier request
    pub fn start(&mut self, ticket: u64) {
        self.ticket = Some(ticket);
        self.state = LoadState::Loading { percent: 0 };
    }

    /// Apply one loader event. Returns the outcome once the tracked load finishes:
    /// the imported model, or the message to fail with.
    pub fn on_event(&mut self, event: LoadEvent) -> Option<std::result::Result<ImportResult, String>> {
        if Some(event.ticket()) != self.ticket {
            log::debug!("Discarding stale subject load #{}", event.ticket());
            return None;
        }
        match event {
            LoadEvent::Progress { percent, .. } => {
                let previous = match self.state {
                    LoadState::Loading { percent } => percent,
                    _ => 0,
                };
                if percent / 25 > previous / 25 {
                    log::info!("Subject loading: {}%", percent);
                }
                self.state = LoadState::Loading { percent };
                None
            }
            LoadEvent::Finished { result, .. } => {
                self.ticket = None;
                Some(match result {
                    Ok(LoadedAsset::Model(model)) => Ok(model),
                    Ok(LoadedAsset::Panorama(_)) => {
                        Err("subject source decoded as an image".to_string())
                    }
                    Err(e) => Err(e.to_string()),
                })
            }
        }
    }

    pub fn ready(&mut self) {
        self.ticket = None;
        self.state = LoadState::Ready;
    }

    pub fn fail(&mut self, message: String) {
        self.ticket = None;
        self.state = LoadState::Failed { message };
    }

    /// Stop following the pending request, if any
    pub fn cancel(&mut self) {
        self.ticket = None;
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn pending_ticket(&self) -> Option<u64> {
        self.ticket
    }

    /// Captures are refused until the subject is on stage
    pub fn ensure_capturable(&self) -> Result<()> {
        if self.state.is_ready() {
            Ok(())
        } else {
            Err(StudioError::CaptureError(
                "the subject is not ready yet".to_string(),
            ))
        }
    }

    /// The LOD label only shows for a ready subject
    pub fn visible_lod(&self, lod: LodLevel) -> Option<LodLevel> {
        self.state.is_ready().then_some(lod)
    }
}

/// Move `model` so its bounding box is centered on the origin.
/// Returns the new bounds, or `None` for an empty model.
pub fn center_subject(model: &mut ImportResult) -> Option<MeshBounds> {
    let bounds = model.bounds()?;
    model.translate(Vec3::ZERO - bounds.center());
    model.bounds()
}

/// `BackdropTarget` backed by the stage renderer
struct GpuStage<'a> {
    renderer: &'a mut StageRenderer,
    device: &'a wgpu::Device,
    queue: &'a wgpu::Queue,
}

impl BackdropTarget for GpuStage<'_> {
    fn reset_backdrop(&mut self) {
        self.renderer.reset_backdrop(self.device);
    }

    fn show_color(&mut self, color: Color) {
        self.renderer.set_backdrop_color(color);
    }

    fn show_panorama(&mut self, image: &PanoramaImage) {
        self.renderer
            .set_backdrop_panorama(self.device, self.queue, image);
    }

    fn begin_video(&mut self, width: u32, height: u32) {
        self.renderer
            .begin_video_backdrop(self.device, width, height);
    }

    fn push_video_frame(&mut self, rgba: &[u8]) {
        self.renderer.update_video_frame(self.queue, rgba);
    }

    fn show_environment_model(&mut self, model: &ImportResult, placement: Mat4) {
        self.renderer
            .set_environment_model(self.device, self.queue, model, placement);
    }
}

pub struct SceneHost {
    runtime: SceneRuntime,
    camera: Camera,
    renderer: StageRenderer,
    compositor: BackdropCompositor,
    loader: AssetLoader,
    subject: SubjectLoad,
    lod_thresholds: LodThresholds,
    lod: LodLevel,
    hooks: Box<dyn StudioHooks>,
}

impl SceneHost {
    /// Build the stage and show `initial`. No subject is loaded yet.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        output_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        initial: SceneState,
        config: &ViewerConfig,
        hooks: Box<dyn StudioHooks>,
    ) -> Self {
        let renderer = StageRenderer::new(device, queue, output_format, width, height);
        let mut camera = Camera::new();
        camera.set_viewport(width, height);

        let runtime = SceneRuntime::new(initial, config.scene.blur);
        let effects = runtime.initial_effects();

        let mut host = Self {
            runtime,
            camera,
            renderer,
            compositor: BackdropCompositor::new(config.video.clone()),
            loader: AssetLoader::new(),
            subject: SubjectLoad::new(),
            lod_thresholds: config.lod,
            lod: LodLevel::HighFidelity,
            hooks,
        };
        host.handle_effects(device, queue, effects);
        host
    }

    /// Start loading the subject in the background
    pub fn load_subject(&mut self, source: &str) {
        log::info!("Loading subject from {}", source);
        let ticket = self.loader.request(AssetKind::Subject, source);
        self.subject.start(ticket);
    }

    /// Install an already imported subject
    pub fn set_subject(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, mut model: ImportResult) {
        match center_subject(&mut model) {
            Some(bounds) => {
                let size = bounds.size();
                log::info!(
                    "Subject '{}' ready: {} vertices, {:.2} x {:.2} x {:.2}",
                    model.name,
                    model.vertex_count(),
                    size.x,
                    size.y,
                    size.z
                );
            }
            None => log::warn!("Subject '{}' has no geometry", model.name),
        }
        self.renderer.set_subject(device, queue, &model);
        self.subject.ready();
    }

    pub fn user_edit(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, update: SceneUpdate) {
        let effects = self.runtime.user_edit(update);
        self.handle_effects(device, queue, effects);
    }

    pub fn undo(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) {
        if let Some(effects) = self.runtime.undo() {
            self.handle_effects(device, queue, effects);
        }
    }

    pub fn redo(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) {
        if let Some(effects) = self.runtime.redo() {
            self.handle_effects(device, queue, effects);
        }
    }

    pub fn import_backdrop(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        path: &Path,
        mime: Option<&str>,
    ) {
        let effects = self.runtime.import_backdrop(path, mime);
        self.handle_effects(device, queue, effects);
    }

    fn handle_effects(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, effects: SceneEffects) {
        if let Some(backdrop) = effects.backdrop {
            let mut stage = GpuStage {
                renderer: &mut self.renderer,
                device,
                queue,
            };
            self.compositor.apply(&backdrop, &mut stage);
        }
        if let Some(descriptor) = effects.descriptor {
            self.hooks.on_style_update(&descriptor);
        }
    }

    /// Per-frame update: finished loads, video frames, motion, camera and LOD
    pub fn frame(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, dt: f32) {
        self.poll_subject(device, queue);

        let mut stage = GpuStage {
            renderer: &mut self.renderer,
            device,
            queue,
        };
        self.compositor.poll(&mut stage);

        self.runtime.advance(dt);
        self.camera.update(dt);
        self.lod = select_lod(self.camera.distance_to(Vec3::ZERO), &self.lod_thresholds);
    }

    fn poll_subject(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) {
        for event in self.loader.poll() {
            match self.subject.on_event(event) {
                Some(Ok(model)) => self.set_subject(device, queue, model),
                Some(Err(message)) => self.fail_subject(message),
                None => {}
            }
        }
    }

    fn fail_subject(&mut self, message: String) {
        log::error!("Subject failed to load: {}", message);
        self.renderer.clear_subject();
        self.subject.fail(message);
    }

    /// Everything the renderer needs for the current frame
    pub fn stage_frame(&self) -> StageFrame {
        let motion = self.runtime.motion();
        let state = self.runtime.state();
        StageFrame {
            subject_model: motion.model_matrix(),
            tint: motion.color,
            emissive: motion.emissive(),
            lod: self.lod,
            reflection: state.reflection,
            grid: state.grid,
            filter: ViewFilterSettings {
                blur_px: self.runtime.blur(),
                flash: self.runtime.morph_indicator_active(),
            },
        }
    }

    pub fn render(&self, device: &wgpu::Device, queue: &wgpu::Queue, output: &wgpu::TextureView) {
        self.renderer
            .render(device, queue, output, &self.camera, &self.stage_frame());
    }

    /// Render the current scene now and read it back as `(width, height, rgba)`
    pub fn capture_rgba(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) -> Result<(u32, u32, Vec<u8>)> {
        self.subject.ensure_capturable()?;
        let frame = self
            .renderer
            .capture_rgba(device, queue, &self.camera, &self.stage_frame())?;
        Ok(frame)
    }

    /// Capture the current frame as a PNG data URI and hand it to the hooks
    pub fn capture_frame(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) -> Result<String> {
        let (width, height, rgba) = self.capture_rgba(device, queue)?;
        let uri = encode_png_data_uri(width, height, &rgba)?;
        log::info!("Captured {}x{} frame", width, height);
        self.hooks.on_snapshot(&uri);
        Ok(uri)
    }

    /// Zero sizes are ignored until the surface has an area again
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.renderer.resize(device, width, height);
        self.camera.set_viewport(width, height);
    }

    /// Stop backdrop playback and release the subject and stage resources
    pub fn teardown(mut self, device: &wgpu::Device, queue: &wgpu::Queue) {
        let mut stage = GpuStage {
            renderer: &mut self.renderer,
            device,
            queue,
        };
        self.compositor.teardown(&mut stage);
        self.renderer.clear_subject();
        self.subject.cancel();
        log::info!("Scene host torn down");
    }

    pub fn runtime(&self) -> &SceneRuntime {
        &self.runtime
    }

    /// Direct access for previews, hover and impulses, which never record history
    pub fn runtime_mut(&mut self) -> &mut SceneRuntime {
        &mut self.runtime
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn compositor(&self) -> &BackdropCompositor {
        &self.compositor
    }

    pub fn load_state(&self) -> &LoadState {
        self.subject.state()
    }

    /// Current level of detail, only meaningful once the subject is ready
    pub fn lod(&self) -> Option<LodLevel> {
        self.subject.visible_lod(self.lod)
    }

    pub fn background(&self) -> Color {
        self.renderer.background()
    }

    pub fn floor_color(&self) -> Color {
        self.renderer.floor_color()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use studio_import::ImportedMesh;

    fn offset_box() -> ImportResult {
        ImportResult {
            name: "box".into(),
            meshes: vec![ImportedMesh {
                name: "box".into(),
                positions: vec![[1.0, 2.0, 3.0], [3.0, 6.0, 5.0], [1.0, 6.0, 3.0]],
                normals: vec![[0.0, 1.0, 0.0]; 3],
                uvs: vec![[0.0, 0.0]; 3],
                indices: vec![0, 1, 2],
                material_index: None,
            }],
            ..Default::default()
        }
    }

    #[test]
    fn subject_is_recentered() {
        let mut model = offset_box();
        let bounds = center_subject(&mut model).unwrap();
        assert!(bounds.center().length() < 1e-5);
        // Ground level sits at -height / 2
        assert!((bounds.min.y + 2.0).abs() < 1e-5);
    }

    #[test]
    fn empty_subject_has_no_bounds() {
        let mut model = ImportResult::default();
        assert!(center_subject(&mut model).is_none());
    }

    #[test]
    fn only_ready_is_ready() {
        assert!(LoadState::Ready.is_ready());
        assert!(!LoadState::Loading { percent: 99 }.is_ready());
        assert!(!LoadState::Failed {
            message: "x".into()
        }
        .is_ready());
    }

    fn finished(ticket: u64, result: Result<LoadedAsset>) -> LoadEvent {
        LoadEvent::Finished { ticket, result }
    }

    #[test]
    fn progress_updates_percent() {
        let mut load = SubjectLoad::new();
        load.start(3);
        assert!(load.on_event(LoadEvent::Progress { ticket: 3, percent: 40 }).is_none());
        assert_eq!(load.state(), &LoadState::Loading { percent: 40 });
        load.on_event(LoadEvent::Progress { ticket: 3, percent: 90 });
        assert_eq!(load.state(), &LoadState::Loading { percent: 90 });
        assert_eq!(load.pending_ticket(), Some(3));
    }

    #[test]
    fn superseded_ticket_is_ignored() {
        let mut load = SubjectLoad::new();
        load.start(1);
        load.start(2);
        assert!(load.on_event(LoadEvent::Progress { ticket: 1, percent: 80 }).is_none());
        assert_eq!(load.state(), &LoadState::Loading { percent: 0 });
        assert!(load.on_event(finished(1, Ok(LoadedAsset::Model(offset_box())))).is_none());
        assert_eq!(load.pending_ticket(), Some(2));
    }

    #[test]
    fn events_without_a_request_are_ignored() {
        let mut load = SubjectLoad::new();
        assert!(load.on_event(finished(0, Ok(LoadedAsset::Model(offset_box())))).is_none());
        assert!(!load.state().is_ready());
    }

    #[test]
    fn failed_load_becomes_failed_state() {
        let mut load = SubjectLoad::new();
        load.start(5);
        let outcome = load.on_event(finished(5, Err(StudioError::FetchError("404".into()))));
        let message = match outcome {
            Some(Err(message)) => message,
            other => panic!("expected a failure, got {:?}", other.map(|r| r.is_ok())),
        };
        assert!(message.contains("404"));
        assert_eq!(load.pending_ticket(), None);

        load.fail(message.clone());
        assert_eq!(load.state(), &LoadState::Failed { message });
        // Later events for the finished ticket no longer count
        assert!(load.on_event(LoadEvent::Progress { ticket: 5, percent: 10 }).is_none());
    }

    #[test]
    fn image_decoded_as_subject_fails() {
        let mut load = SubjectLoad::new();
        load.start(7);
        let panorama = PanoramaImage {
            width: 1,
            height: 1,
            rgba: vec![0, 0, 0, 255],
            average: Color::BLACK,
            was_hdr: false,
        };
        let outcome = load.on_event(finished(7, Ok(LoadedAsset::Panorama(panorama))));
        assert!(matches!(outcome, Some(Err(_))));
    }

    #[test]
    fn finished_model_is_handed_back() {
        let mut load = SubjectLoad::new();
        load.start(9);
        let outcome = load.on_event(finished(9, Ok(LoadedAsset::Model(offset_box()))));
        match outcome {
            Some(Ok(model)) => assert_eq!(model.name, "box"),
            other => panic!("expected a model, got {:?}", other.map(|r| r.is_ok())),
        }
        load.ready();
        assert!(load.state().is_ready());
    }

    #[test]
    fn only_ready_subject_allows_capture_and_lod() {
        let mut load = SubjectLoad::new();
        load.start(1);
        assert!(matches!(load.ensure_capturable(), Err(StudioError::CaptureError(_))));
        assert_eq!(load.visible_lod(LodLevel::HighFidelity), None);

        load.fail("broken".into());
        assert!(load.ensure_capturable().is_err());
        assert_eq!(load.visible_lod(LodLevel::HighFidelity), None);

        load.ready();
        assert!(load.ensure_capturable().is_ok());
        assert_eq!(load.visible_lod(LodLevel::HighFidelity), Some(LodLevel::HighFidelity));
    }
}
