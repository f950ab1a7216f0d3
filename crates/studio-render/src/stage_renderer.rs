//! Stage renderer: owns every GPU resource of the viewer
//!
//! Draw order per frame: backdrop, environment set, floor, mirrored subject,
//! reflector, grid, subject. The subject is drawn in exactly one of its
//! level-of-detail representations.

use crate::camera::Camera;
use crate::context::RenderError;
use crate::gpu_mesh::GpuMesh;
use crate::pipeline::{srgb_to_linear, LightUniforms, MaterialUniforms, StagePipeline, TransformUniforms};
use crate::postprocess::{ViewFilter, ViewFilterSettings, SCENE_FORMAT};
use crate::primitives::{
    create_grid_mesh, create_plane_mesh, create_wireframe_box_mesh, mesh_from_imported,
    triangles_to_wireframe_indices,
};
use crate::readback::read_texture_rgba;
use crate::skybox_pipeline::{SkyboxPipeline, SkyboxUniforms};
use crate::texture::{GpuTexture, TextureWrap};
use studio_core::{
    mat4_identity, mat4_inv_transpose, mat4_mul, mat4_scale, mat4_translation, Color, LodLevel,
    Mat4,
};
use studio_import::{ImportResult, MeshBounds, PanoramaImage};
use wgpu::util::DeviceExt;

pub const GROUND_SIZE: f32 = 100.0;
pub const GRID_DIVISIONS: u32 = 50;
pub const REFLECTOR_OFFSET: f32 = 0.005;
pub const GRID_OFFSET: f32 = 0.01;

pub const DEFAULT_BACKGROUND: u32 = 0x0a0a0a;
pub const FLOOR_COLOR: u32 = 0x050505;
pub const REFLECTOR_COLOR: u32 = 0x222222;
pub const GOLD: u32 = 0xD4AF37;
pub const GRID_LINE_COLOR: u32 = 0x333333;

/// Fraction of a flat backdrop color carried into the floor
pub const FLOOR_TINT_FACTOR: f32 = 0.2;

pub const WIRE_GHOST_OPACITY: f32 = 0.5;
pub const PROXY_OPACITY: f32 = 0.3;

/// Planes and the grid are hidden below this level
const VISIBILITY_EPSILON: f32 = 0.01;
const REFLECTOR_MAX_ALPHA: f32 = 0.35;

/// Everything that changes per frame, computed by the scene host
#[derive(Debug, Clone, Copy)]
pub struct StageFrame {
    /// Subject model matrix (spin, scale pulse, jitter)
    pub subject_model: Mat4,
    /// Current (eased) subject color, sRGB
    pub tint: Color,
    /// Morph glow, sRGB
    pub emissive: Color,
    pub lod: LodLevel,
    /// 0..1
    pub reflection: f32,
    /// 0..1
    pub grid: f32,
    pub filter: ViewFilterSettings,
}

impl Default for StageFrame {
    fn default() -> Self {
        Self {
            subject_model: mat4_identity(),
            tint: Color::WHITE,
            emissive: Color::BLACK,
            lod: LodLevel::HighFidelity,
            reflection: 0.5,
            grid: 0.3,
            filter: ViewFilterSettings::default(),
        }
    }
}

/// Uniform buffers and bind groups for one draw call
struct DrawSlot {
    transform_buffer: wgpu::Buffer,
    transform_bind_group: wgpu::BindGroup,
    material_buffer: wgpu::Buffer,
    material_bind_group: wgpu::BindGroup,
}

impl DrawSlot {
    fn new(
        device: &wgpu::Device,
        pipeline: &StagePipeline,
        texture: &GpuTexture,
        label: &str,
    ) -> Self {
        let transform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Transform", label)),
            contents: bytemuck::cast_slice(&[TransformUniforms::default()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let transform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{} Transform Bind Group", label)),
            layout: &pipeline.transform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: transform_buffer.as_entire_binding(),
            }],
        });

        let material_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Material", label)),
            contents: bytemuck::cast_slice(&[MaterialUniforms::new(Color::WHITE, 0.0, 1.0, 1.0)]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let material_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{} Material Bind Group", label)),
            layout: &pipeline.material_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: material_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&texture.sampler),
                },
            ],
        });

        Self {
            transform_buffer,
            transform_bind_group,
            material_buffer,
            material_bind_group,
        }
    }

    fn write(
        &self,
        queue: &wgpu::Queue,
        view_proj: Mat4,
        camera_pos: [f32; 4],
        model: Mat4,
        material: MaterialUniforms,
    ) {
        let transform = TransformUniforms {
            view_proj,
            model,
            normal_matrix: mat4_inv_transpose(&model),
            camera_pos,
        };
        queue.write_buffer(&self.transform_buffer, 0, bytemuck::cast_slice(&[transform]));
        queue.write_buffer(&self.material_buffer, 0, bytemuck::cast_slice(&[material]));
    }

    fn bind(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_bind_group(0, &self.transform_bind_group, &[]);
        pass.set_bind_group(1, &self.material_bind_group, &[]);
    }
}

/// One imported primitive with its direct and mirrored draw slots
struct ModelPart {
    mesh: GpuMesh,
    base_color: Color,
    metallic: f32,
    roughness: f32,
    direct: DrawSlot,
    mirrored: DrawSlot,
}

/// An uploaded glTF model
struct StageModel {
    parts: Vec<ModelPart>,
    bounds: Option<MeshBounds>,
    _textures: Vec<GpuTexture>,
}

impl StageModel {
    fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        pipeline: &StagePipeline,
        white: &GpuTexture,
        model: &ImportResult,
        with_wireframe: bool,
    ) -> Self {
        let textures: Vec<GpuTexture> = model
            .textures
            .iter()
            .map(|t| {
                GpuTexture::from_rgba(
                    device,
                    queue,
                    t.width,
                    t.height,
                    &t.data,
                    TextureWrap::Repeat,
                    &t.name,
                )
            })
            .collect();

        let parts = model
            .meshes
            .iter()
            .map(|imported| {
                let label = format!("{}/{}", model.name, imported.name);
                let cpu = mesh_from_imported(imported);
                let mut mesh = GpuMesh::upload(device, &cpu, &label);
                if with_wireframe {
                    let lines = triangles_to_wireframe_indices(&cpu.indices);
                    mesh = mesh.with_wireframe(device, &lines, &label);
                }

                let material = imported
                    .material_index
                    .and_then(|i| model.materials.get(i));
                let texture = material
                    .and_then(|m| m.base_color_texture)
                    .and_then(|i| textures.get(i))
                    .unwrap_or(white);
                let (base_color, metallic, roughness) = match material {
                    Some(m) => (
                        Color::new(m.base_color[0], m.base_color[1], m.base_color[2], m.base_color[3]),
                        m.metallic,
                        m.roughness,
                    ),
                    None => (Color::WHITE, 0.0, 0.5),
                };

                ModelPart {
                    mesh,
                    base_color,
                    metallic,
                    roughness,
                    direct: DrawSlot::new(device, pipeline, texture, &label),
                    mirrored: DrawSlot::new(device, pipeline, texture, &format!("{} Mirror", label)),
                }
            })
            .collect();

        Self {
            parts,
            bounds: model.bounds(),
            _textures: textures,
        }
    }
}

/// The subject plus its proxy box
struct Subject {
    model: StageModel,
    proxy: GpuMesh,
    proxy_direct: DrawSlot,
    proxy_mirrored: DrawSlot,
    ground_level: f32,
}

/// A flat mesh with a single draw slot (floor, reflector, grid)
struct Fixture {
    mesh: GpuMesh,
    slot: DrawSlot,
}

/// What currently fills the background
enum Sky {
    /// Clear color only
    Flat,
    Panorama {
        texture: GpuTexture,
        bind_group: wgpu::BindGroup,
    },
    Video {
        texture: GpuTexture,
        bind_group: wgpu::BindGroup,
    },
}

impl Sky {
    fn texture(&self) -> Option<&GpuTexture> {
        match self {
            Sky::Flat => None,
            Sky::Panorama { texture, .. } | Sky::Video { texture, .. } => Some(texture),
        }
    }
}

pub struct StageRenderer {
    pipeline: StagePipeline,
    skybox: SkyboxPipeline,
    filter: ViewFilter,
    white: GpuTexture,

    light: LightUniforms,
    light_buffer: wgpu::Buffer,
    light_bind_group: wgpu::BindGroup,

    sky: Sky,
    sky_buffer: wgpu::Buffer,
    sky_bind_group: wgpu::BindGroup,
    background: Color,
    floor_color: Color,

    floor: Fixture,
    reflector: Fixture,
    grid: Fixture,
    subject: Option<Subject>,
    environment: Option<(StageModel, Mat4)>,
}

impl StageRenderer {
    /// `output_format` is the format of the presented target (surface or
    /// headless texture)
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        output_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Self {
        let pipeline = StagePipeline::new(device, SCENE_FORMAT);
        let skybox = SkyboxPipeline::new(device, SCENE_FORMAT);
        let filter = ViewFilter::new(device, output_format, width, height);
        let white = GpuTexture::solid(device, queue, [255, 255, 255, 255], "White Texture");

        let light = LightUniforms::studio();
        let light_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Light Uniforms"),
            contents: bytemuck::cast_slice(&[light]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let light_bind_group = light_bind_group(device, &pipeline, &light_buffer, &white);

        let sky_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Skybox Uniforms"),
            contents: bytemuck::cast_slice(&[SkyboxUniforms::panorama(mat4_identity())]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let sky_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Skybox Uniform Bind Group"),
            layout: &skybox.uniform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: sky_buffer.as_entire_binding(),
            }],
        });

        let plane = create_plane_mesh(GROUND_SIZE, GROUND_SIZE);
        let floor = Fixture {
            mesh: GpuMesh::upload(device, &plane, "Floor"),
            slot: DrawSlot::new(device, &pipeline, &white, "Floor"),
        };
        let reflector = Fixture {
            mesh: GpuMesh::upload(device, &plane, "Reflector"),
            slot: DrawSlot::new(device, &pipeline, &white, "Reflector"),
        };
        let grid_mesh = create_grid_mesh(
            GROUND_SIZE,
            GRID_DIVISIONS,
            srgb_to_linear(Color::from_hex(GOLD)).to_array(),
            srgb_to_linear(Color::from_hex(GRID_LINE_COLOR)).to_array(),
        );
        let grid = Fixture {
            mesh: GpuMesh::upload(device, &grid_mesh, "Grid"),
            slot: DrawSlot::new(device, &pipeline, &white, "Grid"),
        };

        Self {
            pipeline,
            skybox,
            filter,
            white,
            light,
            light_buffer,
            light_bind_group,
            sky: Sky::Flat,
            sky_buffer,
            sky_bind_group,
            background: Color::from_hex(DEFAULT_BACKGROUND),
            floor_color: Color::from_hex(FLOOR_COLOR),
            floor,
            reflector,
            grid,
            subject: None,
            environment: None,
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.filter.resize(device, width, height);
    }

    pub fn size(&self) -> (u32, u32) {
        (self.filter.targets.width, self.filter.targets.height)
    }

    // --- subject ---

    /// Upload a centered subject. The ground sits at its lowest vertex.
    pub fn set_subject(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, model: &ImportResult) {
        let stage_model =
            StageModel::upload(device, queue, &self.pipeline, &self.white, model, true);
        let (size, ground_level) = match stage_model.bounds {
            Some(b) => (b.size(), b.min.y),
            None => (studio_core::Vec3::ONE, 0.0),
        };
        let proxy = GpuMesh::upload(device, &create_wireframe_box_mesh(size), "Subject Proxy");
        self.subject = Some(Subject {
            model: stage_model,
            proxy,
            proxy_direct: DrawSlot::new(device, &self.pipeline, &self.white, "Proxy"),
            proxy_mirrored: DrawSlot::new(device, &self.pipeline, &self.white, "Proxy Mirror"),
            ground_level,
        });
        log::debug!("Subject uploaded, ground at {:.3}", ground_level);
    }

    pub fn clear_subject(&mut self) {
        self.subject = None;
    }

    pub fn has_subject(&self) -> bool {
        self.subject.is_some()
    }

    pub fn ground_level(&self) -> f32 {
        self.subject.as_ref().map_or(0.0, |s| s.ground_level)
    }

    // --- backdrop ---

    /// Drop every live backdrop resource and return to the default look
    pub fn reset_backdrop(&mut self, device: &wgpu::Device) {
        self.sky = Sky::Flat;
        self.environment = None;
        self.background = Color::from_hex(DEFAULT_BACKGROUND);
        self.floor_color = Color::from_hex(FLOOR_COLOR);
        self.rebind_environment(device);
    }

    /// Flat background; the floor picks up a dimmed copy of the color
    pub fn set_backdrop_color(&mut self, color: Color) {
        self.background = color;
        self.floor_color = floor_tint_for(color);
    }

    /// Equirectangular panorama as background and lighting environment
    pub fn set_backdrop_panorama(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        image: &PanoramaImage,
    ) {
        let texture = GpuTexture::from_rgba(
            device,
            queue,
            image.width,
            image.height,
            &image.rgba,
            TextureWrap::Panorama,
            "Backdrop Panorama",
        );
        let bind_group = self.sky_texture_bind_group(device, &texture);
        self.sky = Sky::Panorama {
            texture,
            bind_group,
        };
        self.light = self.light.with_environment(image.average);
        self.rebind_environment(device);
    }

    /// Allocate a streaming texture for a looping video backdrop. Frames
    /// arrive later through `update_video_frame`.
    pub fn begin_video_backdrop(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        let texture = GpuTexture::empty(device, width, height, TextureWrap::Clamp, "Backdrop Video");
        let bind_group = self.sky_texture_bind_group(device, &texture);
        self.sky = Sky::Video {
            texture,
            bind_group,
        };
        self.light = self.light.with_environment(Color::from_hex(DEFAULT_BACKGROUND));
        self.rebind_environment(device);
    }

    /// Upload one RGBA frame into the video backdrop. Ignored when the
    /// current backdrop is not a video.
    pub fn update_video_frame(&self, queue: &wgpu::Queue, rgba: &[u8]) {
        if let Sky::Video { texture, .. } = &self.sky {
            texture.write_rgba(queue, rgba);
        }
    }

    /// Add a secondary model around the subject with the given placement
    pub fn set_environment_model(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        model: &ImportResult,
        placement: Mat4,
    ) {
        let uploaded = StageModel::upload(device, queue, &self.pipeline, &self.white, model, false);
        self.environment = Some((uploaded, placement));
    }

    pub fn background(&self) -> Color {
        self.background
    }

    pub fn floor_color(&self) -> Color {
        self.floor_color
    }

    fn sky_texture_bind_group(&self, device: &wgpu::Device, texture: &GpuTexture) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Skybox Texture Bind Group"),
            layout: &self.skybox.texture_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&texture.sampler),
                },
            ],
        })
    }

    /// Rebind group 2 to the sky texture, or disable environment lighting
    /// when the backdrop is flat
    fn rebind_environment(&mut self, device: &wgpu::Device) {
        let env = self.sky.texture();
        if env.is_none() {
            self.light = LightUniforms::studio();
        }
        self.light_bind_group = light_bind_group(
            device,
            &self.pipeline,
            &self.light_buffer,
            env.unwrap_or(&self.white),
        );
    }

    // --- frame ---

    /// Render the scene, then present it through the view filter into `output`
    pub fn render(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        output: &wgpu::TextureView,
        camera: &Camera,
        frame: &StageFrame,
    ) {
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Stage Encoder"),
        });
        self.encode_scene(&mut encoder, queue, camera, frame);
        self.filter.apply(&mut encoder, queue, output, frame.filter);
        queue.submit(std::iter::once(encoder.finish()));
    }

    /// Render the scene now and read it back unfiltered.
    /// Returns `(width, height, rgba)`.
    pub fn capture_rgba(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        camera: &Camera,
        frame: &StageFrame,
    ) -> Result<(u32, u32, Vec<u8>), RenderError> {
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Capture Encoder"),
        });
        self.encode_scene(&mut encoder, queue, camera, frame);
        queue.submit(std::iter::once(encoder.finish()));

        let (width, height) = self.size();
        let pixels = read_texture_rgba(device, queue, &self.filter.targets.scene_texture)?;
        Ok((width, height, pixels))
    }

    fn encode_scene(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        queue: &wgpu::Queue,
        camera: &Camera,
        frame: &StageFrame,
    ) {
        let view_proj = camera.view_projection_matrix();
        let eye = camera.position_array();
        let ground = self.ground_level();
        let (width, height) = self.size();

        queue.write_buffer(&self.light_buffer, 0, bytemuck::cast_slice(&[self.light]));

        let sky_uniforms = match &self.sky {
            Sky::Flat => None,
            Sky::Panorama { .. } => Some(SkyboxUniforms::panorama(
                camera.inverse_rotation_projection(),
            )),
            Sky::Video { texture, .. } => Some(SkyboxUniforms::screen_cover(
                texture.width,
                texture.height,
                width,
                height,
            )),
        };
        if let Some(uniforms) = sky_uniforms {
            queue.write_buffer(&self.sky_buffer, 0, bytemuck::cast_slice(&[uniforms]));
        }

        // Fixtures
        self.floor.slot.write(
            queue,
            view_proj,
            eye,
            mat4_translation(0.0, ground, 0.0),
            MaterialUniforms::new(self.floor_color, 0.8, 0.1, 0.95),
        );
        let reflector_visible = frame.reflection > VISIBILITY_EPSILON;
        self.reflector.slot.write(
            queue,
            view_proj,
            eye,
            mat4_translation(0.0, ground + REFLECTOR_OFFSET, 0.0),
            MaterialUniforms::new(
                Color::from_hex(REFLECTOR_COLOR),
                1.0,
                0.0,
                REFLECTOR_MAX_ALPHA * frame.reflection.clamp(0.0, 1.0),
            ),
        );
        let grid_visible = frame.grid > VISIBILITY_EPSILON;
        self.grid.slot.write(
            queue,
            view_proj,
            eye,
            mat4_translation(0.0, ground + GRID_OFFSET, 0.0),
            MaterialUniforms::line(Color::WHITE, frame.grid.clamp(0.0, 1.0)),
        );

        if let Some((model, placement)) = &self.environment {
            for part in &model.parts {
                part.direct.write(
                    queue,
                    view_proj,
                    eye,
                    *placement,
                    MaterialUniforms::new(part.base_color, part.metallic, part.roughness, 1.0),
                );
            }
        }

        let mirror = mirror_matrix(ground);
        if let Some(subject) = &self.subject {
            let mirrored_model = mat4_mul(&mirror, &frame.subject_model);
            match frame.lod {
                LodLevel::SpatialProxy => {
                    let proxy = MaterialUniforms::line(Color::from_hex(GOLD), PROXY_OPACITY);
                    subject
                        .proxy_direct
                        .write(queue, view_proj, eye, frame.subject_model, proxy);
                    let mut reflected = proxy;
                    reflected.params[2] *= frame.reflection;
                    subject
                        .proxy_mirrored
                        .write(queue, view_proj, eye, mirrored_model, reflected);
                }
                LodLevel::HighFidelity | LodLevel::WireGhost => {
                    let opacity = if frame.lod == LodLevel::WireGhost {
                        WIRE_GHOST_OPACITY
                    } else {
                        1.0
                    };
                    for part in &subject.model.parts {
                        let material =
                            MaterialUniforms::new(frame.tint, part.metallic, part.roughness, opacity)
                                .with_emissive(frame.emissive);
                        part.direct
                            .write(queue, view_proj, eye, frame.subject_model, material);
                        let mut reflected = material;
                        reflected.params[2] *= frame.reflection;
                        part.mirrored
                            .write(queue, view_proj, eye, mirrored_model, reflected);
                    }
                }
            }
        }

        let clear = srgb_to_linear(self.background);
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Stage Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &self.filter.targets.scene_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: clear.r as f64,
                        g: clear.g as f64,
                        b: clear.b as f64,
                        a: 1.0,
                    }),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.filter.targets.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        match &self.sky {
            Sky::Flat => {}
            Sky::Panorama { bind_group, .. } | Sky::Video { bind_group, .. } => {
                pass.set_pipeline(&self.skybox.pipeline);
                pass.set_bind_group(0, &self.sky_bind_group, &[]);
                pass.set_bind_group(1, bind_group, &[]);
                pass.draw(0..3, 0..1);
            }
        }

        pass.set_bind_group(2, &self.light_bind_group, &[]);

        if let Some((model, _)) = &self.environment {
            pass.set_pipeline(&self.pipeline.solid);
            for part in &model.parts {
                part.direct.bind(&mut pass);
                part.mesh.draw(&mut pass);
            }
        }

        pass.set_pipeline(&self.pipeline.surface);
        self.floor.slot.bind(&mut pass);
        self.floor.mesh.draw(&mut pass);

        if let Some(subject) = &self.subject {
            if reflector_visible {
                self.draw_subject(&mut pass, subject, frame.lod, true);
            }
        }

        if reflector_visible {
            pass.set_pipeline(&self.pipeline.surface);
            self.reflector.slot.bind(&mut pass);
            self.reflector.mesh.draw(&mut pass);
        }

        if grid_visible {
            pass.set_pipeline(&self.pipeline.line);
            self.grid.slot.bind(&mut pass);
            self.grid.mesh.draw(&mut pass);
        }

        if let Some(subject) = &self.subject {
            self.draw_subject(&mut pass, subject, frame.lod, false);
        }
    }

    fn draw_subject(
        &self,
        pass: &mut wgpu::RenderPass<'_>,
        subject: &Subject,
        lod: LodLevel,
        mirrored: bool,
    ) {
        match lod {
            LodLevel::HighFidelity => {
                pass.set_pipeline(if mirrored {
                    &self.pipeline.mirror
                } else {
                    &self.pipeline.solid
                });
                for part in &subject.model.parts {
                    let slot = if mirrored { &part.mirrored } else { &part.direct };
                    slot.bind(pass);
                    part.mesh.draw(pass);
                }
            }
            LodLevel::WireGhost => {
                pass.set_pipeline(&self.pipeline.line);
                for part in &subject.model.parts {
                    let slot = if mirrored { &part.mirrored } else { &part.direct };
                    slot.bind(pass);
                    part.mesh.draw_wireframe(pass);
                }
            }
            LodLevel::SpatialProxy => {
                pass.set_pipeline(&self.pipeline.line);
                let slot = if mirrored {
                    &subject.proxy_mirrored
                } else {
                    &subject.proxy_direct
                };
                slot.bind(pass);
                subject.proxy.draw(pass);
            }
        }
    }
}

fn light_bind_group(
    device: &wgpu::Device,
    pipeline: &StagePipeline,
    buffer: &wgpu::Buffer,
    env: &GpuTexture,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Light Bind Group"),
        layout: &pipeline.light_bind_group_layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(&env.view),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::Sampler(&env.sampler),
            },
        ],
    })
}

/// Floor color under a flat backdrop
pub fn floor_tint_for(background: Color) -> Color {
    background.scaled(FLOOR_TINT_FACTOR).with_alpha(1.0)
}

/// Reflection across the horizontal plane `y = ground`
pub fn mirror_matrix(ground: f32) -> Mat4 {
    mat4_mul(
        &mat4_translation(0.0, 2.0 * ground, 0.0),
        &mat4_scale(1.0, -1.0, 1.0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(m: &Mat4, p: [f32; 3]) -> [f32; 3] {
        let v = [p[0], p[1], p[2], 1.0];
        let mut out = [0.0; 3];
        for (row, value) in out.iter_mut().enumerate() {
            *value = (0..4).map(|k| m[k][row] * v[k]).sum();
        }
        out
    }

    #[test]
    fn mirror_reflects_across_ground() {
        let m = mirror_matrix(-1.0);
        // 0.5 above the ground lands 0.5 below it
        assert_eq!(apply(&m, [2.0, -0.5, 3.0]), [2.0, -1.5, 3.0]);
        // Points on the plane stay put
        assert_eq!(apply(&m, [0.0, -1.0, 0.0]), [0.0, -1.0, 0.0]);
    }

    #[test]
    fn floor_tint_darkens_flat_backdrops() {
        let floor = floor_tint_for(Color::from_hex(0x00ff00));
        assert_eq!(floor.r, 0.0);
        assert!((floor.g - 0.2).abs() < 1e-6);
        assert_eq!(floor.b, 0.0);
        assert_eq!(floor.a, 1.0);
    }

    #[test]
    fn fixtures_stack_above_the_floor() {
        assert!(REFLECTOR_OFFSET > 0.0);
        assert!(GRID_OFFSET > REFLECTOR_OFFSET);
    }
}
