//! View filter: separable focus blur plus the morph flash grade
//!
//! The scene is rendered to an offscreen sRGB buffer. A horizontal blur pass
//! writes an intermediate buffer, then a vertical pass writes the presented
//! target and applies brightness/saturation. Captures read the scene buffer
//! directly and never see this filter.

use crate::pipeline::{texture_entries, uniform_entry};
use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

/// Format of the offscreen scene buffer and the blur intermediate
pub const SCENE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// Largest accepted blur, in pixels
pub const MAX_BLUR_PX: f32 = 20.0;

pub const FLASH_BRIGHTNESS: f32 = 1.8;
pub const FLASH_SATURATION: f32 = 0.2;

/// Runtime view filter settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewFilterSettings {
    /// Gaussian sigma in pixels; 0 disables
    pub blur_px: f32,
    /// Morph flash on
    pub flash: bool,
}

impl Default for ViewFilterSettings {
    fn default() -> Self {
        Self {
            blur_px: 0.0,
            flash: false,
        }
    }
}

impl ViewFilterSettings {
    /// (brightness, saturation)
    pub fn grade(&self) -> (f32, f32) {
        if self.flash {
            (FLASH_BRIGHTNESS, FLASH_SATURATION)
        } else {
            (1.0, 1.0)
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct CompositeUniforms {
    /// xy: texel step along the blur axis, z: sigma
    pub blur: [f32; 4],
    /// x: brightness, y: saturation
    pub grade: [f32; 4],
}

impl CompositeUniforms {
    fn pass(step: [f32; 2], sigma: f32, grade: (f32, f32)) -> Self {
        Self {
            blur: [step[0], step[1], sigma.clamp(0.0, MAX_BLUR_PX), 0.0],
            grade: [grade.0, grade.1, 0.0, 0.0],
        }
    }
}

/// Offscreen targets recreated on resize
pub struct ViewFilterTargets {
    pub scene_texture: wgpu::Texture,
    pub scene_view: wgpu::TextureView,
    pub intermediate_texture: wgpu::Texture,
    pub intermediate_view: wgpu::TextureView,
    pub depth_texture: wgpu::Texture,
    pub depth_view: wgpu::TextureView,
    scene_bind_group: wgpu::BindGroup,
    intermediate_bind_group: wgpu::BindGroup,
    pub width: u32,
    pub height: u32,
}

pub struct ViewFilter {
    horizontal_pipeline: wgpu::RenderPipeline,
    vertical_pipeline: wgpu::RenderPipeline,
    texture_bgl: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    horizontal_buffer: wgpu::Buffer,
    vertical_buffer: wgpu::Buffer,
    horizontal_bind_group: wgpu::BindGroup,
    vertical_bind_group: wgpu::BindGroup,
    pub targets: ViewFilterTargets,
}

impl ViewFilter {
    pub fn new(
        device: &wgpu::Device,
        output_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Composite Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("composite_shader.wgsl").into()),
        });

        let uniform_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Composite Uniform BGL"),
            entries: &[uniform_entry(0, wgpu::ShaderStages::FRAGMENT)],
        });
        let texture_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Composite Source BGL"),
            entries: &texture_entries(0),
        });
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Composite Pipeline Layout"),
            bind_group_layouts: &[&uniform_bgl, &texture_bgl],
            push_constant_ranges: &[],
        });

        let horizontal_pipeline =
            build_pass(device, &layout, &shader, SCENE_FORMAT, "Blur Horizontal Pipeline");
        let vertical_pipeline =
            build_pass(device, &layout, &shader, output_format, "Blur Vertical Pipeline");

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Composite Linear Sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            ..Default::default()
        });

        let neutral = CompositeUniforms::pass([0.0, 0.0], 0.0, (1.0, 1.0));
        let horizontal_buffer = uniform_buffer(device, &neutral, "Blur Horizontal Uniforms");
        let vertical_buffer = uniform_buffer(device, &neutral, "Blur Vertical Uniforms");
        let horizontal_bind_group =
            uniform_bind_group(device, &uniform_bgl, &horizontal_buffer, "Blur Horizontal");
        let vertical_bind_group =
            uniform_bind_group(device, &uniform_bgl, &vertical_buffer, "Blur Vertical");

        let targets = create_targets(device, &texture_bgl, &sampler, width, height);

        Self {
            horizontal_pipeline,
            vertical_pipeline,
            texture_bgl,
            sampler,
            horizontal_buffer,
            vertical_buffer,
            horizontal_bind_group,
            vertical_bind_group,
            targets,
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        if width == self.targets.width && height == self.targets.height {
            return;
        }
        self.targets = create_targets(device, &self.texture_bgl, &self.sampler, width, height);
    }

    /// Encode both passes, reading the scene buffer and writing `output`
    pub fn apply(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        queue: &wgpu::Queue,
        output: &wgpu::TextureView,
        settings: ViewFilterSettings,
    ) {
        let texel_x = 1.0 / self.targets.width as f32;
        let texel_y = 1.0 / self.targets.height as f32;

        queue.write_buffer(
            &self.horizontal_buffer,
            0,
            bytemuck::cast_slice(&[CompositeUniforms::pass(
                [texel_x, 0.0],
                settings.blur_px,
                (1.0, 1.0),
            )]),
        );
        queue.write_buffer(
            &self.vertical_buffer,
            0,
            bytemuck::cast_slice(&[CompositeUniforms::pass(
                [0.0, texel_y],
                settings.blur_px,
                settings.grade(),
            )]),
        );

        run_pass(
            encoder,
            "Blur Horizontal Pass",
            &self.targets.intermediate_view,
            &self.horizontal_pipeline,
            &self.horizontal_bind_group,
            &self.targets.scene_bind_group,
        );
        run_pass(
            encoder,
            "Blur Vertical Pass",
            output,
            &self.vertical_pipeline,
            &self.vertical_bind_group,
            &self.targets.intermediate_bind_group,
        );
    }
}

fn run_pass(
    encoder: &mut wgpu::CommandEncoder,
    label: &str,
    target: &wgpu::TextureView,
    pipeline: &wgpu::RenderPipeline,
    uniforms: &wgpu::BindGroup,
    source: &wgpu::BindGroup,
) {
    let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: target,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
    });
    pass.set_pipeline(pipeline);
    pass.set_bind_group(0, uniforms, &[]);
    pass.set_bind_group(1, source, &[]);
    pass.draw(0..3, 0..1);
}

fn build_pass(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    label: &str,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_fullscreen"),
            buffers: &[],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_composite"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

fn uniform_buffer(device: &wgpu::Device, value: &CompositeUniforms, label: &str) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::cast_slice(&[*value]),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}

fn uniform_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    buffer: &wgpu::Buffer,
    label: &str,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: buffer.as_entire_binding(),
        }],
    })
}

fn color_target(
    device: &wgpu::Device,
    width: u32,
    height: u32,
    usage: wgpu::TextureUsages,
    label: &str,
) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: SCENE_FORMAT,
        usage,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

fn create_targets(
    device: &wgpu::Device,
    texture_bgl: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    width: u32,
    height: u32,
) -> ViewFilterTargets {
    let width = width.max(1);
    let height = height.max(1);

    let (scene_texture, scene_view) = color_target(
        device,
        width,
        height,
        wgpu::TextureUsages::RENDER_ATTACHMENT
            | wgpu::TextureUsages::TEXTURE_BINDING
            | wgpu::TextureUsages::COPY_SRC,
        "Scene Color Texture",
    );
    let (intermediate_texture, intermediate_view) = color_target(
        device,
        width,
        height,
        wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        "Blur Intermediate Texture",
    );

    let depth_texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Scene Depth Texture"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Depth32Float,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let depth_view = depth_texture.create_view(&wgpu::TextureViewDescriptor::default());

    let source_group = |view: &wgpu::TextureView, label: &str| {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: texture_bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        })
    };
    let scene_bind_group = source_group(&scene_view, "Scene Source Bind Group");
    let intermediate_bind_group =
        source_group(&intermediate_view, "Blur Intermediate Bind Group");

    ViewFilterTargets {
        scene_texture,
        scene_view,
        intermediate_texture,
        intermediate_view,
        depth_texture,
        depth_view,
        scene_bind_group,
        intermediate_bind_group,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flash_grade_only_while_flashing() {
        let mut settings = ViewFilterSettings::default();
        assert_eq!(settings.grade(), (1.0, 1.0));
        settings.flash = true;
        assert_eq!(settings.grade(), (1.8, 0.2));
    }

    #[test]
    fn blur_sigma_is_clamped() {
        let u = CompositeUniforms::pass([1.0, 0.0], 45.0, (1.0, 1.0));
        assert_eq!(u.blur[2], MAX_BLUR_PX);
        let u = CompositeUniforms::pass([1.0, 0.0], -3.0, (1.0, 1.0));
        assert_eq!(u.blur[2], 0.0);
    }
}
