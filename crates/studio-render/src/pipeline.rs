//! Stage render pipelines and their uniform layouts

use crate::primitives::Vertex;
use bytemuck::{Pod, Zeroable};
use studio_core::{mat4_identity, Color, Mat4};

/// Per-draw transform (bind group 0)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct TransformUniforms {
    pub view_proj: Mat4,
    pub model: Mat4,
    pub normal_matrix: Mat4,
    pub camera_pos: [f32; 4],
}

impl Default for TransformUniforms {
    fn default() -> Self {
        Self {
            view_proj: mat4_identity(),
            model: mat4_identity(),
            normal_matrix: mat4_identity(),
            camera_pos: [0.0; 4],
        }
    }
}

/// Per-draw material (bind group 1, alongside the base color map)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct MaterialUniforms {
    /// Linear RGBA
    pub base_color: [f32; 4],
    /// Linear RGB added after lighting
    pub emissive: [f32; 4],
    /// x: metallic, y: roughness, z: opacity
    pub params: [f32; 4],
}

impl MaterialUniforms {
    /// `color` is an sRGB-authored color
    pub fn new(color: Color, metallic: f32, roughness: f32, opacity: f32) -> Self {
        Self {
            base_color: srgb_to_linear(color).to_array(),
            emissive: [0.0; 4],
            params: [metallic, roughness, opacity, 0.0],
        }
    }

    /// Unlit line color
    pub fn line(color: Color, opacity: f32) -> Self {
        Self::new(color, 0.0, 1.0, opacity)
    }

    pub fn with_emissive(mut self, emissive: Color) -> Self {
        self.emissive = srgb_to_linear(emissive).to_array();
        self
    }
}

/// Scene lighting (bind group 2, alongside the environment panorama)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct LightUniforms {
    pub ambient: [f32; 4],
    /// Direction toward the light
    pub light_dir: [f32; 4],
    pub light_color: [f32; 4],
    /// x: environment strength
    pub env_params: [f32; 4],
    pub env_average: [f32; 4],
}

impl LightUniforms {
    /// White ambient fill plus one white key light from (5, 5, 5)
    pub fn studio() -> Self {
        let inv_len = 1.0 / 75.0f32.sqrt();
        Self {
            ambient: [0.8, 0.8, 0.8, 1.0],
            light_dir: [5.0 * inv_len, 5.0 * inv_len, 5.0 * inv_len, 0.0],
            light_color: [1.2, 1.2, 1.2, 1.0],
            env_params: [0.0; 4],
            env_average: [0.0; 4],
        }
    }

    /// Enable image-based reflections from a panorama whose mean color is
    /// `average` (sRGB)
    pub fn with_environment(mut self, average: Color) -> Self {
        self.env_params = [1.0, 0.0, 0.0, 0.0];
        self.env_average = srgb_to_linear(average).to_array();
        self
    }
}

impl Default for LightUniforms {
    fn default() -> Self {
        Self::studio()
    }
}

/// Decode an sRGB-authored color to linear light (alpha untouched)
pub fn srgb_to_linear(c: Color) -> Color {
    let f = |v: f32| {
        if v <= 0.04045 {
            v / 12.92
        } else {
            ((v + 0.055) / 1.055).powf(2.4)
        }
    };
    Color::new(f(c.r), f(c.g), f(c.b), c.a)
}

/// All stage pipelines share one shader and one pipeline layout
pub struct StagePipeline {
    /// Opaque-ish triangles with depth write (subject, environment set)
    pub solid: wgpu::RenderPipeline,
    /// Solid geometry mirrored through the ground plane; winding is flipped
    pub mirror: wgpu::RenderPipeline,
    /// Translucent ground planes, no depth write
    pub surface: wgpu::RenderPipeline,
    /// Unlit line lists (grid, wire ghost, proxy box), no depth write
    pub line: wgpu::RenderPipeline,
    pub transform_bind_group_layout: wgpu::BindGroupLayout,
    pub material_bind_group_layout: wgpu::BindGroupLayout,
    pub light_bind_group_layout: wgpu::BindGroupLayout,
}

struct Variant {
    label: &'static str,
    topology: wgpu::PrimitiveTopology,
    cull_mode: Option<wgpu::Face>,
    depth_write: bool,
    fragment: &'static str,
}

impl StagePipeline {
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Stage Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shader.wgsl").into()),
        });

        let transform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[uniform_entry(
                    0,
                    wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                )],
                label: Some("Transform Bind Group Layout"),
            });

        // Uniform + base color map + sampler
        let material_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &textured_uniform_entries(),
                label: Some("Material Bind Group Layout"),
            });

        // Uniform + environment panorama + sampler
        let light_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &textured_uniform_entries(),
                label: Some("Light Bind Group Layout"),
            });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Stage Pipeline Layout"),
            bind_group_layouts: &[
                &transform_bind_group_layout,
                &material_bind_group_layout,
                &light_bind_group_layout,
            ],
            push_constant_ranges: &[],
        });

        let build = |v: Variant| build_variant(device, &layout, &shader, format, v);

        Self {
            solid: build(Variant {
                label: "Solid Pipeline",
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Back),
                depth_write: true,
                fragment: "fs_main",
            }),
            mirror: build(Variant {
                label: "Mirror Pipeline",
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Front),
                depth_write: true,
                fragment: "fs_main",
            }),
            surface: build(Variant {
                label: "Surface Pipeline",
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                depth_write: false,
                fragment: "fs_main",
            }),
            line: build(Variant {
                label: "Line Pipeline",
                topology: wgpu::PrimitiveTopology::LineList,
                cull_mode: None,
                depth_write: false,
                fragment: "fs_line",
            }),
            transform_bind_group_layout,
            material_bind_group_layout,
            light_bind_group_layout,
        }
    }
}

fn build_variant(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    v: Variant,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(v.label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[Vertex::desc()],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some(v.fragment),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: v.topology,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: v.cull_mode,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: wgpu::TextureFormat::Depth32Float,
            depth_write_enabled: v.depth_write,
            depth_compare: if v.depth_write {
                wgpu::CompareFunction::Less
            } else {
                wgpu::CompareFunction::LessEqual
            },
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

pub(crate) fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

/// Texture at binding 0 and filtering sampler at binding 1, fragment only
pub(crate) fn texture_entries(first_binding: u32) -> [wgpu::BindGroupLayoutEntry; 2] {
    [
        wgpu::BindGroupLayoutEntry {
            binding: first_binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        },
        wgpu::BindGroupLayoutEntry {
            binding: first_binding + 1,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        },
    ]
}

fn textured_uniform_entries() -> [wgpu::BindGroupLayoutEntry; 3] {
    let [texture, sampler] = texture_entries(1);
    [uniform_entry(0, wgpu::ShaderStages::FRAGMENT), texture, sampler]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_sizes_are_16_byte_aligned() {
        assert_eq!(std::mem::size_of::<TransformUniforms>() % 16, 0);
        assert_eq!(std::mem::size_of::<MaterialUniforms>(), 48);
        assert_eq!(std::mem::size_of::<LightUniforms>(), 80);
    }

    #[test]
    fn srgb_decode_endpoints() {
        let black = srgb_to_linear(Color::BLACK);
        assert_eq!(black.r, 0.0);
        let white = srgb_to_linear(Color::WHITE);
        assert!((white.g - 1.0).abs() < 1e-6);
        let mid = srgb_to_linear(Color::new(0.5, 0.5, 0.5, 0.5));
        assert!((mid.r - 0.214).abs() < 0.001);
        assert_eq!(mid.a, 0.5);
    }

    #[test]
    fn studio_light_points_at_origin_from_key_position() {
        let l = LightUniforms::studio();
        let len = (l.light_dir[0].powi(2) + l.light_dir[1].powi(2) + l.light_dir[2].powi(2)).sqrt();
        assert!((len - 1.0).abs() < 1e-6);
        assert_eq!(l.env_params[0], 0.0);
        assert_eq!(l.with_environment(Color::WHITE).env_params[0], 1.0);
    }
}
