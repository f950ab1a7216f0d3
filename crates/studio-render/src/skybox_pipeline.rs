//! Backdrop pipeline: a fullscreen triangle at the far plane
//!
//! Panoramas are sampled along the view ray (equirectangular); video frames
//! are stretched over the screen with cover fit. No vertex buffers.

use crate::pipeline::{texture_entries, uniform_entry};
use bytemuck::{Pod, Zeroable};
use studio_core::{mat4_identity, Mat4};

/// How the backdrop texture is mapped onto the screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkyboxMode {
    Equirectangular,
    ScreenCover,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct SkyboxUniforms {
    /// Inverse of projection * rotation-only view
    pub inv_view_proj: Mat4,
    /// x: mode, y/z: cover scale, w: intensity
    pub params: [f32; 4],
}

impl SkyboxUniforms {
    pub fn panorama(inv_view_proj: Mat4) -> Self {
        Self {
            inv_view_proj,
            params: [0.0, 1.0, 1.0, 1.0],
        }
    }

    /// Screen-fill a `frame_w` x `frame_h` image over a `view_w` x `view_h`
    /// target, cropping whichever axis overflows
    pub fn screen_cover(frame_w: u32, frame_h: u32, view_w: u32, view_h: u32) -> Self {
        let [sx, sy] = cover_scale(frame_w, frame_h, view_w, view_h);
        Self {
            inv_view_proj: mat4_identity(),
            params: [1.0, sx, sy, 1.0],
        }
    }

    pub fn mode(&self) -> SkyboxMode {
        if self.params[0] < 0.5 {
            SkyboxMode::Equirectangular
        } else {
            SkyboxMode::ScreenCover
        }
    }
}

/// UV scale for cover fit: the visible fraction of the frame on each axis
pub fn cover_scale(frame_w: u32, frame_h: u32, view_w: u32, view_h: u32) -> [f32; 2] {
    if frame_w == 0 || frame_h == 0 || view_w == 0 || view_h == 0 {
        return [1.0, 1.0];
    }
    let frame_aspect = frame_w as f32 / frame_h as f32;
    let view_aspect = view_w as f32 / view_h as f32;
    if view_aspect > frame_aspect {
        [1.0, frame_aspect / view_aspect]
    } else {
        [view_aspect / frame_aspect, 1.0]
    }
}

pub struct SkyboxPipeline {
    pub pipeline: wgpu::RenderPipeline,
    pub uniform_bind_group_layout: wgpu::BindGroupLayout,
    pub texture_bind_group_layout: wgpu::BindGroupLayout,
}

impl SkyboxPipeline {
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Skybox Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("skybox_shader.wgsl").into()),
        });

        let uniform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[uniform_entry(
                    0,
                    wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                )],
                label: Some("Skybox Uniform Bind Group Layout"),
            });

        let texture_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &texture_entries(0),
                label: Some("Skybox Texture Bind Group Layout"),
            });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Skybox Pipeline Layout"),
            bind_group_layouts: &[&uniform_bind_group_layout, &texture_bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Skybox Render Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_skybox"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_skybox"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: wgpu::TextureFormat::Depth32Float,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Self {
            pipeline,
            uniform_bind_group_layout,
            texture_bind_group_layout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cover_crops_the_overflowing_axis() {
        // 16:9 frame on a square view: horizontal crop
        let [sx, sy] = cover_scale(1600, 900, 1000, 1000);
        assert!((sx - 0.5625).abs() < 1e-5);
        assert_eq!(sy, 1.0);

        // 16:9 frame on a 32:9 view: vertical crop
        let [sx, sy] = cover_scale(1600, 900, 3200, 900);
        assert_eq!(sx, 1.0);
        assert!((sy - 0.5).abs() < 1e-5);
    }

    #[test]
    fn degenerate_sizes_fall_back_to_identity() {
        assert_eq!(cover_scale(0, 0, 100, 100), [1.0, 1.0]);
        assert_eq!(cover_scale(100, 100, 0, 10), [1.0, 1.0]);
    }

    #[test]
    fn mode_round_trips_through_params() {
        assert_eq!(
            SkyboxUniforms::panorama(mat4_identity()).mode(),
            SkyboxMode::Equirectangular
        );
        assert_eq!(
            SkyboxUniforms::screen_cover(16, 9, 16, 9).mode(),
            SkyboxMode::ScreenCover
        );
    }
}
