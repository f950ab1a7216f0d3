//! Studio Render - wgpu stage renderer for the model viewer
//!
//! Draws the loaded subject on a reflective ground plane in front of a
//! color, panorama or video backdrop, with distance-based level of detail
//! and a blur/flash view filter. Also provides frame readback for captures.

mod camera;
mod context;
mod gpu_mesh;
mod headless;
mod pipeline;
pub mod postprocess;
mod primitives;
mod readback;
pub mod skybox_pipeline;
mod stage_renderer;
mod texture;

pub use camera::Camera;
pub use context::{aspect_ratio, RenderContext, RenderError};
pub use gpu_mesh::GpuMesh;
pub use headless::HeadlessContext;
pub use pipeline::{srgb_to_linear, LightUniforms, MaterialUniforms, StagePipeline, TransformUniforms};
pub use postprocess::{ViewFilter, ViewFilterSettings, MAX_BLUR_PX, SCENE_FORMAT};
pub use primitives::{
    create_grid_mesh, create_plane_mesh, create_wireframe_box_mesh, mesh_from_imported,
    triangles_to_wireframe_indices, Mesh, Vertex,
};
pub use readback::read_texture_rgba;
pub use skybox_pipeline::{SkyboxPipeline, SkyboxUniforms};
pub use stage_renderer::{
    floor_tint_for, mirror_matrix, StageFrame, StageRenderer, DEFAULT_BACKGROUND, GOLD,
    GRID_OFFSET, REFLECTOR_OFFSET,
};
pub use texture::{GpuTexture, TextureWrap};

#[cfg(test)]
mod tests {
    #[test]
    fn shader_wgsl_parses() {
        let source = include_str!("shader.wgsl");
        naga::front::wgsl::parse_str(source).expect("shader.wgsl failed to parse");
    }

    #[test]
    fn skybox_shader_wgsl_parses() {
        let source = include_str!("skybox_shader.wgsl");
        naga::front::wgsl::parse_str(source).expect("skybox_shader.wgsl failed to parse");
    }

    #[test]
    fn composite_shader_wgsl_parses() {
        let source = include_str!("composite_shader.wgsl");
        naga::front::wgsl::parse_str(source).expect("composite_shader.wgsl failed to parse");
    }
}
