//! GPU-resident meshes

use crate::primitives::Mesh;
use wgpu::util::DeviceExt;

/// Vertex and index buffers for one mesh. When built with `with_wireframe`,
/// a second index buffer holds the unique triangle edges as a line list.
pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
    pub wire_index_buffer: Option<wgpu::Buffer>,
    pub wire_index_count: u32,
}

impl GpuMesh {
    pub fn upload(device: &wgpu::Device, mesh: &Mesh, label: &str) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Vertex Buffer", label)),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Index Buffer", label)),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices.len() as u32,
            wire_index_buffer: None,
            wire_index_count: 0,
        }
    }

    /// Attach a line-list index buffer sharing this mesh's vertices
    pub fn with_wireframe(mut self, device: &wgpu::Device, line_indices: &[u32], label: &str) -> Self {
        if !line_indices.is_empty() {
            self.wire_index_buffer = Some(device.create_buffer_init(
                &wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("{} Wire Index Buffer", label)),
                    contents: bytemuck::cast_slice(line_indices),
                    usage: wgpu::BufferUsages::INDEX,
                },
            ));
            self.wire_index_count = line_indices.len() as u32;
        }
        self
    }

    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        if self.index_count == 0 {
            return;
        }
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.index_count, 0, 0..1);
    }

    pub fn draw_wireframe(&self, pass: &mut wgpu::RenderPass<'_>) {
        if let Some(buffer) = &self.wire_index_buffer {
            pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            pass.set_index_buffer(buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..self.wire_index_count, 0, 0..1);
        }
    }
}
