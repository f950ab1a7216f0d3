//! Stage geometry: ground planes, grid, proxy box, and imported meshes

use bytemuck::{Pod, Zeroable};
use std::collections::HashSet;
use studio_core::Vec3;
use studio_import::ImportedMesh;

/// A vertex with position, normal, color, and UV coordinates
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 4],
    pub uv: [f32; 2],
}

impl Vertex {
    const ATTRIBS: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x3,
        2 => Float32x4,
        3 => Float32x2,
    ];

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

/// A mesh with vertices and indices
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }
}

const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
const UP: [f32; 3] = [0.0, 1.0, 0.0];

/// Horizontal plane centered at the origin, facing +Y
pub fn create_plane_mesh(width: f32, depth: f32) -> Mesh {
    let hw = width / 2.0;
    let hd = depth / 2.0;
    let corner = |x: f32, z: f32, u: f32, v: f32| Vertex {
        position: [x, 0.0, z],
        normal: UP,
        color: WHITE,
        uv: [u, v],
    };

    Mesh {
        vertices: vec![
            corner(-hw, -hd, 0.0, 0.0),
            corner(-hw, hd, 0.0, 1.0),
            corner(hw, hd, 1.0, 1.0),
            corner(hw, -hd, 1.0, 0.0),
        ],
        indices: vec![0, 1, 2, 0, 2, 3],
    }
}

/// Line grid on the XZ plane. The two lines through the origin use
/// `center_color`, every other line `line_color`.
pub fn create_grid_mesh(
    size: f32,
    divisions: u32,
    center_color: [f32; 4],
    line_color: [f32; 4],
) -> Mesh {
    let half = size / 2.0;
    let step = size / divisions.max(1) as f32;
    let center = divisions / 2;

    let mut vertices = Vec::with_capacity(((divisions + 1) * 4) as usize);
    let mut indices = Vec::with_capacity(((divisions + 1) * 4) as usize);

    for i in 0..=divisions {
        let k = -half + i as f32 * step;
        let color = if divisions % 2 == 0 && i == center {
            center_color
        } else {
            line_color
        };
        for (a, b) in [([-half, 0.0, k], [half, 0.0, k]), ([k, 0.0, -half], [k, 0.0, half])] {
            let base = vertices.len() as u32;
            for position in [a, b] {
                vertices.push(Vertex {
                    position,
                    normal: UP,
                    color,
                    uv: [0.0, 0.0],
                });
            }
            indices.extend_from_slice(&[base, base + 1]);
        }
    }

    Mesh { vertices, indices }
}

/// The 12 edges of an axis-aligned box of `size` centered at the origin,
/// as a line list
pub fn create_wireframe_box_mesh(size: Vec3) -> Mesh {
    let (hx, hy, hz) = (size.x / 2.0, size.y / 2.0, size.z / 2.0);
    let corners = [
        [-hx, -hy, -hz],
        [hx, -hy, -hz],
        [hx, hy, -hz],
        [-hx, hy, -hz],
        [-hx, -hy, hz],
        [hx, -hy, hz],
        [hx, hy, hz],
        [-hx, hy, hz],
    ];

    let vertices = corners
        .iter()
        .map(|&position| Vertex {
            position,
            normal: UP,
            color: WHITE,
            uv: [0.0, 0.0],
        })
        .collect();

    let indices = vec![
        0, 1, 1, 2, 2, 3, 3, 0, // back face
        4, 5, 5, 6, 6, 7, 7, 4, // front face
        0, 4, 1, 5, 2, 6, 3, 7, // connecting edges
    ];

    Mesh { vertices, indices }
}

/// Convert triangle-list indices to unique edge line-list indices
pub fn triangles_to_wireframe_indices(indices: &[u32]) -> Vec<u32> {
    let mut seen: HashSet<(u32, u32)> = HashSet::new();
    let mut lines = Vec::new();

    for tri in indices.chunks_exact(3) {
        for (i, j) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
            let edge = (i.min(j), i.max(j));
            if seen.insert(edge) {
                lines.extend_from_slice(&[edge.0, edge.1]);
            }
        }
    }

    lines
}

/// Build a renderable mesh from imported data. Missing normals are
/// reconstructed by area-weighted face accumulation.
pub fn mesh_from_imported(imported: &ImportedMesh) -> Mesh {
    let normals = if imported.normals.len() == imported.positions.len() {
        imported.normals.clone()
    } else {
        compute_vertex_normals(&imported.positions, &imported.indices)
    };

    let vertices = imported
        .positions
        .iter()
        .enumerate()
        .map(|(i, &position)| Vertex {
            position,
            normal: normals[i],
            color: WHITE,
            uv: imported.uvs.get(i).copied().unwrap_or([0.0, 0.0]),
        })
        .collect();

    Mesh {
        vertices,
        indices: imported.indices.clone(),
    }
}

fn compute_vertex_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut acc = vec![Vec3::ZERO; positions.len()];
    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        if a >= positions.len() || b >= positions.len() || c >= positions.len() {
            continue;
        }
        let pa = Vec3::from_array(positions[a]);
        let face = (Vec3::from_array(positions[b]) - pa).cross(&(Vec3::from_array(positions[c]) - pa));
        for i in [a, b, c] {
            acc[i] = acc[i] + face;
        }
    }
    acc.iter()
        .map(|n| {
            let n = n.normalized();
            if n == Vec3::ZERO {
                UP
            } else {
                n.to_array()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plane_faces_up_with_ccw_winding() {
        let plane = create_plane_mesh(100.0, 100.0);
        assert_eq!(plane.vertex_count(), 4);
        let p = |i: usize| Vec3::from_array(plane.vertices[plane.indices[i] as usize].position);
        let n = (p(1) - p(0)).cross(&(p(2) - p(0)));
        assert!(n.y > 0.0);
    }

    #[test]
    fn grid_marks_center_lines() {
        let center = [1.0, 0.0, 0.0, 1.0];
        let line = [0.0, 0.0, 1.0, 1.0];
        let grid = create_grid_mesh(100.0, 50, center, line);
        // 51 lines per axis, two vertices each
        assert_eq!(grid.vertex_count(), 51 * 2 * 2);
        assert_eq!(grid.index_count(), 51 * 2 * 2);
        let centered = grid.vertices.iter().filter(|v| v.color == center).count();
        assert_eq!(centered, 4);
        assert!(grid
            .vertices
            .iter()
            .all(|v| v.position[0].abs() <= 50.0 && v.position[2].abs() <= 50.0));
    }

    #[test]
    fn wireframe_box_has_twelve_edges() {
        let b = create_wireframe_box_mesh(Vec3::new(2.0, 4.0, 1.0));
        assert_eq!(b.vertex_count(), 8);
        assert_eq!(b.index_count(), 24);
        assert!(b.vertices.iter().all(|v| v.position[1].abs() == 2.0));
    }

    #[test]
    fn wireframe_indices_share_edges() {
        // Two triangles sharing the 0-2 diagonal: 5 unique edges
        let lines = triangles_to_wireframe_indices(&[0, 1, 2, 0, 2, 3]);
        assert_eq!(lines.len(), 10);
    }

    #[test]
    fn imported_mesh_gets_normals() {
        let imported = ImportedMesh {
            name: "tri".into(),
            positions: vec![[0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0]],
            normals: vec![],
            uvs: vec![],
            indices: vec![0, 1, 2],
            material_index: None,
        };
        let mesh = mesh_from_imported(&imported);
        for v in &mesh.vertices {
            assert!((v.normal[1] - 1.0).abs() < 1e-6);
        }
        assert_eq!(mesh.index_count(), 3);
    }
}
