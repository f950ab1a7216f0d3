//! Import result types

use studio_core::Vec3;

/// Result of importing a model
#[derive(Debug, Default)]
pub struct ImportResult {
    /// Display name derived from the source
    pub name: String,
    /// Extracted meshes, positions already in model space
    pub meshes: Vec<ImportedMesh>,
    /// Extracted textures, converted to RGBA8
    pub textures: Vec<ImportedTexture>,
    /// Extracted materials
    pub materials: Vec<ImportedMaterial>,
}

impl ImportResult {
    /// Compute the combined bounding box across all meshes
    pub fn bounds(&self) -> Option<MeshBounds> {
        self.meshes
            .iter()
            .filter_map(|m| m.bounds())
            .reduce(|a, b| a.union(&b))
    }

    pub fn vertex_count(&self) -> usize {
        self.meshes.iter().map(|m| m.positions.len()).sum()
    }

    /// Shift every vertex by `offset`
    pub fn translate(&mut self, offset: Vec3) {
        for mesh in &mut self.meshes {
            for p in &mut mesh.positions {
                p[0] += offset.x;
                p[1] += offset.y;
                p[2] += offset.z;
            }
        }
    }
}

/// Axis-aligned bounding box computed from vertex positions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshBounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl MeshBounds {
    /// Compute bounds from a set of vertex positions
    pub fn from_positions(positions: &[[f32; 3]]) -> Option<Self> {
        let first = Vec3::from_array(*positions.first()?);
        let (min, max) = positions
            .iter()
            .skip(1)
            .map(|p| Vec3::from_array(*p))
            .fold((first, first), |(lo, hi), p| (lo.min(&p), hi.max(&p)));
        Some(Self { min, max })
    }

    /// Size along each axis
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Merge with another bounds to get the union
    pub fn union(&self, other: &MeshBounds) -> MeshBounds {
        MeshBounds {
            min: self.min.min(&other.min),
            max: self.max.max(&other.max),
        }
    }
}

impl std::fmt::Display for MeshBounds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = self.size();
        write!(
            f,
            "{:.2} x {:.2} x {:.2} (min [{:.2}, {:.2}, {:.2}], max [{:.2}, {:.2}, {:.2}])",
            s.x, s.y, s.z, self.min.x, self.min.y, self.min.z, self.max.x, self.max.y, self.max.z,
        )
    }
}

/// An imported mesh with vertex data
#[derive(Debug, Clone)]
pub struct ImportedMesh {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
    pub material_index: Option<usize>,
}

impl ImportedMesh {
    /// Compute the axis-aligned bounding box of this mesh's vertices
    pub fn bounds(&self) -> Option<MeshBounds> {
        MeshBounds::from_positions(&self.positions)
    }
}

/// An imported texture, always RGBA8
#[derive(Debug, Clone)]
pub struct ImportedTexture {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// An imported PBR material
#[derive(Debug, Clone)]
pub struct ImportedMaterial {
    pub name: String,
    pub base_color: [f32; 4],
    pub metallic: f32,
    pub roughness: f32,
    /// Index into `ImportResult::textures`
    pub base_color_texture: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mesh(positions: Vec<[f32; 3]>) -> ImportedMesh {
        ImportedMesh {
            name: "m".into(),
            positions,
            normals: vec![],
            uvs: vec![],
            indices: vec![],
            material_index: None,
        }
    }

    #[test]
    fn bounds_union_across_meshes() {
        let result = ImportResult {
            name: "subject".into(),
            meshes: vec![
                mesh(vec![[-1.0, 0.0, 0.0], [1.0, 2.0, 0.5]]),
                mesh(vec![[0.0, -3.0, -2.0]]),
                mesh(vec![]),
            ],
            ..Default::default()
        };
        let b = result.bounds().unwrap();
        assert_eq!(b.min, Vec3::new(-1.0, -3.0, -2.0));
        assert_eq!(b.max, Vec3::new(1.0, 2.0, 0.5));
        assert_eq!(b.center(), Vec3::new(0.0, -0.5, -0.75));
        assert_eq!(result.vertex_count(), 3);
    }

    #[test]
    fn empty_positions_have_no_bounds() {
        assert!(MeshBounds::from_positions(&[]).is_none());
        assert!(ImportResult::default().bounds().is_none());
    }

    #[test]
    fn translate_recenters() {
        let mut result = ImportResult {
            meshes: vec![mesh(vec![[1.0, 1.0, 1.0], [3.0, 5.0, 1.0]])],
            ..Default::default()
        };
        let center = result.bounds().unwrap().center();
        result.translate(center * -1.0);
        let b = result.bounds().unwrap();
        assert_eq!(b.center(), Vec3::ZERO);
        assert_eq!(b.min.y, -2.0);
    }
}
