//! glTF/GLB model importer
//!
//! Node transforms are baked into vertex data so the subject can be handled
//! as one rigid hierarchy with a single model matrix.

use crate::types::{ImportResult, ImportedMaterial, ImportedMesh, ImportedTexture};
use studio_core::{mat4_identity, mat4_inv_transpose, mat4_mul, Mat4, Result, StudioError};
use std::path::Path;

/// Import a glTF or GLB file from disk
pub fn import_gltf<P: AsRef<Path>>(path: P) -> Result<ImportResult> {
    let path = path.as_ref();
    let (document, buffers, images) = gltf::import(path)
        .map_err(|e| StudioError::ImportError(format!("Failed to import glTF: {}", e)))?;

    let name = path
        .file_stem()
        .and_then(|n| n.to_str())
        .unwrap_or("unnamed")
        .to_string();

    Ok(build_result(name, &document, &buffers, &images))
}

/// Import a self-contained GLB (or glTF with embedded buffers) from memory
pub fn import_gltf_slice(name: &str, bytes: &[u8]) -> Result<ImportResult> {
    let (document, buffers, images) = gltf::import_slice(bytes)
        .map_err(|e| StudioError::ImportError(format!("Failed to import glTF: {}", e)))?;
    Ok(build_result(name.to_string(), &document, &buffers, &images))
}

fn build_result(
    name: String,
    document: &gltf::Document,
    buffers: &[gltf::buffer::Data],
    images: &[gltf::image::Data],
) -> ImportResult {
    let mut meshes = Vec::new();

    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next());
    match scene {
        Some(scene) => {
            for node in scene.nodes() {
                visit_node(&node, &mat4_identity(), buffers, &mut meshes);
            }
        }
        None => {
            // No scene graph: take meshes as authored
            for mesh in document.meshes() {
                read_mesh(&mesh, &mat4_identity(), buffers, &mut meshes);
            }
        }
    }

    let textures = images
        .iter()
        .enumerate()
        .map(|(i, image)| ImportedTexture {
            name: format!("image_{}", i),
            width: image.width,
            height: image.height,
            data: to_rgba8(image).unwrap_or_else(|| {
                log::warn!("Unsupported glTF image format {:?}, using white", image.format);
                vec![255; (image.width * image.height * 4) as usize]
            }),
        })
        .collect();

    let materials = document
        .materials()
        .map(|material| {
            let pbr = material.pbr_metallic_roughness();
            ImportedMaterial {
                name: material
                    .name()
                    .map(String::from)
                    .unwrap_or_else(|| format!("material_{}", material.index().unwrap_or(0))),
                base_color: pbr.base_color_factor(),
                metallic: pbr.metallic_factor(),
                roughness: pbr.roughness_factor(),
                base_color_texture: pbr
                    .base_color_texture()
                    .map(|info| info.texture().source().index()),
            }
        })
        .collect();

    ImportResult {
        name,
        meshes,
        textures,
        materials,
    }
}

fn visit_node(
    node: &gltf::Node,
    parent: &Mat4,
    buffers: &[gltf::buffer::Data],
    out: &mut Vec<ImportedMesh>,
) {
    let world = mat4_mul(parent, &node.transform().matrix());
    if let Some(mesh) = node.mesh() {
        read_mesh(&mesh, &world, buffers, out);
    }
    for child in node.children() {
        visit_node(&child, &world, buffers, out);
    }
}

fn read_mesh(
    mesh: &gltf::Mesh,
    world: &Mat4,
    buffers: &[gltf::buffer::Data],
    out: &mut Vec<ImportedMesh>,
) {
    let mesh_name = mesh
        .name()
        .map(String::from)
        .unwrap_or_else(|| format!("mesh_{}", mesh.index()));
    let normal_matrix = mat4_inv_transpose(world);

    for primitive in mesh.primitives() {
        let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

        let positions: Vec<[f32; 3]> = reader
            .read_positions()
            .map(|iter| iter.map(|p| transform_point(world, p)).collect())
            .unwrap_or_default();

        let normals: Vec<[f32; 3]> = reader
            .read_normals()
            .map(|iter| iter.map(|n| transform_normal(&normal_matrix, n)).collect())
            .unwrap_or_default();

        let uvs: Vec<[f32; 2]> = reader
            .read_tex_coords(0)
            .map(|iter| iter.into_f32().collect())
            .unwrap_or_default();

        let indices: Vec<u32> = reader
            .read_indices()
            .map(|iter| iter.into_u32().collect())
            .unwrap_or_else(|| (0..positions.len() as u32).collect());

        out.push(ImportedMesh {
            name: mesh_name.clone(),
            positions,
            normals,
            uvs,
            indices,
            material_index: primitive.material().index(),
        });
    }
}

fn transform_point(m: &Mat4, p: [f32; 3]) -> [f32; 3] {
    [
        m[0][0] * p[0] + m[1][0] * p[1] + m[2][0] * p[2] + m[3][0],
        m[0][1] * p[0] + m[1][1] * p[1] + m[2][1] * p[2] + m[3][1],
        m[0][2] * p[0] + m[1][2] * p[1] + m[2][2] * p[2] + m[3][2],
    ]
}

fn transform_normal(m: &Mat4, n: [f32; 3]) -> [f32; 3] {
    let x = m[0][0] * n[0] + m[1][0] * n[1] + m[2][0] * n[2];
    let y = m[0][1] * n[0] + m[1][1] * n[1] + m[2][1] * n[2];
    let z = m[0][2] * n[0] + m[1][2] * n[1] + m[2][2] * n[2];
    let len = (x * x + y * y + z * z).sqrt();
    if len > 0.0 {
        [x / len, y / len, z / len]
    } else {
        [0.0, 1.0, 0.0]
    }
}

fn to_rgba8(image: &gltf::image::Data) -> Option<Vec<u8>> {
    use gltf::image::Format;
    let px = &image.pixels;
    match image.format {
        Format::R8G8B8A8 => Some(px.clone()),
        Format::R8G8B8 => Some(
            px.chunks_exact(3)
                .flat_map(|c| [c[0], c[1], c[2], 255])
                .collect(),
        ),
        Format::R8G8 => Some(px.chunks_exact(2).flat_map(|c| [c[0], c[0], c[0], c[1]]).collect()),
        Format::R8 => Some(px.iter().flat_map(|&v| [v, v, v, 255]).collect()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use studio_core::{mat4_scale, mat4_translation};

    #[test]
    fn point_transform_applies_translation() {
        let m = mat4_mul(&mat4_translation(0.0, 1.0, 0.0), &mat4_scale(2.0, 2.0, 2.0));
        assert_eq!(transform_point(&m, [1.0, 1.0, 1.0]), [2.0, 3.0, 2.0]);
    }

    #[test]
    fn normal_transform_renormalizes() {
        let m = mat4_inv_transpose(&mat4_scale(1.0, 4.0, 1.0));
        let n = transform_normal(&m, [0.0, 1.0, 0.0]);
        assert!((n[1] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn invalid_bytes_are_import_errors() {
        let err = import_gltf_slice("broken", b"not a model").unwrap_err();
        assert!(matches!(err, StudioError::ImportError(_)));
    }
}
