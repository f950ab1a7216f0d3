//! Studio Import - Asset importers
//!
//! This crate turns raw asset bytes into CPU-side data the renderer can upload:
//! - glTF/GLB models, flattened into world-space meshes with PBR materials
//! - Raster panoramas, HDR and EXR images, tone-mapped to RGBA8
//! - Source fetching from local paths or HTTP URLs with progress reporting

mod gltf_import;
mod image_import;
mod source;
mod types;

pub use gltf_import::{import_gltf, import_gltf_slice};
pub use image_import::{decode_panorama, tonemap_aces, PanoramaImage};
pub use source::{fetch, is_remote, source_extension};
pub use types::{ImportResult, ImportedMaterial, ImportedMesh, ImportedTexture, MeshBounds};
