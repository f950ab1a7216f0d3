//! Studio Core - Foundational types for SHARJAYS Studio
//!
//! This crate provides the core types that all other studio crates depend on:
//! - `Transform`, `Vec3` - Spatial types
//! - `Color` - RGBA color with hex parsing and easing helpers
//! - `LodLevel` - Level-of-detail tiers for the loaded subject
//! - Column-major 4x4 matrix helpers
//! - Error types and Result alias

mod error;
mod matrix;
mod types;

pub use error::{Result, StudioError};
pub use matrix::{
    mat4_identity, mat4_inv_transpose, mat4_inverse, mat4_mul, mat4_scale, mat4_translation,
    Mat4,
};
pub use types::{Color, LodLevel, Transform, Vec3};
