//! Panorama decoding for backdrop images
//!
//! Every backdrop texture is uploaded as sRGB RGBA8. High dynamic range inputs
//! (Radiance HDR, OpenEXR) are tone-mapped with the ACES filmic curve first.

use image::{DynamicImage, GenericImageView, ImageFormat};
use studio_core::{Color, Result, StudioError};

/// Largest panorama width kept on upload; wider sources are downsampled
const MAX_PANORAMA_WIDTH: u32 = 4096;

/// A decoded panorama ready for upload
#[derive(Debug, Clone)]
pub struct PanoramaImage {
    pub width: u32,
    pub height: u32,
    /// sRGB-encoded RGBA8 pixels, row-major
    pub rgba: Vec<u8>,
    /// Mean color over the image, used as the environment's ambient tint
    pub average: Color,
    /// Whether the source carried HDR data
    pub was_hdr: bool,
}

/// Decode image bytes. `extension` (without dot) picks the decoder when the
/// magic bytes are ambiguous.
pub fn decode_panorama(bytes: &[u8], extension: Option<&str>) -> Result<PanoramaImage> {
    let format = extension.and_then(ImageFormat::from_extension);
    let decoded = match format {
        Some(format) => image::load_from_memory_with_format(bytes, format),
        None => image::load_from_memory(bytes),
    }
    .map_err(|e| StudioError::DecodeError(format!("Failed to decode image: {}", e)))?;

    let decoded = if decoded.width() > MAX_PANORAMA_WIDTH {
        let height = (decoded.height() as u64 * MAX_PANORAMA_WIDTH as u64
            / decoded.width() as u64)
            .max(1) as u32;
        decoded.resize_exact(
            MAX_PANORAMA_WIDTH,
            height,
            image::imageops::FilterType::Triangle,
        )
    } else {
        decoded
    };

    let (width, height) = decoded.dimensions();
    let was_hdr = matches!(
        decoded,
        DynamicImage::ImageRgb32F(_) | DynamicImage::ImageRgba32F(_)
    );

    let rgba = if was_hdr {
        decoded
            .to_rgba32f()
            .pixels()
            .flat_map(|p| {
                let [r, g, b, a] = p.0;
                [
                    encode_srgb(tonemap_aces(r)),
                    encode_srgb(tonemap_aces(g)),
                    encode_srgb(tonemap_aces(b)),
                    (a.clamp(0.0, 1.0) * 255.0).round() as u8,
                ]
            })
            .collect()
    } else {
        decoded.to_rgba8().into_raw()
    };

    let average = average_color(&rgba);
    log::debug!(
        "Decoded panorama {}x{} (hdr: {}, average {})",
        width,
        height,
        was_hdr,
        average
    );

    Ok(PanoramaImage {
        width,
        height,
        rgba,
        average,
        was_hdr,
    })
}

/// ACES filmic approximation (Narkowicz), linear in, linear 0..1 out
pub fn tonemap_aces(x: f32) -> f32 {
    let x = x.max(0.0);
    ((x * (2.51 * x + 0.03)) / (x * (2.43 * x + 0.59) + 0.14)).clamp(0.0, 1.0)
}

fn encode_srgb(linear: f32) -> u8 {
    let c = if linear <= 0.003_130_8 {
        linear * 12.92
    } else {
        1.055 * linear.powf(1.0 / 2.4) - 0.055
    };
    (c.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn average_color(rgba: &[u8]) -> Color {
    let count = (rgba.len() / 4).max(1) as f64;
    let mut sum = [0u64; 3];
    for px in rgba.chunks_exact(4) {
        sum[0] += px[0] as u64;
        sum[1] += px[1] as u64;
        sum[2] += px[2] as u64;
    }
    let c = |s: u64| (s as f64 / count / 255.0) as f32;
    Color::new(c(sum[0]), c(sum[1]), c(sum[2]), 1.0)
}
