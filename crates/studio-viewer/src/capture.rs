//! Frame capture encoding

use base64::Engine;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use std::path::Path;
use studio_core::{Result, StudioError};

const DATA_URI_PREFIX: &str = "data:image/png;base64,";

/// Encode tightly packed RGBA8 pixels as PNG bytes
pub fn encode_png(width: u32, height: u32, rgba: &[u8]) -> Result<Vec<u8>> {
    let expected = width as usize * height as usize * 4;
    if width == 0 || height == 0 || rgba.len() != expected {
        return Err(StudioError::CaptureError(format!(
            "expected {}x{} RGBA ({} bytes), got {} bytes",
            width,
            height,
            expected,
            rgba.len()
        )));
    }
    let mut png = Vec::new();
    PngEncoder::new(&mut png)
        .write_image(rgba, width, height, ExtendedColorType::Rgba8)
        .map_err(|e| StudioError::CaptureError(format!("PNG encoding failed: {}", e)))?;
    Ok(png)
}

/// `data:image/png;base64,...` for the given frame
pub fn encode_png_data_uri(width: u32, height: u32, rgba: &[u8]) -> Result<String> {
    let png = encode_png(width, height, rgba)?;
    let mut uri = String::with_capacity(DATA_URI_PREFIX.len() + png.len() * 4 / 3 + 4);
    uri.push_str(DATA_URI_PREFIX);
    base64::engine::general_purpose::STANDARD.encode_string(&png, &mut uri);
    Ok(uri)
}

/// PNG bytes carried by a data URI produced by `encode_png_data_uri`
pub fn decode_png_data_uri(uri: &str) -> Result<Vec<u8>> {
    let payload = uri
        .strip_prefix(DATA_URI_PREFIX)
        .ok_or_else(|| StudioError::CaptureError("not a PNG data URI".to_string()))?;
    base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| StudioError::CaptureError(format!("invalid base64 payload: {}", e)))
}

/// Write the frame to `path` as PNG, creating parent directories
pub fn write_png(path: &Path, width: u32, height: u32, rgba: &[u8]) -> Result<()> {
    let png = encode_png(width, height, rgba)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, png)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker(w: u32, h: u32) -> Vec<u8> {
        (0..w * h)
            .flat_map(|i| if i % 2 == 0 { [255, 0, 0, 255] } else { [0, 0, 255, 255] })
            .collect()
    }

    #[test]
    fn data_uri_carries_a_decodable_png() {
        let uri = encode_png_data_uri(4, 3, &checker(4, 3)).unwrap();
        assert!(uri.starts_with("data:image/png;base64,"));

        let png = decode_png_data_uri(&uri).unwrap();
        let img = image::load_from_memory(&png).unwrap().to_rgba8();
        assert_eq!(img.dimensions(), (4, 3));
        assert_eq!(img.get_pixel(1, 0).0, [0, 0, 255, 255]);
    }

    #[test]
    fn wrong_buffer_size_is_rejected() {
        let err = encode_png_data_uri(4, 4, &[0; 10]).unwrap_err();
        assert!(matches!(err, StudioError::CaptureError(_)));
        assert!(encode_png(0, 4, &[]).is_err());
    }

    #[test]
    fn foreign_uri_is_rejected() {
        assert!(decode_png_data_uri("data:image/jpeg;base64,AAAA").is_err());
    }

    #[test]
    fn write_png_creates_directories() {
        let dir = std::env::temp_dir().join(format!("studio-capture-{}", std::process::id()));
        let path = dir.join("nested").join("frame.png");
        write_png(&path, 2, 2, &checker(2, 2)).unwrap();
        assert!(path.exists());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
