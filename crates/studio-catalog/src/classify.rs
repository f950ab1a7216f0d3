//! Classification of user-imported files into backdrop kinds

use crate::types::{Backdrop, BackdropKind, BackdropKindTag};
use std::time::{SystemTime, UNIX_EPOCH};

/// Thumbnail shown for imports that have no cheap still preview
pub const PLACEHOLDER_THUMBNAIL: &str =
    "https://images.unsplash.com/photo-1618005182384-a83a8bd57fbe?w=150";

/// Container extensions treated as video when no MIME type is known
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "mov", "mkv", "m4v"];

/// Decide the backdrop kind for an imported file.
///
/// Model and HDR extensions win over the MIME type; anything unrecognised is
/// treated as a static image.
pub fn classify_import(file_name: &str, mime: Option<&str>) -> BackdropKindTag {
    let ext = file_extension(file_name);
    match ext.as_deref() {
        Some("glb" | "gltf") => BackdropKindTag::Environment3D,
        Some("hdr" | "exr") => BackdropKindTag::Hdr,
        _ => {
            let is_video = match mime {
                Some(mime) => mime.trim().to_ascii_lowercase().starts_with("video/"),
                None => ext
                    .as_deref()
                    .is_some_and(|e| VIDEO_EXTENSIONS.contains(&e)),
            };
            if is_video {
                BackdropKindTag::Video
            } else {
                BackdropKindTag::Image
            }
        }
    }
}

/// Build the backdrop entry for an imported file at `location`
pub fn custom_backdrop(id: String, file_name: &str, location: &str, mime: Option<&str>) -> Backdrop {
    let location = location.to_string();
    let (kind, thumbnail) = match classify_import(file_name, mime) {
        BackdropKindTag::Image => (
            BackdropKind::StaticImage(location.clone()),
            location,
        ),
        BackdropKindTag::Hdr => (
            BackdropKind::HdrEnvironment(location),
            PLACEHOLDER_THUMBNAIL.to_string(),
        ),
        BackdropKindTag::Video => (
            BackdropKind::LoopingVideo(location),
            PLACEHOLDER_THUMBNAIL.to_string(),
        ),
        BackdropKindTag::Environment3D => (
            BackdropKind::Environment3D(location),
            PLACEHOLDER_THUMBNAIL.to_string(),
        ),
        // Imports never produce flat colors
        BackdropKindTag::Color => (
            BackdropKind::StaticImage(location.clone()),
            location,
        ),
    };
    Backdrop {
        id,
        name: file_name.to_string(),
        kind,
        thumbnail,
    }
}

/// Issues `c-{unix millis}` ids, suffixing a sequence number when two imports
/// land in the same millisecond
#[derive(Debug, Default)]
pub struct CustomIdGenerator {
    last_millis: Option<u128>,
    seq: u32,
}

impl CustomIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id stamped with the current wall-clock time
    pub fn next_id(&mut self) -> String {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        self.next_id_at(now)
    }

    pub fn next_id_at(&mut self, now_millis: u128) -> String {
        if self.last_millis == Some(now_millis) {
            self.seq += 1;
            format!("c-{}-{}", now_millis, self.seq)
        } else {
            self.last_millis = Some(now_millis);
            self.seq = 0;
            format!("c-{}", now_millis)
        }
    }
}

fn file_extension(file_name: &str) -> Option<String> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn models_and_hdr_by_extension() {
        assert_eq!(classify_import("loft.glb", None), BackdropKindTag::Environment3D);
        assert_eq!(classify_import("LOFT.GLTF", Some("model/gltf+json")), BackdropKindTag::Environment3D);
        assert_eq!(classify_import("sky.hdr", None), BackdropKindTag::Hdr);
        assert_eq!(classify_import("sky.exr", Some("image/x-exr")), BackdropKindTag::Hdr);
    }

    #[test]
    fn video_by_mime_or_extension() {
        assert_eq!(classify_import("clip.bin", Some("video/mp4")), BackdropKindTag::Video);
        assert_eq!(classify_import("clip.webm", None), BackdropKindTag::Video);
        // An explicit non-video MIME overrides the extension guess
        assert_eq!(classify_import("clip.mp4", Some("image/png")), BackdropKindTag::Image);
    }

    #[test]
    fn everything_else_is_an_image() {
        assert_eq!(classify_import("photo.jpg", Some("image/jpeg")), BackdropKindTag::Image);
        assert_eq!(classify_import("notes.txt", Some("text/plain")), BackdropKindTag::Image);
        assert_eq!(classify_import("no_extension", None), BackdropKindTag::Image);
    }

    #[test]
    fn thumbnails_follow_kind() {
        let img = custom_backdrop("c-1".into(), "set.png", "/tmp/set.png", None);
        assert_eq!(img.thumbnail, "/tmp/set.png");
        assert_eq!(img.name, "set.png");
        assert_eq!(img.kind, BackdropKind::StaticImage("/tmp/set.png".into()));

        let vid = custom_backdrop("c-2".into(), "loop.mp4", "/tmp/loop.mp4", Some("video/mp4"));
        assert_eq!(vid.thumbnail, PLACEHOLDER_THUMBNAIL);
        assert_eq!(vid.kind, BackdropKind::LoopingVideo("/tmp/loop.mp4".into()));

        let env = custom_backdrop("c-3".into(), "loft.glb", "/tmp/loft.glb", None);
        assert_eq!(env.thumbnail, PLACEHOLDER_THUMBNAIL);
    }

    #[test]
    fn ids_are_unique_within_a_millisecond() {
        let mut ids = CustomIdGenerator::new();
        assert_eq!(ids.next_id_at(1700), "c-1700");
        assert_eq!(ids.next_id_at(1700), "c-1700-1");
        assert_eq!(ids.next_id_at(1700), "c-1700-2");
        assert_eq!(ids.next_id_at(1701), "c-1701");
        assert!(ids.next_id().starts_with("c-"));
    }
}
