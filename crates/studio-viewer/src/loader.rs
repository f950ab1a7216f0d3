//! Asynchronous asset loading
//!
//! Each request runs on its own worker thread and reports back through a
//! channel drained by the render loop once per frame. Every request gets a
//! ticket so callers can ignore results that a newer request superseded.

use std::path::Path;
use std::sync::mpsc::{self, Receiver, Sender};
use studio_core::{Result, StudioError};
use studio_import::{
    decode_panorama, fetch, import_gltf, import_gltf_slice, is_remote, source_extension,
    ImportResult, PanoramaImage,
};

/// What a source should be decoded as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    /// The model being dressed
    Subject,
    /// Equirectangular backdrop (raster, HDR or EXR)
    Panorama,
    /// Secondary model placed around the subject
    EnvironmentModel,
}

#[derive(Debug)]
pub enum LoadedAsset {
    Model(ImportResult),
    Panorama(PanoramaImage),
}

#[derive(Debug)]
pub enum LoadEvent {
    Progress { ticket: u64, percent: u8 },
    Finished { ticket: u64, result: Result<LoadedAsset> },
}

impl LoadEvent {
    pub fn ticket(&self) -> u64 {
        match self {
            LoadEvent::Progress { ticket, .. } | LoadEvent::Finished { ticket, .. } => *ticket,
        }
    }
}

/// Load `source` synchronously, reporting byte progress when the size is known
pub fn load_asset(kind: AssetKind, source: &str, progress: impl FnMut(u8)) -> Result<LoadedAsset> {
    match kind {
        AssetKind::Subject | AssetKind::EnvironmentModel => {
            load_model(source, progress).map(LoadedAsset::Model)
        }
        AssetKind::Panorama => {
            let bytes = fetch(source, progress)?;
            let ext = source_extension(source);
            decode_panorama(&bytes, ext.as_deref()).map(LoadedAsset::Panorama)
        }
    }
}

fn load_model(source: &str, mut progress: impl FnMut(u8)) -> Result<ImportResult> {
    let ext = source_extension(source);
    // Text glTF on disk may reference sibling buffers, so let the importer resolve them
    if !is_remote(source) && ext.as_deref() == Some("gltf") {
        let model = import_gltf(Path::new(source))?;
        progress(100);
        return Ok(model);
    }
    let bytes = fetch(source, progress)?;
    let name = source
        .rsplit(['/', '\\'])
        .next()
        .and_then(|file| file.split(['?', '#']).next())
        .and_then(|file| file.rsplit_once('.').map(|(stem, _)| stem))
        .filter(|stem| !stem.is_empty())
        .unwrap_or("model");
    import_gltf_slice(name, &bytes)
}

/// Background loader with ticketed requests
pub struct AssetLoader {
    tx: Sender<LoadEvent>,
    rx: Receiver<LoadEvent>,
    next_ticket: u64,
}

impl AssetLoader {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            tx,
            rx,
            next_ticket: 1,
        }
    }

    /// Start loading on a worker thread and return the request's ticket
    pub fn request(&mut self, kind: AssetKind, source: &str) -> u64 {
        let ticket = self.next_ticket;
        self.next_ticket += 1;

        let tx = self.tx.clone();
        let source_owned = source.to_string();
        let spawned = std::thread::Builder::new()
            .name("studio-loader".into())
            .spawn(move || {
                let progress_tx = tx.clone();
                let result = load_asset(kind, &source_owned, |percent| {
                    let _ = progress_tx.send(LoadEvent::Progress { ticket, percent });
                });
                let _ = tx.send(LoadEvent::Finished { ticket, result });
            });

        if let Err(e) = spawned {
            let _ = self.tx.send(LoadEvent::Finished {
                ticket,
                result: Err(StudioError::IoError(e)),
            });
        }
        log::debug!("Load #{} started: {:?} {}", ticket, kind, source);
        ticket
    }

    /// Everything reported since the last poll, in arrival order
    pub fn poll(&self) -> Vec<LoadEvent> {
        self.rx.try_iter().collect()
    }
}

impl Default for AssetLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn wait_finished(loader: &AssetLoader, ticket: u64) -> (Vec<u8>, Result<LoadedAsset>) {
        let deadline = Instant::now() + Duration::from_secs(10);
        let mut progress = Vec::new();
        while Instant::now() < deadline {
            for event in loader.poll() {
                match event {
                    LoadEvent::Progress { ticket: t, percent } if t == ticket => progress.push(percent),
                    LoadEvent::Finished { ticket: t, result } if t == ticket => {
                        return (progress, result)
                    }
                    _ => {}
                }
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        panic!("load #{} never finished", ticket);
    }

    fn temp_png(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("studio-loader-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        image::RgbaImage::from_pixel(8, 4, image::Rgba([200, 10, 10, 255]))
            .save(&path)
            .unwrap();
        path
    }

    #[test]
    fn tickets_increase() {
        let mut loader = AssetLoader::new();
        let a = loader.request(AssetKind::Panorama, "/nonexistent/a.png");
        let b = loader.request(AssetKind::Panorama, "/nonexistent/b.png");
        assert!(b > a);
    }

    #[test]
    fn panorama_loads_with_progress() {
        let path = temp_png("pano.png");
        let mut loader = AssetLoader::new();
        let ticket = loader.request(AssetKind::Panorama, path.to_str().unwrap());
        let (progress, result) = wait_finished(&loader, ticket);
        match result.unwrap() {
            LoadedAsset::Panorama(p) => assert_eq!((p.width, p.height), (8, 4)),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(progress.last(), Some(&100));
    }

    #[test]
    fn missing_source_reports_an_error() {
        let mut loader = AssetLoader::new();
        let ticket = loader.request(AssetKind::Subject, "/nonexistent/subject.glb");
        let (_, result) = wait_finished(&loader, ticket);
        assert!(result.is_err());
    }

    #[test]
    fn garbage_model_bytes_fail_to_import() {
        let dir = std::env::temp_dir().join(format!("studio-loader-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("broken.glb");
        std::fs::write(&path, b"not a model").unwrap();
        let result = load_asset(AssetKind::EnvironmentModel, path.to_str().unwrap(), |_| {});
        assert!(matches!(result, Err(StudioError::ImportError(_))));
    }
}
