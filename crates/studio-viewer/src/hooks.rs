//! Outputs handed to the embedding application

use crate::capture::decode_png_data_uri;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

/// Receives what the viewer produces for the rest of the studio: captured
/// frames for the generation client and style descriptors for the prompt
/// builder
pub trait StudioHooks {
    /// A captured frame as `data:image/png;base64,...`
    fn on_snapshot(&mut self, data_uri: &str);
    /// Current style descriptor; empty when no outfit is worn
    fn on_style_update(&mut self, descriptor: &str);
}

/// Standalone hooks: log descriptors and save snapshots as PNG files
#[derive(Debug, Clone)]
pub struct LoggingHooks {
    capture_dir: Option<PathBuf>,
}

impl LoggingHooks {
    pub fn new(capture_dir: Option<PathBuf>) -> Self {
        Self { capture_dir }
    }

    fn snapshot_path(&self) -> Option<PathBuf> {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        self.capture_dir
            .as_ref()
            .map(|dir| dir.join(format!("snapshot-{}.png", millis)))
    }
}

impl StudioHooks for LoggingHooks {
    fn on_snapshot(&mut self, data_uri: &str) {
        log::info!("Snapshot captured ({} bytes encoded)", data_uri.len());
        let Some(path) = self.snapshot_path() else {
            return;
        };
        let written = decode_png_data_uri(data_uri).and_then(|png| {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, png)?;
            Ok(())
        });
        match written {
            Ok(()) => log::info!("Snapshot saved to {}", path.display()),
            Err(e) => log::error!("Failed to save snapshot: {}", e),
        }
    }

    fn on_style_update(&mut self, descriptor: &str) {
        if descriptor.is_empty() {
            log::info!("Style cleared");
        } else {
            log::info!("Style: {}", descriptor);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::encode_png_data_uri;

    #[test]
    fn snapshot_is_written_to_the_capture_dir() {
        let dir = std::env::temp_dir().join(format!("studio-hooks-{}", std::process::id()));
        let mut hooks = LoggingHooks::new(Some(dir.clone()));
        let uri = encode_png_data_uri(1, 1, &[1, 2, 3, 255]).unwrap();
        hooks.on_snapshot(&uri);
        let count = std::fs::read_dir(&dir).unwrap().count();
        assert_eq!(count, 1);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn without_a_dir_nothing_is_written() {
        let mut hooks = LoggingHooks::new(None);
        hooks.on_snapshot("data:image/png;base64,");
        hooks.on_style_update("");
    }
}
