//! Viewer configuration
//!
//! Settings come from the first `studio.toml` found, highest precedence first:
//! 1. An explicit `--config` path
//! 2. Project-local: `./studio.toml`
//! 3. Global: `~/.sharjays/studio.toml`
//!
//! Missing files mean defaults. `SHARJAYS_FFMPEG` overrides the video decoder
//! binary after loading.

use crate::lod::LodThresholds;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use studio_core::{Result, StudioError};
use studio_render::MAX_BLUR_PX;

const CONFIG_FILE: &str = "studio.toml";
const FFMPEG_ENV: &str = "SHARJAYS_FFMPEG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "SHARJAYS Studio".to_string(),
            width: 1600,
            height: 900,
        }
    }
}

/// Starting slider levels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub reflection: f32,
    pub grid: f32,
    /// Focus blur in pixels
    pub blur: f32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            reflection: 0.5,
            grid: 0.3,
            blur: 4.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// ffmpeg executable used to decode looping video backdrops
    pub ffmpeg: String,
    pub width: u32,
    pub height: u32,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            ffmpeg: "ffmpeg".to_string(),
            width: 1280,
            height: 720,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Where captures are written
    pub output_dir: PathBuf,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("captures"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub window: WindowConfig,
    pub scene: SceneConfig,
    pub lod: LodThresholds,
    pub video: VideoConfig,
    pub capture: CaptureConfig,
}

impl ViewerConfig {
    /// Load from `path`, or from the first config file found on the search path
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load_file(path)?,
            None => match Self::search_paths().into_iter().find(|p| p.exists()) {
                Some(found) => Self::load_file(&found)?,
                None => Self::default(),
            },
        };
        if let Ok(ffmpeg) = std::env::var(FFMPEG_ENV) {
            if !ffmpeg.trim().is_empty() {
                config.video.ffmpeg = ffmpeg;
            }
        }
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: ViewerConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    fn load_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ViewerConfig = toml::from_str(&content).map_err(|e| {
            StudioError::ConfigError(format!("Failed to parse config {}: {}", path.display(), e))
        })?;
        log::info!("Loaded viewer config from {}", path.display());
        Ok(config)
    }

    fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(CONFIG_FILE)];
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".sharjays").join(CONFIG_FILE));
        }
        paths
    }

    pub fn validate(&self) -> Result<()> {
        check_range("scene.reflection", self.scene.reflection, 0.0, 1.0)?;
        check_range("scene.grid", self.scene.grid, 0.0, 1.0)?;
        check_range("scene.blur", self.scene.blur, 0.0, MAX_BLUR_PX)?;
        self.lod.validate()?;
        if self.window.width == 0 || self.window.height == 0 {
            return Err(StudioError::ConfigError(
                "window size must be non-zero".to_string(),
            ));
        }
        if self.video.width == 0 || self.video.height == 0 {
            return Err(StudioError::ConfigError(
                "video decode size must be non-zero".to_string(),
            ));
        }
        if self.video.ffmpeg.trim().is_empty() {
            return Err(StudioError::ConfigError(
                "video.ffmpeg must name an executable".to_string(),
            ));
        }
        Ok(())
    }
}

fn check_range(field: &str, value: f32, min: f32, max: f32) -> Result<()> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(StudioError::ValueOutOfRange {
            field: field.to_string(),
            min: min as f64,
            max: max as f64,
            value: value as f64,
        })
    }
}
