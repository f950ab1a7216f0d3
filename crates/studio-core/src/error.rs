//! Error types for SHARJAYS Studio

use thiserror::Error;

/// The main error type for studio operations
#[derive(Debug, Error)]
pub enum StudioError {
    #[error("Import error: {0}")]
    ImportError(String),

    #[error("Fetch error: {0}")]
    FetchError(String),

    #[error("Decode error: {0}")]
    DecodeError(String),

    #[error("Catalog error: {0}")]
    CatalogError(String),

    #[error("Unknown {kind}: {id}")]
    UnknownEntry { kind: &'static str, id: String },

    #[error("Invalid color: {0}")]
    InvalidColor(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Value out of range: {field} must be between {min} and {max}, got {value}")]
    ValueOutOfRange {
        field: String,
        min: f64,
        max: f64,
        value: f64,
    },

    #[error("Render error: {0}")]
    RenderError(String),

    #[error("Video error: {0}")]
    VideoError(String),

    #[error("Capture error: {0}")]
    CaptureError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(String),

    #[error("TOML serialization error: {0}")]
    TomlSerError(String),
}

/// Result type alias for studio operations
pub type Result<T> = std::result::Result<T, StudioError>;

impl From<toml::de::Error> for StudioError {
    fn from(err: toml::de::Error) -> Self {
        StudioError::TomlParseError(err.to_string())
    }
}

impl From<toml::ser::Error> for StudioError {
    fn from(err: toml::ser::Error) -> Self {
        StudioError::TomlSerError(err.to_string())
    }
}
