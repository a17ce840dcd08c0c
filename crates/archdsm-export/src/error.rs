//! Export pipeline errors

use archdsm_core::FactError;
use thiserror::Error;

pub type ExportResult<T> = std::result::Result<T, ExportError>;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error(transparent)]
    Facts(#[from] FactError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config file: {0}")]
    Config(#[from] toml::de::Error),

    #[error("invalid glob pattern: {0}")]
    Glob(#[from] globset::Error),

    #[error("unknown naming scheme '{0}' (expected structured, flat or legacy)")]
    UnknownScheme(String),
}
