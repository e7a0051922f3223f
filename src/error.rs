use thiserror::Error;

/// Errors raised by the particle field engine
#[derive(Debug, Error, PartialEq)]
pub enum FieldError {
    /// Rejected configuration; the field keeps its previous state
    #[error("invalid field configuration: {0}")]
    Configuration(String),
    /// No drawable area could be acquired for the field
    #[error("drawing surface unavailable")]
    SurfaceUnavailable,
}

/// Errors from reading or writing config, preset and preference files
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("could not determine config directory")]
    NoConfigDir,
    #[error("file access failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Field(#[from] FieldError),
}
