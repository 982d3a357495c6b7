//! Error types
//!
//! Decode and capture paths degrade to "nothing found" or "camera
//! unavailable" instead of returning these; they surface only from
//! explicitly fallible calls such as loading a file or opening a device.

use thiserror::Error;

/// Result alias using the crate error
pub type Result<T> = std::result::Result<T, Error>;

/// Crate-level error
#[derive(Debug, Error)]
pub enum Error {
    /// Image file could not be read or decoded
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    /// Decode engine failure
    #[error(transparent)]
    Engine(#[from] EngineError),
    /// Camera failure
    #[error(transparent)]
    Camera(#[from] CameraError),
    /// Configuration failure
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Failure reported by a decode engine for one invocation
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EngineError {
    /// The raster handed to the engine is unusable
    #[error("malformed buffer: {0}")]
    MalformedBuffer(String),
    /// Engine-internal failure
    #[error("{engine} failed: {message}")]
    Backend {
        /// Engine name
        engine: &'static str,
        /// Error message from the engine
        message: String,
    },
}

/// Camera acquisition and capture errors
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CameraError {
    /// Device handle could not be acquired
    #[error("failed to open camera {device_id}: {reason}")]
    OpenFailed {
        /// Device index
        device_id: u32,
        /// Backend reason
        reason: String,
    },
    /// A single frame read failed
    #[error("frame read failed: {0}")]
    ReadFailed(String),
    /// The device produces a pixel format we can't convert
    #[error("unsupported pixel format {0}")]
    UnsupportedFormat(String),
    /// The device rejected requested settings
    #[error("failed to configure camera: {0}")]
    ConfigureFailed(String),
}

/// Configuration loading and validation errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("failed to read config {path}: {source}")]
    Io {
        /// Path of the config file
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
    /// File is not valid JSON for the config schema
    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
    /// A field is outside its allowed range
    #[error("invalid value for {field}: {reason}")]
    InvalidField {
        /// Field name
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },
}
