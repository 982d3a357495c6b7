//! Decode Engine seam and the retry ladder that drives it.
//!
//! The symbol decoding algorithm itself is an external capability behind
//! [`DecodeEngine`]. The ladder decides which transformed rasters the engine
//! sees, and in which order.

/// Ladder tuning knobs read from the environment
pub mod config;
/// Built-in engines
pub mod engine;
/// Ordered decode strategies
pub mod ladder;
#[cfg(feature = "rxing")]
/// Multi-format engine backed by rxing
pub mod rxing_engine;

pub use engine::{ChainEngine, QrEngine};
pub use ladder::{FAST_LADDER, LadderOutcome, STILL_LADDER, Stage, Step, run_ladder};
#[cfg(feature = "rxing")]
pub use rxing_engine::RxingEngine;

use crate::error::EngineError;
use crate::models::{Point, Rect};
use image::GrayImage;
use serde::{Deserialize, Serialize};

/// One detection as reported by a Decode Engine, in the pixel space of the
/// raster the engine was given
#[derive(Debug, Clone, PartialEq)]
pub struct RawDetection {
    /// Payload bytes
    pub data: Vec<u8>,
    /// Engine-specific symbology name
    pub symbology_name: String,
    /// Bounding rectangle
    pub rect: Rect,
    /// Outline points, possibly empty
    pub polygon: Vec<Point>,
}

impl RawDetection {
    /// Build a detection whose rectangle encloses `polygon`
    pub fn from_polygon(data: Vec<u8>, symbology_name: impl Into<String>, polygon: Vec<Point>) -> Self {
        let rect = Rect::bounding(&polygon).unwrap_or_default();
        Self {
            data,
            symbology_name: symbology_name.into(),
            rect,
            polygon,
        }
    }
}

/// External symbol decoding capability.
///
/// Implementations must return `Ok(vec![])` for a raster with nothing on
/// it. Errors are reserved for rasters the engine cannot process; the
/// ladder treats them as an empty stage.
pub trait DecodeEngine: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Decode every symbol visible in `image`
    fn decode(&self, image: &GrayImage) -> Result<Vec<RawDetection>, EngineError>;
}

impl<E: DecodeEngine + ?Sized> DecodeEngine for Box<E> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn decode(&self, image: &GrayImage) -> Result<Vec<RawDetection>, EngineError> {
        (**self).decode(image)
    }
}

impl<E: DecodeEngine + ?Sized> DecodeEngine for std::sync::Arc<E> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn decode(&self, image: &GrayImage) -> Result<Vec<RawDetection>, EngineError> {
        (**self).decode(image)
    }
}

/// Switches for the decode pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderOptions {
    /// Flag EAN/UPC results whose check digit does not match
    pub validate_checksum: bool,
    /// Allow the binarize/enhance stages that need the full filter chain
    pub use_preprocessing: bool,
    /// Allow the rotation sweeps
    pub try_rotations: bool,
}

impl Default for DecoderOptions {
    fn default() -> Self {
        Self {
            validate_checksum: true,
            use_preprocessing: true,
            try_rotations: true,
        }
    }
}
