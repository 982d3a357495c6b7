//! barscan - retail barcode extraction from still images and live camera frames
//!
//! Symbol decoding is delegated to a [`DecodeEngine`]; this crate decides
//! which transformed rasters the engine sees, validates what comes back and
//! manages the camera session around it.
//!
//! ```no_run
//! let symbols = barscan::decode_path("shelf.jpg").unwrap_or_default();
//! for symbol in &symbols {
//!     println!("{} {}", symbol.symbology(), symbol.data());
//! }
//! ```

#![warn(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

/// Camera capture state machine, device seam and overlays
pub mod camera;
/// Decode Engine seam and retry ladders
pub mod decoder;
/// Error types
pub mod error;
/// Core data structures (DecodedSymbol, Symbology, Rect, Point)
pub mod models;
/// Still-image and frame decode API
pub mod pipeline;
/// Image preprocessing stages
pub mod preprocess;
/// Region of interest cropping and coordinate remapping
pub mod region;
/// Time-windowed duplicate suppression
pub mod temporal;
/// Helpers shared by the binaries and benchmarks
pub mod tools;
/// Checksum validation and deduplication
pub mod validation;

pub use camera::{CameraConfig, CameraScanner, CameraState};
pub use decoder::{DecodeEngine, DecoderOptions, RawDetection};
pub use error::{Error, Result};
pub use models::{DecodedSymbol, Point, Rect, Symbology};
pub use pipeline::BarcodeDecoder;
pub use temporal::DuplicateFilter;

use image::{DynamicImage, RgbImage};
use std::path::Path;

/// Decode every barcode in a still image with the default engine
pub fn decode_image(image: &DynamicImage) -> Vec<DecodedSymbol> {
    BarcodeDecoder::new().decode_image(image)
}

/// Fast decode of one RGB video frame with the default engine
pub fn decode_frame(frame: &RgbImage) -> Vec<DecodedSymbol> {
    BarcodeDecoder::new().decode_frame(frame)
}

/// Load an image file and decode it with the default engine
pub fn decode_path<P: AsRef<Path>>(path: P) -> Result<Vec<DecodedSymbol>> {
    BarcodeDecoder::new().decode_path(path)
}
