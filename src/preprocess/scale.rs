//! Upscaling for low-resolution frames.
//!
//! Module widths below a few pixels defeat most decoders, so small frames
//! are enlarged with cubic interpolation before decoding.

use image::GrayImage;
use image::imageops::{self, FilterType};

/// Factor that brings the shorter side up to `floor` pixels, never below 2x.
///
/// Equals `max(floor / w, floor / h, 2.0)`.
pub fn floor_factor(width: u32, height: u32, floor: u32) -> f64 {
    if width == 0 || height == 0 {
        return 2.0;
    }
    let fw = floor as f64 / width as f64;
    let fh = floor as f64 / height as f64;
    fw.max(fh).max(2.0)
}

/// Aggressive factor used ahead of binarization: `max(2.0, target / min(w, h))`
pub fn target_factor(width: u32, height: u32, target: u32) -> f64 {
    let min_side = width.min(height);
    if min_side == 0 {
        return 2.0;
    }
    (target as f64 / min_side as f64).max(2.0)
}

/// Output dimensions for scaling `(width, height)` by `factor`
pub fn scaled_dimensions(width: u32, height: u32, factor: f64) -> (u32, u32) {
    let w = (width as f64 * factor).round().max(1.0) as u32;
    let h = (height as f64 * factor).round().max(1.0) as u32;
    (w, h)
}

/// Resize by `factor` using Catmull-Rom (cubic) interpolation
pub fn upscale(gray: &GrayImage, factor: f64) -> GrayImage {
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 {
        return gray.clone();
    }
    let (w, h) = scaled_dimensions(width, height, factor);
    imageops::resize(gray, w, h, FilterType::CatmullRom)
}

/// True when the shorter side is below `floor`
pub fn below_floor(width: u32, height: u32, floor: u32) -> bool {
    width < floor || height < floor
}
