//! Centred region-of-interest cropping.

use crate::models::Rect;
use image::{ImageBuffer, Pixel, imageops};
use serde::{Deserialize, Serialize};

/// Placement of a cropped region inside its source frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Roi {
    /// Left offset in the source frame
    pub x: u32,
    /// Top offset in the source frame
    pub y: u32,
    /// Region width
    pub width: u32,
    /// Region height
    pub height: u32,
}

impl Roi {
    /// Region covering a whole `width` x `height` frame
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }

    /// Centred region covering `ratio` of each side.
    ///
    /// Sides are `floor(side * ratio)` and offsets use integer halving of
    /// the remainder. `ratio` is clamped to `[0, 1]`; NaN counts as 0.
    pub fn centered(width: u32, height: u32, ratio: f64) -> Self {
        let ratio = if ratio.is_nan() { 0.0 } else { ratio.clamp(0.0, 1.0) };
        let roi_w = ((width as f64 * ratio).floor() as u32).min(width);
        let roi_h = ((height as f64 * ratio).floor() as u32).min(height);
        Self {
            x: (width - roi_w) / 2,
            y: (height - roi_h) / 2,
            width: roi_w,
            height: roi_h,
        }
    }

    /// True when the region holds no pixels
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Same region as a signed rectangle
    pub fn as_rect(&self) -> Rect {
        Rect::new(
            self.x as i32,
            self.y as i32,
            self.width as i32,
            self.height as i32,
        )
    }
}

/// Crop the centred region of interest out of `frame`.
///
/// Returns the cropped copy and where it sits in `frame`. A zero-size frame
/// gives a zero-size region.
pub fn extract_roi<P>(
    frame: &ImageBuffer<P, Vec<P::Subpixel>>,
    ratio: f64,
) -> (ImageBuffer<P, Vec<P::Subpixel>>, Roi)
where
    P: Pixel + 'static,
{
    let (width, height) = frame.dimensions();
    let roi = Roi::centered(width, height, ratio);
    let cropped = imageops::crop_imm(frame, roi.x, roi.y, roi.width, roi.height).to_image();
    (cropped, roi)
}
