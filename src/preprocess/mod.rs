//! Preprocessing stage library.
//!
//! Every transform takes a borrowed single-channel image and returns a new
//! one; inputs are never modified. The decode ladder composes them.

pub mod binarization;
pub mod filter;
pub mod grayscale;
pub mod morphology;
pub mod rotate;
pub mod scale;

pub use binarization::{adaptive_binarize, otsu_binarize};
pub use grayscale::{rgb_frame_to_gray, to_gray};
pub use rotate::{Rotation, rotate};
pub use scale::upscale;

use image::GrayImage;

/// Full enhancement chain for noisy or glare-affected frames.
///
/// Bilateral denoise, CLAHE, adaptive threshold with the given block size
/// and offset, then a 2x2 opening followed by a 2x2 closing.
pub fn enhance(gray: &GrayImage, block_size: u32, c: i32) -> GrayImage {
    let denoised = filter::bilateral_filter(
        gray,
        filter::BILATERAL_DIAMETER,
        filter::BILATERAL_SIGMA,
        filter::BILATERAL_SIGMA,
    );
    let equalized = filter::clahe(&denoised, filter::CLAHE_CLIP_LIMIT, filter::CLAHE_GRID);
    let binary = adaptive_binarize(&equalized, block_size, c);
    let opened = morphology::open(&binary, morphology::KERNEL_SIZE);
    morphology::close(&opened, morphology::KERNEL_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bars(width: u32, height: u32) -> GrayImage {
        GrayImage::from_fn(width, height, |x, _| {
            image::Luma([if (x / 6) % 2 == 0 { 40 } else { 210 }])
        })
    }

    #[test]
    fn test_enhance_is_binary_and_pure() {
        let gray = bars(60, 30);
        let before = gray.clone();
        let out = enhance(&gray, 11, 2);
        assert_eq!(gray, before);
        assert_eq!(out.dimensions(), gray.dimensions());
        assert!(binarization::is_binary(&out));
    }

    #[test]
    fn test_enhance_keeps_bar_pattern() {
        let gray = bars(60, 30);
        let out = enhance(&gray, 11, 2);
        // Interior of a dark bar and a light bar away from edges
        assert_eq!(out.get_pixel(14, 15)[0], 0);
        assert_eq!(out.get_pixel(8, 15)[0], 255);
    }
}
