//! Grayscale conversion, BT.601 weights in fixed point.

use image::{DynamicImage, GrayImage, RgbImage};

/// Coefficients for grayscale conversion: Y = (76*R + 150*G + 29*B) >> 8
const COEF_R: u32 = 76;
const COEF_G: u32 = 150;
const COEF_B: u32 = 29;

#[inline]
fn luma(r: u8, g: u8, b: u8) -> u8 {
    let lum = (COEF_R * r as u32 + COEF_G * g as u32 + COEF_B * b as u32) >> 8;
    lum.min(255) as u8
}

/// Convert packed RGB bytes to grayscale
pub fn rgb_to_grayscale(rgb: &[u8], width: usize, height: usize) -> Vec<u8> {
    let pixel_count = width * height;
    let mut gray = Vec::with_capacity(pixel_count);
    gray.extend(
        rgb.chunks_exact(3)
            .take(pixel_count)
            .map(|px| luma(px[0], px[1], px[2])),
    );
    gray
}

/// Convert packed RGBA bytes to grayscale (ignores alpha channel)
pub fn rgba_to_grayscale(rgba: &[u8], width: usize, height: usize) -> Vec<u8> {
    let pixel_count = width * height;
    let mut gray = Vec::with_capacity(pixel_count);
    gray.extend(
        rgba.chunks_exact(4)
            .take(pixel_count)
            .map(|px| luma(px[0], px[1], px[2])),
    );
    gray
}

/// Convert an RGB frame to a single-channel intensity image
pub fn rgb_frame_to_gray(frame: &RgbImage) -> GrayImage {
    let (width, height) = frame.dimensions();
    let gray = rgb_to_grayscale(frame.as_raw(), width as usize, height as usize);
    GrayImage::from_raw(width, height, gray).unwrap_or_else(|| GrayImage::new(width, height))
}

/// Convert any decoded image to a single-channel intensity image.
///
/// Luma input is copied as-is; 8-bit RGB/RGBA go through the integer
/// path above; anything else is normalised to RGB8 first.
pub fn to_gray(image: &DynamicImage) -> GrayImage {
    match image {
        DynamicImage::ImageLuma8(gray) => gray.clone(),
        DynamicImage::ImageRgb8(rgb) => rgb_frame_to_gray(rgb),
        DynamicImage::ImageRgba8(rgba) => {
            let (width, height) = rgba.dimensions();
            let gray = rgba_to_grayscale(rgba.as_raw(), width as usize, height as usize);
            GrayImage::from_raw(width, height, gray)
                .unwrap_or_else(|| GrayImage::new(width, height))
        }
        other => rgb_frame_to_gray(&other.to_rgb8()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_to_grayscale() {
        // Pure white
        let gray = rgb_to_grayscale(&[255, 255, 255], 1, 1);
        assert!(gray[0] >= 254);

        // Pure black
        let gray = rgb_to_grayscale(&[0, 0, 0], 1, 1);
        assert_eq!(gray[0], 0);

        // Pure red
        let gray = rgb_to_grayscale(&[255, 0, 0], 1, 1);
        assert!(gray[0] < 255);
        assert!(gray[0] > 0);

        // Pure green
        let gray = rgb_to_grayscale(&[0, 255, 0], 1, 1);
        assert!(gray[0] > 100);

        // 2x2 image
        let img = vec![255, 0, 0, 0, 255, 0, 0, 0, 255, 255, 255, 255];
        let gray = rgb_to_grayscale(&img, 2, 2);
        assert_eq!(gray.len(), 4);
    }

    #[test]
    fn test_rgba_to_grayscale() {
        let gray = rgba_to_grayscale(&[255, 128, 64, 0], 1, 1);
        assert_eq!(gray.len(), 1);
        assert_eq!(gray[0], rgb_to_grayscale(&[255, 128, 64], 1, 1)[0]);
    }

    #[test]
    fn test_to_gray_dispatch() {
        let rgb = RgbImage::from_pixel(4, 3, image::Rgb([10, 200, 30]));
        let gray = to_gray(&DynamicImage::ImageRgb8(rgb));
        assert_eq!(gray.dimensions(), (4, 3));
        assert_eq!(gray.get_pixel(0, 0)[0], luma(10, 200, 30));

        let luma_img = GrayImage::from_pixel(2, 2, image::Luma([77]));
        let out = to_gray(&DynamicImage::ImageLuma8(luma_img.clone()));
        assert_eq!(out, luma_img);
    }
}
