//! Global and local thresholding.
//!
//! Output images are strictly two-level: 255 where the source is brighter
//! than the threshold, 0 elsewhere.

use image::GrayImage;

/// Binarize using Otsu's automatically selected global threshold
pub fn otsu_binarize(gray: &GrayImage) -> GrayImage {
    let threshold = otsu_threshold(gray.as_raw());
    threshold_binarize(gray, threshold)
}

/// Calculate Otsu's optimal threshold.
///
/// Picks the `t` maximising between-class variance (equivalently
/// minimising intra-class variance) for the split `[0, t]` / `(t, 255]`.
pub fn otsu_threshold(gray: &[u8]) -> u8 {
    // Build histogram
    let mut histogram = [0u64; 256];
    for &pixel in gray {
        histogram[pixel as usize] += 1;
    }

    let total = gray.len() as f64;
    if total == 0.0 {
        return 0;
    }
    let total_sum: f64 = histogram
        .iter()
        .enumerate()
        .map(|(i, &c)| i as f64 * c as f64)
        .sum();

    let mut class1_pixels = 0f64;
    let mut class1_sum = 0f64;
    let mut max_variance = -1.0;
    let mut optimal_threshold = 0u8;

    for (t, &count) in histogram.iter().enumerate() {
        class1_pixels += count as f64;
        class1_sum += t as f64 * count as f64;
        let class2_pixels = total - class1_pixels;
        if class1_pixels == 0.0 || class2_pixels == 0.0 {
            continue;
        }

        let mean1 = class1_sum / class1_pixels;
        let mean2 = (total_sum - class1_sum) / class2_pixels;
        let variance = class1_pixels * class2_pixels * (mean1 - mean2).powi(2);

        if variance > max_variance {
            max_variance = variance;
            optimal_threshold = t as u8;
        }
    }

    optimal_threshold
}

/// Simple global threshold binarization
pub fn threshold_binarize(gray: &GrayImage, threshold: u8) -> GrayImage {
    let (width, height) = gray.dimensions();
    let data = gray
        .as_raw()
        .iter()
        .map(|&v| if v > threshold { 255 } else { 0 })
        .collect();
    GrayImage::from_raw(width, height, data).unwrap_or_else(|| GrayImage::new(width, height))
}

/// Adaptive Gaussian-weighted binarization for uneven illumination.
///
/// Each pixel is compared against the Gaussian-weighted mean of the
/// `block_size` x `block_size` window centred on it, minus `c`. The kernel
/// sigma follows the usual `0.3 * ((k - 1) / 2 - 1) + 0.8` rule for a
/// kernel of size `k`, and borders replicate the edge pixel.
pub fn adaptive_binarize(gray: &GrayImage, block_size: u32, c: i32) -> GrayImage {
    let (width, height) = gray.dimensions();
    let (w, h) = (width as usize, height as usize);
    if w == 0 || h == 0 {
        return GrayImage::new(width, height);
    }
    let src = gray.as_raw();
    let radius = (block_size.max(3) / 2) as usize;
    let kernel = gaussian_kernel(radius);

    // Horizontal pass
    let mut rows = vec![0f32; w * h];
    for y in 0..h {
        let row = &src[y * w..(y + 1) * w];
        for x in 0..w {
            let mut acc = 0f32;
            for (k, &weight) in kernel.iter().enumerate() {
                let sx = (x + k).saturating_sub(radius).min(w - 1);
                acc += weight * row[sx] as f32;
            }
            rows[y * w + x] = acc;
        }
    }

    // Vertical pass, then compare
    let mut out = vec![0u8; w * h];
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0f32;
            for (k, &weight) in kernel.iter().enumerate() {
                let sy = (y + k).saturating_sub(radius).min(h - 1);
                acc += weight * rows[sy * w + x];
            }
            let threshold = acc.round() as i32 - c;
            if src[y * w + x] as i32 > threshold {
                out[y * w + x] = 255;
            }
        }
    }

    GrayImage::from_raw(width, height, out).unwrap_or_else(|| GrayImage::new(width, height))
}

/// Normalised 1D Gaussian of length `2 * radius + 1`
fn gaussian_kernel(radius: usize) -> Vec<f32> {
    let size = 2 * radius + 1;
    let sigma = 0.3 * ((size as f32 - 1.0) * 0.5 - 1.0) + 0.8;
    let denom = 2.0 * sigma * sigma;
    let mut kernel: Vec<f32> = (0..size)
        .map(|i| {
            let d = i as f32 - radius as f32;
            (-(d * d) / denom).exp()
        })
        .collect();
    let sum: f32 = kernel.iter().sum();
    for weight in &mut kernel {
        *weight /= sum;
    }
    kernel
}

/// True when every pixel is either 0 or 255
pub fn is_binary(gray: &GrayImage) -> bool {
    gray.as_raw().iter().all(|&v| v == 0 || v == 255)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_binarize() {
        let gray = GrayImage::from_raw(2, 2, vec![100, 150, 200, 50]).unwrap();
        let binary = threshold_binarize(&gray, 128);

        // Pixels <= 128 become black
        assert_eq!(binary.get_pixel(0, 0)[0], 0);
        assert_eq!(binary.get_pixel(1, 0)[0], 255);
        assert_eq!(binary.get_pixel(0, 1)[0], 255);
        assert_eq!(binary.get_pixel(1, 1)[0], 0);
    }

    #[test]
    fn test_otsu_binarize() {
        // Two-class image: dark top half, light bottom half
        let mut data = vec![50u8; 50];
        data.extend(vec![200u8; 50]);
        let gray = GrayImage::from_raw(10, 10, data).unwrap();

        let t = otsu_threshold(gray.as_raw());
        assert!((50..200).contains(&t), "threshold {t} should separate classes");

        let binary = otsu_binarize(&gray);
        assert_eq!(binary.get_pixel(0, 0)[0], 0);
        assert_eq!(binary.get_pixel(0, 7)[0], 255);
        assert!(is_binary(&binary));
    }

    #[test]
    fn test_otsu_uniform_image() {
        let gray = GrayImage::from_pixel(4, 4, image::Luma([128]));
        // Single class: no split improves variance, everything ends up on one side
        let binary = otsu_binarize(&gray);
        let first = binary.get_pixel(0, 0)[0];
        assert!(binary.pixels().all(|p| p[0] == first));
        assert_eq!(otsu_threshold(&[]), 0);
    }

    #[test]
    fn test_adaptive_binarize_handles_gradient() {
        // Left-to-right illumination ramp with a dark bar in each half
        let (w, h) = (40u32, 10u32);
        let gray = GrayImage::from_fn(w, h, |x, _| {
            let base = 60 + (x * 4) as u8;
            if x == 8 || x == 30 {
                image::Luma([base.saturating_sub(50)])
            } else {
                image::Luma([base])
            }
        });
        let binary = adaptive_binarize(&gray, 11, 2);
        assert!(is_binary(&binary));
        assert_eq!(binary.get_pixel(8, 5)[0], 0);
        assert_eq!(binary.get_pixel(30, 5)[0], 0);
        assert_eq!(binary.get_pixel(20, 5)[0], 255);
    }

    #[test]
    fn test_adaptive_weights_centre_over_window_edge() {
        // Columns 100 100 120 100 255: the plain 5x5 mean at the centre is
        // 135, the Gaussian-weighted mean is about 118
        let columns = [100u8, 100, 120, 100, 255];
        let gray = GrayImage::from_fn(5, 5, |x, _| image::Luma([columns[x as usize]]));
        let binary = adaptive_binarize(&gray, 5, 0);
        assert_eq!(binary.get_pixel(2, 2)[0], 255);
        assert_eq!(binary.get_pixel(0, 2)[0], 0);
    }

    #[test]
    fn test_gaussian_kernel_is_normalised_and_symmetric() {
        let kernel = gaussian_kernel(5);
        assert_eq!(kernel.len(), 11);
        assert!((kernel.iter().sum::<f32>() - 1.0).abs() < 1e-5);
        assert!((kernel[0] - kernel[10]).abs() < 1e-7);
        assert!(kernel[5] > kernel[4]);
    }

    #[test]
    fn test_adaptive_empty_image() {
        let gray = GrayImage::new(0, 0);
        assert_eq!(adaptive_binarize(&gray, 11, 2).dimensions(), (0, 0));
    }
}
