//! Smoothing and contrast filters.
//!
//! - Gaussian 3x3 blur (cheap, used on the real-time path)
//! - Bilateral filter (edge-preserving denoise)
//! - CLAHE (contrast-limited adaptive histogram equalization)

use image::GrayImage;

/// Bilateral filter diameter used by the enhancement chain
pub const BILATERAL_DIAMETER: u32 = 9;
/// Bilateral colour/space sigma used by the enhancement chain
pub const BILATERAL_SIGMA: f32 = 75.0;
/// CLAHE clip limit used by the enhancement chain
pub const CLAHE_CLIP_LIMIT: f32 = 2.0;
/// CLAHE tile grid used by the enhancement chain
pub const CLAHE_GRID: u32 = 8;

#[inline]
fn clamp_index(v: isize, len: usize) -> usize {
    v.clamp(0, len as isize - 1) as usize
}

/// Separable 3x3 Gaussian blur with kernel `[1 2 1] / 4`, border replicated
pub fn gaussian_blur_3x3(gray: &GrayImage) -> GrayImage {
    let (width, height) = gray.dimensions();
    let (w, h) = (width as usize, height as usize);
    if w == 0 || h == 0 {
        return gray.clone();
    }
    let src = gray.as_raw();

    // Horizontal pass, 4x scaled
    let mut tmp = vec![0u16; w * h];
    for y in 0..h {
        let row = &src[y * w..(y + 1) * w];
        for x in 0..w {
            let l = row[clamp_index(x as isize - 1, w)] as u16;
            let r = row[clamp_index(x as isize + 1, w)] as u16;
            tmp[y * w + x] = l + 2 * row[x] as u16 + r;
        }
    }

    // Vertical pass, 16x scaled
    let mut out = vec![0u8; w * h];
    for y in 0..h {
        let up = clamp_index(y as isize - 1, h);
        let down = clamp_index(y as isize + 1, h);
        for x in 0..w {
            let acc = tmp[up * w + x] as u32 + 2 * tmp[y * w + x] as u32 + tmp[down * w + x] as u32;
            out[y * w + x] = ((acc + 8) >> 4) as u8;
        }
    }

    GrayImage::from_raw(width, height, out).unwrap_or_else(|| GrayImage::new(width, height))
}

/// Edge-preserving bilateral filter.
///
/// Each output pixel is a weighted mean over a `diameter`-wide disc where
/// weights fall off with both spatial distance (`sigma_space`) and
/// intensity difference (`sigma_color`), so flat regions are smoothed
/// while bar edges stay sharp.
pub fn bilateral_filter(
    gray: &GrayImage,
    diameter: u32,
    sigma_color: f32,
    sigma_space: f32,
) -> GrayImage {
    let (width, height) = gray.dimensions();
    let (w, h) = (width as usize, height as usize);
    if w == 0 || h == 0 {
        return gray.clone();
    }
    let src = gray.as_raw();
    let radius = (diameter.max(1) / 2) as isize;

    let color_coeff = -0.5 / (sigma_color * sigma_color);
    let space_coeff = -0.5 / (sigma_space * sigma_space);

    let color_weight: Vec<f32> = (0..256)
        .map(|d| ((d * d) as f32 * color_coeff).exp())
        .collect();

    // Spatial kernel restricted to a disc, like the classic implementation
    let mut offsets: Vec<(isize, isize, f32)> = Vec::new();
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let r2 = (dx * dx + dy * dy) as f32;
            if r2.sqrt() > radius as f32 {
                continue;
            }
            offsets.push((dx, dy, (r2 * space_coeff).exp()));
        }
    }

    let mut out = vec![0u8; w * h];
    for y in 0..h {
        for x in 0..w {
            let center = src[y * w + x] as i32;
            let mut sum = 0f32;
            let mut norm = 0f32;
            for &(dx, dy, sw) in &offsets {
                let sx = clamp_index(x as isize + dx, w);
                let sy = clamp_index(y as isize + dy, h);
                let v = src[sy * w + sx] as i32;
                let wgt = sw * color_weight[(v - center).unsigned_abs() as usize];
                sum += wgt * v as f32;
                norm += wgt;
            }
            out[y * w + x] = (sum / norm).round().clamp(0.0, 255.0) as u8;
        }
    }

    GrayImage::from_raw(width, height, out).unwrap_or_else(|| GrayImage::new(width, height))
}

/// Contrast-limited adaptive histogram equalization.
///
/// The image is split into a `grid` x `grid` tile layout. Each tile gets an
/// equalization curve built from its clipped histogram (excess above
/// `clip_limit` times the mean bin height is spread evenly over all bins).
/// Pixels are mapped by bilinear interpolation between the curves of the
/// four nearest tile centres so tile borders don't show.
pub fn clahe(gray: &GrayImage, clip_limit: f32, grid: u32) -> GrayImage {
    let (width, height) = gray.dimensions();
    let (w, h) = (width as usize, height as usize);
    if w == 0 || h == 0 {
        return gray.clone();
    }
    let src = gray.as_raw();
    let grid = grid.max(1) as usize;
    let tiles_x = grid.min(w);
    let tiles_y = grid.min(h);
    let tile_w = w.div_ceil(tiles_x);
    let tile_h = h.div_ceil(tiles_y);

    let mut luts = vec![[0u8; 256]; tiles_x * tiles_y];
    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            let x0 = tx * tile_w;
            let y0 = ty * tile_h;
            let x1 = ((tx + 1) * tile_w).min(w);
            let y1 = ((ty + 1) * tile_h).min(h);
            luts[ty * tiles_x + tx] = tile_lut(src, w, x0, y0, x1, y1, clip_limit);
        }
    }

    let mut out = vec![0u8; w * h];
    for y in 0..h {
        // Position relative to tile centres
        let gy = (y as f32 + 0.5) / tile_h as f32 - 0.5;
        let ty0 = gy.floor().clamp(0.0, (tiles_y - 1) as f32) as usize;
        let ty1 = (ty0 + 1).min(tiles_y - 1);
        let fy = (gy - ty0 as f32).clamp(0.0, 1.0);
        for x in 0..w {
            let gx = (x as f32 + 0.5) / tile_w as f32 - 0.5;
            let tx0 = gx.floor().clamp(0.0, (tiles_x - 1) as f32) as usize;
            let tx1 = (tx0 + 1).min(tiles_x - 1);
            let fx = (gx - tx0 as f32).clamp(0.0, 1.0);

            let v = src[y * w + x] as usize;
            let tl = luts[ty0 * tiles_x + tx0][v] as f32;
            let tr = luts[ty0 * tiles_x + tx1][v] as f32;
            let bl = luts[ty1 * tiles_x + tx0][v] as f32;
            let br = luts[ty1 * tiles_x + tx1][v] as f32;

            let top = tl + (tr - tl) * fx;
            let bottom = bl + (br - bl) * fx;
            out[y * w + x] = (top + (bottom - top) * fy).round().clamp(0.0, 255.0) as u8;
        }
    }

    GrayImage::from_raw(width, height, out).unwrap_or_else(|| GrayImage::new(width, height))
}

/// Equalization curve for one tile with histogram clipping
fn tile_lut(
    src: &[u8],
    stride: usize,
    x0: usize,
    y0: usize,
    x1: usize,
    y1: usize,
    clip_limit: f32,
) -> [u8; 256] {
    let mut lut = [0u8; 256];
    let area = (x1 - x0) * (y1 - y0);
    if area == 0 {
        for (i, v) in lut.iter_mut().enumerate() {
            *v = i as u8;
        }
        return lut;
    }

    let mut histogram = [0u32; 256];
    for y in y0..y1 {
        for &v in &src[y * stride + x0..y * stride + x1] {
            histogram[v as usize] += 1;
        }
    }

    // Clip and redistribute
    let clip = ((clip_limit * area as f32 / 256.0) as u32).max(1);
    let mut excess = 0u32;
    for count in histogram.iter_mut() {
        if *count > clip {
            excess += *count - clip;
            *count = clip;
        }
    }
    let bonus = excess / 256;
    let remainder = (excess % 256) as usize;
    for (i, count) in histogram.iter_mut().enumerate() {
        *count += bonus;
        if i < remainder {
            *count += 1;
        }
    }

    let scale = 255.0 / area as f32;
    let mut cdf = 0u32;
    for (i, &count) in histogram.iter().enumerate() {
        cdf += count;
        lut[i] = (cdf as f32 * scale).round().clamp(0.0, 255.0) as u8;
    }
    lut
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blur_flat_image_unchanged() {
        let gray = GrayImage::from_pixel(5, 4, image::Luma([120]));
        assert_eq!(gaussian_blur_3x3(&gray), gray);
    }

    #[test]
    fn test_blur_softens_spike() {
        let mut gray = GrayImage::from_pixel(5, 5, image::Luma([0]));
        gray.put_pixel(2, 2, image::Luma([160]));
        let out = gaussian_blur_3x3(&gray);
        // Centre keeps 4/16, direct neighbours 2/16, diagonals 1/16
        assert_eq!(out.get_pixel(2, 2)[0], 40);
        assert_eq!(out.get_pixel(1, 2)[0], 20);
        assert_eq!(out.get_pixel(1, 1)[0], 10);
        assert_eq!(out.get_pixel(0, 0)[0], 0);
    }

    #[test]
    fn test_bilateral_preserves_step_edge() {
        // Hard vertical edge: 20 | 230
        let gray = GrayImage::from_fn(20, 6, |x, _| image::Luma([if x < 10 { 20 } else { 230 }]));
        let out = bilateral_filter(&gray, 9, 75.0, 75.0);
        // Colour weight across a 210-level step is negligible
        assert!(out.get_pixel(9, 3)[0] < 30);
        assert!(out.get_pixel(10, 3)[0] > 220);
    }

    #[test]
    fn test_bilateral_smooths_noise() {
        let gray = GrayImage::from_fn(12, 12, |x, y| image::Luma([if (x + y) % 2 == 0 { 100 } else { 110 }]));
        let out = bilateral_filter(&gray, 5, 75.0, 75.0);
        let v = out.get_pixel(6, 6)[0];
        assert!((102..=108).contains(&v), "got {v}");
    }

    #[test]
    fn test_clahe_stretches_low_contrast() {
        // Values squeezed into 100..=115
        let gray = GrayImage::from_fn(64, 64, |x, y| image::Luma([100 + ((x + y) % 16) as u8]));
        let out = clahe(&gray, 2.0, 8);
        let min = out.pixels().map(|p| p[0]).min().unwrap();
        let max = out.pixels().map(|p| p[0]).max().unwrap();
        assert!(max - min > 15 * 3, "range {min}..{max} should widen");
        assert_eq!(out.dimensions(), gray.dimensions());
    }

    #[test]
    fn test_clahe_tiny_image() {
        let gray = GrayImage::from_raw(3, 2, vec![0, 50, 100, 150, 200, 250]).unwrap();
        let out = clahe(&gray, 2.0, 8);
        assert_eq!(out.dimensions(), (3, 2));
    }
}
