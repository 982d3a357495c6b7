//! Rectangular-kernel morphology on intensity images.
//!
//! The kernel anchor sits at `(k / 2, k / 2)`, so a 2x2 erosion covers the
//! pixel itself plus its left/upper neighbours. Dilation uses the reflected
//! kernel, which keeps opening and closing from shifting the image on even
//! kernel sizes. Pixels outside the image are ignored.

use image::GrayImage;

/// Kernel size used by the enhancement chain
pub const KERNEL_SIZE: u32 = 2;

fn kernel_offsets(size: u32) -> (isize, isize) {
    let size = size.max(1) as isize;
    let anchor = size / 2;
    (-anchor, size - 1 - anchor)
}

fn rank_filter(gray: &GrayImage, (lo, hi): (isize, isize), pick_max: bool) -> GrayImage {
    let (width, height) = gray.dimensions();
    let (w, h) = (width as isize, height as isize);
    if w == 0 || h == 0 {
        return gray.clone();
    }
    let src = gray.as_raw();

    let mut out = vec![0u8; src.len()];
    for y in 0..h {
        for x in 0..w {
            let mut acc = if pick_max { u8::MIN } else { u8::MAX };
            for dy in lo..=hi {
                let sy = y + dy;
                if sy < 0 || sy >= h {
                    continue;
                }
                for dx in lo..=hi {
                    let sx = x + dx;
                    if sx < 0 || sx >= w {
                        continue;
                    }
                    let v = src[(sy * w + sx) as usize];
                    acc = if pick_max { acc.max(v) } else { acc.min(v) };
                }
            }
            out[(y * w + x) as usize] = acc;
        }
    }

    GrayImage::from_raw(width, height, out).unwrap_or_else(|| GrayImage::new(width, height))
}

/// Minimum filter
pub fn erode(gray: &GrayImage, size: u32) -> GrayImage {
    rank_filter(gray, kernel_offsets(size), false)
}

/// Maximum filter
pub fn dilate(gray: &GrayImage, size: u32) -> GrayImage {
    let (lo, hi) = kernel_offsets(size);
    rank_filter(gray, (-hi, -lo), true)
}

/// Erode then dilate: removes bright specks smaller than the kernel
pub fn open(gray: &GrayImage, size: u32) -> GrayImage {
    dilate(&erode(gray, size), size)
}

/// Dilate then erode: fills dark gaps smaller than the kernel
pub fn close(gray: &GrayImage, size: u32) -> GrayImage {
    erode(&dilate(gray, size), size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_removes_single_pixel_speck() {
        let mut gray = GrayImage::from_pixel(6, 6, image::Luma([0]));
        gray.put_pixel(3, 3, image::Luma([255]));
        let out = open(&gray, 2);
        assert!(out.pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn test_close_fills_single_pixel_hole() {
        let mut gray = GrayImage::from_pixel(6, 6, image::Luma([255]));
        gray.put_pixel(3, 3, image::Luma([0]));
        let out = close(&gray, 2);
        assert!(out.pixels().all(|p| p[0] == 255));
    }

    #[test]
    fn test_open_keeps_wide_bar() {
        // 3-pixel-wide white bar survives a 2x2 opening
        let gray = GrayImage::from_fn(10, 6, |x, _| image::Luma([if (3..6).contains(&x) { 255 } else { 0 }]));
        let out = open(&gray, 2);
        assert_eq!(out, gray);
    }

    #[test]
    fn test_kernel_offsets() {
        assert_eq!(kernel_offsets(2), (-1, 0));
        assert_eq!(kernel_offsets(3), (-1, 1));
        assert_eq!(kernel_offsets(1), (0, 0));
    }
}
