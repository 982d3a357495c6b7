//! Cosmetic frame annotations: the region guide, detection outlines and a
//! debug strip. Everything draws onto a copy; the input frame is untouched.

use crate::models::{DecodedSymbol, Point};
use crate::region::Roi;
use image::{Rgb, RgbImage};

/// Region border and corner markers
pub const GUIDE_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
/// Outline of a symbol with a good (or no) check digit
pub const VALID_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
/// Outline of a symbol whose check digit did not match
pub const INVALID_COLOR: Rgb<u8> = Rgb([255, 165, 0]);
/// Length of each corner marker arm
pub const CORNER_LEN: u32 = 30;

const DIM_KEEP: u32 = 7; // tenths of original brightness kept outside the region
const LABEL_HEIGHT: u32 = 6;

fn put(frame: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < frame.width() && (y as u32) < frame.height() {
        frame.put_pixel(x as u32, y as u32, color);
    }
}

fn fill_rect(frame: &mut RgbImage, x: i64, y: i64, w: i64, h: i64, color: Rgb<u8>) {
    for yy in y..y + h {
        for xx in x..x + w {
            put(frame, xx, yy, color);
        }
    }
}

/// Bresenham segment, `thickness` pixels wide (square brush)
fn draw_line(frame: &mut RgbImage, from: Point, to: Point, thickness: u32, color: Rgb<u8>) {
    let (mut x0, mut y0) = (from.x as i64, from.y as i64);
    let (x1, y1) = (to.x as i64, to.y as i64);
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    let half = thickness.max(1) as i64 / 2;
    let size = thickness.max(1) as i64;

    loop {
        fill_rect(frame, x0 - half, y0 - half, size, size, color);
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

fn draw_polygon(frame: &mut RgbImage, points: &[Point], thickness: u32, color: Rgb<u8>) {
    for (i, &p) in points.iter().enumerate() {
        let next = points[(i + 1) % points.len()];
        draw_line(frame, p, next, thickness, color);
    }
}

/// Dim everything outside `roi`, then draw its border and corner markers
pub fn draw_roi_guide(frame: &RgbImage, roi: &Roi) -> RgbImage {
    let mut out = frame.clone();
    let (x0, y0) = (roi.x, roi.y);
    let (x1, y1) = (roi.x + roi.width, roi.y + roi.height);

    for (x, y, px) in out.enumerate_pixels_mut() {
        let inside = x >= x0 && x < x1 && y >= y0 && y < y1;
        if !inside {
            for c in px.0.iter_mut() {
                *c = (*c as u32 * DIM_KEEP / 10) as u8;
            }
        }
    }
    if roi.is_empty() {
        return out;
    }

    let r = roi.as_rect();
    draw_polygon(&mut out, &r.corners(), 2, GUIDE_COLOR);

    let len = CORNER_LEN.min(roi.width / 2).min(roi.height / 2) as i32;
    let (l, t, rt, b) = (r.x, r.y, r.x + r.width, r.y + r.height);
    let arms = [
        ((l, t), (l + len, t)),
        ((l, t), (l, t + len)),
        ((rt, t), (rt - len, t)),
        ((rt, t), (rt, t + len)),
        ((l, b), (l + len, b)),
        ((l, b), (l, b - len)),
        ((rt, b), (rt - len, b)),
        ((rt, b), (rt, b - len)),
    ];
    for (from, to) in arms {
        draw_line(&mut out, from.into(), to.into(), 3, GUIDE_COLOR);
    }
    out
}

/// Outline every symbol and put a label bar above it
pub fn draw_detections(frame: &RgbImage, symbols: &[DecodedSymbol]) -> RgbImage {
    let mut out = frame.clone();
    for symbol in symbols {
        let color = if symbol.checksum_valid() {
            VALID_COLOR
        } else {
            INVALID_COLOR
        };
        let outline = symbol.outline();
        draw_polygon(&mut out, &outline, 2, color);

        let rect = symbol.bounding_rect();
        let label_w = (rect.width as i64).max(8);
        fill_rect(
            &mut out,
            rect.x as i64,
            rect.y as i64 - LABEL_HEIGHT as i64 - 2,
            label_w,
            LABEL_HEIGHT as i64,
            color,
        );
    }
    out
}

/// Bar along the top-left edge whose length tracks `fps` against `target_fps`
pub fn draw_debug_strip(frame: &RgbImage, fps: f64, target_fps: u32) -> RgbImage {
    let mut out = frame.clone();
    let max_w = (out.width() / 4) as f64;
    let ratio = if target_fps == 0 || !fps.is_finite() {
        0.0
    } else {
        (fps / target_fps as f64).clamp(0.0, 1.0)
    };
    fill_rect(&mut out, 10, 10, max_w as i64, 4, Rgb([64, 64, 64]));
    fill_rect(&mut out, 10, 10, (max_w * ratio) as i64, 4, Rgb([255, 255, 0]));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Rect, Symbology};

    #[test]
    fn test_guide_dims_outside_only() {
        let frame = RgbImage::from_pixel(200, 100, Rgb([100, 100, 100]));
        let roi = Roi::centered(200, 100, 0.5);
        let out = draw_roi_guide(&frame, &roi);
        assert_eq!(out.get_pixel(5, 5).0, [70, 70, 70]);
        assert_eq!(out.get_pixel(100, 50).0, [100, 100, 100]);
        // Border on the region's left edge
        assert_eq!(*out.get_pixel(roi.x, 50), GUIDE_COLOR);
        // Input untouched
        assert_eq!(frame.get_pixel(5, 5).0, [100, 100, 100]);
    }

    #[test]
    fn test_detection_colors() {
        let frame = RgbImage::new(120, 120);
        let good = DecodedSymbol::new("96385074", Symbology::Ean8, Rect::new(20, 20, 40, 30), vec![]);
        let bad = DecodedSymbol::new("96385075", Symbology::Ean8, Rect::new(70, 70, 30, 30), vec![])
            .with_checksum_valid(false);
        let out = draw_detections(&frame, &[good, bad]);
        assert_eq!(*out.get_pixel(40, 20), VALID_COLOR);
        assert_eq!(*out.get_pixel(85, 70), INVALID_COLOR);
    }

    #[test]
    fn test_shapes_clip_at_frame_edges() {
        let frame = RgbImage::new(10, 10);
        let off = DecodedSymbol::new("123456", Symbology::Code128, Rect::new(-20, -20, 100, 100), vec![]);
        let out = draw_detections(&frame, &[off]);
        assert_eq!(out.dimensions(), (10, 10));
        let strip = draw_debug_strip(&frame, 30.0, 30);
        assert_eq!(strip.dimensions(), (10, 10));
    }

    #[test]
    fn test_debug_strip_length() {
        let frame = RgbImage::new(400, 100);
        let out = draw_debug_strip(&frame, 15.0, 30);
        assert_eq!(*out.get_pixel(10, 11), Rgb([255, 255, 0]));
        assert_eq!(*out.get_pixel(59, 11), Rgb([255, 255, 0]));
        assert_eq!(*out.get_pixel(61, 11), Rgb([64, 64, 64]));
    }
}
