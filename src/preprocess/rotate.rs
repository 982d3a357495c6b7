//! Quarter-turn rotations and their inverse point mapping.

use image::GrayImage;
use image::imageops;

/// Clockwise quarter-turn rotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rotation {
    /// 90 degrees clockwise
    Deg90,
    /// 180 degrees
    Deg180,
    /// 270 degrees clockwise (90 counter-clockwise)
    Deg270,
}

impl Rotation {
    /// Map a point in the rotated image back into the source image.
    ///
    /// `width`/`height` are the source dimensions. Coordinates are treated
    /// as continuous so rectangle corners map onto rectangle corners.
    pub fn unrotate_point(&self, x: f64, y: f64, width: u32, height: u32) -> (f64, f64) {
        let (w, h) = (width as f64, height as f64);
        match self {
            // src (sx, sy) -> rotated (h - sy, sx)
            Rotation::Deg90 => (y, h - x),
            // src (sx, sy) -> rotated (w - sx, h - sy)
            Rotation::Deg180 => (w - x, h - y),
            // src (sx, sy) -> rotated (sy, w - sx)
            Rotation::Deg270 => (w - y, x),
        }
    }
}

/// Rotate by a quarter turn; the input is left untouched
pub fn rotate(gray: &GrayImage, rotation: Rotation) -> GrayImage {
    match rotation {
        Rotation::Deg90 => imageops::rotate90(gray),
        Rotation::Deg180 => imageops::rotate180(gray),
        Rotation::Deg270 => imageops::rotate270(gray),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marked(width: u32, height: u32) -> GrayImage {
        let mut img = GrayImage::new(width, height);
        img.put_pixel(0, 0, image::Luma([255]));
        img
    }

    #[test]
    fn test_rotate_dimensions() {
        let img = marked(4, 2);
        assert_eq!(rotate(&img, Rotation::Deg90).dimensions(), (2, 4));
        assert_eq!(rotate(&img, Rotation::Deg180).dimensions(), (4, 2));
        assert_eq!(rotate(&img, Rotation::Deg270).dimensions(), (2, 4));
    }

    #[test]
    fn test_rotate_clockwise() {
        let img = marked(4, 2);
        // Top-left corner moves to top-right on a clockwise quarter turn
        let r90 = rotate(&img, Rotation::Deg90);
        assert_eq!(r90.get_pixel(1, 0)[0], 255);
        let r180 = rotate(&img, Rotation::Deg180);
        assert_eq!(r180.get_pixel(3, 1)[0], 255);
        let r270 = rotate(&img, Rotation::Deg270);
        assert_eq!(r270.get_pixel(0, 3)[0], 255);
    }

    #[test]
    fn test_unrotate_point_matches_pixels() {
        // Pixel (0,0) of a 4x2 source occupies [0,1]x[0,1]; its rotated
        // cell's far corner should map back to the source origin region.
        let (w, h) = (4, 2);
        for rotation in [Rotation::Deg90, Rotation::Deg180, Rotation::Deg270] {
            let (rw, rh) = rotate(&marked(w, h), rotation).dimensions();
            let corners = [(0.0, 0.0), (rw as f64, 0.0), (rw as f64, rh as f64), (0.0, rh as f64)];
            for (x, y) in corners {
                let (sx, sy) = rotation.unrotate_point(x, y, w, h);
                assert!(sx == 0.0 || sx == w as f64, "{rotation:?}: x {sx}");
                assert!(sy == 0.0 || sy == h as f64, "{rotation:?}: y {sy}");
            }
        }
        // Rotated 90: the marked pixel sits at rotated cell (1,0); its centre
        // (1.5, 0.5) maps back to source centre (0.5, 0.5)
        assert_eq!(Rotation::Deg90.unrotate_point(1.5, 0.5, w, h), (0.5, 0.5));
        assert_eq!(Rotation::Deg180.unrotate_point(3.5, 1.5, w, h), (0.5, 0.5));
        assert_eq!(Rotation::Deg270.unrotate_point(0.5, 3.5, w, h), (0.5, 0.5));
    }
}
