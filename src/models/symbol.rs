use super::point::{Point, Rect};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Barcode symbology reported by a decode engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Symbology {
    /// EAN-13 / GTIN-13
    Ean13,
    /// EAN-8
    Ean8,
    /// UPC-A
    Upca,
    /// UPC-E
    Upce,
    /// QR code
    Qr,
    /// Code 128
    Code128,
    /// Code 39
    Code39,
    /// Anything the engine reported that we don't model
    Unknown,
}

impl Symbology {
    /// Map an engine-specific symbology name onto our enum.
    ///
    /// Matching ignores case and separators, so `EAN13`, `ean-13` and
    /// `EAN_13` all resolve to [`Symbology::Ean13`].
    pub fn from_engine_name(name: &str) -> Self {
        let key: String = name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_uppercase())
            .collect();
        match key.as_str() {
            "EAN13" => Self::Ean13,
            "EAN8" => Self::Ean8,
            "UPCA" => Self::Upca,
            "UPCE" => Self::Upce,
            "QR" | "QRCODE" => Self::Qr,
            "CODE128" => Self::Code128,
            "CODE39" => Self::Code39,
            _ => Self::Unknown,
        }
    }

    /// Whether the symbology carries a GS1 mod-10 check digit
    pub fn has_check_digit(&self) -> bool {
        matches!(self, Self::Ean13 | Self::Ean8 | Self::Upca | Self::Upce)
    }

    /// Canonical display name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ean13 => "EAN13",
            Self::Ean8 => "EAN8",
            Self::Upca => "UPCA",
            Self::Upce => "UPCE",
            Self::Qr => "QRCODE",
            Self::Code128 => "CODE128",
            Self::Code39 => "CODE39",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for Symbology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One barcode detected by a single decode call.
///
/// Values are never mutated after construction; coordinate remapping
/// produces a fresh instance via [`DecodedSymbol::translated`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodedSymbol {
    data: String,
    symbology: Symbology,
    bounding_rect: Rect,
    polygon: Vec<Point>,
    checksum_valid: bool,
    confidence: f32,
}

impl DecodedSymbol {
    /// Create a symbol with a valid checksum and full confidence
    pub fn new(
        data: impl Into<String>,
        symbology: Symbology,
        bounding_rect: Rect,
        polygon: Vec<Point>,
    ) -> Self {
        Self {
            data: data.into(),
            symbology,
            bounding_rect,
            polygon,
            checksum_valid: true,
            confidence: 1.0,
        }
    }

    /// Copy with the checksum flag replaced
    pub fn with_checksum_valid(self, checksum_valid: bool) -> Self {
        Self {
            checksum_valid,
            ..self
        }
    }

    /// Copy with confidence replaced (clamped to `[0, 1]`)
    pub fn with_confidence(self, confidence: f32) -> Self {
        let confidence = if confidence.is_finite() {
            confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self { confidence, ..self }
    }

    /// Decoded payload
    pub fn data(&self) -> &str {
        &self.data
    }

    /// Symbology
    pub fn symbology(&self) -> Symbology {
        self.symbology
    }

    /// Bounding rectangle in pixels of the frame the caller passed in
    pub fn bounding_rect(&self) -> Rect {
        self.bounding_rect
    }

    /// Ordered outline points; may be empty
    pub fn polygon(&self) -> &[Point] {
        &self.polygon
    }

    /// False only for EAN/UPC payloads whose check digit does not match
    pub fn checksum_valid(&self) -> bool {
        self.checksum_valid
    }

    /// Confidence in `[0, 1]`
    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    /// Polygon if present, otherwise the rectangle corners
    pub fn outline(&self) -> Vec<Point> {
        if self.polygon.is_empty() {
            self.bounding_rect.corners().to_vec()
        } else {
            self.polygon.clone()
        }
    }

    /// New symbol with every coordinate shifted by `(dx, dy)`
    pub fn translated(&self, dx: i32, dy: i32) -> Self {
        Self {
            data: self.data.clone(),
            symbology: self.symbology,
            bounding_rect: self.bounding_rect.translate(dx, dy),
            polygon: self.polygon.iter().map(|p| p.translate(dx, dy)).collect(),
            checksum_valid: self.checksum_valid,
            confidence: self.confidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbology_names() {
        assert_eq!(Symbology::from_engine_name("EAN13"), Symbology::Ean13);
        assert_eq!(Symbology::from_engine_name("ean-8"), Symbology::Ean8);
        assert_eq!(Symbology::from_engine_name("UPC_A"), Symbology::Upca);
        assert_eq!(Symbology::from_engine_name("QRCODE"), Symbology::Qr);
        assert_eq!(Symbology::from_engine_name("qr"), Symbology::Qr);
        assert_eq!(Symbology::from_engine_name("CODE_128"), Symbology::Code128);
        assert_eq!(Symbology::from_engine_name("PDF417"), Symbology::Unknown);
        assert_eq!(Symbology::Qr.to_string(), "QRCODE");
    }

    #[test]
    fn test_check_digit_symbologies() {
        assert!(Symbology::Ean13.has_check_digit());
        assert!(Symbology::Upce.has_check_digit());
        assert!(!Symbology::Qr.has_check_digit());
        assert!(!Symbology::Code128.has_check_digit());
    }

    #[test]
    fn test_outline_falls_back_to_rect() {
        let sym = DecodedSymbol::new("12345678", Symbology::Ean8, Rect::new(1, 2, 3, 4), vec![]);
        assert_eq!(sym.outline(), Rect::new(1, 2, 3, 4).corners().to_vec());
        assert!(sym.checksum_valid());
        assert_eq!(sym.confidence(), 1.0);
    }

    #[test]
    fn test_translated_is_a_new_value() {
        let sym = DecodedSymbol::new(
            "5449000000996",
            Symbology::Ean13,
            Rect::new(10, 20, 50, 30),
            vec![Point::new(10, 20), Point::new(60, 50)],
        )
        .with_checksum_valid(false)
        .with_confidence(0.5);
        let moved = sym.translated(40, 60);

        assert_eq!(sym.bounding_rect(), Rect::new(10, 20, 50, 30));
        assert_eq!(moved.bounding_rect(), Rect::new(50, 80, 50, 30));
        assert_eq!(moved.polygon(), &[Point::new(50, 80), Point::new(100, 110)]);
        assert_eq!(moved.data(), sym.data());
        assert!(!moved.checksum_valid());
        assert_eq!(moved.confidence(), 0.5);
    }

    #[test]
    fn test_confidence_clamped() {
        let sym = DecodedSymbol::new("abcdef", Symbology::Qr, Rect::default(), vec![]);
        assert_eq!(sym.clone().with_confidence(3.0).confidence(), 1.0);
        assert_eq!(sym.with_confidence(f32::NAN).confidence(), 0.0);
    }
}
