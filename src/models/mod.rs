/// Pixel coordinates and rectangles
pub mod point;
/// Decoded barcode results
pub mod symbol;

pub use point::{Point, Rect};
pub use symbol::{DecodedSymbol, Symbology};
