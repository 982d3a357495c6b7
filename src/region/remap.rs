//! Mapping detections from a crop back to its source frame.

use super::roi::Roi;
use crate::models::DecodedSymbol;

/// Translate a symbol found inside `roi` into the coordinates of the frame
/// the region was cut from. Produces a new symbol; apply once per detection.
pub fn remap(symbol: &DecodedSymbol, roi: &Roi) -> DecodedSymbol {
    symbol.translated(roi.x as i32, roi.y as i32)
}

/// [`remap`] over a batch
pub fn remap_all(symbols: &[DecodedSymbol], roi: &Roi) -> Vec<DecodedSymbol> {
    symbols.iter().map(|s| remap(s, roi)).collect()
}
