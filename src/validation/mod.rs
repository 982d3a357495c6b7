//! Result validation and same-call deduplication.
//!
//! Raw engine detections become [`DecodedSymbol`]s here. Payloads that are
//! empty or of implausible length are dropped as likely false positives.
//! EAN/UPC payloads get their check digit verified; a mismatch is flagged on
//! the symbol rather than dropping it.

pub mod checksum;

pub use checksum::{sanitize_digits, validate_checksum};

use crate::decoder::RawDetection;
use crate::models::{DecodedSymbol, Symbology};
use std::collections::HashSet;
use tracing::debug;

/// Shortest accepted payload, in characters
pub const MIN_DATA_LEN: usize = 6;
/// Longest accepted payload, in characters
pub const MAX_DATA_LEN: usize = 20;

/// Convert one engine detection; `None` when the payload isn't UTF-8
pub fn to_symbol(raw: RawDetection) -> Option<DecodedSymbol> {
    let symbology = Symbology::from_engine_name(&raw.symbology_name);
    match String::from_utf8(raw.data) {
        Ok(data) => Some(DecodedSymbol::new(data, symbology, raw.rect, raw.polygon)),
        Err(err) => {
            debug!(symbology = %symbology, error = %err, "dropping non UTF-8 payload");
            None
        }
    }
}

/// True when the payload length is within `[MIN_DATA_LEN, MAX_DATA_LEN]`
pub fn plausible_length(data: &str) -> bool {
    let len = data.chars().count();
    (MIN_DATA_LEN..=MAX_DATA_LEN).contains(&len)
}

/// Drop implausible payloads and flag bad EAN/UPC check digits
pub fn validate(symbols: Vec<DecodedSymbol>, check_digits: bool) -> Vec<DecodedSymbol> {
    symbols
        .into_iter()
        .filter(|s| {
            let keep = !s.data().is_empty() && plausible_length(s.data());
            if !keep {
                debug!(data = s.data(), "skipping barcode with unusual length");
            }
            keep
        })
        .map(|s| {
            if check_digits && s.symbology().has_check_digit() {
                let valid = validate_checksum(s.data());
                if !valid {
                    debug!(data = s.data(), "invalid checksum");
                }
                s.with_checksum_valid(valid)
            } else {
                s
            }
        })
        .collect()
}

/// Keep the first occurrence of each payload, preserving order
pub fn dedupe(symbols: Vec<DecodedSymbol>) -> Vec<DecodedSymbol> {
    let mut seen = HashSet::new();
    symbols
        .into_iter()
        .filter(|s| seen.insert(s.data().to_string()))
        .collect()
}

/// Full post-decode pass: convert, validate, dedupe
pub fn process(raw: Vec<RawDetection>, check_digits: bool) -> Vec<DecodedSymbol> {
    let symbols = raw.into_iter().filter_map(to_symbol).collect();
    dedupe(validate(symbols, check_digits))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Rect;

    fn raw(data: &[u8], symbology: &str) -> RawDetection {
        RawDetection {
            data: data.to_vec(),
            symbology_name: symbology.to_string(),
            rect: Rect::new(0, 0, 10, 10),
            polygon: Vec::new(),
        }
    }

    #[test]
    fn test_length_filter() {
        let out = process(
            vec![
                raw(b"", "EAN13"),
                raw(b"12345", "CODE128"),
                raw(b"123456", "CODE128"),
                raw(b"123456789012345678901", "CODE128"),
                raw(b"12345678901234567890", "CODE128"),
            ],
            true,
        );
        let data: Vec<&str> = out.iter().map(|s| s.data()).collect();
        assert_eq!(data, vec!["123456", "12345678901234567890"]);
    }

    #[test]
    fn test_invalid_checksum_is_flagged_not_dropped() {
        let out = process(
            vec![raw(b"5449000000997", "EAN13"), raw(b"5449000000996", "EAN13")],
            true,
        );
        assert_eq!(out.len(), 2);
        assert!(!out[0].checksum_valid());
        assert!(out[1].checksum_valid());
    }

    #[test]
    fn test_checksum_only_for_ean_upc() {
        let out = process(vec![raw(b"5449000000997", "CODE128")], true);
        assert!(out[0].checksum_valid());
        let out = process(vec![raw(b"5449000000997", "EAN13")], false);
        assert!(out[0].checksum_valid());
    }

    #[test]
    fn test_dedupe_keeps_first() {
        let mut first = raw(b"96385074", "EAN8");
        first.rect = Rect::new(1, 1, 5, 5);
        let out = process(
            vec![first, raw(b"4006381333931", "EAN13"), raw(b"96385074", "EAN8")],
            true,
        );
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].data(), "96385074");
        assert_eq!(out[0].bounding_rect(), Rect::new(1, 1, 5, 5));
        assert_eq!(out[1].data(), "4006381333931");
    }

    #[test]
    fn test_non_utf8_dropped() {
        assert!(to_symbol(raw(&[0xff, 0xfe, 0x31, 0x32, 0x33, 0x34], "QR_CODE")).is_none());
        let sym = to_symbol(raw("héllo wörld".as_bytes(), "QR_CODE")).unwrap();
        assert_eq!(sym.symbology(), Symbology::Qr);
        // Length counts characters, not bytes
        assert!(plausible_length("ééééé!"));
    }
}
