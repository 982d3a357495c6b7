//! GS1 mod-10 check digit validation for EAN/UPC payloads

/// Keep only ASCII digits; `None` when nothing is left
pub fn sanitize_digits(data: &str) -> Option<String> {
    let digits: String = data.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() { None } else { Some(digits) }
}

/// Check digit for `body` where the digit at index `i` gets weight
/// `even_weight` when `i` is even and `odd_weight` otherwise
fn check_digit(body: &[u8], even_weight: u32, odd_weight: u32) -> u8 {
    let sum: u32 = body
        .iter()
        .enumerate()
        .map(|(i, &d)| {
            let weight = if i % 2 == 0 { even_weight } else { odd_weight };
            d as u32 * weight
        })
        .sum();
    ((10 - sum % 10) % 10) as u8
}

/// Validate the trailing check digit of an EAN-8, UPC-A, EAN-13 or
/// GTIN-14 payload.
///
/// Non-digit characters are stripped first. Any other length, including a
/// payload with no digits at all, is not a checksummed format and counts as
/// valid.
pub fn validate_checksum(data: &str) -> bool {
    let Some(digits) = sanitize_digits(data) else {
        return true;
    };
    let mut values: Vec<u8> = digits.bytes().map(|b| b - b'0').collect();

    let (even_weight, odd_weight) = match values.len() {
        12 => {
            values.insert(0, 0);
            (1, 3)
        }
        13 => (1, 3),
        14 | 8 => (3, 1),
        _ => return true,
    };

    let Some((&last, body)) = values.split_last() else {
        return true;
    };
    check_digit(body, even_weight, odd_weight) == last
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_vectors() {
        let vectors = [
            ("5449000000996", true),
            ("5449000000997", false),
            ("4006381333931", true),
            ("4006381333932", false),
            ("96385074", true),
            ("96385075", false),
            // UPC-A, padded to 13
            ("036000291452", true),
            ("036000291453", false),
            // GTIN-14
            ("10012345678902", true),
            ("10012345678903", false),
        ];
        for (code, expected) in vectors {
            assert_eq!(validate_checksum(code), expected, "{code}");
        }
    }

    #[test]
    fn test_unknown_lengths_are_valid() {
        assert!(validate_checksum("12345"));
        assert!(validate_checksum("123456789012345678"));
        assert!(validate_checksum("ABCDEF"));
        assert!(validate_checksum(""));
    }

    #[test]
    fn test_non_digits_are_stripped() {
        assert!(validate_checksum("5449000-000996"));
        assert!(validate_checksum(" 9638 5074 "));
        assert!(!validate_checksum("9638-5075"));
    }

    #[test]
    fn test_sanitize_digits() {
        assert_eq!(sanitize_digits("a1b2-3"), Some("123".to_string()));
        assert_eq!(sanitize_digits("abc"), None);
    }
}
