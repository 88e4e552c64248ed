//! Position-aware OCR confusion correction.
//!
//! Plates are read as a 4-character digit zone followed by a letter zone.
//! Letters that look like digits are rewritten inside the digit zone, and
//! digits that look like letters are rewritten inside the letter zone.

/// Number of leading positions treated as the digit zone.
pub const DIGIT_ZONE_LEN: usize = 4;

/// Letter → digit substitutions applied in the digit zone.
const LETTER_TO_DIGIT: [(char, char); 6] = [
    ('I', '1'),
    ('O', '0'),
    ('S', '5'),
    ('G', '6'),
    ('B', '8'),
    ('Z', '2'),
];

/// Maps a digit-zone character to the digit it was probably meant to be.
fn as_digit(c: char) -> char {
    LETTER_TO_DIGIT
        .iter()
        .find(|(letter, _)| *letter == c)
        .map(|(_, digit)| *digit)
        .unwrap_or(c)
}

/// Maps a letter-zone character to the letter it was probably meant to be.
fn as_letter(c: char) -> char {
    LETTER_TO_DIGIT
        .iter()
        .find(|(_, digit)| *digit == c)
        .map(|(letter, _)| *letter)
        .unwrap_or(c)
}

/// Applies the positional confusion map to a cleaned candidate string.
///
/// Input is upper-cased first. Strings shorter than the digit zone are
/// returned unchanged (apart from case).
pub fn correct_ocr_errors(text: &str) -> String {
    let upper = text.to_uppercase();
    if upper.chars().count() < DIGIT_ZONE_LEN {
        return upper;
    }

    upper
        .chars()
        .enumerate()
        .map(|(i, c)| {
            if i < DIGIT_ZONE_LEN {
                as_digit(c)
            } else {
                as_letter(c)
            }
        })
        .collect()
}

/// True if no position holds a character the correction map would rewrite.
pub fn is_zone_consistent(text: &str) -> bool {
    correct_ocr_errors(text) == text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digit_zone_table() {
        assert_eq!(correct_ocr_errors("IOSGABC"), "1056ABC");
        assert_eq!(correct_ocr_errors("BZ00XYZ"), "8200XYZ");
    }

    #[test]
    fn test_letter_zone_table() {
        assert_eq!(correct_ocr_errors("1234015"), "1234OIS");
        assert_eq!(correct_ocr_errors("1234682"), "1234GBZ");
    }

    #[test]
    fn test_raw_line_with_confused_characters() {
        // "12S4 4BC" cleans to "12S44BC": S → 5 in the digit zone, and the
        // 4 in the letter zone has no letter counterpart.
        assert_eq!(correct_ocr_errors("12S44BC"), "12544BC");
    }

    #[test]
    fn test_short_strings_pass_through() {
        assert_eq!(correct_ocr_errors("SO1"), "SO1");
        assert_eq!(correct_ocr_errors(""), "");
        assert_eq!(correct_ocr_errors("ab"), "AB");
    }

    #[test]
    fn test_exactly_four_characters() {
        assert_eq!(correct_ocr_errors("SOBI"), "5081");
    }

    #[test]
    fn test_lowercase_is_normalized_first() {
        assert_eq!(correct_ocr_errors("12s4abc"), "1254ABC");
    }

    #[test]
    fn test_unmapped_characters_are_identity() {
        assert_eq!(correct_ocr_errors("1234ABC"), "1234ABC");
        assert_eq!(correct_ocr_errors("A7C9XYW"), "A7C9XYW");
    }

    #[test]
    fn test_idempotent_on_consistent_output() {
        for input in ["1234ABC", "IOSG015", "12S44BC", "BZ00XYZ"] {
            let once = correct_ocr_errors(input);
            if is_zone_consistent(&once) {
                assert_eq!(correct_ocr_errors(&once), once);
            }
        }
    }

    #[test]
    fn test_zone_consistency() {
        assert!(is_zone_consistent("1234ABC"));
        assert!(!is_zone_consistent("12S4ABC"));
        assert!(!is_zone_consistent("12340BC"));
    }
}
