//! Input sanitation shared by the tokenizer, the canonicalizer and the
//! reference parser.
//!
//! Everything that reaches a lookup table passes through here first:
//! Telugu digits become ASCII digits, zero-width characters disappear,
//! whitespace collapses, and text is brought to NFC so that the same
//! Telugu word typed on two keyboards produces the same key.

use unicode_normalization::UnicodeNormalization;

/// First code point of the Telugu digit block (TELUGU DIGIT ZERO).
const TELUGU_DIGIT_ZERO: u32 = 0x0C66;

/// Telugu block, letters, vowel signs and digits.
const TELUGU_BLOCK: std::ops::RangeInclusive<char> = '\u{0C00}'..='\u{0C7F}';

/// Replace every Telugu digit with its ASCII counterpart.
///
/// Applying this twice gives the same result as applying it once.
///
/// # Examples
///
/// ```
/// use bookref::normalize::normalize_digits;
///
/// assert_eq!(normalize_digits("౧౨౩"), "123");
/// assert_eq!(normalize_digits("John ౩:౧౬"), "John 3:16");
/// ```
pub fn normalize_digits(text: &str) -> String {
    text.chars()
        .map(|c| {
            let offset = (c as u32).wrapping_sub(TELUGU_DIGIT_ZERO);
            if offset < 10 {
                char::from(b'0' + offset as u8)
            } else {
                c
            }
        })
        .collect()
}

fn is_zero_width(c: char) -> bool {
    matches!(
        c,
        '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{2060}' | '\u{FEFF}' | '\u{00AD}'
    )
}

/// Drop zero-width spaces, joiners and the byte-order mark.
pub fn strip_zero_width(text: &str) -> String {
    text.chars().filter(|&c| !is_zero_width(c)).collect()
}

/// Collapse runs of whitespace into single ASCII spaces and trim the ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Full cleanup applied to raw user input before tokenizing.
///
/// NFC, zero-width removal, digit normalization, dash unification
/// (en and em dashes become `-`) and whitespace collapsing.
pub fn clean_input(text: &str) -> String {
    let composed: String = text.nfc().collect();
    let digits = normalize_digits(&strip_zero_width(&composed));
    let dashes: String = digits
        .chars()
        .map(|c| match c {
            '\u{2010}'..='\u{2015}' | '\u{2212}' => '-',
            _ => c,
        })
        .collect();
    collapse_whitespace(&dashes)
}

/// Helper function to determine if a character is punctuation.
///
/// Combining marks are deliberately not punctuation: Telugu vowel signs and
/// the virama carry meaning and must survive key folding.
pub fn is_punctuation(c: char) -> bool {
    c.is_ascii_punctuation()
        || ('\u{2000}'..='\u{206F}').contains(&c) // General Punctuation
        || ('\u{3000}'..='\u{303F}').contains(&c) // CJK Symbols and Punctuation
        || ('\u{FF00}'..='\u{FF0F}').contains(&c) // Fullwidth ASCII punctuation
        || matches!(c, '¡' | '¿' | '§' | '¶' | '†' | '‡' | '•' | '…' | '·' | '।' | '॥')
}

/// Lookup key used by every table: lowercase, no punctuation, single spaces.
pub fn fold_key(text: &str) -> String {
    let cleaned = clean_input(text);
    let stripped: String = cleaned
        .to_lowercase()
        .chars()
        .filter(|&c| !is_punctuation(c))
        .collect();
    collapse_whitespace(&stripped)
}

/// Abbreviation key: [`fold_key`] with the spaces squeezed out, so that
/// `"1 Sam."`, `"1Sam"` and `"1 sam"` all land on `"1sam"`.
pub fn abbreviation_key(text: &str) -> String {
    fold_key(text).split_whitespace().collect()
}

/// True for any character of the Telugu block.
pub fn is_secondary_char(c: char) -> bool {
    TELUGU_BLOCK.contains(&c)
}

/// True when the text contains at least one Telugu character.
pub fn is_secondary_script(text: &str) -> bool {
    text.chars().any(is_secondary_char)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_digits_telugu() {
        assert_eq!(normalize_digits("౧౨౩"), "123");
        assert_eq!(normalize_digits("౦౪౫౬౭౮౯"), "0456789");
    }

    #[test]
    fn test_normalize_digits_is_idempotent() {
        let once = normalize_digits("యోహాను ౩:౧౬");
        assert_eq!(once, "యోహాను 3:16");
        assert_eq!(normalize_digits(&once), once);
        assert_eq!(normalize_digits("Genesis 1:1"), "Genesis 1:1");
    }

    #[test]
    fn test_normalize_digits_leaves_letters() {
        // Neighbours of the digit block are letters and signs, not digits.
        assert_eq!(normalize_digits("\u{0C65}\u{0C70}"), "\u{0C65}\u{0C70}");
    }

    #[test]
    fn test_clean_input() {
        assert_eq!(clean_input("  1\u{200B} John   3:16 "), "1 John 3:16");
        assert_eq!(clean_input("Rom 8:1\u{2013}4"), "Rom 8:1-4");
        assert_eq!(clean_input("\u{FEFF}౧ యోహాను"), "1 యోహాను");
    }

    #[test]
    fn test_fold_key() {
        assert_eq!(fold_key("Song of  Solomon"), "song of solomon");
        assert_eq!(fold_key("1 Sam."), "1 sam");
        assert_eq!(fold_key("అ.కా."), "అకా");
        // Vowel signs and the virama are kept.
        assert_eq!(fold_key("కీర్తనలు"), "కీర్తనలు");
    }

    #[test]
    fn test_abbreviation_key() {
        assert_eq!(abbreviation_key("1 Sam."), "1sam");
        assert_eq!(abbreviation_key("1Sam"), "1sam");
        assert_eq!(abbreviation_key("Song of Solomon"), "songofsolomon");
    }

    #[test]
    fn test_is_secondary_script() {
        assert!(is_secondary_script("1 యోహాను"));
        assert!(!is_secondary_script("1 John"));
        assert!(!is_secondary_script(""));
    }
}
