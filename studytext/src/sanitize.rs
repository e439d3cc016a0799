//! ASCII sanitation of romanized transliterations.
//!
//! Generated transliterations arrive in whatever scholarly convention the
//! generator felt like using: macrons, underdots, ayin/aleph half rings,
//! schwa. Readers get plain ASCII: letters, digits, apostrophes, hyphens
//! and whitespace.

use bookref::normalize::is_secondary_char;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Letters with a conventional ASCII digraph, applied before decomposition
/// so that the digraph wins over the bare base letter.
fn ascii_digraph(c: char) -> Option<&'static str> {
    let digraph = match c {
        'š' => "sh",
        'Š' => "Sh",
        'ṣ' => "ts",
        'Ṣ' => "Ts",
        'ṭ' => "t",
        'Ṭ' => "T",
        'ḥ' => "h",
        'Ḥ' => "H",
        'ḫ' => "kh",
        'Ḫ' => "Kh",
        'ṯ' => "th",
        'Ṯ' => "Th",
        'ḏ' => "dh",
        'Ḏ' => "Dh",
        'ŋ' => "ng",
        'Ŋ' => "Ng",
        'æ' => "ae",
        'Æ' => "Ae",
        'œ' => "oe",
        'Œ' => "Oe",
        'ə' | 'ǝ' => "e",
        'Ə' => "E",
        'ß' => "ss",
        'ø' => "o",
        'Ø' => "O",
        'đ' => "d",
        'ł' => "l",
        'ı' => "i",
        'ʾ' | 'ʿ' | 'ʼ' | 'ʻ' | '\u{2019}' | '\u{2018}' | '`' | '´' => "'",
        '\u{2010}'..='\u{2015}' => "-",
        _ => return None,
    };
    Some(digraph)
}

fn is_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '\'' || c == '-' || c.is_ascii_whitespace()
}

/// Reduce a transliteration to `[A-Za-z0-9'\-\s]`.
///
/// Special letters become digraphs, diacritics are dropped after NFD,
/// anything else outside the allowed set is removed, runs of `'`/`-`
/// collapse to one, and whitespace collapses per line.
///
/// # Examples
///
/// ```
/// use studytext::sanitize::sanitize_transliteration;
///
/// assert_eq!(sanitize_transliteration("bərēʾšîṯ"), "bere'shith");
/// assert_eq!(sanitize_transliteration("Iēsous  Christos"), "Iesous Christos");
/// ```
pub fn sanitize_transliteration(text: &str) -> String {
    let mapped: String = text
        .nfc()
        .flat_map(|c| match ascii_digraph(c) {
            Some(digraph) => digraph.chars().collect::<Vec<_>>(),
            None => vec![c],
        })
        .collect();
    let filtered: String = mapped
        .nfd()
        .filter(|&c| !is_combining_mark(c))
        .filter(|&c| is_allowed(c))
        .collect();

    let mut collapsed = String::with_capacity(filtered.len());
    for c in filtered.chars() {
        if (c == '\'' || c == '-') && collapsed.ends_with(c) {
            continue;
        }
        collapsed.push(c);
    }

    collapsed
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// True when every letter in `text` is Telugu (and there is at least one).
pub fn is_pure_secondary(text: &str) -> bool {
    let mut seen = false;
    for c in text.chars() {
        if is_secondary_char(c) {
            seen = true;
        } else if c.is_alphabetic() {
            return false;
        }
    }
    seen
}

/// True when `text` already satisfies the ASCII transliteration charset.
pub fn is_ascii_transliteration(text: &str) -> bool {
    text.chars().all(is_allowed)
}
