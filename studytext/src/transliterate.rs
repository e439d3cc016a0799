//! Romanized text to Telugu script.
//!
//! This is a best-effort heuristic, not a linguistically complete scheme:
//! it exists for generator output that romanized words the reader would
//! rather see in Telugu letters. Schemes are CSV tables compiled into the
//! crate from `data/translit/` and sit behind the [`Transliterator`] trait so
//! a better strategy can replace them.
//!
//! Segmentation is greedy longest-match over the scheme's Latin patterns
//! (`chh` before `ch` before `c`, `aa` before `a`). Composition then applies
//! vowel signs to pending consonants, a virama between consonants and at
//! the end of a word, and an anusvara for a nasal before another consonant
//! or a word-final `m`. A final pass puts the vowel carrier in front of any
//! vowel sign left without a consonant.

use anyhow::{bail, Context, Result};
use csv::Reader;
use serde::Deserialize;
use std::collections::HashMap;
use unicode_segmentation::UnicodeSegmentation;

include!(concat!(env!("OUT_DIR"), "/scheme_data.rs"));

/// Scheme used when configuration does not name one.
pub const DEFAULT_SCHEME: &str = "tel_Telu";

/// Converts ASCII romanization to a native script.
pub trait Transliterator: Send + Sync {
    fn transliterate(&self, ascii: &str) -> String;
}

#[derive(Debug, Deserialize)]
struct SchemeRow {
    latn: String,
    tel: String,
    sign: String,
    kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Unit {
    Vowel { letter: String, sign: String },
    Consonant { letter: String, nasal: bool },
}

#[derive(Debug, Clone, Copy)]
enum Piece<'s> {
    Sound(&'s str, &'s Unit),
    Apostrophe,
    Other(char),
}

/// Table-driven transliterator loaded from a `latn,tel,sign,kind` scheme.
#[derive(Debug, Clone)]
pub struct SchemeTransliterator {
    units: HashMap<String, Unit>,
    longest: usize,
    virama: String,
    anusvara: String,
    carrier: String,
}

impl SchemeTransliterator {
    /// Load one of the compiled-in schemes by code, e.g. `"tel_Telu"`.
    pub fn new(code: &str) -> Result<Self> {
        let data = get_scheme_data(code)
            .with_context(|| format!("unknown transliteration scheme '{code}'"))?;
        Self::from_csv(data).with_context(|| format!("scheme '{code}' is malformed"))
    }

    /// Codes of every compiled-in scheme.
    pub fn available_schemes() -> &'static [&'static str] {
        AVAILABLE_SCHEMES
    }

    /// Build a transliterator from scheme CSV text.
    ///
    /// Rows of kind `vowel` give the independent letter and the dependent
    /// sign (empty for the inherent vowel), `consonant` and `nasal` rows give
    /// a letter, and `mark` rows named `virama` and `anusvara` give those
    /// signs. The independent letter of `a` doubles as the vowel carrier.
    pub fn from_csv(data: &str) -> Result<Self> {
        let mut units = HashMap::new();
        let mut virama = None;
        let mut anusvara = None;

        let mut reader = Reader::from_reader(data.as_bytes());
        for result in reader.deserialize() {
            let row: SchemeRow = result.context("Error reading scheme row")?;
            let latn = row.latn.trim().to_ascii_lowercase();
            let unit = match row.kind.as_str() {
                "vowel" => Unit::Vowel {
                    letter: row.tel,
                    sign: row.sign,
                },
                "consonant" | "nasal" => Unit::Consonant {
                    letter: row.tel,
                    nasal: row.kind == "nasal",
                },
                "mark" => {
                    match latn.as_str() {
                        "virama" => virama = Some(row.tel),
                        "anusvara" => anusvara = Some(row.tel),
                        other => bail!("unknown mark '{other}'"),
                    }
                    continue;
                }
                other => bail!("unknown row kind '{other}' for '{latn}'"),
            };
            if latn.is_empty() || !latn.is_ascii() {
                bail!("pattern '{latn}' must be non-empty ASCII");
            }
            units.insert(latn, unit);
        }

        let carrier = match units.get("a") {
            Some(Unit::Vowel { letter, .. }) if !letter.is_empty() => letter.clone(),
            _ => bail!("scheme has no independent letter for 'a'"),
        };
        let longest = units.keys().map(String::len).max().unwrap_or(0);
        Ok(SchemeTransliterator {
            units,
            longest,
            virama: virama.context("scheme has no virama mark")?,
            anusvara: anusvara.context("scheme has no anusvara mark")?,
            carrier,
        })
    }

    fn segment<'s>(&'s self, word: &'s str) -> Vec<Piece<'s>> {
        let mut pieces = Vec::new();
        let mut i = 0;
        while i < word.len() {
            let rest = &word[i..];
            if rest.starts_with('\'') {
                pieces.push(Piece::Apostrophe);
                i += 1;
                continue;
            }
            let matched = (1..=self.longest.min(rest.len()))
                .rev()
                .find_map(|len| self.units.get_key_value(&rest[..len]));
            match matched {
                Some((pattern, unit)) => {
                    pieces.push(Piece::Sound(pattern.as_str(), unit));
                    i += pattern.len();
                }
                None => {
                    // Word is ASCII, so one byte is one char.
                    pieces.push(Piece::Other(char::from(word.as_bytes()[i])));
                    i += 1;
                }
            }
        }
        pieces
    }

    fn transliterate_word(&self, word: &str) -> String {
        let lower = word.to_ascii_lowercase();
        let pieces = self.segment(&lower);

        let mut out = String::new();
        let mut pending = false;
        let mut word_start = true;
        for (idx, piece) in pieces.iter().enumerate() {
            match *piece {
                Piece::Sound(_, Unit::Vowel { letter, sign }) => {
                    if pending || letter.is_empty() {
                        out.push_str(sign);
                    } else {
                        out.push_str(letter);
                    }
                    pending = false;
                    word_start = false;
                }
                Piece::Sound(pattern, Unit::Consonant { letter, nasal }) => {
                    let next = pieces[idx + 1..]
                        .iter()
                        .find(|p| !matches!(p, Piece::Apostrophe));
                    let before_other_consonant = matches!(
                        next,
                        Some(Piece::Sound(next_pattern, Unit::Consonant { .. }))
                            if *next_pattern != pattern
                    );
                    let final_m = next.is_none() && pattern == "m";
                    if *nasal && !pending && !word_start && (before_other_consonant || final_m) {
                        out.push_str(&self.anusvara);
                    } else {
                        if pending {
                            out.push_str(&self.virama);
                        }
                        out.push_str(letter);
                        pending = true;
                    }
                    word_start = false;
                }
                Piece::Apostrophe => {}
                Piece::Other(c) => {
                    if pending {
                        out.push_str(&self.virama);
                    }
                    out.push(c);
                    pending = false;
                    word_start = true;
                }
            }
        }
        if pending {
            out.push_str(&self.virama);
        }
        self.prefix_carrier(&out)
    }

    fn prefix_carrier(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut prev: Option<char> = None;
        for c in text.chars() {
            if is_vowel_sign(c) && !prev.is_some_and(is_consonant) {
                out.push_str(&self.carrier);
            }
            out.push(c);
            prev = Some(c);
        }
        out
    }
}

impl Transliterator for SchemeTransliterator {
    /// Transliterate every ASCII word of `ascii`; whitespace, punctuation,
    /// digits and non-ASCII text pass through untouched.
    fn transliterate(&self, ascii: &str) -> String {
        ascii
            .split_word_bounds()
            .map(|segment| {
                let is_word = segment.chars().any(|c| c.is_ascii_alphabetic())
                    && segment.chars().all(|c| c.is_ascii_alphabetic() || c == '\'');
                if is_word {
                    self.transliterate_word(segment)
                } else {
                    segment.to_string()
                }
            })
            .collect()
    }
}

fn is_vowel_sign(c: char) -> bool {
    ('\u{0C3E}'..='\u{0C4C}').contains(&c) || matches!(c, '\u{0C55}' | '\u{0C56}')
}

fn is_consonant(c: char) -> bool {
    ('\u{0C15}'..='\u{0C39}').contains(&c) || ('\u{0C58}'..='\u{0C5A}').contains(&c)
}
