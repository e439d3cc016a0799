//! Splits a raw book reference into its parts: an optional book numeral,
//! the remaining book-name text, and an optional `chapter:verse[-verse]`
//! suffix.

use nom::{
    character::complete::{char as nom_char, digit1, one_of, space0},
    combinator::{all_consuming, map_res, opt},
    sequence::{delimited, preceded, tuple},
    IResult,
};

use crate::normalize::{clean_input, is_secondary_char};

/// Chapter and verse coordinates as written after a book name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChapterVerse {
    pub chapter: u32,
    pub start_verse: u32,
    pub end_verse: Option<u32>,
}

/// Result of tokenizing a book-name candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookTokens {
    /// Book numeral (1, 2 or 3) if one was written as a prefix, ordinal or suffix.
    pub numeral: Option<u8>,
    /// The book-name text without the numeral and without chapter/verse.
    pub name: String,
    pub chapter_verse: Option<ChapterVerse>,
    /// The cleaned input before the chapter/verse suffix was removed.
    pub cleaned: String,
}

impl BookTokens {
    /// Name with the numeral restored in canonical position, e.g. `"1 Timothy"`.
    pub fn numbered_name(&self) -> String {
        match self.numeral {
            Some(n) if !self.name.is_empty() => format!("{n} {}", self.name),
            _ => self.name.clone(),
        }
    }

    /// Lookup candidates in priority order: the numeral combined with the
    /// name in three orders, then the bare name.
    pub fn candidates(&self) -> Vec<String> {
        let mut candidates = Vec::with_capacity(4);
        if self.name.is_empty() {
            return candidates;
        }
        if let Some(n) = self.numeral {
            candidates.push(format!("{n} {}", self.name));
            candidates.push(format!("{n}{}", self.name));
            candidates.push(format!("{} {n}", self.name));
        }
        candidates.push(self.name.clone());
        candidates
    }
}

fn number(input: &str) -> IResult<&str, u32> {
    map_res(digit1, |digits: &str| digits.parse::<u32>())(input)
}

/// `chapter (":" | ".") verse ["-" verse]`
pub(crate) fn chapter_verse(input: &str) -> IResult<&str, ChapterVerse> {
    let (input, (chapter, _, start_verse, end_verse)) = tuple((
        number,
        delimited(space0, one_of(":."), space0),
        number,
        opt(preceded(delimited(space0, nom_char('-'), space0), number)),
    ))(input)?;
    Ok((
        input,
        ChapterVerse {
            chapter,
            start_verse,
            end_verse,
        },
    ))
}

fn is_suffix_char(c: char) -> bool {
    c.is_ascii_digit() || matches!(c, ':' | '.' | '-' | ' ')
}

/// Find a trailing chapter/verse suffix and return the text before it.
fn split_chapter_verse(text: &str) -> (&str, Option<ChapterVerse>) {
    let run_start = text
        .char_indices()
        .rev()
        .take_while(|&(_, c)| is_suffix_char(c))
        .last()
        .map(|(i, _)| i);
    let Some(run_start) = run_start else {
        return (text, None);
    };

    // Leftmost digit that begins a number and parses to the end wins.
    let bytes = text.as_bytes();
    for start in run_start..text.len() {
        let starts_number =
            bytes[start].is_ascii_digit() && (start == 0 || !bytes[start - 1].is_ascii_digit());
        if !starts_number {
            continue;
        }
        if let Ok((_, cv)) = all_consuming(chapter_verse)(text[start..].trim_end()) {
            return (text[..start].trim_end(), Some(cv));
        }
    }
    (text, None)
}

fn numeral_word(word: &str) -> Option<u8> {
    let lowered = word.trim_end_matches('.').to_lowercase();
    match lowered.as_str() {
        "1" | "i" | "first" | "1st" | "మొదటి" | "1వ" => Some(1),
        "2" | "ii" | "second" | "2nd" | "రెండవ" | "రెండో" | "2వ" => Some(2),
        "3" | "iii" | "third" | "3rd" | "మూడవ" | "మూడో" | "3వ" => Some(3),
        _ => None,
    }
}

fn split_numeral(name: &str) -> (Option<u8>, String) {
    let words: Vec<&str> = name.split_whitespace().collect();
    if words.len() >= 2 {
        if let Some(n) = numeral_word(words[0]) {
            return (Some(n), words[1..].join(" "));
        }
    }

    // Glued prefix: "1John", "2యోహాను".
    if let Some(first) = words.first() {
        let mut chars = first.chars();
        if let (Some(digit @ '1'..='3'), Some(next)) = (chars.next(), chars.next()) {
            if next.is_alphabetic() || is_secondary_char(next) {
                let rest = std::iter::once(&first[1..])
                    .chain(words[1..].iter().copied())
                    .collect::<Vec<_>>()
                    .join(" ");
                return (Some(digit as u8 - b'0'), rest);
            }
        }
    }

    if words.len() >= 2 {
        if let Some(n @ 1..=3) = words[words.len() - 1].parse::<u8>().ok() {
            return (Some(n), words[..words.len() - 1].join(" "));
        }
    }

    (None, words.join(" "))
}

/// Tokenize a raw book reference.
///
/// # Examples
///
/// ```
/// use bookref::tokenize::tokenize;
///
/// let tokens = tokenize("1 Timothy 2:1-4");
/// assert_eq!(tokens.numeral, Some(1));
/// assert_eq!(tokens.name, "Timothy");
/// assert_eq!(tokens.chapter_verse.map(|cv| cv.end_verse), Some(Some(4)));
/// ```
pub fn tokenize(raw: &str) -> BookTokens {
    let cleaned = clean_input(raw);
    let (book_part, chapter_verse) = split_chapter_verse(&cleaned);
    let (numeral, name) = split_numeral(book_part);
    BookTokens {
        numeral,
        name,
        chapter_verse,
        cleaned,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chapter_verse() {
        assert_eq!(
            chapter_verse("3:16"),
            Ok((
                "",
                ChapterVerse {
                    chapter: 3,
                    start_verse: 16,
                    end_verse: None
                }
            ))
        );
        assert_eq!(
            chapter_verse("2:1 - 4"),
            Ok((
                "",
                ChapterVerse {
                    chapter: 2,
                    start_verse: 1,
                    end_verse: Some(4)
                }
            ))
        );
        assert!(chapter_verse("3").is_err());
    }

    #[test]
    fn test_prefix_numeral() {
        let tokens = tokenize("1 Timothy");
        assert_eq!(tokens.numeral, Some(1));
        assert_eq!(tokens.name, "Timothy");
        assert_eq!(tokens.chapter_verse, None);
    }

    #[test]
    fn test_glued_numeral() {
        let tokens = tokenize("2Kgs 5:1");
        assert_eq!(tokens.numeral, Some(2));
        assert_eq!(tokens.name, "Kgs");
        assert_eq!(tokens.chapter_verse.map(|cv| cv.chapter), Some(5));

        let telugu = tokenize("1యోహాను");
        assert_eq!(telugu.numeral, Some(1));
        assert_eq!(telugu.name, "యోహాను");
    }

    #[test]
    fn test_suffix_numeral() {
        let tokens = tokenize("Timothy 1");
        assert_eq!(tokens.numeral, Some(1));
        assert_eq!(tokens.name, "Timothy");
    }

    #[test]
    fn test_ordinals_and_roman_numerals() {
        assert_eq!(tokenize("II Kings").numeral, Some(2));
        assert_eq!(tokenize("First Peter").numeral, Some(1));
        assert_eq!(tokenize("3rd John").numeral, Some(3));
        let telugu = tokenize("మొదటి యోహాను");
        assert_eq!(telugu.numeral, Some(1));
        assert_eq!(telugu.name, "యోహాను");
    }

    #[test]
    fn test_telugu_digits_and_suffix() {
        let tokens = tokenize("౧ యోహాను ౧:౯");
        assert_eq!(tokens.numeral, Some(1));
        assert_eq!(tokens.name, "యోహాను");
        assert_eq!(
            tokens.chapter_verse,
            Some(ChapterVerse {
                chapter: 1,
                start_verse: 9,
                end_verse: None
            })
        );
        assert_eq!(tokens.cleaned, "1 యోహాను 1:9");
    }

    #[test]
    fn test_glued_chapter_verse() {
        let tokens = tokenize("John3:16");
        assert_eq!(tokens.name, "John");
        assert_eq!(tokens.chapter_verse.map(|cv| cv.start_verse), Some(16));
    }

    #[test]
    fn test_no_numeral_for_plain_names() {
        let tokens = tokenize("Song of Solomon");
        assert_eq!(tokens.numeral, None);
        assert_eq!(tokens.name, "Song of Solomon");
        assert_eq!(tokens.numbered_name(), "Song of Solomon");
    }

    #[test]
    fn test_candidates_order() {
        let tokens = tokenize("1 యోహాను");
        assert_eq!(
            tokens.candidates(),
            vec![
                "1 యోహాను".to_string(),
                "1యోహాను".to_string(),
                "యోహాను 1".to_string(),
                "యోహాను".to_string(),
            ]
        );
    }

    #[test]
    fn test_empty_and_punctuation_input() {
        let empty = tokenize("");
        assert_eq!(empty.name, "");
        assert!(empty.candidates().is_empty());
        let punct = tokenize("?!;");
        assert_eq!(punct.numeral, None);
        assert_eq!(punct.name, "?!;");
    }
}
