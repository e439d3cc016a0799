//! Reference parsing: `"<book> <chapter>:<verse>[-<verse>]"` to a
//! [`ParsedReference`], plus splitting of delimited reference lists.

use nom::{
    bytes::complete::take_while1,
    character::complete::{one_of, space0},
    combinator::{all_consuming, opt, recognize},
    sequence::{pair, terminated, tuple},
    IResult,
};
use std::fmt;
use thiserror::Error;
use tracing::debug;

use crate::books::{CanonicalBook, BOOKS};
use crate::canonical::resolve_book;
use crate::normalize::{clean_input, is_secondary_char};
use crate::tokenize::{chapter_verse, ChapterVerse};

/// A resolved book/chapter/verse coordinate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParsedReference {
    /// Canonical book name.
    pub book: String,
    pub chapter: u32,
    pub start_verse: u32,
    pub end_verse: Option<u32>,
}

impl ParsedReference {
    /// The canonical book record this reference points into.
    pub fn canonical_book(&self) -> Option<&'static CanonicalBook> {
        BOOKS.get(&self.book)
    }

    /// True when `verse` falls inside the referenced verse range.
    pub fn contains_verse(&self, verse: u32) -> bool {
        let end = self.end_verse.unwrap_or(self.start_verse);
        (self.start_verse..=end).contains(&verse)
    }

    /// The reference written with the official Telugu book name.
    pub fn to_secondary_string(&self) -> String {
        let book = self
            .canonical_book()
            .map_or(self.book.as_str(), |b| b.secondary_name.as_str());
        format!("{book} {}", self.coordinates())
    }

    fn coordinates(&self) -> String {
        match self.end_verse {
            Some(end) => format!("{}:{}-{}", self.chapter, self.start_verse, end),
            None => format!("{}:{}", self.chapter, self.start_verse),
        }
    }
}

impl fmt::Display for ParsedReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.book, self.coordinates())
    }
}

/// Why a reference failed to parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReferenceError {
    #[error("'{0}' is not of the form 'Book chapter:verse'")]
    InvalidSyntax(String),
    #[error("no book matches '{0}'")]
    UnresolvedBook(String),
    #[error("{book} has {chapter_count} chapters, not {chapter}")]
    ChapterOutOfRange {
        book: String,
        chapter: u32,
        chapter_count: u32,
    },
    #[error("verse numbers start at 1")]
    InvalidVerse,
    #[error("verse range {start}-{end} runs backwards")]
    InvertedRange { start: u32, end: u32 },
}

fn is_book_char(c: char) -> bool {
    c.is_alphabetic()
        || is_secondary_char(c)
        || matches!(c, '.' | '\'' | '\u{2019}' | '-' | ' ')
}

/// Optional numeral 1–3, then letters of either script, marks, `.`, `'`, `-`
/// and spaces.
fn book_text(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        opt(pair(one_of("123"), space0)),
        take_while1(is_book_char),
    ))(input)
}

fn reference(input: &str) -> IResult<&str, (&str, ChapterVerse)> {
    let (input, (book, _, cv)) = all_consuming(terminated(
        tuple((book_text, space0, chapter_verse)),
        space0,
    ))(input)?;
    Ok((input, (book.trim(), cv)))
}

/// Parse a single reference.
///
/// Telugu digits are accepted anywhere. Chapters are checked against the
/// book's chapter count; verse upper bounds are left to the verse source.
///
/// # Examples
///
/// ```
/// use bookref::reference::parse_reference;
///
/// let r = parse_reference("1 Timothy 2:1-4").unwrap();
/// assert_eq!(r.book, "1 Timothy");
/// assert_eq!((r.chapter, r.start_verse, r.end_verse), (2, 1, Some(4)));
/// assert!(parse_reference("Genesis 51:1").is_err());
/// ```
pub fn parse_reference(text: &str) -> Result<ParsedReference, ReferenceError> {
    let cleaned = clean_input(text);
    let (_, (book_text, cv)) =
        reference(&cleaned).map_err(|_| ReferenceError::InvalidSyntax(cleaned.clone()))?;

    let book = resolve_book(book_text)
        .ok_or_else(|| ReferenceError::UnresolvedBook(book_text.to_string()))?;
    if !book.has_chapter(cv.chapter) {
        return Err(ReferenceError::ChapterOutOfRange {
            book: book.name.clone(),
            chapter: cv.chapter,
            chapter_count: book.chapter_count,
        });
    }
    if cv.start_verse == 0 {
        return Err(ReferenceError::InvalidVerse);
    }
    if let Some(end) = cv.end_verse {
        if end < cv.start_verse {
            return Err(ReferenceError::InvertedRange {
                start: cv.start_verse,
                end,
            });
        }
    }

    Ok(ParsedReference {
        book: book.name.clone(),
        chapter: cv.chapter,
        start_verse: cv.start_verse,
        end_verse: cv.end_verse,
    })
}

/// Split on `;` or `,` and parse each segment, dropping the ones that fail.
///
/// Order is preserved; empty input yields an empty vector.
pub fn parse_multiple(text: &str) -> Vec<ParsedReference> {
    text.split([';', ','])
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .filter_map(|segment| match parse_reference(segment) {
            Ok(reference) => Some(reference),
            Err(e) => {
                debug!(segment, error = %e, "dropping reference segment");
                None
            }
        })
        .collect()
}
