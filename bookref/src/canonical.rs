//! Book canonicalization: free-form, mixed-script book text to one
//! canonical book name.
//!
//! Strategies run in a fixed order and the first hit wins:
//!
//! 1. (ASCII names) abbreviation or alias, exact canonical name, canonical
//!    name prefix;
//! 2. numeral/name combinations against the synonym table and the official
//!    Telugu names;
//! 3. abbreviation lookup of the whole cleaned input;
//! 4. prefix match on the bare name with the numeral dropped.
//!
//! Numbered combinations are always tried before the bare name, so
//! `"1 యోహాను"` reaches 1 John before the numeral-less prefix match could
//! land on John.

use tracing::debug;

use crate::books::{BookTable, CanonicalBook, BOOKS};
use crate::tokenize::{tokenize, BookTokens};

/// The lookup strategy that produced a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    Abbreviation,
    ExactName,
    NamePrefix,
    Synonym,
    SecondaryName,
    RawAbbreviation,
    BarePrefix,
}

impl Strategy {
    /// Prefix matches are guesses; callers may want to warn about them.
    pub fn is_fuzzy(self) -> bool {
        matches!(self, Strategy::NamePrefix | Strategy::BarePrefix)
    }
}

/// A resolved book together with the strategy that found it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution<'t> {
    pub book: &'t CanonicalBook,
    pub strategy: Strategy,
}

/// Lookup result exposed to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookMetadata {
    pub name: String,
    pub number: u8,
    pub chapter_count: u32,
    /// Set when resolution fell back to a prefix match.
    pub was_fuzzy: bool,
    pub strategy: Strategy,
}

impl From<Resolution<'_>> for BookMetadata {
    fn from(resolution: Resolution<'_>) -> Self {
        BookMetadata {
            name: resolution.book.name.clone(),
            number: resolution.book.number,
            chapter_count: resolution.book.chapter_count,
            was_fuzzy: resolution.strategy.is_fuzzy(),
            strategy: resolution.strategy,
        }
    }
}

/// Resolver bound to one book table.
#[derive(Debug, Clone, Copy)]
pub struct Canonicalizer<'t> {
    table: &'t BookTable,
}

impl Default for Canonicalizer<'static> {
    fn default() -> Self {
        Self::new(&BOOKS)
    }
}

impl<'t> Canonicalizer<'t> {
    pub fn new(table: &'t BookTable) -> Self {
        Self { table }
    }

    /// Resolve raw book text, or `None` when every strategy is exhausted.
    pub fn resolve(&self, raw: &str) -> Option<Resolution<'t>> {
        let tokens = tokenize(raw);
        let resolution = self
            .resolve_ascii(&tokens)
            .or_else(|| self.resolve_candidates(&tokens))
            .or_else(|| self.resolve_raw_abbreviation(&tokens))
            .or_else(|| self.resolve_bare_prefix(&tokens));
        match &resolution {
            Some(r) => debug!(input = raw, book = %r.book.name, strategy = ?r.strategy, "resolved book"),
            None => debug!(input = raw, "unresolved book"),
        }
        resolution
    }

    /// Canonical name for `raw`, or the trimmed input when nothing matches.
    pub fn canonicalize(&self, raw: &str) -> String {
        match self.resolve(raw) {
            Some(resolution) => resolution.book.name.clone(),
            None => raw.trim().to_string(),
        }
    }

    fn hit(&self, book: Option<&'t CanonicalBook>, strategy: Strategy) -> Option<Resolution<'t>> {
        book.map(|book| Resolution { book, strategy })
    }

    fn resolve_ascii(&self, tokens: &BookTokens) -> Option<Resolution<'t>> {
        if tokens.name.is_empty() || !tokens.name.is_ascii() {
            return None;
        }
        let numbered = tokens.numbered_name();
        self.hit(self.table.by_abbreviation(&numbered), Strategy::Abbreviation)
            .or_else(|| self.hit(self.table.get(&numbered), Strategy::ExactName))
            .or_else(|| self.hit(self.table.first_with_prefix(&numbered), Strategy::NamePrefix))
    }

    // The indexes are keyed by folded text, so each lookup covers both the
    // raw-cased and the lowercased, punctuation-free form of a candidate.
    fn resolve_candidates(&self, tokens: &BookTokens) -> Option<Resolution<'t>> {
        tokens.candidates().iter().find_map(|candidate| {
            self.hit(self.table.by_synonym(candidate), Strategy::Synonym).or_else(|| {
                self.hit(
                    self.table.by_secondary_name(candidate),
                    Strategy::SecondaryName,
                )
            })
        })
    }

    fn resolve_raw_abbreviation(&self, tokens: &BookTokens) -> Option<Resolution<'t>> {
        self.hit(
            self.table.by_abbreviation(&tokens.cleaned),
            Strategy::RawAbbreviation,
        )
    }

    fn resolve_bare_prefix(&self, tokens: &BookTokens) -> Option<Resolution<'t>> {
        if tokens.name.is_empty() {
            return None;
        }
        let numbered = tokens
            .numeral
            .and_then(|_| self.table.first_secondary_with_prefix(&tokens.numbered_name()));
        numbered
            .or_else(|| self.table.first_with_prefix(&tokens.name))
            .or_else(|| self.table.first_secondary_with_prefix(&tokens.name))
            .map(|book| Resolution {
                book,
                strategy: Strategy::BarePrefix,
            })
    }
}

/// Canonical book name for free-form input; the trimmed input when unresolved.
///
/// # Examples
///
/// ```
/// use bookref::canonical::canonicalize;
///
/// assert_eq!(canonicalize("1 tim"), "1 Timothy");
/// assert_eq!(canonicalize("కీర్తనలు"), "Psalms");
/// assert_eq!(canonicalize("  Hezekiah "), "Hezekiah");
/// ```
pub fn canonicalize(raw: &str) -> String {
    Canonicalizer::default().canonicalize(raw)
}

/// Metadata for the book named by `raw`, if it resolves.
pub fn find_book_metadata(raw: &str) -> Option<BookMetadata> {
    Canonicalizer::default().resolve(raw).map(BookMetadata::from)
}

/// Canonical book record for `raw`, if it resolves.
pub fn resolve_book(raw: &str) -> Option<&'static CanonicalBook> {
    Canonicalizer::default().resolve(raw).map(|r| r.book)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeral_disambiguation() {
        assert_eq!(canonicalize("1 John"), "1 John");
        assert_eq!(canonicalize("John"), "John");
        assert_eq!(canonicalize("3 John"), "3 John");
        assert_eq!(canonicalize("1 యోహాను"), "1 John");
        assert_eq!(canonicalize("యోహాను"), "John");
        assert_eq!(canonicalize("యోహాను 1"), "1 John");
        assert_eq!(canonicalize("౨ యోహాను"), "2 John");
        assert_eq!(canonicalize("1 యోహా"), "1 John");
        assert_eq!(canonicalize("యోహా"), "John");
    }

    #[test]
    fn test_abbreviations_and_case() {
        assert_eq!(canonicalize("gen"), "Genesis");
        assert_eq!(canonicalize("1 Cor."), "1 Corinthians");
        assert_eq!(canonicalize("1cor"), "1 Corinthians");
        assert_eq!(canonicalize("II Kings"), "2 Kings");
        assert_eq!(canonicalize("first peter"), "1 Peter");
        assert_eq!(canonicalize("PS"), "Psalms");
    }

    #[test]
    fn test_strategies() {
        let c = Canonicalizer::default();
        let strategy = |raw: &str| c.resolve(raw).map(|r| r.strategy);
        assert_eq!(strategy("Rom"), Some(Strategy::Abbreviation));
        assert_eq!(strategy("Romans"), Some(Strategy::ExactName));
        assert_eq!(strategy("Roma"), Some(Strategy::NamePrefix));
        assert_eq!(strategy("song of songs"), Some(Strategy::Synonym));
        assert_eq!(strategy("రోమీయులకు"), Some(Strategy::SecondaryName));
        assert_eq!(strategy("1 Gen"), Some(Strategy::BarePrefix));
        assert_eq!(strategy("యెహె"), Some(Strategy::BarePrefix));
        assert_eq!(strategy("Hezekiah"), None);
    }

    #[test]
    fn test_fuzzy_flag() {
        let exact = find_book_metadata("Philippians").expect("resolves");
        assert!(!exact.was_fuzzy);
        assert_eq!(exact.chapter_count, 4);
        let fuzzy = find_book_metadata("Philip").expect("resolves");
        assert!(fuzzy.was_fuzzy);
        assert_eq!(fuzzy.name, "Philippians");
    }

    #[test]
    fn test_chapter_verse_suffix_is_ignored() {
        assert_eq!(canonicalize("John 3:16"), "John");
        assert_eq!(canonicalize("1 Timothy 2:1-4"), "1 Timothy");
        assert_eq!(canonicalize("యోహాను సువార్త 3:16"), "John");
    }

    #[test]
    fn test_unresolved_returns_trimmed_input() {
        assert_eq!(canonicalize("   Hezekiah  "), "Hezekiah");
        assert_eq!(canonicalize(""), "");
        assert_eq!(canonicalize("?!"), "?!");
        assert!(find_book_metadata("Hezekiah").is_none());
    }
}
