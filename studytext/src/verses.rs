//! The verse-text collaborator.
//!
//! Verse data is keyed by canonical book number (the book's position in
//! canon order), so a source only ever sees canonical names.

use anyhow::{Context, Result};
use bookref::BOOKS;
use csv::Reader;
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

/// One verse in both translations.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VerseRow {
    pub verse: u32,
    pub english: String,
    pub telugu: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("no verses for {book} {chapter}")]
    NotFound { book: String, chapter: u32 },
    #[error("verse source unreachable: {0}")]
    Network(String),
}

/// Fetches a chapter by canonical book name.
pub trait VerseSource: Send + Sync {
    fn fetch_chapter(&self, book: &str, chapter: u32) -> Result<Vec<VerseRow>, FetchError>;
}

#[derive(Debug, Deserialize)]
struct VerseRecord {
    book: u8,
    chapter: u32,
    verse: u32,
    english: String,
    telugu: String,
}

/// In-memory verse source read from `book,chapter,verse,english,telugu` CSV,
/// where `book` is the canon position 1..=66.
#[derive(Debug, Default)]
pub struct CsvVerseSource {
    chapters: HashMap<(u8, u32), Vec<VerseRow>>,
}

impl CsvVerseSource {
    pub fn from_reader<R: Read>(rdr: R) -> Result<Self> {
        let mut chapters: HashMap<(u8, u32), Vec<VerseRow>> = HashMap::new();
        let mut reader = Reader::from_reader(rdr);
        for result in reader.deserialize() {
            let record: VerseRecord = result.context("Error reading verse row")?;
            BOOKS
                .by_number(record.book)
                .with_context(|| format!("book number {} is outside the canon", record.book))?;
            chapters
                .entry((record.book, record.chapter))
                .or_default()
                .push(VerseRow {
                    verse: record.verse,
                    english: record.english,
                    telugu: record.telugu,
                });
        }
        for rows in chapters.values_mut() {
            rows.sort_by_key(|row| row.verse);
        }
        Ok(Self { chapters })
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open verse file: {}", path.display()))?;
        Self::from_reader(file)
    }

    /// Number of chapters with at least one verse.
    pub fn chapter_count(&self) -> usize {
        self.chapters.len()
    }
}

impl VerseSource for CsvVerseSource {
    fn fetch_chapter(&self, book: &str, chapter: u32) -> Result<Vec<VerseRow>, FetchError> {
        let not_found = || FetchError::NotFound {
            book: book.to_string(),
            chapter,
        };
        let number = BOOKS.get(book).map(|b| b.number).ok_or_else(not_found)?;
        self.chapters
            .get(&(number, chapter))
            .cloned()
            .ok_or_else(not_found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "book,chapter,verse,english,telugu\n\
        43,3,17,\"For God sent not his Son\",\"లోకమునకు తీర్పు తీర్చుటకు\"\n\
        43,3,16,\"For God so loved the world\",\"దేవుడు లోకమును ఎంతో ప్రేమించెను\"\n\
        62,1,9,\"If we confess our sins\",\"మన పాపములను మనము ఒప్పుకొనినయెడల\"\n";

    #[test]
    fn test_fetch_by_canonical_name() {
        let source = CsvVerseSource::from_reader(SAMPLE.as_bytes()).expect("loads");
        let john = source.fetch_chapter("John", 3).expect("found");
        assert_eq!(john.iter().map(|v| v.verse).collect::<Vec<_>>(), [16, 17]);
        let first_john = source.fetch_chapter("1 John", 1).expect("found");
        assert_eq!(first_john.len(), 1);
        assert_eq!(source.chapter_count(), 2);
    }

    #[test]
    fn test_missing_chapter_and_non_canonical_name() {
        let source = CsvVerseSource::from_reader(SAMPLE.as_bytes()).expect("loads");
        assert_eq!(
            source.fetch_chapter("John", 4),
            Err(FetchError::NotFound {
                book: "John".to_string(),
                chapter: 4
            })
        );
        assert!(source.fetch_chapter("Jn", 3).is_err());
    }

    #[test]
    fn test_rejects_unknown_book_number() {
        let bad = "book,chapter,verse,english,telugu\n67,1,1,x,y\n";
        assert!(CsvVerseSource::from_reader(bad.as_bytes()).is_err());
    }
}
