//! The canonical book table.
//!
//! Sixty-six books in canon order. The order is load-bearing: a book's
//! `number` is the positional index into external verse data, so rows in
//! `data/books.csv` must never be reordered. The build script refuses to
//! compile the crate if the table has the wrong size, is out of order, or if
//! an alias or synonym points at two different books.

use anyhow::{bail, Context, Result};
use csv::Reader;
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::HashMap;

use crate::normalize::{abbreviation_key, fold_key};

const BOOKS_CSV: &str = include_str!("../data/books.csv");
const ALIASES_CSV: &str = include_str!("../data/aliases.csv");
const SYNONYMS_CSV: &str = include_str!("../data/synonyms.csv");

/// Number of books in the canon.
pub const BOOK_COUNT: usize = 66;

/// One book of the canon with its bilingual naming data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalBook {
    /// 1-based position in canon order.
    pub number: u8,
    /// Authoritative English-form name, e.g. `"1 Timothy"`.
    pub name: String,
    pub chapter_count: u32,
    /// Primary abbreviation, e.g. `"1Tim"`.
    pub abbreviation: String,
    /// Official Telugu name, e.g. `"1 తిమోతికి"`.
    pub secondary_name: String,
    /// Colloquial spellings that map onto this book.
    pub synonyms: Vec<String>,
}

impl CanonicalBook {
    /// True when `chapter` exists in this book.
    pub fn has_chapter(&self, chapter: u32) -> bool {
        (1..=self.chapter_count).contains(&chapter)
    }
}

#[derive(Debug, Deserialize)]
struct BookRecord {
    number: u8,
    name: String,
    chapters: u32,
    abbreviation: String,
    secondary_name: String,
}

#[derive(Debug, Deserialize)]
struct KeyRecord {
    #[serde(alias = "alias", alias = "synonym")]
    key: String,
    book: String,
}

/// The loaded table plus its lookup indexes. All indexes store positions
/// into `books`.
#[derive(Debug)]
pub struct BookTable {
    books: Vec<CanonicalBook>,
    by_name: HashMap<String, usize>,
    by_abbreviation: HashMap<String, usize>,
    by_secondary_name: HashMap<String, usize>,
    by_synonym: HashMap<String, usize>,
    folded_names: Vec<String>,
    folded_secondary_names: Vec<String>,
}

/// The compiled-in table, parsed on first use.
pub static BOOKS: Lazy<BookTable> = Lazy::new(|| {
    BookTable::from_csv(BOOKS_CSV, ALIASES_CSV, SYNONYMS_CSV)
        .unwrap_or_else(|e| panic!("embedded book table is malformed: {e:#}"))
});

impl BookTable {
    /// Build a table from the three CSV sources.
    ///
    /// # Arguments
    /// * `books` - `number,name,chapters,abbreviation,secondary_name` rows in canon order
    /// * `aliases` - `alias,book` rows of extra abbreviations
    /// * `synonyms` - `synonym,book` rows of colloquial names
    ///
    /// # Returns
    /// The table, or an error naming the first malformed row or ambiguous key.
    pub fn from_csv(books: &str, aliases: &str, synonyms: &str) -> Result<Self> {
        let mut table = BookTable {
            books: Vec::with_capacity(BOOK_COUNT),
            by_name: HashMap::new(),
            by_abbreviation: HashMap::new(),
            by_secondary_name: HashMap::new(),
            by_synonym: HashMap::new(),
            folded_names: Vec::with_capacity(BOOK_COUNT),
            folded_secondary_names: Vec::with_capacity(BOOK_COUNT),
        };

        let mut reader = Reader::from_reader(books.as_bytes());
        for result in reader.deserialize() {
            let record: BookRecord = result.context("Error reading book rows")?;
            let index = table.books.len();
            if usize::from(record.number) != index + 1 {
                bail!("book '{}' is out of canon order", record.name);
            }
            insert_unique(&mut table.by_name, fold_key(&record.name), index, "name")?;
            insert_unique(
                &mut table.by_abbreviation,
                abbreviation_key(&record.abbreviation),
                index,
                "abbreviation",
            )?;
            insert_unique(
                &mut table.by_secondary_name,
                fold_key(&record.secondary_name),
                index,
                "secondary name",
            )?;
            table.folded_names.push(fold_key(&record.name));
            table.folded_secondary_names.push(fold_key(&record.secondary_name));
            table.books.push(CanonicalBook {
                number: record.number,
                name: record.name,
                chapter_count: record.chapters,
                abbreviation: record.abbreviation,
                secondary_name: record.secondary_name,
                synonyms: Vec::new(),
            });
        }

        for record in read_keys(aliases)? {
            let index = table.position(&record.book)?;
            insert_unique(
                &mut table.by_abbreviation,
                abbreviation_key(&record.key),
                index,
                "alias",
            )?;
        }

        for record in read_keys(synonyms)? {
            let index = table.position(&record.book)?;
            insert_unique(&mut table.by_synonym, fold_key(&record.key), index, "synonym")?;
            table.books[index].synonyms.push(record.key);
        }

        Ok(table)
    }

    fn position(&self, name: &str) -> Result<usize> {
        self.by_name
            .get(&fold_key(name))
            .copied()
            .with_context(|| format!("unknown book '{name}'"))
    }

    /// All books in canon order.
    pub fn books(&self) -> &[CanonicalBook] {
        &self.books
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    /// Exact canonical-name lookup (case and punctuation insensitive).
    pub fn get(&self, name: &str) -> Option<&CanonicalBook> {
        self.by_name.get(&fold_key(name)).map(|&i| &self.books[i])
    }

    /// Lookup by 1-based canon position.
    pub fn by_number(&self, number: u8) -> Option<&CanonicalBook> {
        usize::from(number)
            .checked_sub(1)
            .and_then(|i| self.books.get(i))
    }

    /// Abbreviation or alias lookup; whitespace and case are ignored.
    pub fn by_abbreviation(&self, text: &str) -> Option<&CanonicalBook> {
        self.by_abbreviation
            .get(&abbreviation_key(text))
            .map(|&i| &self.books[i])
    }

    /// Official Telugu name lookup.
    pub fn by_secondary_name(&self, text: &str) -> Option<&CanonicalBook> {
        self.by_secondary_name
            .get(&fold_key(text))
            .map(|&i| &self.books[i])
    }

    /// Synonym lookup.
    pub fn by_synonym(&self, text: &str) -> Option<&CanonicalBook> {
        self.by_synonym.get(&fold_key(text)).map(|&i| &self.books[i])
    }

    /// First book in canon order whose canonical name starts with `prefix`.
    pub fn first_with_prefix(&self, prefix: &str) -> Option<&CanonicalBook> {
        first_prefixed(&self.folded_names, prefix).map(|i| &self.books[i])
    }

    /// First book in canon order whose Telugu name starts with `prefix`.
    pub fn first_secondary_with_prefix(&self, prefix: &str) -> Option<&CanonicalBook> {
        first_prefixed(&self.folded_secondary_names, prefix).map(|i| &self.books[i])
    }
}

fn first_prefixed(folded: &[String], prefix: &str) -> Option<usize> {
    let prefix = fold_key(prefix);
    if prefix.is_empty() {
        return None;
    }
    folded.iter().position(|name| name.starts_with(&prefix))
}

fn read_keys(data: &str) -> Result<Vec<KeyRecord>> {
    let mut reader = Reader::from_reader(data.as_bytes());
    let mut records = Vec::new();
    for result in reader.deserialize() {
        records.push(result.context("Error reading key rows")?);
    }
    Ok(records)
}

fn insert_unique(
    index: &mut HashMap<String, usize>,
    key: String,
    position: usize,
    what: &str,
) -> Result<()> {
    if key.is_empty() {
        bail!("empty {what} key");
    }
    match index.get(&key) {
        Some(&existing) if existing != position => {
            bail!("{what} '{key}' maps to two books ({existing} and {position})")
        }
        _ => {
            index.insert(key, position);
            Ok(())
        }
    }
}
