use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fs;

#[derive(Debug, Deserialize)]
struct BookRow {
    number: u8,
    name: String,
    chapters: u32,
    abbreviation: String,
    secondary_name: String,
}

#[derive(Debug, Deserialize)]
struct KeyRow {
    #[serde(alias = "alias", alias = "synonym")]
    key: String,
    book: String,
}

fn main() -> Result<()> {
    println!("cargo:rerun-if-changed=data/");

    let books: Vec<BookRow> = read_rows("data/books.csv")?;
    if books.len() != 66 {
        bail!("data/books.csv must list 66 books, found {}", books.len());
    }
    let mut names = HashSet::new();
    for (index, book) in books.iter().enumerate() {
        if usize::from(book.number) != index + 1 {
            bail!(
                "data/books.csv is out of canon order at '{}' (number {}, row {})",
                book.name,
                book.number,
                index + 1
            );
        }
        if book.chapters == 0 {
            bail!("book '{}' has no chapters", book.name);
        }
        if book.abbreviation.trim().is_empty() || book.secondary_name.trim().is_empty() {
            bail!("book '{}' is missing an abbreviation or a secondary name", book.name);
        }
        names.insert(book.name.clone());
    }

    // Keys may point many-to-one, never one-to-many.
    let mut abbreviations: HashMap<String, String> = books
        .iter()
        .map(|b| (fold(&b.abbreviation, true), b.name.clone()))
        .collect();
    let aliases: Vec<KeyRow> = read_rows("data/aliases.csv")?;
    check_keys("data/aliases.csv", &aliases, &names, &mut abbreviations, true)?;

    let mut synonyms = HashMap::new();
    let synonym_rows: Vec<KeyRow> = read_rows("data/synonyms.csv")?;
    check_keys("data/synonyms.csv", &synonym_rows, &names, &mut synonyms, false)?;

    Ok(())
}

fn read_rows<T: for<'de> Deserialize<'de>>(path: &str) -> Result<Vec<T>> {
    let content = fs::read_to_string(path).with_context(|| format!("Failed to read {path}"))?;
    let mut reader = csv::Reader::from_reader(content.as_bytes());
    let mut rows = Vec::new();
    for record in reader.deserialize() {
        rows.push(record.with_context(|| format!("Malformed row in {path}"))?);
    }
    Ok(rows)
}

fn check_keys(
    path: &str,
    rows: &[KeyRow],
    names: &HashSet<String>,
    seen: &mut HashMap<String, String>,
    squash_spaces: bool,
) -> Result<()> {
    for row in rows {
        if !names.contains(&row.book) {
            bail!("{path}: '{}' points at unknown book '{}'", row.key, row.book);
        }
        let key = fold(&row.key, squash_spaces);
        if key.is_empty() {
            bail!("{path}: empty key for '{}'", row.book);
        }
        match seen.get(&key) {
            Some(existing) if existing != &row.book => bail!(
                "{path}: '{}' maps to both '{}' and '{}'",
                row.key,
                existing,
                row.book
            ),
            _ => {
                seen.insert(key, row.book.clone());
            }
        }
    }
    Ok(())
}

// Mirrors `normalize::fold_key` closely enough to catch collisions.
fn fold(text: &str, squash_spaces: bool) -> String {
    let lowered: String = text
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_ascii_punctuation())
        .collect();
    let words: Vec<&str> = lowered.split_whitespace().collect();
    if squash_spaces {
        words.concat()
    } else {
        words.join(" ")
    }
}
