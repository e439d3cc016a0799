use bookref::{
    canonicalize, normalize_digits, parse_multiple, parse_reference, ParsedReference,
    ReferenceError, BOOKS, BOOK_COUNT,
};
use csv::Reader;
use serde::Deserialize;

const ALIASES_CSV: &str = include_str!("../data/aliases.csv");
const SYNONYMS_CSV: &str = include_str!("../data/synonyms.csv");
const CASES_CSV: &str = include_str!("../data/tests/resolve-cases.csv");

#[derive(Debug, Deserialize)]
struct KeyRow {
    #[serde(alias = "alias", alias = "synonym", alias = "input")]
    key: String,
    #[serde(alias = "expected")]
    book: String,
}

fn rows(data: &str) -> Vec<KeyRow> {
    Reader::from_reader(data.as_bytes())
        .deserialize()
        .collect::<Result<_, _>>()
        .expect("test data parses")
}

#[test]
fn test_every_primary_abbreviation_resolves() {
    for book in BOOKS.books() {
        assert_eq!(
            canonicalize(&book.abbreviation),
            book.name,
            "abbreviation {}",
            book.abbreviation
        );
    }
}

#[test]
fn test_every_alias_resolves() {
    for row in rows(ALIASES_CSV) {
        assert_eq!(canonicalize(&row.key), row.book, "alias {}", row.key);
        assert_eq!(
            canonicalize(&row.key.to_lowercase()),
            row.book,
            "lowercased alias {}",
            row.key
        );
    }
}

#[test]
fn test_every_synonym_resolves() {
    for row in rows(SYNONYMS_CSV) {
        assert_eq!(canonicalize(&row.key), row.book, "synonym {}", row.key);
    }
}

#[test]
fn test_every_secondary_name_resolves() {
    for book in BOOKS.books() {
        assert_eq!(canonicalize(&book.secondary_name), book.name);
    }
}

#[test]
fn test_canonical_names_are_fixed_points() {
    assert_eq!(BOOKS.len(), BOOK_COUNT);
    for book in BOOKS.books() {
        let once = canonicalize(&book.name);
        assert_eq!(once, book.name);
        assert_eq!(canonicalize(&once), once);
    }
}

#[test]
fn test_numbered_books_stay_distinct() {
    assert_ne!(canonicalize("1 John"), canonicalize("John"));
    assert_ne!(canonicalize("1 యోహాను"), canonicalize("యోహాను"));
    assert_ne!(canonicalize("2 Samuel"), canonicalize("1 Samuel"));
}

#[test]
fn test_evaluation_cases() {
    for row in rows(CASES_CSV) {
        assert_eq!(canonicalize(&row.key), row.book, "case {}", row.key);
    }
}

#[test]
fn test_canonicalize_is_total() {
    // Deterministic pseudo-random strings over a mixed alphabet.
    let alphabet: Vec<char> = "aZ1 3:-.,;'’\u{200B}\u{0C15}\u{0C4D}\u{0C3F}\u{0C67}\u{05D0}\u{03B1}?!"
        .chars()
        .collect();
    let mut state: u64 = 0x2545_F491_4F6C_DD1D;
    for _ in 0..2000 {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        let len = (state % 12) as usize;
        let text: String = (0..len)
            .map(|i| alphabet[((state >> (i * 5)) % alphabet.len() as u64) as usize])
            .collect();
        let _ = canonicalize(&text);
        let _ = parse_reference(&text);
        let _ = parse_multiple(&text);
    }
}

#[test]
fn test_parse_reference_examples() {
    assert_eq!(
        parse_reference("Genesis 1:1"),
        Ok(ParsedReference {
            book: "Genesis".to_string(),
            chapter: 1,
            start_verse: 1,
            end_verse: None,
        })
    );
    assert_eq!(
        parse_reference("1 Timothy 2:1-4"),
        Ok(ParsedReference {
            book: "1 Timothy".to_string(),
            chapter: 2,
            start_verse: 1,
            end_verse: Some(4),
        })
    );
    assert!(matches!(
        parse_reference("Genesis 51:1"),
        Err(ReferenceError::ChapterOutOfRange { chapter: 51, .. })
    ));
}

#[test]
fn test_parse_multiple_examples() {
    let refs = parse_multiple("John 3:16, Romans 8:1");
    assert_eq!(refs.len(), 2);
    assert_eq!(refs[0].book, "John");
    assert_eq!(refs[1].book, "Romans");
    assert_eq!(parse_multiple(""), Vec::<ParsedReference>::new());
}

#[test]
fn test_digit_normalization() {
    let once = normalize_digits("౧౨౩");
    assert_eq!(once, "123");
    assert_eq!(normalize_digits(&once), once);
}
