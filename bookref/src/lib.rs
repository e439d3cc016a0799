//! bookref - resolution of bilingual (English/Telugu) scripture references
//!
//! Free-form book names, abbreviations, Telugu names and colloquial
//! spellings, with numerals in Latin or Telugu digits, are resolved to one
//! canonical book and parsed into chapter/verse coordinates.

pub mod books;
pub mod canonical;
pub mod normalize;
pub mod reference;
pub mod search;
pub mod tokenize;

pub use books::{BookTable, CanonicalBook, BOOKS, BOOK_COUNT};
pub use canonical::{
    canonicalize, find_book_metadata, resolve_book, BookMetadata, Canonicalizer, Strategy,
};
pub use normalize::normalize_digits;
pub use reference::{parse_multiple, parse_reference, ParsedReference, ReferenceError};
pub use search::{route_query, QueryIntent};
