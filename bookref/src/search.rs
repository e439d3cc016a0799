//! Routing of free-text search input.

use crate::normalize::clean_input;
use crate::reference::{parse_multiple, parse_reference, ParsedReference};

/// What a search box entry asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryIntent {
    /// A single reference: jump straight to it.
    Navigate(ParsedReference),
    /// A delimited list that produced at least one reference.
    References(Vec<ParsedReference>),
    /// No reference pattern matched; hand the text to keyword discovery.
    Keyword(String),
    Empty,
}

/// Decide whether `text` is a reference, a reference list or a keyword.
///
/// # Examples
///
/// ```
/// use bookref::search::{route_query, QueryIntent};
///
/// assert!(matches!(route_query("Genesis 1:1"), QueryIntent::Navigate(_)));
/// assert!(matches!(route_query("John 3:16; Rom 8:1"), QueryIntent::References(_)));
/// assert!(matches!(route_query("forgiveness"), QueryIntent::Keyword(_)));
/// ```
pub fn route_query(text: &str) -> QueryIntent {
    let cleaned = clean_input(text);
    if cleaned.is_empty() {
        return QueryIntent::Empty;
    }
    if !cleaned.contains([';', ',']) {
        if let Ok(reference) = parse_reference(&cleaned) {
            return QueryIntent::Navigate(reference);
        }
        return QueryIntent::Keyword(cleaned);
    }
    match parse_multiple(&cleaned) {
        references if references.is_empty() => QueryIntent::Keyword(cleaned),
        references => QueryIntent::References(references),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_reference_navigates() {
        match route_query("  యోహాను ౩:౧౬ ") {
            QueryIntent::Navigate(r) => assert_eq!(r.to_string(), "John 3:16"),
            other => panic!("expected navigation, got {other:?}"),
        }
    }

    #[test]
    fn test_list_keeps_order() {
        match route_query("Romans 8:1, John 3:16") {
            QueryIntent::References(refs) => {
                let names: Vec<_> = refs.iter().map(|r| r.book.as_str()).collect();
                assert_eq!(names, ["Romans", "John"]);
            }
            other => panic!("expected references, got {other:?}"),
        }
    }

    #[test]
    fn test_single_item_list_is_still_a_list() {
        assert!(matches!(
            route_query("John 3:16;"),
            QueryIntent::References(refs) if refs.len() == 1
        ));
    }

    #[test]
    fn test_keywords() {
        assert_eq!(
            route_query("love your enemies"),
            QueryIntent::Keyword("love your enemies".to_string())
        );
        assert_eq!(
            route_query("faith, hope"),
            QueryIntent::Keyword("faith, hope".to_string())
        );
        // Out-of-range references are not navigable; they fall to discovery.
        assert!(matches!(route_query("Genesis 51:1"), QueryIntent::Keyword(_)));
    }

    #[test]
    fn test_empty() {
        assert_eq!(route_query(""), QueryIntent::Empty);
        assert_eq!(route_query(" \u{200B} "), QueryIntent::Empty);
    }
}
