//! The study service: reference routing, passage lookup and cached,
//! reshaped study text over the generator and verse-source collaborators.

use anyhow::Result;
use bookref::{parse_multiple, route_query, ParsedReference, QueryIntent, ReferenceError};
use itertools::Itertools;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::cache::BoundedCache;
use crate::config::StudyConfig;
use crate::generate::{GenerationError, RetryingGenerator, TextGenerator};
use crate::prompt::{analysis_prompt, discovery_prompt, Language, StudyKind};
use crate::reshape::Reshaper;
use crate::transliterate::SchemeTransliterator;
use crate::verses::{FetchError, VerseRow, VerseSource};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StudyError {
    #[error(transparent)]
    Reference(#[from] ReferenceError),
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("no verses in {0}")]
    NoVerses(String),
}

/// Key of the response cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnalysisKey {
    pub book: String,
    pub chapter: u32,
    pub verse: u32,
    pub end_verse: Option<u32>,
    pub kind: StudyKind,
    pub language: Language,
}

impl AnalysisKey {
    pub fn new(reference: &ParsedReference, kind: StudyKind, language: Language) -> Self {
        Self {
            book: reference.book.clone(),
            chapter: reference.chapter,
            verse: reference.start_verse,
            end_verse: reference.end_verse,
            kind,
            language,
        }
    }
}

/// What a search box query turned into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// A single reference to jump to.
    Navigate(ParsedReference),
    /// A list of references, typed directly or suggested by the generator.
    Results(Vec<ParsedReference>),
    NoResults,
}

pub struct StudyService<G, V> {
    generator: G,
    verses: V,
    cache: BoundedCache<AnalysisKey, String>,
    reshaper: Reshaper,
    model: String,
}

impl<G: TextGenerator, V: VerseSource> StudyService<G, V> {
    /// Service with the default configuration and no transliterator.
    pub fn new(generator: G, verses: V) -> Self {
        let config = StudyConfig::default();
        Self {
            generator,
            verses,
            cache: BoundedCache::new(config.cache_capacity),
            reshaper: Reshaper::new(config.language),
            model: config.model,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache = BoundedCache::new(capacity);
        self
    }

    /// Replaces the reshaper; its language is the output language.
    pub fn with_reshaper(mut self, reshaper: Reshaper) -> Self {
        self.cache.clear();
        self.reshaper = reshaper;
        self
    }

    pub fn language(&self) -> Language {
        self.reshaper.language()
    }

    pub fn cache(&self) -> &BoundedCache<AnalysisKey, String> {
        &self.cache
    }

    /// Route a search box query. Keywords go to the generator, whose
    /// suggestions are parsed like a typed reference list.
    pub fn search(&self, query: &str) -> Result<SearchOutcome, StudyError> {
        match route_query(query) {
            QueryIntent::Empty => Ok(SearchOutcome::NoResults),
            QueryIntent::Navigate(reference) => Ok(SearchOutcome::Navigate(reference)),
            QueryIntent::References(references) => Ok(SearchOutcome::Results(references)),
            QueryIntent::Keyword(keyword) => {
                debug!(%keyword, "asking the generator for matching passages");
                let prompt = discovery_prompt(&keyword, self.language());
                let text = self.generator.generate(&prompt, &self.model)?;
                let references = parse_multiple(&text);
                if references.is_empty() {
                    info!(%keyword, "generator suggested no usable references");
                    Ok(SearchOutcome::NoResults)
                } else {
                    Ok(SearchOutcome::Results(references))
                }
            }
        }
    }

    /// Verses of `reference`, fetched by canonical name.
    pub fn passage(&self, reference: &ParsedReference) -> Result<Vec<VerseRow>, StudyError> {
        let rows: Vec<VerseRow> = self
            .verses
            .fetch_chapter(&reference.book, reference.chapter)?
            .into_iter()
            .filter(|row| reference.contains_verse(row.verse))
            .collect();
        if rows.is_empty() {
            return Err(StudyError::NoVerses(reference.to_string()));
        }
        Ok(rows)
    }

    fn verse_text(&self, reference: &ParsedReference) -> String {
        match self.passage(reference) {
            Ok(rows) => rows
                .iter()
                .map(|row| match self.language() {
                    Language::English => row.english.as_str(),
                    Language::Telugu => row.telugu.as_str(),
                })
                .join(" "),
            Err(e) => {
                warn!(%reference, error = %e, "studying without verse text");
                String::new()
            }
        }
    }

    /// Generated study text for `reference`, cached per reference, kind
    /// and language. Interlinear text is reshaped before it is cached.
    pub fn study(
        &self,
        reference: &ParsedReference,
        kind: StudyKind,
    ) -> Result<String, StudyError> {
        let language = self.language();
        let key = AnalysisKey::new(reference, kind, language);
        self.cache.get_or_try_insert_with(key, || {
            let prompt = analysis_prompt(reference, &self.verse_text(reference), kind, language);
            let text = self.generator.generate(&prompt, &self.model)?;
            Ok(match kind {
                StudyKind::Interlinear => self.reshaper.reshape(&text, false),
                StudyKind::Commentary | StudyKind::CrossReferences => text.trim().to_string(),
            })
        })
    }

    /// Related passages suggested by the generator, without the passage
    /// itself and without duplicates.
    pub fn cross_references(
        &self,
        reference: &ParsedReference,
    ) -> Result<Vec<ParsedReference>, StudyError> {
        let text = self.study(reference, StudyKind::CrossReferences)?;
        Ok(parse_multiple(&text)
            .into_iter()
            .filter(|r| r != reference)
            .unique()
            .collect())
    }
}

impl<G: TextGenerator, V: VerseSource> StudyService<RetryingGenerator<G>, V> {
    /// Service configured from `config`, wrapping `generator` in retries.
    /// Telugu output gets the configured transliteration scheme.
    pub fn from_config(config: &StudyConfig, generator: G, verses: V) -> Result<Self> {
        let mut reshaper = Reshaper::new(config.language);
        if config.language == Language::Telugu {
            let transliterator = SchemeTransliterator::new(&config.transliteration_scheme)?;
            reshaper = reshaper.with_transliterator(Box::new(transliterator));
        }
        Ok(Self {
            generator: RetryingGenerator::new(generator, config.retry_policy()),
            verses,
            cache: BoundedCache::new(config.cache_capacity),
            reshaper,
            model: config.model.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verses::CsvVerseSource;
    use bookref::parse_reference;
    use std::sync::Mutex;

    const VERSES: &str = "book,chapter,verse,english,telugu\n\
        43,3,16,\"For God so loved the world\",\"దేవుడు లోకమును ప్రేమించెను\"\n\
        43,3,17,\"For God sent not his Son\",\"తీర్పు తీర్చుటకు పంపలేదు\"\n";

    /// Returns one canned reply and records every prompt.
    struct Canned {
        reply: String,
        prompts: Mutex<Vec<String>>,
    }

    impl Canned {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    impl TextGenerator for Canned {
        fn generate(&self, prompt: &str, _model: &str) -> Result<String, GenerationError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(self.reply.clone())
        }
    }

    fn service(reply: &str) -> StudyService<Canned, CsvVerseSource> {
        let verses = CsvVerseSource::from_reader(VERSES.as_bytes()).unwrap();
        StudyService::new(Canned::new(reply), verses)
    }

    #[test]
    fn test_search_routes_without_generator() {
        let s = service("unused");
        assert_eq!(
            s.search("jn 3:16").unwrap(),
            SearchOutcome::Navigate(parse_reference("John 3:16").unwrap())
        );
        assert!(matches!(s.search("Gen 1:1; Ex 2:3").unwrap(), SearchOutcome::Results(r) if r.len() == 2));
        assert_eq!(s.search("   ").unwrap(), SearchOutcome::NoResults);
        assert_eq!(s.generator.calls(), 0);
    }

    #[test]
    fn test_keyword_search_parses_suggestions() {
        let s = service("John 3:16; 1 John 4:8; Atlantis 1:1");
        let SearchOutcome::Results(found) = s.search("love").unwrap() else {
            panic!("expected results");
        };
        assert_eq!(
            found.iter().map(ToString::to_string).collect::<Vec<_>>(),
            ["John 3:16", "1 John 4:8"]
        );
        assert_eq!(service("no idea").search("love").unwrap(), SearchOutcome::NoResults);
    }

    #[test]
    fn test_passage_keeps_range() {
        let s = service("");
        let rows = s.passage(&parse_reference("John 3:16-17").unwrap()).unwrap();
        assert_eq!(rows.len(), 2);
        let rows = s.passage(&parse_reference("యోహాను 3:17").unwrap()).unwrap();
        assert_eq!(rows[0].verse, 17);
        assert!(matches!(
            s.passage(&parse_reference("John 3:30").unwrap()),
            Err(StudyError::NoVerses(_))
        ));
        assert!(matches!(
            s.passage(&parse_reference("Genesis 1:1").unwrap()),
            Err(StudyError::Fetch(FetchError::NotFound { .. }))
        ));
    }

    #[test]
    fn test_study_is_cached_and_reshaped() {
        let s = service("Sure!\n**1. Text:**\nΟὕτως\n**4. Word-by-Word**\nΟὕτως (hoútōs) - so");
        let reference = parse_reference("John 3:16").unwrap();
        let first = s.study(&reference, StudyKind::Interlinear).unwrap();
        assert_eq!(first, "**1. Text**\nΟὕτως\n\n**4. Word-by-Word**\nΟὕτως (houtos) - so");
        let second = s.study(&reference, StudyKind::Interlinear).unwrap();
        assert_eq!(first, second);
        assert_eq!(s.generator.calls(), 1);
        assert!(s.generator.prompts.lock().unwrap()[0].contains("For God so loved the world"));

        s.study(&reference, StudyKind::Commentary).unwrap();
        assert_eq!(s.generator.calls(), 2);
        assert_eq!(s.cache().len(), 2);
    }

    #[test]
    fn test_cross_references_drop_self_and_duplicates() {
        let s = service("John 3:16; Rom 5:8, Romans 5:8; 1 Jn 4:9");
        let refs = s.cross_references(&parse_reference("John 3:16").unwrap()).unwrap();
        assert_eq!(
            refs.iter().map(ToString::to_string).collect::<Vec<_>>(),
            ["Romans 5:8", "1 John 4:9"]
        );
    }

    #[test]
    fn test_from_config_telugu() {
        let config =
            StudyConfig::from_toml_str("language = \"telugu\"\ncache_capacity = 0").unwrap();
        let verses = CsvVerseSource::from_reader(VERSES.as_bytes()).unwrap();
        let s = StudyService::from_config(&config, Canned::new("x"), verses).unwrap();
        assert_eq!(s.language(), Language::Telugu);
        let reference = parse_reference("John 3:16").unwrap();
        s.study(&reference, StudyKind::Commentary).unwrap();
        s.study(&reference, StudyKind::Commentary).unwrap();
        assert_eq!(s.generator.inner().calls(), 2);

        let bad = StudyConfig {
            language: Language::Telugu,
            transliteration_scheme: "xx_Nope".to_string(),
            ..StudyConfig::default()
        };
        let verses = CsvVerseSource::default();
        assert!(StudyService::from_config(&bad, Canned::new("x"), verses).is_err());
    }
}
