use bookref::parse_reference;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use studytext::{
    is_ascii_transliteration, CsvVerseSource, GenerationError, Language, Reshaper, RetryPolicy,
    RetryingGenerator, SchemeTransliterator, SearchOutcome, StudyConfig, StudyKind, StudyService,
    TextGenerator, DEFAULT_SCHEME,
};

const SAMPLE_VERSES: &str = include_str!("../data/verses/sample.csv");

const GREEK_ANALYSIS: &str = "Of course! Here is the breakdown.\n\n\
    ## 1) Text (Greek)\n\
    Οὕτως γὰρ ἠγάπησεν ὁ θεὸς τὸν κόσμον\n\n\
    ## 2) Transliteration\n\
    Hoútōs gàr ēgápēsen ho theòs tòn kósmon\n\n\
    ## 3) Translation\n\
    For God so loved the world\n\n\
    ## 4) Word-by-Word\n\
    Οὕτως (Hoútōs) - so γὰρ (gàr) - for ἠγάπησεν (ēgápēsen) - loved\n\
    ὁ θεὸς (ho theòs) - God\n";

/// Fails the first `failures` calls as overloaded, then answers.
struct Flaky {
    failures: usize,
    calls: AtomicUsize,
    reply: &'static str,
}

impl TextGenerator for Flaky {
    fn generate(&self, _prompt: &str, _model: &str) -> Result<String, GenerationError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if n < self.failures {
            Err(GenerationError::Unavailable)
        } else {
            Ok(self.reply.to_string())
        }
    }
}

fn word_lines(reshaped: &str) -> Vec<&str> {
    reshaped
        .split("\n\n")
        .find(|block| block.starts_with("**4. "))
        .map(|block| block.lines().skip(1).collect())
        .unwrap_or_default()
}

#[test]
fn test_reshape_greek_analysis() {
    let out = Reshaper::new(Language::English).reshape(GREEK_ANALYSIS, false);
    assert!(out.starts_with("**1. Text**\n"));
    assert!(out.contains("**2. Transliteration**\nHoutos gar egapesen ho theos ton kosmon"));
    assert!(out.contains("**3. Translation**\nFor God so loved the world"));
    assert_eq!(
        word_lines(&out),
        [
            "Οὕτως (Houtos) - so",
            "γὰρ (gar) - for",
            "ἠγάπησεν (egapesen) - loved",
            "ὁ θεὸς (ho theos) - God",
        ]
    );
}

#[test]
fn test_reshaped_transliterations_are_ascii() {
    let out = Reshaper::new(Language::English).reshape(GREEK_ANALYSIS, false);
    for line in word_lines(&out) {
        let open = line.find('(').expect("has transliteration");
        let close = line.find(')').expect("closes");
        assert!(is_ascii_transliteration(&line[open + 1..close]), "{line}");
    }
}

#[test]
fn test_reshape_to_telugu_with_transliterator() {
    let raw = "**2. Transliteration:**\nšālôm\n**4. Word-by-Word:**\nשָׁלוֹם (šālôm) - peace";
    let transliterator = SchemeTransliterator::new(DEFAULT_SCHEME).expect("default scheme");
    let out = Reshaper::new(Language::Telugu)
        .with_transliterator(Box::new(transliterator))
        .reshape(raw, false);
    assert_eq!(
        out,
        "**2. లిప్యంతరీకరణ**\nషలొం\n\n**4. పదం వారీగా**\nשָׁלוֹם (షలొం) - peace"
    );
}

#[test]
fn test_retrying_service_recovers_from_overload() {
    let mut config = StudyConfig {
        cache_capacity: 8,
        ..StudyConfig::default()
    };
    config.retry.base_delay_ms = 0;
    let generator = Flaky {
        failures: 2,
        calls: AtomicUsize::new(0),
        reply: GREEK_ANALYSIS,
    };
    let verses = CsvVerseSource::from_reader(SAMPLE_VERSES.as_bytes()).expect("sample verses");
    let service = StudyService::from_config(&config, generator, verses).expect("service");

    let reference = parse_reference("jn 3:16").expect("parses");
    let text = service.study(&reference, StudyKind::Interlinear).expect("study text");
    assert_eq!(word_lines(&text).len(), 4);
    let again = service.study(&reference, StudyKind::Interlinear).expect("cached");
    assert_eq!(text, again);
    assert_eq!(service.cache().len(), 1);
}

#[test]
fn test_exhausted_retries_surface_the_error() {
    let generator = RetryingGenerator::new(
        Flaky {
            failures: usize::MAX,
            calls: AtomicUsize::new(0),
            reply: "",
        },
        RetryPolicy {
            max_attempts: 2,
            base_delay: Duration::ZERO,
            cooldown: Duration::from_secs(60),
            fallback_models: vec!["backup".to_string()],
        },
    );
    let verses = CsvVerseSource::from_reader(SAMPLE_VERSES.as_bytes()).expect("sample verses");
    let service = StudyService::new(generator, verses);
    let reference = parse_reference("Genesis 1:1").expect("parses");
    assert!(service.study(&reference, StudyKind::Commentary).is_err());
    assert!(service.cache().is_empty());
}

#[test]
fn test_sample_passages_in_both_scripts() {
    let verses = CsvVerseSource::from_reader(SAMPLE_VERSES.as_bytes()).expect("sample verses");
    let service = StudyService::new(
        Flaky {
            failures: 0,
            calls: AtomicUsize::new(0),
            reply: "",
        },
        verses,
    );
    for query in ["1 తిమోతి 2:1-4", "1 Tim 2:1-4", "I Timothy 2:1-4"] {
        let SearchOutcome::Navigate(reference) = service.search(query).expect("routes") else {
            panic!("{query} should navigate");
        };
        let rows = service.passage(&reference).expect("verses");
        assert_eq!(rows.iter().map(|r| r.verse).collect::<Vec<_>>(), [1, 2, 3, 4]);
    }
}
