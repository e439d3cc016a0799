//! studytext - post-processing and service plumbing for generated
//! scripture study text
//!
//! Generated interlinear analyses are reshaped into four canonical
//! sections, romanizations are forced to plain ASCII (or converted to Telugu
//! letters), and a [`StudyService`] ties reference resolution from
//! [`bookref`] to a text generator and a verse source behind traits.

pub mod cache;
pub mod config;
pub mod generate;
pub mod prompt;
pub mod reshape;
pub mod sanitize;
pub mod service;
pub mod transliterate;
pub mod verses;

pub use cache::BoundedCache;
pub use config::{RetryConfig, StudyConfig};
pub use generate::{GenerationError, RetryPolicy, RetryingGenerator, TextGenerator};
pub use prompt::{analysis_prompt, discovery_prompt, Language, StudyKind};
pub use reshape::{
    segment_word_glosses, AnalysisDocument, Reshaper, Section, SegmentStrategy, SourceScript,
    WordGloss, WordLine,
};
pub use sanitize::{is_ascii_transliteration, is_pure_secondary, sanitize_transliteration};
pub use service::{AnalysisKey, SearchOutcome, StudyError, StudyService};
pub use transliterate::{SchemeTransliterator, Transliterator, DEFAULT_SCHEME};
pub use verses::{CsvVerseSource, FetchError, VerseRow, VerseSource};
