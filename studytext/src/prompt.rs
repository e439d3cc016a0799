//! Prompt construction for the text generator.
//!
//! Prompts only ever carry canonical English book names; whatever script the
//! user typed has been resolved by the time a prompt is built.

use anyhow::{bail, Result};
use bookref::ParsedReference;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

use crate::reshape::Section;

/// Output language of generated study text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    Telugu,
}

impl Language {
    pub fn name(self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Telugu => "Telugu",
        }
    }
}

impl FromStr for Language {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "en" | "english" => Ok(Language::English),
            "te" | "telugu" | "తెలుగు" => Ok(Language::Telugu),
            other => bail!("unknown language '{other}'"),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The kind of study text requested for a verse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StudyKind {
    /// Four-section breakdown: source text, transliteration, translation,
    /// word-by-word glosses.
    Interlinear,
    Commentary,
    CrossReferences,
}

impl FromStr for StudyKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace(['-', '_'], "").as_str() {
            "interlinear" => Ok(StudyKind::Interlinear),
            "commentary" => Ok(StudyKind::Commentary),
            "crossreferences" | "xrefs" => Ok(StudyKind::CrossReferences),
            other => bail!("unknown study kind '{other}'"),
        }
    }
}

/// Prompt asking for study text on one reference.
///
/// # Arguments
/// * `reference` - the resolved reference; its canonical name is used
/// * `verse_text` - the verse text the reader is looking at
/// * `kind` - which study text to produce
/// * `language` - language of the explanation
pub fn analysis_prompt(
    reference: &ParsedReference,
    verse_text: &str,
    kind: StudyKind,
    language: Language,
) -> String {
    let mut prompt = format!("Passage: {reference}\n\"{}\"\n\n", verse_text.trim());
    match kind {
        StudyKind::Interlinear => {
            let titles = Section::ALL.map(|section| section.title(language));
            prompt.push_str(&format!(
                "Give an interlinear breakdown of this passage in the original Hebrew or Greek, \
                 written in {language}, with exactly four numbered sections:\n\
                 **1. {}**: the original-language text.\n\
                 **2. {}**: a plain ASCII romanization without diacritics.\n\
                 **3. {}**: a literal translation.\n\
                 **4. {}**: one entry per line, formatted as `word (transliteration) - gloss`.\n",
                titles[0], titles[1], titles[2], titles[3]
            ));
        }
        StudyKind::Commentary => {
            prompt.push_str(&format!(
                "Write a short study commentary on this passage in {language}: historical \
                 context, key words, and how it connects to the surrounding chapter.\n"
            ));
        }
        StudyKind::CrossReferences => {
            prompt.push_str(
                "List up to eight related passages as `Book chapter:verse` separated by \
                 semicolons. Use English book names. Reply with the list only.\n",
            );
        }
    }
    prompt
}

/// Prompt asking the generator to find references for a keyword search.
pub fn discovery_prompt(keyword: &str, language: Language) -> String {
    format!(
        "A reader searched a {language} Bible for: \"{}\".\n\
         List up to eight passages that best match, as `Book chapter:verse` separated by \
         semicolons. Use English book names even if the search is in Telugu. \
         Reply with the list only.\n",
        keyword.trim()
    )
}
