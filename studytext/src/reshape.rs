//! Reshaping of generated interlinear text.
//!
//! Generated study text is supposed to carry four numbered sections (source
//! text, transliteration, translation, word-by-word glosses), but the header
//! formatting drifts between responses and the word-by-word entries are
//! often run together on one line. [`Reshaper`] folds the lines into
//! sections, rewrites every header in one canonical form, forces
//! transliterations to ASCII and puts exactly one
//! `word (transliteration) - gloss` entry on each line.
//!
//! Word-by-word entries are recovered by tokenizing the section body into
//! source-script runs, parenthesized groups, plain text and line breaks, then
//! folding the tokens with the first strategy that finds anything:
//!
//! 1. [`SegmentStrategy::StrictTriples`]: script run, parenthesized
//!    transliteration, separator, gloss;
//! 2. [`SegmentStrategy::ScriptParenLines`]: script run and parenthesized
//!    transliteration, gloss optional;
//! 3. [`SegmentStrategy::ScriptBreaks`]: a line break before every script run.
//!
//! When none applies the body keeps its layout. Whatever the strategy, every
//! parenthesized group in the word-by-word section is forced to ASCII, as are
//! groups in the source text that follow a source word or carry
//! diacritics. Reshaping never fails; the worst case is the unchanged input
//! and a warning in the log.

use bookref::normalize::{is_secondary_char, normalize_digits};
use std::fmt;
use tracing::{debug, warn};
use unicode_normalization::char::is_combining_mark;

use crate::prompt::Language;
use crate::sanitize::{is_pure_secondary, sanitize_transliteration};
use crate::transliterate::Transliterator;

/// The four sections of an interlinear analysis, in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Section {
    SourceText,
    Transliteration,
    Translation,
    WordByWord,
}

impl Section {
    pub const ALL: [Section; 4] = [
        Section::SourceText,
        Section::Transliteration,
        Section::Translation,
        Section::WordByWord,
    ];

    pub fn number(self) -> usize {
        self as usize + 1
    }

    pub fn title(self, language: Language) -> &'static str {
        match (language, self) {
            (Language::English, Section::SourceText) => "Text",
            (Language::English, Section::Transliteration) => "Transliteration",
            (Language::English, Section::Translation) => "Translation",
            (Language::English, Section::WordByWord) => "Word-by-Word",
            (Language::Telugu, Section::SourceText) => "మూల పాఠం",
            (Language::Telugu, Section::Transliteration) => "లిప్యంతరీకరణ",
            (Language::Telugu, Section::Translation) => "అనువాదం",
            (Language::Telugu, Section::WordByWord) => "పదం వారీగా",
        }
    }

    /// Canonical header line, e.g. `**2. Transliteration**`.
    pub fn header(self, language: Language) -> String {
        format!("**{}. {}**", self.number(), self.title(language))
    }
}

const TITLE_ALIASES: &[(&str, Section)] = &[
    ("text", Section::SourceText),
    ("source text", Section::SourceText),
    ("original text", Section::SourceText),
    ("hebrew text", Section::SourceText),
    ("greek text", Section::SourceText),
    ("మూల పాఠం", Section::SourceText),
    ("మూలపాఠం", Section::SourceText),
    ("మూల వచనం", Section::SourceText),
    ("పాఠం", Section::SourceText),
    ("transliteration", Section::Transliteration),
    ("romanization", Section::Transliteration),
    ("లిప్యంతరీకరణ", Section::Transliteration),
    ("లిప్యంతరణ", Section::Transliteration),
    ("ఉచ్చారణ", Section::Transliteration),
    ("translation", Section::Translation),
    ("literal translation", Section::Translation),
    ("అనువాదం", Section::Translation),
    ("అనువాదము", Section::Translation),
    ("తర్జుమా", Section::Translation),
    ("word-by-word", Section::WordByWord),
    ("word by word", Section::WordByWord),
    ("word-for-word", Section::WordByWord),
    ("word for word", Section::WordByWord),
    ("word-by-word analysis", Section::WordByWord),
    ("word by word analysis", Section::WordByWord),
    ("word-by-word breakdown", Section::WordByWord),
    ("interlinear", Section::WordByWord),
    ("పదం వారీగా", Section::WordByWord),
    ("పదాల వారీగా", Section::WordByWord),
    ("పద విశ్లేషణ", Section::WordByWord),
];

fn is_title_boundary(tail: &str) -> bool {
    tail.chars()
        .next()
        .map_or(true, |c| c.is_whitespace() || matches!(c, ':' | '*' | '_' | '(' | ')' | '.'))
}

/// Recognize a section header line, returning the section and any content
/// that followed the header on the same line.
///
/// Accepts `#` prefixes, bold or italic markers, a section number in ASCII
/// or Telugu digits followed by `.`, `)` or `:`, English or Telugu titles,
/// a parenthesized qualifier and a trailing colon. Content on the same line
/// is only accepted after a `#`, bold or numbered header; an unmarked title
/// must stand alone, with at most a trailing colon.
fn parse_header(line: &str) -> Option<(Section, String)> {
    let line = normalize_digits(line.trim());
    let mut rest = line.trim_start_matches('#').trim_start();
    let mut prefixed = rest.len() != line.len();

    let unbolded = rest.trim_start_matches(['*', '_']);
    prefixed |= unbolded.len() != rest.len();
    rest = unbolded.trim_start();

    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits > 0 {
        let after = &rest[digits..];
        let delimited = after.strip_prefix(['.', ')', ':']);
        if delimited.is_none() && !after.starts_with(char::is_whitespace) {
            return None;
        }
        prefixed = true;
        rest = delimited
            .unwrap_or(after)
            .trim_start()
            .trim_start_matches(['*', '_'])
            .trim_start();
    }

    let (title_len, section) = TITLE_ALIASES
        .iter()
        .filter(|(alias, _)| {
            rest.get(..alias.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(alias))
                && is_title_boundary(&rest[alias.len()..])
        })
        .map(|&(alias, section)| (alias.len(), section))
        .max_by_key(|&(len, _)| len)?;

    let mut tail = rest[title_len..].trim_start();
    if let Some(inner) = tail.strip_prefix('(') {
        if let Some(close) = inner.find(')') {
            let after = inner[close + 1..].trim_start();
            if after.is_empty() || after.starts_with([':', '*', '_']) {
                tail = after;
            }
        }
    }
    let content =
        tail.trim_start_matches(|c: char| c.is_whitespace() || matches!(c, ':' | '*' | '_'));

    if !prefixed && !content.is_empty() {
        return None;
    }
    Some((section, content.trim_end().to_string()))
}

/// Fold lines into sections. Text before the first header is dropped;
/// a repeated header continues its section. `None` when no header exists.
fn split_sections(raw: &str) -> Option<Vec<(Section, String)>> {
    let mut sections: Vec<(Section, Vec<String>)> = Vec::new();
    let mut current: Option<usize> = None;
    let mut preamble = 0;

    for line in raw.lines() {
        if let Some((section, inline)) = parse_header(line) {
            let index = match sections.iter().position(|(s, _)| *s == section) {
                Some(index) => index,
                None => {
                    sections.push((section, Vec::new()));
                    sections.len() - 1
                }
            };
            if !inline.is_empty() {
                sections[index].1.push(inline);
            }
            current = Some(index);
        } else if let Some(index) = current {
            sections[index].1.push(line.to_string());
        } else if !line.trim().is_empty() {
            preamble += 1;
        }
    }

    if sections.is_empty() {
        return None;
    }
    if preamble > 0 {
        debug!(lines = preamble, "dropping text before the first section header");
    }
    sections.sort_by_key(|(section, _)| *section);
    Some(
        sections
            .into_iter()
            .map(|(section, lines)| (section, lines.join("\n").trim().to_string()))
            .collect(),
    )
}

/// Script of the words being glossed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceScript {
    /// Hebrew or Greek.
    Original,
    Telugu,
}

impl SourceScript {
    pub fn from_secondary_flag(is_secondary_script_source: bool) -> Self {
        if is_secondary_script_source {
            SourceScript::Telugu
        } else {
            SourceScript::Original
        }
    }

    pub fn contains(self, c: char) -> bool {
        match self {
            SourceScript::Original => {
                ('\u{0590}'..='\u{05FF}').contains(&c)
                    || ('\u{FB1D}'..='\u{FB4F}').contains(&c)
                    || ('\u{0370}'..='\u{03FF}').contains(&c)
                    || ('\u{1F00}'..='\u{1FFF}').contains(&c)
            }
            SourceScript::Telugu => is_secondary_char(c),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    /// Source-script words; runs separated only by spaces are one token.
    Script(&'a str),
    /// Contents of a parenthesized group closed on the same line.
    Paren(&'a str),
    Text(&'a str),
    Break,
}

fn script_run_end(text: &str, script: SourceScript) -> usize {
    let mut end = 0;
    for (i, c) in text.char_indices() {
        let joins = is_combining_mark(c) || matches!(c, '\u{200C}' | '\u{200D}');
        if script.contains(c) || (end > 0 && joins) {
            end = i + c.len_utf8();
            continue;
        }
        if c == ' ' || c == '\t' {
            let after = text[i..].trim_start_matches([' ', '\t']);
            if after.starts_with(|n: char| script.contains(n)) {
                continue;
            }
        }
        break;
    }
    end
}

fn tokenize(body: &str, script: SourceScript) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut rest = body;
    while let Some(c) = rest.chars().next() {
        let consumed = if c == '\n' {
            tokens.push(Token::Break);
            1
        } else if c == '(' {
            let line_end = rest.find('\n').unwrap_or(rest.len());
            match rest[..line_end].find(')') {
                Some(close) => {
                    tokens.push(Token::Paren(&rest[1..close]));
                    close + 1
                }
                None => {
                    tokens.push(Token::Text("("));
                    1
                }
            }
        } else if script.contains(c) {
            let end = script_run_end(rest, script);
            tokens.push(Token::Script(&rest[..end]));
            end
        } else {
            let end = rest
                .find(|n: char| n == '\n' || n == '(' || script.contains(n))
                .unwrap_or(rest.len());
            tokens.push(Token::Text(&rest[..end]));
            end
        };
        rest = &rest[consumed..];
    }
    tokens
}

fn is_blank_connector(text: &str) -> bool {
    text.chars().all(|c| matches!(c, ' ' | '\t' | '*' | '_'))
}

fn is_trailing_noise(c: char) -> bool {
    c.is_whitespace() || matches!(c, ',' | ';' | '-' | '–' | '—' | '*' | '_' | '•' | '|')
}

/// Drop a trailing `2.` or `3)` that belonged to the next entry.
fn strip_trailing_enumerator(text: &str) -> &str {
    let Some(body) = text.strip_suffix(['.', ')']) else {
        return text;
    };
    let number = body.trim_end_matches(|c: char| c.is_ascii_digit());
    if number.len() == body.len() {
        return text;
    }
    if number.is_empty() || number.ends_with(char::is_whitespace) {
        number.trim_end()
    } else {
        text
    }
}

/// Returns whether the gloss opened with a separator, and the cleaned gloss.
fn clean_gloss(raw: &str) -> (bool, String) {
    let text = raw.trim().trim_start_matches(['*', '_']).trim_start();
    let (separated, text) = match text.strip_prefix(['-', '–', '—', ':', '=']) {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let text = text.trim_end_matches(is_trailing_noise);
    let text = strip_trailing_enumerator(text).trim_end_matches(is_trailing_noise);
    (separated, text.trim_start_matches(['*', '_']).trim().to_string())
}

/// One word-by-word entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordGloss {
    pub source_word: String,
    pub transliteration: String,
    pub gloss: String,
}

impl fmt::Display for WordGloss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.source_word, self.transliteration)?;
        if !self.gloss.is_empty() {
            write!(f, " - {}", self.gloss)?;
        }
        Ok(())
    }
}

/// Fold strategy that recovered the word-by-word entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentStrategy {
    StrictTriples,
    ScriptParenLines,
    ScriptBreaks,
    /// Nothing recognizable; the body is kept verbatim.
    Raw,
}

/// A line of the reshaped word-by-word section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WordLine {
    Gloss(WordGloss),
    Text(String),
}

/// Every script run followed by a parenthesized group, paired with whether
/// it is a full triple (separator and non-empty gloss).
fn collect_entries(tokens: &[Token<'_>]) -> Vec<(bool, WordGloss)> {
    let mut entries = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        let Token::Script(word) = tokens[i] else {
            i += 1;
            continue;
        };
        let mut j = i + 1;
        while matches!(tokens.get(j), Some(Token::Text(t)) if is_blank_connector(t)) {
            j += 1;
        }
        let Some(Token::Paren(transliteration)) = tokens.get(j) else {
            i += 1;
            continue;
        };

        let mut k = j + 1;
        let mut gloss = String::new();
        while let Some(token) = tokens.get(k) {
            match token {
                Token::Text(t) => gloss.push_str(t),
                Token::Paren(p) => {
                    gloss.push('(');
                    gloss.push_str(p);
                    gloss.push(')');
                }
                Token::Script(_) | Token::Break => break,
            }
            k += 1;
        }

        let (separated, gloss) = clean_gloss(&gloss);
        let triple = separated && !gloss.is_empty();
        entries.push((
            triple,
            WordGloss {
                source_word: word.trim().to_string(),
                transliteration: transliteration.trim().to_string(),
                gloss,
            },
        ));
        i = k;
    }
    entries
}

fn script_break_lines(tokens: &[Token<'_>]) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut flush = |current: &mut String| {
        let line = current.trim();
        if !line.is_empty() {
            lines.push(line.to_string());
        }
        current.clear();
    };
    for token in tokens {
        match *token {
            Token::Break => flush(&mut current),
            Token::Script(word) => {
                flush(&mut current);
                current.push_str(word);
            }
            Token::Paren(p) => {
                current.push('(');
                current.push_str(p);
                current.push(')');
            }
            Token::Text(t) => current.push_str(t),
        }
    }
    flush(&mut current);
    lines
}

/// Re-segment a word-by-word section body.
///
/// Once any full triple is found, entries missing their separator are kept
/// too, with whatever text followed them as the gloss. Transliterations are
/// returned as written; cleaning them is up to the caller.
pub fn segment_word_glosses(
    body: &str,
    script: SourceScript,
) -> (SegmentStrategy, Vec<WordLine>) {
    let tokens = tokenize(body, script);

    let entries = collect_entries(&tokens);
    if !entries.is_empty() {
        let strategy = if entries.iter().any(|(triple, _)| *triple) {
            SegmentStrategy::StrictTriples
        } else {
            SegmentStrategy::ScriptParenLines
        };
        let lines = entries
            .into_iter()
            .map(|(_, gloss)| WordLine::Gloss(gloss))
            .collect();
        return (strategy, lines);
    }
    if tokens.iter().any(|t| matches!(t, Token::Script(_))) {
        return (
            SegmentStrategy::ScriptBreaks,
            script_break_lines(&tokens)
                .into_iter()
                .map(WordLine::Text)
                .collect(),
        );
    }
    (SegmentStrategy::Raw, vec![WordLine::Text(body.to_string())])
}

/// A group carrying letters that are neither ASCII nor one of the source
/// scripts, as romanizations with diacritics do.
fn looks_transliterated(group: &str) -> bool {
    group.chars().any(|c| {
        !c.is_ascii()
            && (c.is_alphabetic() || is_combining_mark(c))
            && !is_secondary_char(c)
            && !SourceScript::Original.contains(c)
    })
}

/// Rewrite the contents of every parenthesized group for which `rewrite`
/// returns `Some`. The flag passed along is whether the group directly
/// follows a source-script run.
fn map_parentheticals(
    text: &str,
    script: SourceScript,
    rewrite: impl Fn(&str, bool) -> Option<String>,
) -> String {
    let mut out = String::with_capacity(text.len());
    let mut after_script = false;
    for token in tokenize(text, script) {
        match token {
            Token::Script(word) => {
                out.push_str(word);
                after_script = true;
            }
            Token::Text(t) => {
                out.push_str(t);
                after_script &= is_blank_connector(t);
            }
            Token::Paren(p) => {
                out.push('(');
                match rewrite(p, after_script) {
                    Some(cleaned) => out.push_str(&cleaned),
                    None => out.push_str(p),
                }
                out.push(')');
                after_script = false;
            }
            Token::Break => {
                out.push('\n');
                after_script = false;
            }
        }
    }
    out
}

/// Post-processor for generated interlinear text.
pub struct Reshaper {
    language: Language,
    transliterator: Option<Box<dyn Transliterator>>,
}

impl Reshaper {
    pub fn new(language: Language) -> Self {
        Self {
            language,
            transliterator: None,
        }
    }

    /// With a transliterator and Telugu output, ASCII transliterations are
    /// converted to Telugu letters after sanitizing.
    pub fn with_transliterator(mut self, transliterator: Box<dyn Transliterator>) -> Self {
        self.transliterator = Some(transliterator);
        self
    }

    pub fn language(&self) -> Language {
        self.language
    }

    fn clean_transliteration(&self, text: &str) -> String {
        if is_pure_secondary(text) {
            return text.trim().to_string();
        }
        let ascii = sanitize_transliteration(text);
        match (&self.transliterator, self.language) {
            (Some(t), Language::Telugu) => t.transliterate(&ascii),
            _ => ascii,
        }
    }

    /// Reshape a generated analysis.
    ///
    /// # Arguments
    /// * `raw` - generator output with four numbered sections
    /// * `is_secondary_script_source` - the glossed words are Telugu rather
    ///   than Hebrew or Greek
    ///
    /// # Returns
    /// The reshaped text, or `raw` unchanged when it has no section headers.
    pub fn reshape(&self, raw: &str, is_secondary_script_source: bool) -> String {
        let script = SourceScript::from_secondary_flag(is_secondary_script_source);
        let Some(sections) = split_sections(raw) else {
            warn!("no section headers found, leaving text unchanged");
            return raw.to_string();
        };

        let inline = |p: &str, after_script: bool| {
            (after_script || looks_transliterated(p)).then(|| self.clean_transliteration(p))
        };
        let mut out = Vec::with_capacity(sections.len());
        for (section, body) in sections {
            let body = match section {
                Section::SourceText => map_parentheticals(&body, script, inline),
                Section::Transliteration if body.is_empty() => body,
                Section::Transliteration => self.clean_transliteration(&body),
                Section::Translation => body,
                Section::WordByWord => self.reshape_word_by_word(&body, script),
            };
            let header = section.header(self.language);
            if body.is_empty() {
                out.push(header);
            } else {
                out.push(format!("{header}\n{body}"));
            }
        }
        out.join("\n\n")
    }

    /// Parse `raw` into an [`AnalysisDocument`]; for Telugu output with a
    /// transliterator, romanized transliterations become Telugu letters.
    pub fn document(&self, raw: &str, is_secondary_script_source: bool) -> AnalysisDocument {
        let script = SourceScript::from_secondary_flag(is_secondary_script_source);
        let mut document = AnalysisDocument::parse(raw, script);
        if let (Some(t), Language::Telugu) = (&self.transliterator, self.language) {
            document.localize_transliteration(t.as_ref());
        }
        document
    }

    fn reshape_word_by_word(&self, body: &str, script: SourceScript) -> String {
        if body.is_empty() {
            return String::new();
        }
        let (strategy, lines) = segment_word_glosses(body, script);
        match strategy {
            SegmentStrategy::StrictTriples => {
                debug!(entries = lines.len(), "word-by-word entries recovered")
            }
            SegmentStrategy::ScriptParenLines | SegmentStrategy::ScriptBreaks => {
                warn!(?strategy, lines = lines.len(), "word-by-word section needed a looser split")
            }
            SegmentStrategy::Raw => {
                warn!("no word-by-word entries recognized, keeping the section layout")
            }
        }
        lines
            .into_iter()
            .map(|line| match line {
                WordLine::Gloss(mut gloss) => {
                    gloss.transliteration = self.clean_transliteration(&gloss.transliteration);
                    gloss.to_string()
                }
                WordLine::Text(text) => map_parentheticals(&text, script, |p, _| {
                    Some(self.clean_transliteration(p))
                }),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// The four sections of an analysis as data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisDocument {
    pub source_text: String,
    pub transliteration: String,
    pub translation: String,
    pub word_glosses: Vec<WordGloss>,
}

impl AnalysisDocument {
    /// Parse generated text into sections. Missing sections stay empty;
    /// transliterations are sanitized to ASCII unless they are Telugu.
    /// Word-by-word lines that no strategy turns into entries are dropped.
    pub fn parse(raw: &str, script: SourceScript) -> Self {
        let clean = |text: &str| {
            if is_pure_secondary(text) {
                text.trim().to_string()
            } else {
                sanitize_transliteration(text)
            }
        };
        let mut document = AnalysisDocument::default();
        for (section, body) in split_sections(raw).unwrap_or_default() {
            match section {
                Section::SourceText => document.source_text = body,
                Section::Transliteration => document.transliteration = clean(&body),
                Section::Translation => document.translation = body,
                Section::WordByWord => {
                    let (_, lines) = segment_word_glosses(&body, script);
                    document.word_glosses = lines
                        .into_iter()
                        .filter_map(|line| match line {
                            WordLine::Gloss(mut gloss) => {
                                gloss.transliteration = clean(&gloss.transliteration);
                                Some(gloss)
                            }
                            WordLine::Text(_) => None,
                        })
                        .collect();
                }
            }
        }
        document
    }

    pub fn is_empty(&self) -> bool {
        self.source_text.is_empty()
            && self.transliteration.is_empty()
            && self.translation.is_empty()
            && self.word_glosses.is_empty()
    }

    /// Replace ASCII transliterations with `transliterator` output.
    pub fn localize_transliteration(&mut self, transliterator: &dyn Transliterator) {
        if !self.transliteration.is_empty() && !is_pure_secondary(&self.transliteration) {
            self.transliteration = transliterator.transliterate(&self.transliteration);
        }
        for gloss in &mut self.word_glosses {
            if !is_pure_secondary(&gloss.transliteration) {
                gloss.transliteration = transliterator.transliterate(&gloss.transliteration);
            }
        }
    }

    /// Render with canonical headers; empty sections are left out.
    pub fn render(&self, language: Language) -> String {
        let glosses = self
            .word_glosses
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n");
        let bodies = [
            &self.source_text,
            &self.transliteration,
            &self.translation,
            &glosses,
        ];
        Section::ALL
            .iter()
            .zip(bodies)
            .filter(|(_, body)| !body.is_empty())
            .map(|(section, body)| format!("{}\n{}", section.header(language), body))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
