//! studytext
//!
//! Command-line front end for the study text pipeline. There is no network
//! client: generated text is replayed from a file, which is enough to
//! reshape saved responses and to drive the service end to end.
//!
//! Usage:
//! - `studytext reshape response.md` - reshape a saved interlinear response
//! - `studytext reshape --language telugu --telugu-source < response.md`
//! - `studytext reshape --glosses response.md` - word glosses, tab separated
//! - `studytext transliterate "bereshit bara elohim"` - romanization to Telugu
//! - `studytext sanitize "bərēʾšîṯ"` - force a romanization to ASCII
//! - `studytext passage "యోహాను 3:16-17"` - verses from the bundled sample
//! - `studytext study "John 3:16" --response reply.md` - cached, reshaped study text
//! - `studytext search "God so loved" --response suggestions.txt`

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use bookref::parse_reference;
use studytext::{
    sanitize_transliteration, CsvVerseSource, GenerationError, Language, Reshaper,
    SchemeTransliterator, SearchOutcome, StudyConfig, StudyKind, StudyService, TextGenerator,
    Transliterator, DEFAULT_SCHEME,
};

const SAMPLE_VERSES: &str = include_str!("../data/verses/sample.csv");

#[derive(Parser)]
#[command(name = "studytext")]
#[command(about = "Reshape, transliterate and serve generated scripture study text")]
struct Args {
    /// TOML configuration file
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    /// Log strategy selection and retries (same as RUST_LOG=debug)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Reshape a generated interlinear analysis (file or stdin)
    Reshape {
        file: Option<PathBuf>,
        /// Output language of the section headers
        #[arg(short = 'l', long)]
        language: Option<Language>,
        /// The glossed words are Telugu rather than Hebrew or Greek
        #[arg(long)]
        telugu_source: bool,
        /// Print only the recovered word glosses, one per line
        #[arg(short = 'g', long)]
        glosses: bool,
    },
    /// Convert ASCII romanization to Telugu letters
    Transliterate {
        text: Vec<String>,
        #[arg(short = 's', long, default_value = DEFAULT_SCHEME)]
        scheme: String,
    },
    /// Force romanized text to plain ASCII
    Sanitize { text: Vec<String> },
    /// Print the verses of a reference
    Passage {
        reference: String,
        /// Verse CSV (`book,chapter,verse,english,telugu`); bundled sample by default
        #[arg(long)]
        verses: Option<PathBuf>,
    },
    /// Study text for a reference, generated text replayed from a file
    Study {
        reference: String,
        #[arg(short = 'k', long, default_value = "interlinear")]
        kind: StudyKind,
        #[arg(short = 'r', long)]
        response: Option<PathBuf>,
        #[arg(long)]
        verses: Option<PathBuf>,
    },
    /// Route a search query; keywords use the replayed response as suggestions
    Search {
        query: String,
        #[arg(short = 'r', long)]
        response: Option<PathBuf>,
    },
}

/// Generator that answers every prompt with a saved response.
struct ReplayGenerator {
    reply: Option<String>,
}

impl ReplayGenerator {
    fn from_path(path: Option<&Path>) -> Result<Self> {
        let reply = path
            .map(|p| {
                fs::read_to_string(p)
                    .with_context(|| format!("Failed to read response file: {}", p.display()))
            })
            .transpose()?;
        Ok(Self { reply })
    }
}

impl TextGenerator for ReplayGenerator {
    fn generate(&self, _prompt: &str, _model: &str) -> Result<String, GenerationError> {
        self.reply
            .clone()
            .ok_or_else(|| GenerationError::Unknown("no --response file given".to_string()))
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "studytext=debug,bookref=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read input file: {}", path.display())),
        None => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read stdin")?;
            Ok(text)
        }
    }
}

fn load_verses(path: Option<&Path>) -> Result<CsvVerseSource> {
    match path {
        Some(path) => CsvVerseSource::from_path(path),
        None => CsvVerseSource::from_reader(SAMPLE_VERSES.as_bytes()),
    }
}

fn service(
    config: &StudyConfig,
    response: Option<&Path>,
    verses: Option<&Path>,
) -> Result<StudyService<studytext::RetryingGenerator<ReplayGenerator>, CsvVerseSource>> {
    StudyService::from_config(config, ReplayGenerator::from_path(response)?, load_verses(verses)?)
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);
    let config = StudyConfig::load(args.config.as_deref())?;

    match args.command {
        Command::Reshape {
            file,
            language,
            telugu_source,
            glosses,
        } => {
            let language = language.unwrap_or(config.language);
            let mut reshaper = Reshaper::new(language);
            if language == Language::Telugu {
                let transliterator = SchemeTransliterator::new(&config.transliteration_scheme)?;
                reshaper = reshaper.with_transliterator(Box::new(transliterator));
            }
            let raw = read_input(file.as_deref())?;
            if glosses {
                let document = reshaper.document(&raw, telugu_source);
                if document.word_glosses.is_empty() {
                    bail!("no word glosses recognized");
                }
                for gloss in &document.word_glosses {
                    println!(
                        "{}\t{}\t{}",
                        gloss.source_word.bold(),
                        gloss.transliteration.green(),
                        gloss.gloss
                    );
                }
            } else {
                println!("{}", reshaper.reshape(&raw, telugu_source));
            }
        }
        Command::Transliterate { text, scheme } => {
            let transliterator = SchemeTransliterator::new(&scheme)?;
            for line in text {
                println!("{} → {}", line, transliterator.transliterate(&line).green());
            }
        }
        Command::Sanitize { text } => {
            for line in text {
                println!("{} → {}", line, sanitize_transliteration(&line).green());
            }
        }
        Command::Passage { reference, verses } => {
            let reference = parse_reference(&reference)?;
            let service = service(&config, None, verses.as_deref())?;
            println!(
                "{} ({})",
                reference.to_string().blue().bold(),
                reference.to_secondary_string().blue()
            );
            for row in service.passage(&reference)? {
                println!("{:>3}  {}", row.verse.to_string().bold(), row.english);
                println!("     {}", row.telugu);
            }
        }
        Command::Study {
            reference,
            kind,
            response,
            verses,
        } => {
            let reference = parse_reference(&reference)?;
            let service = service(&config, response.as_deref(), verses.as_deref())?;
            println!("{}", reference.to_string().blue().bold());
            println!("{}", service.study(&reference, kind)?);
        }
        Command::Search { query, response } => {
            let service = service(&config, response.as_deref(), None)?;
            match service.search(&query)? {
                SearchOutcome::Navigate(reference) => {
                    println!("{} {}", "go to".green(), reference.to_string().bold())
                }
                SearchOutcome::Results(references) => {
                    for reference in references {
                        println!(
                            "{}  {}",
                            reference.to_string().bold(),
                            reference.to_secondary_string()
                        );
                    }
                }
                SearchOutcome::NoResults => bail!("no results for '{query}'"),
            }
        }
    }
    Ok(())
}
