//! resolve_refs
//!
//! Resolve scripture references from the command line, or evaluate the
//! resolver against a CSV of `input,expected` cases.
//!
//! Usage:
//! - `resolve_refs "1 యోహాను ౧:౯" "Rom 8:1-4; Gen 1:1"` - parse references
//! - `resolve_refs --books "jn" "కీర్తనలు"` - canonicalize book names only
//! - `resolve_refs --cases data/tests/resolve-cases.csv` - run the evaluation table

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use csv::Reader;
use itertools::Itertools;
use serde::Deserialize;
use tabled::{settings::Style, Table, Tabled};
use tracing_subscriber::EnvFilter;

use bookref::{find_book_metadata, route_query, Canonicalizer, QueryIntent};

#[derive(Parser)]
#[command(name = "resolve_refs")]
#[command(about = "Resolve English/Telugu scripture references to canonical form")]
struct Args {
    /// References, reference lists or book names to resolve
    inputs: Vec<String>,

    /// Treat inputs as bare book names and canonicalize them
    #[arg(short = 'b', long)]
    books: bool,

    /// CSV file with `input,expected` rows to evaluate book resolution against
    #[arg(short = 'c', long = "cases")]
    cases: Option<String>,

    /// Log resolution strategies (same as RUST_LOG=bookref=debug)
    #[arg(short = 'v', long)]
    verbose: bool,
}

#[derive(Debug, Deserialize)]
struct TestCase {
    input: String,
    expected: String,
}

#[derive(Tabled)]
struct CaseResult {
    #[tabled(rename = "Input")]
    input: String,
    #[tabled(rename = "Hypothesis")]
    hypothesis: String,
    #[tabled(rename = "Reference")]
    reference: String,
    #[tabled(rename = "Strategy")]
    strategy: String,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "bookref=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    if let Some(path) = &args.cases {
        return run_cases(path);
    }
    for input in &args.inputs {
        if args.books {
            print_book(input);
        } else {
            print_query(input);
        }
    }
    Ok(())
}

fn print_book(input: &str) {
    match find_book_metadata(input) {
        Some(meta) => {
            let name = if meta.was_fuzzy {
                format!("{} (guessed)", meta.name).yellow()
            } else {
                meta.name.green()
            };
            println!(
                "{input} -> {name} [{} chapters, {:?}]",
                meta.chapter_count, meta.strategy
            );
        }
        None => println!("{input} -> {}", "no match".red()),
    }
}

fn print_query(input: &str) {
    match route_query(input) {
        QueryIntent::Navigate(reference) => println!(
            "{input} -> {} | {}",
            reference.to_string().green(),
            reference.to_secondary_string()
        ),
        QueryIntent::References(references) => println!(
            "{input} -> {}",
            references.iter().map(ToString::to_string).join("; ").green()
        ),
        QueryIntent::Keyword(keyword) => {
            println!("{input} -> {} '{keyword}'", "keyword search".yellow())
        }
        QueryIntent::Empty => println!("{}", "empty query".dimmed()),
    }
}

fn run_cases(path: &str) -> Result<()> {
    let mut reader =
        Reader::from_path(path).with_context(|| format!("Failed to open cases file: {path}"))?;
    let canonicalizer = Canonicalizer::default();

    let mut results = Vec::new();
    let mut strategies = Vec::new();
    let mut correct_count = 0;
    for row in reader.deserialize() {
        let case: TestCase = row.with_context(|| format!("Malformed row in {path}"))?;
        let resolution = canonicalizer.resolve(&case.input);
        let hypothesis = canonicalizer.canonicalize(&case.input);
        let strategy = resolution
            .map(|r| format!("{:?}", r.strategy))
            .unwrap_or_else(|| "-".to_string());

        let is_correct = hypothesis == case.expected;
        if is_correct {
            correct_count += 1;
        }
        strategies.push(strategy.clone());
        results.push(CaseResult {
            input: case.input,
            hypothesis: if is_correct {
                hypothesis.blue().to_string()
            } else {
                hypothesis.red().to_string()
            },
            reference: case.expected,
            strategy,
        });
    }

    if !results.is_empty() {
        println!("{}", Table::new(&results).with(Style::modern()));
    }

    let total_count = results.len();
    let accuracy = if total_count > 0 {
        (correct_count as f64 / total_count as f64) * 100.0
    } else {
        0.0
    };

    println!("\n{}", "Strategy usage:".bold());
    for (strategy, count) in strategies.iter().counts().into_iter().sorted() {
        println!("  {strategy}: {count}");
    }

    let accuracy_str = format!("{accuracy:.2}%");
    let colored_accuracy = if accuracy >= 90.0 {
        accuracy_str.green()
    } else if accuracy >= 70.0 {
        accuracy_str.yellow()
    } else {
        accuracy_str.red()
    };
    println!(
        "\n{}: {} ({}/{})",
        "ACCURACY".bold(),
        colored_accuracy.bold(),
        correct_count,
        total_count
    );
    Ok(())
}
