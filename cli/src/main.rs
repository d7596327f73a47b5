use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use ccl_frontend::automata::{compile, determinize};
use ccl_frontend::language::{keywords, SOURCE_EXTENSION};
use ccl_frontend::{Diagnostic, Diagnostics, LanguageConfig, Symbol, Token, Tokenizer};

mod pretty;

use pretty::{
    format_dfa, format_diagnostic_with_context, format_nfa, format_rules, format_symbols, format_tokens,
};

/// CCL front end: tokenizer, symbol table and automaton inspector
#[derive(Parser, Debug)]
#[command(name = "ccl")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Tokenize a source file and print tokens, symbols and diagnostics
    Lex {
        /// Source file to tokenize
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Token pattern file to use instead of the built-in patterns
        #[arg(long, value_name = "FILE")]
        patterns: Option<PathBuf>,

        /// Maximum number of fraction digits in decimal literals
        #[arg(long, value_name = "N")]
        max_decimal_places: Option<usize>,

        /// Emit a JSON document instead of tables
        #[arg(long)]
        json: bool,
    },
    /// List the token patterns in priority order with their automaton sizes
    Patterns {
        /// Token pattern file to use instead of the built-in patterns
        #[arg(long, value_name = "FILE")]
        patterns: Option<PathBuf>,
    },
    /// Show the NFA and DFA built for a pattern, optionally matching inputs
    Automaton {
        /// Regular expression to compile
        #[arg(value_name = "PATTERN")]
        pattern: String,

        /// Strings to test for a full match
        #[arg(value_name = "INPUT")]
        inputs: Vec<String>,
    },
}

#[derive(Serialize)]
struct LexReport<'a> {
    file: String,
    tokens: &'a [Token],
    max_decimal_places: usize,
    symbols: Vec<&'a Symbol>,
    diagnostics: &'a [Diagnostic],
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Lex {
            file,
            patterns,
            max_decimal_places,
            json,
        } => run_lex(&file, patterns.as_deref(), max_decimal_places, json),
        Command::Patterns { patterns } => run_patterns(patterns.as_deref()),
        Command::Automaton { pattern, inputs } => run_automaton(&pattern, &inputs),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(patterns: Option<&Path>, max_decimal_places: Option<usize>) -> Result<LanguageConfig> {
    let mut config = match patterns {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read pattern file {}", path.display()))?;
            LanguageConfig::from_ebnf(&content)
                .with_context(|| format!("invalid pattern file {}", path.display()))?
        },
        None => LanguageConfig::default(),
    };
    if let Some(places) = max_decimal_places {
        config = config.with_max_decimal_places(places);
    }
    Ok(config)
}

fn run_lex(
    file: &Path,
    patterns: Option<&Path>,
    max_decimal_places: Option<usize>,
    json: bool,
) -> Result<ExitCode> {
    if file.extension().and_then(|e| e.to_str()) != Some(SOURCE_EXTENSION) {
        warn!(file = %file.display(), "source file does not have the .{} extension", SOURCE_EXTENSION);
    }
    let source = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read source file {}", file.display()))?;
    let config = load_config(patterns, max_decimal_places)?;

    let mut diagnostics = Diagnostics::new();
    let tokenizer = Tokenizer::from_config(&config, &mut diagnostics);
    info!(rules = tokenizer.rules().len(), "tokenizer ready");

    let analysis = tokenizer.analyze(&source);
    diagnostics.extend(analysis.diagnostics);
    let sorted = diagnostics.sorted();

    if json {
        let report = LexReport {
            file: file.display().to_string(),
            tokens: &analysis.tokens,
            max_decimal_places: analysis.symbols.max_decimal_places(),
            symbols: analysis.symbols.iter().collect(),
            diagnostics: &sorted,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", "Tokens:".bold());
        print!("{}", format_tokens(&analysis.tokens));
        println!();
        println!(
            "{} (decimal literals: at most {} places)",
            "Symbols:".bold(),
            analysis.symbols.max_decimal_places()
        );
        print!("{}", format_symbols(analysis.symbols.iter()));
        if !sorted.is_empty() {
            println!();
            println!("{} {}", "Diagnostics:".bold(), sorted.len());
            for diagnostic in &sorted {
                println!("{}", format_diagnostic_with_context(&source, diagnostic));
            }
        }
    }

    Ok(if sorted.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn run_patterns(patterns: Option<&Path>) -> Result<ExitCode> {
    let config = load_config(patterns, None)?;
    let mut diagnostics = Diagnostics::new();
    let tokenizer = Tokenizer::from_config(&config, &mut diagnostics);

    print!("{}", format_rules(tokenizer.rules()));
    println!();
    println!("{} {}", "Keywords:".bold(), keywords().collect::<Vec<_>>().join(" "));

    if diagnostics.is_empty() {
        return Ok(ExitCode::SUCCESS);
    }
    println!();
    for diagnostic in diagnostics.iter() {
        println!("{}", format_diagnostic_with_context("", diagnostic));
    }
    Ok(ExitCode::FAILURE)
}

fn run_automaton(pattern: &str, inputs: &[String]) -> Result<ExitCode> {
    let nfa = compile(pattern)?;
    let dfa = determinize(&nfa);

    print!("{}", format_nfa(&nfa));
    println!();
    print!("{}", format_dfa(&dfa));

    if inputs.is_empty() {
        return Ok(ExitCode::SUCCESS);
    }
    println!();
    for input in inputs {
        let verdict = if dfa.full_match(input) {
            "match".green()
        } else {
            "no match".red()
        };
        let prefix = dfa
            .longest_prefix(input.as_bytes())
            .map_or_else(|| "none".to_string(), |len| format!("{:?}", &input[..len]));
        println!("  {:<20} {}  (longest prefix: {})", format!("{:?}", input), verdict, prefix);
    }
    Ok(ExitCode::SUCCESS)
}
