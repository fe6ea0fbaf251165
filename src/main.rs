// src/main.rs
//
// trameform — Vuetify markup → trame widget code converter
//
// - Parses the input markup leniently (unclosed tags, stray text and
//   comments all recover), walks the tree depth-first and emits one trame
//   construct per element, then reflows the result to black-style layout.
// - Tag names translate kebab-case → PascalCase (v-app-bar → VAppBar);
//   attributes become keyword arguments (hyphens → underscores, class →
//   classes, ':'-prefixed bindings → single-element tuples).
//
// CLI flags:
//   --line-length N : maximum width of a generated line (0 falls back to 80)

use anyhow::Context;
use clap::Parser;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// CLI flags
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Maximum line width for the generated code (0 falls back to 80)
    #[arg(long = "line-length", default_value_t = trameform::DEFAULT_LINE_LIMIT)]
    line_length: usize,

    /// Input file (Vuetify template markup)
    input: PathBuf,

    /// Output file (default: stdout)
    output: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    // Log to stderr to keep stdout clean for the generated code
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let markup = fs::read_to_string(&cli.input)
        .with_context(|| format!("reading {}", cli.input.display()))?;
    let code = trameform::convert(&markup, cli.line_length)?;

    match &cli.output {
        Some(path) => fs::write(path, &code)
            .with_context(|| format!("writing {}", path.display()))?,
        None => io::stdout().write_all(code.as_bytes())?,
    }
    Ok(())
}
