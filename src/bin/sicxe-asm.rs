use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use sicxe_rs::listing::{fmt_symbol_table, report};
use sicxe_rs::{assemble, FrontEnd, LineReader};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Two-pass SIC/XE assembler", long_about = None)]
struct Cli {
    /// Assembly source file
    #[arg(value_name = "SOURCE")]
    input: String,
    /// Output format: text or json
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
    /// Write the report to a file instead of stdout
    #[arg(long, value_name = "FILE")]
    out: Option<String>,
    /// Print only the symbol table
    #[arg(long)]
    symbols: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let source = std::fs::read_to_string(&cli.input)
        .with_context(|| format!("reading {}", cli.input))?;

    let stmts = LineReader::new().parse(&source);
    let asm = assemble(&stmts);
    tracing::info!(
        lines = asm.lines.len(),
        symbols = asm.symbols.len(),
        errors = asm.diagnostics.len(),
        "assembled {}",
        cli.input
    );

    let text = match (cli.format, cli.symbols) {
        (OutputFormat::Text, false) => report(&asm),
        (OutputFormat::Text, true) => fmt_symbol_table(&asm.symbols),
        (OutputFormat::Json, false) => serde_json::to_string_pretty(&asm)?,
        (OutputFormat::Json, true) => serde_json::to_string_pretty(&asm.symbols)?,
    };

    match &cli.out {
        Some(path) => std::fs::write(path, &text).with_context(|| format!("writing {path}"))?,
        None => println!("{text}"),
    }

    if !asm.is_valid() {
        std::process::exit(1);
    }
    Ok(())
}
