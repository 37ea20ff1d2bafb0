mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{check, normalize, CheckArgs, NormalizeArgs};
use folio_editor::EditorConfig;

/// Folio CLI - keep persisted rich documents well formed
#[derive(Parser, Debug)]
#[command(name = "folio")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Repair collapsible sections in .json documents
    Normalize(NormalizeArgs),

    /// Report collapsible sections that break the section rules
    Check(CheckArgs),
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        eprintln!();
        eprintln!("{} {}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let config = EditorConfig::load(&cwd)?;
    tracing::debug!(?config, "Loaded config");

    match cli.command {
        Command::Normalize(args) => normalize(args, &config),
        Command::Check(args) => check(args),
    }
}
