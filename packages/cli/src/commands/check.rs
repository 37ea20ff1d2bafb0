use super::{collect_inputs, read_document};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use folio_editor::{validate_sections, SectionViolation};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Input .json document or directory to check
    pub input: PathBuf,

    /// Show files without violations too
    #[arg(short, long)]
    pub verbose: bool,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    pub format: String,
}

#[derive(Debug, Serialize)]
struct FileReport<'a> {
    file: &'a Path,
    violations: &'a [SectionViolation],
}

pub fn check(args: CheckArgs) -> Result<()> {
    let json = args.format == "json";
    if !json {
        println!("🔍 {} Folio checker", "Starting".green().bold());
        println!("   Input: {}", args.input.display());
        println!();
    }

    let files = collect_inputs(&args.input)?;
    let mut total_structural = 0;
    let mut total_labels = 0;

    for file in &files {
        let violations = check_file(file)?;
        total_structural += violations
            .iter()
            .filter(|v| v.violation.is_structural())
            .count();
        total_labels += violations
            .iter()
            .filter(|v| !v.violation.is_structural())
            .count();

        if json {
            if !violations.is_empty() || args.verbose {
                let report = FileReport {
                    file,
                    violations: &violations,
                };
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            continue;
        }

        if violations.is_empty() {
            if args.verbose {
                println!("{} {}", "✓".green(), file.display());
            }
            continue;
        }

        println!("{}", file.display());
        for violation in &violations {
            let level = if violation.violation.is_structural() {
                "error".red().bold()
            } else {
                "warning".yellow().bold()
            };
            println!("  {} {} {}", level, violation.path, violation.violation);
        }
        println!();
    }

    if !json {
        let done = if total_structural > 0 {
            "Done".red().bold()
        } else {
            "Done".green().bold()
        };
        println!("✨ {} Check complete!", done);
        println!("   Files checked: {}", files.len());

        if total_structural > 0 {
            println!("   {} {}", "Broken sections:".red(), total_structural);
        }
        if total_labels > 0 {
            println!("   {} {}", "Block-only labels:".yellow(), total_labels);
        }
        if total_structural == 0 && total_labels == 0 {
            println!("   {} No issues found!", "✓".green());
        }
    }

    if total_structural + total_labels > 0 {
        std::process::exit(1);
    }

    Ok(())
}

fn check_file(path: &Path) -> Result<Vec<SectionViolation>> {
    let document = read_document(path)?;
    Ok(validate_sections(&document))
}
