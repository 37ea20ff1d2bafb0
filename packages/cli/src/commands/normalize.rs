use super::{collect_inputs, read_document};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use folio_document::{Affected, Document};
use folio_editor::{normalize_batch, EditorConfig, PostEffectEngine};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Args, Debug)]
pub struct NormalizeArgs {
    /// Input .json document or directory
    pub input: PathBuf,

    /// Write results here instead of overwriting the inputs
    #[arg(short, long)]
    pub out_dir: Option<PathBuf>,

    /// Print results instead of writing files
    #[arg(long)]
    pub stdout: bool,

    /// Apply the live editing rules as well, moving blocks out of labels
    #[arg(long)]
    pub live: bool,
}

pub fn normalize(args: NormalizeArgs, config: &EditorConfig) -> Result<()> {
    if !args.stdout {
        println!("🧹 {} Folio normalizer", "Starting".green().bold());
        println!("   Input: {}", args.input.display());
        println!();
    }

    let root = if args.input.is_dir() {
        args.input.clone()
    } else {
        args.input.parent().map(Path::to_path_buf).unwrap_or_default()
    };

    let files = collect_inputs(&args.input)?;
    let mut changed = 0;

    for file in &files {
        let document = read_document(file)?;
        let normalized = normalize_document(document.clone(), args.live, config);

        if normalized != document {
            changed += 1;
        }

        let json = normalized.to_json_pretty()?;
        if args.stdout {
            println!("{}", json);
            continue;
        }

        let target = match &args.out_dir {
            Some(out_dir) => out_dir.join(file.strip_prefix(&root).unwrap_or(file)),
            None => file.clone(),
        };
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, json)?;

        let marker = if normalized != document {
            "✓".green()
        } else {
            "·".dimmed()
        };
        println!("   {} {} → {}", marker, file.display(), target.display());
    }

    if !args.stdout {
        println!();
        println!("✨ {} Normalization complete!", "Done".green().bold());
        println!("   Files processed: {}", files.len());
        println!("   Files changed: {}", changed);
    }

    Ok(())
}

/// Batch-normalize `document`; with `live`, then run the live rules over
/// every section
pub fn normalize_document(document: Document, live: bool, config: &EditorConfig) -> Document {
    let mut document = normalize_batch(document);

    if live {
        let sections = Affected::parents(document.details_paths());
        let engine = PostEffectEngine::new(config.normalize.max_passes);
        let repaired = engine.run(&sections, &mut document);
        debug!(sections = sections.parents.len(), repaired, "Applied live rules");
    }

    document
}
