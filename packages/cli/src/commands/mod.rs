pub mod check;
pub mod normalize;

pub use check::{check, CheckArgs};
pub use normalize::{normalize, NormalizeArgs};

use anyhow::Result;
use folio_document::Document;
use folio_editor::config::DEFAULT_CONFIG_NAME;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// JSON documents under `dir`, sorted, config files excluded
pub fn find_json_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        let is_json = path.extension().map(|e| e == "json").unwrap_or(false);
        let is_config = path.file_name().map(|n| n == DEFAULT_CONFIG_NAME).unwrap_or(false);

        if path.is_file() && is_json && !is_config {
            files.push(path.to_path_buf());
        }
    }

    files.sort();
    Ok(files)
}

/// Files named by `input`: the file itself, or every document in a directory
pub fn collect_inputs(input: &Path) -> Result<Vec<PathBuf>> {
    if input.is_file() {
        Ok(vec![input.to_path_buf()])
    } else if input.is_dir() {
        find_json_files(input)
    } else {
        Err(anyhow::anyhow!(
            "Input path does not exist: {}",
            input.display()
        ))
    }
}

pub fn read_document(path: &Path) -> Result<Document> {
    let source = fs::read_to_string(path)?;
    Document::from_json(&source)
        .map_err(|err| anyhow::anyhow!("Failed to parse {}: {}", path.display(), err))
}
