//! Input discovery.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use clinisum_core::SourceDocument;

/// Read every `*.txt` file in `dir`, sorted by file name.
///
/// The file name is the document id. Any unreadable file aborts before the
/// batch starts.
pub fn read_documents(dir: &Path) -> Result<Vec<SourceDocument>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read input directory {}", dir.display()))?;

    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let path = entry
            .with_context(|| format!("Failed to list {}", dir.display()))?
            .path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "txt") {
            paths.push(path);
        }
    }
    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    paths
        .iter()
        .map(|path| {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let id = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            Ok(SourceDocument::new(id, text))
        })
        .collect()
}
