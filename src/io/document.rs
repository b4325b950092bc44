// src/io/document.rs - Loads already-extracted document text

use anyhow::{Context, Result};
use log::{info, warn};
use std::fs;
use std::path::Path;

/// Read the whole document as text. Invalid UTF-8 is replaced rather than
/// rejected; an empty file is a valid, empty document.
pub fn read_document_text(path: &Path) -> Result<String> {
    let raw = fs::read(path)
        .with_context(|| format!("Failed to read document {}", path.display()))?;
    let text = match String::from_utf8(raw) {
        Ok(text) => text,
        Err(e) => {
            warn!(
                "Document {} is not valid UTF-8 (first bad byte at {}); decoding lossily",
                path.display(),
                e.utf8_error().valid_up_to()
            );
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }
    };
    if text.trim().is_empty() {
        warn!("Document {} is empty; no client can be found in it", path.display());
    } else {
        info!("Read document {} ({} chars)", path.display(), text.chars().count());
    }
    Ok(text)
}
