use anyhow::{Context, Result};
use std::path::Path;
use walkdir::WalkDir;

/// One retrievable unit: a whole text file or a single PDF page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    pub id: String,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Pdf,
    Text,
}

/// Classify a path by extension (case-insensitive). `None` for anything we don't ingest.
pub fn source_kind(path: &Path) -> Option<SourceKind> {
    let ext = path.extension()?.to_str()?;
    if ext.eq_ignore_ascii_case("pdf") {
        Some(SourceKind::Pdf)
    } else if ext.eq_ignore_ascii_case("txt") {
        Some(SourceKind::Text)
    } else {
        None
    }
}

pub fn is_supported(path: &Path) -> bool {
    source_kind(path).is_some()
}

/// Whole-file text document, id = file name.
pub fn text_document(filename: &str, bytes: &[u8]) -> SourceDocument {
    SourceDocument {
        id: filename.to_string(),
        text: String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// One document per PDF page with non-empty text, id `<filename>_page_<n>` (1-based).
pub fn pdf_documents(filename: &str, bytes: &[u8]) -> Result<Vec<SourceDocument>> {
    // pdf-extract panics on some malformed inputs
    let pages = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(bytes))
        .map_err(|_| anyhow::anyhow!("PDF parser panicked on {filename}"))?
        .map_err(|e| anyhow::anyhow!("Failed to extract text from PDF {filename}: {e}"))?;

    Ok(pages_to_documents(filename, pages))
}

fn pages_to_documents(filename: &str, pages: Vec<String>) -> Vec<SourceDocument> {
    pages
        .into_iter()
        .enumerate()
        .filter_map(|(i, page)| {
            let text = page.trim();
            if text.is_empty() {
                return None;
            }
            Some(SourceDocument {
                id: format!("{filename}_page_{}", i + 1),
                text: text.to_string(),
            })
        })
        .collect()
}

/// Read one supported file into its documents.
pub fn load_file(path: &Path) -> Result<Vec<SourceDocument>> {
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .context("Path has no file name")?;
    let kind = source_kind(path)
        .with_context(|| format!("Unsupported file type: {filename}"))?;

    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;

    match kind {
        SourceKind::Text => Ok(vec![text_document(&filename, &bytes)]),
        SourceKind::Pdf => pdf_documents(&filename, &bytes),
    }
}

/// All documents from the supported files directly inside `dir`, in file-name order.
/// Files that cannot be read or parsed are skipped.
pub fn load_directory(dir: &Path) -> Vec<SourceDocument> {
    let mut documents = Vec::new();

    if !dir.is_dir() {
        return documents;
    }

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !is_supported(path) || !path.is_file() {
            continue;
        }

        match load_file(path) {
            Ok(mut docs) => documents.append(&mut docs),
            Err(e) => tracing::warn!("Skipping {}: {e:#}", path.display()),
        }
    }

    documents
}
