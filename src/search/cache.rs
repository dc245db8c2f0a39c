//! Embedding cache keyed on a directory signature.
//!
//! The snapshot (`rag_cache.json`) holds the embedding matrix and the id/text
//! arrays; the signature file (`rag_cache_meta.json`) holds the size and mtime
//! of every source file plus the SHA-256 of the snapshot it was written with.
//! A snapshot is trusted only when both files exist, the digest matches, and
//! the recorded signature equals the current one. Anything else, including a
//! corrupt file, means a full rebuild.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::UNIX_EPOCH;
use walkdir::WalkDir;

use crate::config::Config;
use crate::documents::{is_supported, load_directory};
use crate::llm::Embedder;
use crate::search::vector::DocumentStore;

/// Change-detection fingerprint of one source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStamp {
    pub size: u64,
    /// Whole seconds since the Unix epoch
    pub mtime_secs: u64,
    /// Sub-second part, kept as an integer so the stamp survives JSON exactly
    pub mtime_nanos: u32,
}

/// File name -> stamp for every eligible file in the data directory.
pub type DirectorySignature = BTreeMap<String, FileStamp>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheDecision {
    ReuseCache,
    Rebuild,
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheMeta {
    snapshot_sha256: String,
    files: DirectorySignature,
}

/// Locations of the snapshot/signature pair.
#[derive(Debug, Clone)]
pub struct CacheFiles {
    pub snapshot: PathBuf,
    pub signature: PathBuf,
}

impl CacheFiles {
    pub fn from_config(config: &Config) -> Self {
        Self {
            snapshot: config.snapshot_path(),
            signature: config.signature_path(),
        }
    }
}

/// Stamp every eligible file directly inside `dir`. Entries that vanish while
/// listing, or that are not regular files, are skipped.
pub fn compute_signature(dir: &Path) -> Result<DirectorySignature> {
    if !dir.is_dir() {
        anyhow::bail!("Data directory {} does not exist", dir.display());
    }

    let mut signature = DirectorySignature::new();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !is_supported(path) {
            continue;
        }

        let Ok(meta) = std::fs::metadata(path) else {
            continue;
        };
        if !meta.is_file() {
            continue;
        }

        let mtime = meta
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .unwrap_or_default();

        signature.insert(
            entry.file_name().to_string_lossy().to_string(),
            FileStamp {
                size: meta.len(),
                mtime_secs: mtime.as_secs(),
                mtime_nanos: mtime.subsec_nanos(),
            },
        );
    }

    Ok(signature)
}

/// Reuse only when a valid snapshot exists and the signatures are identical.
pub fn decide(
    current: &DirectorySignature,
    previous: Option<&DirectorySignature>,
    cache_exists: bool,
) -> CacheDecision {
    match previous {
        Some(previous) if cache_exists && previous == current => CacheDecision::ReuseCache,
        _ => CacheDecision::Rebuild,
    }
}

fn read_meta(path: &Path) -> Option<CacheMeta> {
    if !path.exists() {
        return None;
    }
    let parsed: Result<CacheMeta> = std::fs::read(path)
        .context("read failed")
        .and_then(|data| serde_json::from_slice(&data).context("parse failed"));
    match parsed {
        Ok(meta) => Some(meta),
        Err(e) => {
            tracing::warn!("Ignoring corrupt cache signature {}: {e:#}", path.display());
            None
        }
    }
}

fn file_sha256(path: &Path) -> Option<String> {
    let data = std::fs::read(path).ok()?;
    Some(format!("{:x}", Sha256::digest(&data)))
}

fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, data)
        .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
    std::fs::rename(&tmp_path, path)
        .with_context(|| format!("Failed to move {} into place", path.display()))?;
    Ok(())
}

/// Write the snapshot, then the signature stamped with the snapshot's digest.
pub fn persist(store: &DocumentStore, signature: &DirectorySignature, files: &CacheFiles) -> Result<()> {
    if store.is_empty() {
        tracing::info!("[RAG] No documents to cache");
        return Ok(());
    }

    store.save(&files.snapshot)?;
    let snapshot_sha256 =
        file_sha256(&files.snapshot).context("Snapshot vanished right after writing it")?;

    let meta = CacheMeta {
        snapshot_sha256,
        files: signature.clone(),
    };
    let data = serde_json::to_vec(&meta).context("Failed to serialize cache signature")?;
    write_atomic(&files.signature, &data)
}

/// Build the process-wide store: load the cached snapshot when the data
/// directory is unchanged, otherwise re-embed every document and cache the result.
pub async fn open_or_rebuild(
    data_dir: &Path,
    files: &CacheFiles,
    embedder: Arc<dyn Embedder>,
) -> Result<DocumentStore> {
    let current = compute_signature(data_dir)?;
    let previous = read_meta(&files.signature);

    let cache_exists = previous
        .as_ref()
        .is_some_and(|meta| file_sha256(&files.snapshot).is_some_and(|d| d == meta.snapshot_sha256));

    let decision = decide(&current, previous.as_ref().map(|m| &m.files), cache_exists);
    if decision == CacheDecision::ReuseCache {
        match DocumentStore::load(&files.snapshot, embedder.clone()) {
            Ok(store) => {
                tracing::info!("[RAG] Loaded {} documents from cache", store.len());
                return Ok(store);
            }
            Err(e) => tracing::warn!("[RAG] Cache unreadable, rebuilding: {e:#}"),
        }
    }

    rebuild(data_dir, current, files, embedder).await
}

async fn rebuild(
    data_dir: &Path,
    signature: DirectorySignature,
    files: &CacheFiles,
    embedder: Arc<dyn Embedder>,
) -> Result<DocumentStore> {
    tracing::info!("[RAG] Building embeddings from {}", data_dir.display());

    let dir = data_dir.to_path_buf();
    let documents = tokio::task::spawn_blocking(move || load_directory(&dir))
        .await
        .context("Document loading task failed")?;

    let store = DocumentStore::new(embedder);
    for doc in &documents {
        if !store.add_document(&doc.id, &doc.text).await? {
            tracing::warn!("[RAG] Duplicate document id {}, keeping the first", doc.id);
        }
    }

    if let Err(e) = persist(&store, &signature, files) {
        tracing::warn!("[RAG] Failed to write embedding cache: {e:#}");
    } else {
        tracing::info!(
            "[RAG] Loaded {} documents into memory and saved cache",
            store.len()
        );
    }

    Ok(store)
}
