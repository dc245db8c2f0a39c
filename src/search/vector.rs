use anyhow::{Context, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use crate::llm::Embedder;
use crate::models::SearchResult;

/// Added to the norm product so an all-zero vector scores 0 instead of NaN.
const SIMILARITY_EPSILON: f32 = 1e-8;

/// Parallel id/text arrays plus the row-major N×D embedding matrix.
#[derive(Debug, Default)]
struct Index {
    doc_ids: Vec<String>,
    docs: Vec<String>,
    embeddings: Vec<f32>,
    dimension: usize,
}

impl Index {
    fn len(&self) -> usize {
        self.doc_ids.len()
    }

    fn rows(&self) -> impl Iterator<Item = &[f32]> {
        // dimension is 0 only while the index is empty
        self.embeddings.chunks_exact(self.dimension.max(1))
    }

    fn push(&mut self, id: String, text: String, embedding: Vec<f32>) -> Result<()> {
        if embedding.is_empty() {
            anyhow::bail!("Embedding for {id} is empty");
        }
        if self.len() == 0 {
            self.dimension = embedding.len();
        } else if embedding.len() != self.dimension {
            anyhow::bail!(
                "Embedding for {id} has dimension {}, store expects {}",
                embedding.len(),
                self.dimension
            );
        }

        self.doc_ids.push(id);
        self.docs.push(text);
        self.embeddings.extend_from_slice(&embedding);
        Ok(())
    }
}

/// On-disk form of a [`DocumentStore`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub dimension: usize,
    pub embeddings: Vec<Vec<f32>>,
    pub doc_ids: Vec<String>,
    pub docs: Vec<String>,
}

/// In-memory document store with cosine similarity search.
///
/// Appends are serialized by `append_lock`, which is held across the embedding
/// call so parallel ingestion cannot interleave rows. Searches embed the query
/// without any lock and then score against the matrix under a read lock.
pub struct DocumentStore {
    embedder: Arc<dyn Embedder>,
    index: RwLock<Index>,
    append_lock: tokio::sync::Mutex<()>,
}

impl DocumentStore {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            index: RwLock::new(Index::default()),
            append_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Rebuild a store from a snapshot, checking that the arrays line up.
    pub fn from_snapshot(embedder: Arc<dyn Embedder>, snapshot: StoreSnapshot) -> Result<Self> {
        let StoreSnapshot {
            dimension,
            embeddings,
            doc_ids,
            docs,
        } = snapshot;

        if doc_ids.len() != docs.len() || doc_ids.len() != embeddings.len() {
            anyhow::bail!(
                "Snapshot arrays disagree: {} ids, {} texts, {} vectors",
                doc_ids.len(),
                docs.len(),
                embeddings.len()
            );
        }
        if dimension == 0 && !doc_ids.is_empty() {
            anyhow::bail!("Snapshot holds documents but no embedding dimension");
        }
        if let Some(row) = embeddings.iter().position(|r| r.len() != dimension) {
            anyhow::bail!("Snapshot row {row} does not have dimension {dimension}");
        }

        let index = Index {
            doc_ids,
            docs,
            embeddings: embeddings.into_iter().flatten().collect(),
            dimension,
        };

        Ok(Self {
            embedder,
            index: RwLock::new(index),
            append_lock: tokio::sync::Mutex::new(()),
        })
    }

    /// Embed `id + "\n" + text` and append it.
    ///
    /// Returns `false` without embedding when the id is already present. The
    /// check runs under the append lock, so of two racing adds for one id
    /// exactly one returns `true`. A failed embedding leaves the store untouched.
    pub async fn add_document(&self, id: &str, text: &str) -> Result<bool> {
        let _guard = self.append_lock.lock().await;

        if self.contains(id) {
            return Ok(false);
        }

        let embedding = self
            .embedder
            .embed(&format!("{id}\n{text}"))
            .await
            .with_context(|| format!("Failed to embed document {id}"))?;

        self.index
            .write()
            .push(id.to_string(), text.to_string(), embedding)?;
        Ok(true)
    }

    /// Top-`k` documents by cosine similarity to `query`, best first.
    /// Equal scores keep insertion order.
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchResult>> {
        if k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }

        let query_embedding = self
            .embedder
            .embed(query)
            .await
            .context("Failed to embed query")?;

        let index = self.index.read();
        if query_embedding.len() != index.dimension {
            anyhow::bail!(
                "Query embedding has dimension {}, store holds {}",
                query_embedding.len(),
                index.dimension
            );
        }

        let query_norm = l2_norm(&query_embedding);
        let mut scored: Vec<(usize, f32)> = index
            .rows()
            .enumerate()
            .map(|(i, row)| (i, cosine_similarity(row, &query_embedding, query_norm)))
            .collect();

        // sort_by is stable, so ties stay in insertion order
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(i, _)| SearchResult {
                id: index.doc_ids[i].clone(),
                text: index.docs[i].clone(),
            })
            .collect())
    }

    pub fn len(&self) -> usize {
        self.index.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.read().doc_ids.iter().any(|d| d == id)
    }

    /// Copy of the current contents.
    pub fn snapshot(&self) -> StoreSnapshot {
        let index = self.index.read();
        StoreSnapshot {
            dimension: index.dimension,
            embeddings: index.rows().map(<[f32]>::to_vec).collect(),
            doc_ids: index.doc_ids.clone(),
            docs: index.docs.clone(),
        }
    }

    /// Persist the store (atomic write via temp file + rename).
    /// Does nothing when the store is empty.
    pub fn save(&self, path: &Path) -> Result<()> {
        if self.is_empty() {
            return Ok(());
        }

        let data = serde_json::to_vec(&self.snapshot()).context("Failed to serialize snapshot")?;
        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, data)
            .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("Failed to move snapshot into {}", path.display()))?;
        Ok(())
    }

    pub fn load(path: &Path, embedder: Arc<dyn Embedder>) -> Result<Self> {
        let data = std::fs::read(path)
            .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
        let snapshot: StoreSnapshot =
            serde_json::from_slice(&data).context("Failed to parse snapshot")?;
        Self::from_snapshot(embedder, snapshot)
    }
}

fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

fn cosine_similarity(row: &[f32], query: &[f32], query_norm: f32) -> f32 {
    let dot: f32 = row.iter().zip(query).map(|(a, b)| a * b).sum();
    dot / (l2_norm(row) * query_norm + SIMILARITY_EPSILON)
}
