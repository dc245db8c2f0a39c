use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{post_json, Provider};
use crate::config::LlmConfig;

/// Input cap in bytes. Hebrew tokenizes densely, so this keeps slide-sized
/// pages well inside the embedding model's context.
const MAX_EMBED_BYTES: usize = 3_000;

/// Source of fixed-dimension embedding vectors.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

fn truncate_for_embedding(text: &str) -> &str {
    if text.len() <= MAX_EMBED_BYTES {
        return text;
    }
    let cut = (0..=MAX_EMBED_BYTES)
        .rev()
        .find(|&i| text.is_char_boundary(i))
        .unwrap_or(0);
    &text[..cut]
}

/// Embedder backed by the configured provider's HTTP API, one text per call.
pub struct HttpEmbedder {
    client: reqwest::Client,
    config: LlmConfig,
}

impl HttpEmbedder {
    pub fn new(client: reqwest::Client, config: LlmConfig) -> Self {
        Self { client, config }
    }
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: [&'a str; 1],
    /// Ollama only: clip over-long input instead of answering 400.
    #[serde(skip_serializing_if = "Option::is_none")]
    truncate: Option<bool>,
}

/// Ollama `/api/embed` reply.
#[derive(Deserialize)]
struct OllamaEmbeddings {
    embeddings: Vec<Vec<f32>>,
}

/// OpenAI `/v1/embeddings` reply.
#[derive(Deserialize)]
struct OpenAiEmbeddings {
    data: Vec<OpenAiEmbedding>,
}

#[derive(Deserialize)]
struct OpenAiEmbedding {
    embedding: Vec<f32>,
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let provider = Provider::of(&self.config)?;
        let input = truncate_for_embedding(text);

        let embedding = match provider {
            Provider::Ollama => {
                let req = EmbedRequest {
                    model: &self.config.embedding_model,
                    input: [input],
                    truncate: Some(true),
                };
                let reply: OllamaEmbeddings =
                    post_json(&self.client, &self.config, provider, "/api/embed", &req).await?;
                reply.embeddings.into_iter().next()
            }
            Provider::OpenAi => {
                let req = EmbedRequest {
                    model: &self.config.embedding_model,
                    input: [input],
                    truncate: None,
                };
                let reply: OpenAiEmbeddings =
                    post_json(&self.client, &self.config, provider, "/v1/embeddings", &req).await?;
                reply.data.into_iter().next().map(|d| d.embedding)
            }
        }
        .context("Embedding API returned no vectors")?;

        if embedding.is_empty() {
            anyhow::bail!("Embedding API returned an empty vector");
        }
        Ok(embedding)
    }
}
