pub mod embeddings;
pub mod generate;

#[cfg(test)]
pub(crate) mod fakes;

pub use embeddings::{Embedder, HttpEmbedder};
pub use generate::{Generator, HttpGenerator};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::LlmConfig;

/// Wire dialect of the configured provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Provider {
    Ollama,
    OpenAi,
}

impl Provider {
    pub(crate) fn of(config: &LlmConfig) -> Result<Self> {
        match config.provider.as_str() {
            "ollama" => Ok(Provider::Ollama),
            "openai" => Ok(Provider::OpenAi),
            other => anyhow::bail!("Unknown LLM provider: {other}"),
        }
    }
}

/// POST `body` as JSON to `{base_url}{endpoint}` and decode the JSON reply.
/// OpenAI-compatible calls carry the API key as a bearer token.
pub(crate) async fn post_json<B, T>(
    client: &reqwest::Client,
    config: &LlmConfig,
    provider: Provider,
    endpoint: &str,
    body: &B,
) -> Result<T>
where
    B: Serialize + ?Sized,
    T: DeserializeOwned,
{
    let url = format!("{}{endpoint}", config.base_url);

    let mut request = client.post(&url).json(body);
    if let (Provider::OpenAi, Some(key)) = (provider, config.api_key.as_deref()) {
        request = request.bearer_auth(key);
    }

    let resp = request
        .send()
        .await
        .with_context(|| format!("Failed to reach {url}"))?;

    let status = resp.status();
    if !status.is_success() {
        let detail = resp.text().await.unwrap_or_default();
        anyhow::bail!("{endpoint} returned {status}: {detail}");
    }

    resp.json()
        .await
        .with_context(|| format!("Unexpected response body from {endpoint}"))
}
