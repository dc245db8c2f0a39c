use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use crate::config::Config;
use crate::llm::{Embedder, Generator, HttpEmbedder, HttpGenerator};
use crate::search::{open_or_rebuild, CacheFiles, DocumentStore};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<DocumentStore>,
    pub generator: Arc<dyn Generator>,
}

impl AppState {
    /// Wire up the HTTP providers and bootstrap the document store from the data directory.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        std::fs::create_dir_all(&config.data_dir).with_context(|| {
            format!("Failed to create data directory {}", config.data_dir.display())
        })?;

        let http_client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(config.llm.request_timeout_secs))
            .build()?;

        let embedder: Arc<dyn Embedder> =
            Arc::new(HttpEmbedder::new(http_client.clone(), config.llm.clone()));
        let generator: Arc<dyn Generator> =
            Arc::new(HttpGenerator::new(http_client, config.llm.clone()));

        let files = CacheFiles::from_config(&config);
        let store = open_or_rebuild(&config.data_dir, &files, embedder).await?;

        Ok(Self::from_parts(config, store, generator))
    }

    pub fn from_parts(config: Config, store: DocumentStore, generator: Arc<dyn Generator>) -> Self {
        Self {
            config,
            store: Arc::new(store),
            generator,
        }
    }
}
