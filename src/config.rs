use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the source documents and the embedding cache
    pub data_dir: PathBuf,
    /// Server bind address
    pub bind_addr: String,
    /// Origin allowed to call the API from a browser (the chat frontend)
    pub cors_origin: String,
    /// Maximum request body size for uploads, in MB
    pub max_upload_mb: usize,
    /// LLM provider configuration
    pub llm: LlmConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "ollama" or "openai"
    pub provider: String,
    /// Base URL for the LLM API
    pub base_url: String,
    /// Model name for answer generation
    pub chat_model: String,
    /// Model name for embeddings
    pub embedding_model: String,
    /// API key (only needed for cloud providers)
    pub api_key: Option<String>,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            bind_addr: "127.0.0.1:8000".to_string(),
            cors_origin: "http://localhost:5173".to_string(),
            max_upload_mb: 50,
            llm: LlmConfig::default(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            base_url: "http://localhost:11434".to_string(),
            chat_model: "llama3.2".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
            api_key: None,
            request_timeout_secs: 120,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Layer overrides from `lookup` on top of the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(dir) = lookup("RAG_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(addr) = lookup("RAG_BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Some(origin) = lookup("RAG_CORS_ORIGIN") {
            config.cors_origin = origin;
        }
        if let Some(val) = lookup("RAG_MAX_UPLOAD_MB") {
            if let Ok(v) = val.parse() {
                config.max_upload_mb = v;
            }
        }
        if let Some(provider) = lookup("LLM_PROVIDER") {
            config.llm.provider = provider;
        }
        if let Some(url) = lookup("LLM_BASE_URL") {
            config.llm.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(model) = lookup("LLM_CHAT_MODEL") {
            config.llm.chat_model = model;
        }
        if let Some(model) = lookup("LLM_EMBEDDING_MODEL") {
            config.llm.embedding_model = model;
        }
        if let Some(key) = lookup("LLM_API_KEY") {
            config.llm.api_key = Some(key);
        }
        if let Some(val) = lookup("LLM_TIMEOUT_SECS") {
            if let Ok(v) = val.parse() {
                config.llm.request_timeout_secs = v;
            }
        }

        config
    }

    /// Persisted embedding matrix plus id/text arrays.
    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join("rag_cache.json")
    }

    /// Directory signature paired with the snapshot.
    pub fn signature_path(&self) -> PathBuf {
        self.data_dir.join("rag_cache_meta.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_env() {
        let config = Config::from_lookup(|_| None);
        assert_eq!(config.data_dir, PathBuf::from("./data"));
        assert_eq!(config.bind_addr, "127.0.0.1:8000");
        assert_eq!(config.llm.provider, "ollama");
        assert!(config.llm.api_key.is_none());
    }

    #[test]
    fn test_env_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("RAG_DATA_DIR", "/srv/docs"),
            ("LLM_PROVIDER", "openai"),
            ("LLM_BASE_URL", "https://api.example.com/"),
            ("LLM_API_KEY", "sk-test"),
            ("RAG_MAX_UPLOAD_MB", "10"),
        ]));
        assert_eq!(config.data_dir, PathBuf::from("/srv/docs"));
        assert_eq!(config.llm.provider, "openai");
        assert_eq!(config.llm.base_url, "https://api.example.com");
        assert_eq!(config.llm.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.max_upload_mb, 10);
    }

    #[test]
    fn test_unparsable_numbers_keep_defaults() {
        let config = Config::from_lookup(lookup_from(&[
            ("RAG_MAX_UPLOAD_MB", "lots"),
            ("LLM_TIMEOUT_SECS", "-3"),
        ]));
        assert_eq!(config.max_upload_mb, 50);
        assert_eq!(config.llm.request_timeout_secs, 120);
    }

    #[test]
    fn test_cache_paths_live_in_data_dir() {
        let config = Config::from_lookup(lookup_from(&[("RAG_DATA_DIR", "/tmp/d")]));
        assert_eq!(config.snapshot_path(), PathBuf::from("/tmp/d/rag_cache.json"));
        assert_eq!(
            config.signature_path(),
            PathBuf::from("/tmp/d/rag_cache_meta.json")
        );
    }
}
