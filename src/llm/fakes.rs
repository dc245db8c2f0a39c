//! In-process providers for tests.

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use super::{Embedder, Generator};

/// Bag-of-words embedder: one dimension per vocabulary word, valued by its
/// occurrence count in the lower-cased text.
pub struct KeywordEmbedder {
    vocabulary: Vec<&'static str>,
    calls: AtomicUsize,
    failing: AtomicBool,
}

impl KeywordEmbedder {
    pub fn new(vocabulary: &[&'static str]) -> Self {
        Self {
            vocabulary: vocabulary.to_vec(),
            calls: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("embedding provider unavailable");
        }
        let text = text.to_lowercase();
        Ok(self
            .vocabulary
            .iter()
            .map(|w| text.matches(w).count() as f32)
            .collect())
    }
}

/// Returns preset vectors for exact input strings.
#[derive(Default)]
pub struct TableEmbedder {
    vectors: HashMap<String, Vec<f32>>,
}

impl TableEmbedder {
    pub fn with(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.vectors.insert(text.to_string(), vector);
        self
    }
}

#[async_trait]
impl Embedder for TableEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        match self.vectors.get(text) {
            Some(v) => Ok(v.clone()),
            None => anyhow::bail!("no vector for {text:?}"),
        }
    }
}

/// Records each call and replies with a fixed answer, or fails.
pub struct ScriptedGenerator {
    answer: Option<String>,
    pub calls: Mutex<Vec<(String, f32, u32)>>,
}

impl ScriptedGenerator {
    pub fn answering(answer: &str) -> Self {
        Self {
            answer: Some(answer.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            answer: None,
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(&self, prompt: &str, temperature: f32, max_tokens: u32) -> Result<String> {
        self.calls
            .lock()
            .push((prompt.to_string(), temperature, max_tokens));
        match &self.answer {
            Some(a) => Ok(a.clone()),
            None => anyhow::bail!("completion provider timed out"),
        }
    }
}
