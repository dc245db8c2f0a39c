//! Turning retrieval results into a prompt context and citation labels.
//!
//! The store always yields `(id, text)` pairs, but other retrievers hand back
//! richer objects (LangChain-style `page_content` + `metadata`). Both shapes
//! are accepted here so the answer pipeline does not care where results came from.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::path::Path;

use crate::models::SearchResult;

/// Citations kept per answer, in retrieval order.
pub const MAX_CITATIONS: usize = 3;

/// Word placed between a source name and its page number in a citation.
const PAGE_WORD: &str = "שקופית";

const SOURCE_KEYS: &[&str] = &["source", "file_name", "filename", "path"];
const PAGE_KEYS: &[&str] = &["page", "page_number", "slide", "page_index"];

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RetrievedDocument {
    /// `(id, text)`
    Pair(String, String),
    Rich(RichDocument),
}

/// Loosely-shaped retrieval result. Text may sit under any of three names and
/// provenance either in `metadata` or at the top level.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RichDocument {
    pub page_content: Option<String>,
    pub content: Option<String>,
    pub text: Option<String>,
    pub metadata: Option<Value>,
    pub source: Option<String>,
    pub page: Option<Value>,
}

impl From<SearchResult> for RetrievedDocument {
    fn from(result: SearchResult) -> Self {
        RetrievedDocument::Pair(result.id, result.text)
    }
}

fn non_empty(s: &Option<String>) -> Option<&str> {
    s.as_deref().filter(|s| !s.is_empty())
}

impl RetrievedDocument {
    pub fn text(&self) -> Option<&str> {
        match self {
            RetrievedDocument::Pair(_, text) => Some(text.as_str()).filter(|t| !t.is_empty()),
            RetrievedDocument::Rich(doc) => non_empty(&doc.page_content)
                .or_else(|| non_empty(&doc.content))
                .or_else(|| non_empty(&doc.text)),
        }
    }

    /// Human-readable provenance label, if the result carries one.
    pub fn label(&self) -> Option<String> {
        match self {
            RetrievedDocument::Pair(id, _) => Some(id.clone()).filter(|id| !id.is_empty()),
            RetrievedDocument::Rich(doc) => doc.label(),
        }
    }
}

impl RichDocument {
    fn label(&self) -> Option<String> {
        let (source, page) = match &self.metadata {
            Some(Value::Object(meta)) => (metadata_source(meta), metadata_page(meta)),
            _ => (
                non_empty(&self.source).map(str::to_string),
                self.page.clone().filter(|p| !p.is_null()),
            ),
        };

        let source = source?;
        let name = Path::new(&source)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or(source);

        Some(match page {
            Some(Value::Number(n)) if n.is_i64() || n.is_u64() => {
                let page = n.as_i64().unwrap_or(i64::MAX);
                format!("{name} - {PAGE_WORD} {}", page.saturating_add(1))
            }
            Some(Value::String(s)) => format!("{name} - {PAGE_WORD} {s}"),
            Some(other) => format!("{name} - {PAGE_WORD} {other}"),
            None => name,
        })
    }
}

fn metadata_source(meta: &Map<String, Value>) -> Option<String> {
    SOURCE_KEYS.iter().find_map(|key| match meta.get(*key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    })
}

/// First page key holding a non-empty, non-zero value. A `page: 0` therefore
/// falls through to the later keys, and yields no page when none is set.
fn metadata_page(meta: &Map<String, Value>) -> Option<Value> {
    PAGE_KEYS
        .iter()
        .find_map(|key| meta.get(*key).filter(|v| is_set(v)).cloned())
}

fn is_set(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Context blob plus the citations that go with it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssembledContext {
    pub text: String,
    pub citations: Vec<String>,
}

/// Join result texts with blank lines and collect unique labels in order.
/// No context means no citations; otherwise at most [`MAX_CITATIONS`].
pub fn assemble_context(documents: &[RetrievedDocument]) -> AssembledContext {
    let mut chunks: Vec<&str> = Vec::new();
    let mut citations = Vec::new();
    let mut seen = HashSet::new();

    for doc in documents {
        if let Some(text) = doc.text() {
            chunks.push(text);
        }
        if let Some(label) = doc.label() {
            if seen.insert(label.clone()) {
                citations.push(label);
            }
        }
    }

    let text = chunks.join("\n\n");
    if text.trim().is_empty() {
        citations.clear();
    } else {
        citations.truncate(MAX_CITATIONS);
    }

    AssembledContext { text, citations }
}
