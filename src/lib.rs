//! # rag-copilot
//!
//! A small retrieval-augmented study assistant. Course material (PDF slides and
//! text notes) dropped into a data directory is embedded into an in-memory
//! vector store; questions are routed to an answer profile, answered by an LLM
//! over the retrieved context, and returned with source citations.
//!
//! ## Request flow
//!
//! ```text
//!                   POST /ask {query, mode?}
//!                              │
//!                              ▼
//!                  ┌───────────────────────┐
//!                  │   Mode inference      │
//!                  │  email keywords win   │
//!                  └───────────┬───────────┘
//!                              │
//!                              ▼
//!                  ┌───────────────────────┐
//!                  │   Question profile    │
//!                  │  first matching rule  │
//!                  └───────────┬───────────┘
//!                              │
//!                              ▼
//!                  ┌───────────────────────┐
//!                  │  Generation config    │
//!                  │  top_k / temperature  │
//!                  │  / token budget       │
//!                  └───────────┬───────────┘
//!                              │
//!                ┌─────────────┴─────────────┐
//!                ▼                           ▼
//!    ┌───────────────────────┐   ┌───────────────────────┐
//!    │  Vector search        │   │  No retrieval         │
//!    │  cosine, top_k        │   │  (small talk)         │
//!    └───────────┬───────────┘   └───────────┬───────────┘
//!                └─────────────┬─────────────┘
//!                              ▼
//!                  ┌───────────────────────┐
//!                  │  Context + citations  │
//!                  │  unique, at most 3    │
//!                  └───────────┬───────────┘
//!                              │
//!                              ▼
//!                  ┌───────────────────────┐
//!                  │  LLM generation       │
//!                  │  fallback on failure  │
//!                  └───────────────────────┘
//! ```
//!
//! ## Module Overview
//!
//! - [`config`] - Environment-based configuration for server, data dir, and LLM settings
//! - [`models`] - Shared data types: `Mode`, `SearchResult`, request/response types
//! - [`routing`] - Mode inference, question classification, and the per-profile parameter table
//! - [`documents`] - Turning PDF and text files into retrievable documents
//! - [`search::vector`] - In-memory document store with cosine similarity and snapshots
//! - [`search::cache`] - Directory signature and cache reuse/rebuild at startup
//! - [`llm`] - Embedding and completion providers (Ollama or OpenAI-compatible)
//! - [`context`] - Context assembly and citation labels
//! - [`api`] - Axum HTTP handlers for ask, upload, and health
//! - [`state`] - Shared application state

pub mod api;
pub mod config;
pub mod context;
pub mod documents;
pub mod llm;
pub mod models;
pub mod routing;
pub mod search;
pub mod state;
