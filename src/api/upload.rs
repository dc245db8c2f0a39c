use std::path::Path;

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;

use crate::documents::loader::{pdf_documents, source_kind, text_document};
use crate::documents::{SourceDocument, SourceKind};
use crate::models::UploadResponse;
use crate::state::AppState;

const UNSUPPORTED_MESSAGE: &str = "Only .pdf or .txt files are supported right now.";

/// POST /upload-docs - store each uploaded file and index its contents.
pub async fn upload_docs(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, (StatusCode, String)> {
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("Invalid multipart body: {e}")))?
    {
        let raw_name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| (StatusCode::BAD_REQUEST, "File name is required".to_string()))?;
        let bytes = field
            .bytes()
            .await
            .map_err(|e| (StatusCode::BAD_REQUEST, format!("Failed to read {raw_name}: {e}")))?;

        files.push(ingest_upload(&state, &raw_name, &bytes).await?);
    }

    if files.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "No files were uploaded".to_string()));
    }

    Ok(Json(UploadResponse {
        status: "ok",
        files,
    }))
}

/// Save one upload into the data directory and add its documents to the store.
/// Returns the stored file name.
pub async fn ingest_upload(
    state: &AppState,
    raw_name: &str,
    bytes: &[u8],
) -> Result<String, (StatusCode, String)> {
    let filename = sanitize_file_name(raw_name)
        .ok_or_else(|| (StatusCode::BAD_REQUEST, "File name is required".to_string()))?;
    let kind = source_kind(Path::new(&filename))
        .ok_or_else(|| (StatusCode::BAD_REQUEST, UNSUPPORTED_MESSAGE.to_string()))?;

    let target = state.config.data_dir.join(&filename);
    tokio::fs::write(&target, bytes).await.map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to save {filename}: {e}"),
        )
    })?;

    let documents = match kind {
        SourceKind::Text => vec![text_document(&filename, bytes)],
        SourceKind::Pdf => {
            let name = filename.clone();
            let data = bytes.to_vec();
            tokio::task::spawn_blocking(move || pdf_documents(&name, &data))
                .await
                .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
                .map_err(|e| (StatusCode::BAD_REQUEST, format!("{e:#}")))?
        }
    };

    let added = index_documents(state, &documents).await?;
    tracing::info!("Uploaded {filename}: {added} new document(s)");

    Ok(filename)
}

async fn index_documents(
    state: &AppState,
    documents: &[SourceDocument],
) -> Result<usize, (StatusCode, String)> {
    let mut added = 0;
    for doc in documents {
        let inserted = state
            .store
            .add_document(&doc.id, &doc.text)
            .await
            .map_err(|e| (StatusCode::BAD_GATEWAY, format!("Embedding failed: {e:#}")))?;
        if inserted {
            added += 1;
        } else {
            tracing::warn!("Document {} is already indexed, skipping", doc.id);
        }
    }
    Ok(added)
}

/// Base name of a client-supplied path. Handles Windows separators too.
fn sanitize_file_name(raw: &str) -> Option<String> {
    let normalized = raw.replace('\\', "/");
    let name = Path::new(&normalized).file_name()?.to_str()?.trim();
    if name.is_empty() {
        return None;
    }
    Some(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::llm::fakes::{KeywordEmbedder, ScriptedGenerator};
    use crate::search::DocumentStore;
    use std::sync::Arc;

    const VOCAB: &[&str] = &["regression", "gradient", "variance"];

    fn state_in(dir: &Path) -> (AppState, Arc<KeywordEmbedder>) {
        let embedder = Arc::new(KeywordEmbedder::new(VOCAB));
        let config = Config {
            data_dir: dir.to_path_buf(),
            ..Config::default()
        };
        let store = DocumentStore::new(embedder.clone());
        let generator = Arc::new(ScriptedGenerator::answering("ok"));
        (AppState::from_parts(config, store, generator), embedder)
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("notes.txt").as_deref(), Some("notes.txt"));
        assert_eq!(sanitize_file_name("../../etc/x.txt").as_deref(), Some("x.txt"));
        assert_eq!(sanitize_file_name("C:\\Users\\me\\a.pdf").as_deref(), Some("a.pdf"));
        assert_eq!(sanitize_file_name(""), None);
        assert_eq!(sanitize_file_name(".."), None);
        assert_eq!(sanitize_file_name("dir/"), Some("dir".to_string()));
    }

    #[tokio::test]
    async fn test_text_upload_is_saved_and_searchable() {
        let dir = tempfile::tempdir().unwrap();
        let (state, _) = state_in(dir.path());

        let name = ingest_upload(&state, "week1.txt", b"gradient descent notes")
            .await
            .unwrap();

        assert_eq!(name, "week1.txt");
        let saved = std::fs::read(dir.path().join("week1.txt")).unwrap();
        assert_eq!(saved, b"gradient descent notes");

        let results = state.store.search("gradient", 1).await.unwrap();
        assert_eq!(results[0].id, "week1.txt");
        assert_eq!(results[0].text, "gradient descent notes");
    }

    #[tokio::test]
    async fn test_upload_strips_directories() {
        let dir = tempfile::tempdir().unwrap();
        let (state, _) = state_in(dir.path());

        let name = ingest_upload(&state, "../outside.txt", b"variance").await.unwrap();
        assert_eq!(name, "outside.txt");
        assert!(dir.path().join("outside.txt").exists());
    }

    #[tokio::test]
    async fn test_unsupported_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (state, embedder) = state_in(dir.path());

        let err = ingest_upload(&state, "slides.pptx", b"...").await.unwrap_err();
        assert_eq!(err, (StatusCode::BAD_REQUEST, UNSUPPORTED_MESSAGE.to_string()));
        assert!(!dir.path().join("slides.pptx").exists());
        assert_eq!(embedder.calls(), 0);
    }

    #[tokio::test]
    async fn test_unparsable_pdf_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (state, _) = state_in(dir.path());

        let err = ingest_upload(&state, "broken.pdf", b"not a pdf").await.unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
        assert!(state.store.is_empty());
    }

    #[tokio::test]
    async fn test_reupload_skips_indexed_documents() {
        let dir = tempfile::tempdir().unwrap();
        let (state, embedder) = state_in(dir.path());

        ingest_upload(&state, "a.txt", b"regression").await.unwrap();
        ingest_upload(&state, "a.txt", b"regression v2").await.unwrap();

        assert_eq!(state.store.len(), 1);
        assert_eq!(embedder.calls(), 1);
        let saved = std::fs::read_to_string(dir.path().join("a.txt")).unwrap();
        assert_eq!(saved, "regression v2");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_uploads_of_same_file_both_succeed() {
        let dir = tempfile::tempdir().unwrap();
        let (state, embedder) = state_in(dir.path());

        let (first, second) = tokio::join!(
            ingest_upload(&state, "a.txt", b"regression"),
            ingest_upload(&state, "a.txt", b"regression"),
        );

        assert_eq!(first.unwrap(), "a.txt");
        assert_eq!(second.unwrap(), "a.txt");
        assert_eq!(state.store.len(), 1);
        assert_eq!(embedder.calls(), 1);
    }

    #[tokio::test]
    async fn test_embedding_failure_is_bad_gateway() {
        let dir = tempfile::tempdir().unwrap();
        let (state, embedder) = state_in(dir.path());
        embedder.set_failing(true);

        let err = ingest_upload(&state, "a.txt", b"regression").await.unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_GATEWAY);
        assert!(state.store.is_empty());
    }

    #[tokio::test]
    async fn test_missing_data_dir_is_server_error() {
        let dir = tempfile::tempdir().unwrap();
        let (state, _) = state_in(&dir.path().join("missing"));

        let err = ingest_upload(&state, "a.txt", b"regression").await.unwrap_err();
        assert_eq!(err.0, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
