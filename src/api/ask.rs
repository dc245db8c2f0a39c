use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::context::{assemble_context, RetrievedDocument};
use crate::models::{AskRequest, AskResponse, Mode};
use crate::routing::{classify, configure, infer_mode};
use crate::state::AppState;

/// Returned whenever generation fails or comes back empty.
pub const FALLBACK_ANSWER: &str = "לא מצאתי את זה בחומר שהעלת, אנא תדייק את שאלתך";

/// POST /ask - route the question, retrieve context, generate an answer.
pub async fn ask(
    State(state): State<AppState>,
    Json(req): Json<AskRequest>,
) -> Result<Json<AskResponse>, (StatusCode, String)> {
    let query = req.query.trim();
    if query.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Query is required".to_string()));
    }

    let mode = infer_mode(query, req.mode);
    let profile = classify(query, mode);
    let params = configure(profile);

    tracing::info!(
        %mode,
        %profile,
        top_k = params.retrieval_depth,
        use_retrieval = params.use_retrieval,
        temperature = params.temperature,
        max_tokens = params.max_output_tokens,
        "[routing]"
    );

    let mut documents: Vec<RetrievedDocument> = Vec::new();
    if params.use_retrieval && params.retrieval_depth > 0 {
        let results = state
            .store
            .search(query, params.retrieval_depth)
            .await
            .map_err(|e| (StatusCode::BAD_GATEWAY, format!("Retrieval failed: {e:#}")))?;
        documents.extend(results.into_iter().map(RetrievedDocument::from));
    }

    let context = assemble_context(&documents);
    let prompt = build_prompt(mode, query, &context.text);

    let answer = match state
        .generator
        .generate(&prompt, params.temperature, params.max_output_tokens)
        .await
    {
        Ok(answer) if !answer.trim().is_empty() => answer,
        Ok(_) => {
            tracing::warn!("Generator returned an empty answer");
            FALLBACK_ANSWER.to_string()
        }
        Err(e) => {
            tracing::error!("Answer generation failed: {e:#}");
            FALLBACK_ANSWER.to_string()
        }
    };

    tracing::debug!(citations = ?context.citations, "answer ready");

    Ok(Json(AskResponse {
        mode,
        answer,
        citations: context.citations,
    }))
}

/// Per-mode instruction placed at the top of the prompt.
fn instruction_for(mode: Mode) -> &'static str {
    match mode {
        Mode::Answer => {
            "ענה בעברית, בצורה ברורה וקצרה, ב-2–4 משפטים. \
             אתה יכול להשתמש גם בידע כללי וגם בקונטקסט."
        }
        Mode::Email => {
            "כתוב מייל קצר בעברית, מקצועי וידידותי, על בסיס השאלה והקונטקסט. \
             אל תוסיף כותרות או נמען, רק את גוף המייל עצמו."
        }
        Mode::Summary => {
            "סכם את המידע הרלוונטי בעברית ב-3–5 נקודות קצרות. \
             אפשר להשתמש ברשימה עם כוכביות או מקפים אם זה עוזר לקריאות."
        }
    }
}

fn build_prompt(mode: Mode, query: &str, context: &str) -> String {
    format!(
        "You are an AI copilot.\n\n\
         Instruction:\n{instruction}\n\n\
         Use the following context if it is relevant. Prefer the context over your own knowledge\n\
         when there is a conflict.\n\n\
         Context:\n{context}\n\n\
         User question (mode={mode}):\n{query}\n",
        instruction = instruction_for(mode),
    )
}
