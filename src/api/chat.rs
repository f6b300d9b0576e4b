use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::api::error::ApiResult;
use crate::api::AppState;
use crate::models::{ChatAnswer, ChatQuery};
use crate::qa;

/// Handler: POST /api/chat
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ChatQuery>,
) -> ApiResult<Json<ChatAnswer>> {
    let answer = qa::answer_question(
        &state.store,
        &state.embedder,
        &state.llm,
        &body.question,
        body.pdf_id.as_deref(),
    )
    .await?;
    Ok(Json(answer))
}
