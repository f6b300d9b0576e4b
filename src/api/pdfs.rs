//! Document management routes: list, upload (the full ingestion pipeline),
//! delete.

use std::sync::Arc;

use axum::extract::{Multipart, Path, State};
use axum::Json;
use uuid::Uuid;

use crate::api::error::{ApiFailure, ApiResult};
use crate::api::AppState;
use crate::doc_processor::{self, CHUNK_OVERLAP, CHUNK_SIZE};
use crate::models::{DeleteReceipt, PdfListResponse, UploadReceipt, MAX_UPLOAD_BYTES};

/// Chunks embedded per request to the embeddings API.
const EMBED_BATCH: usize = 20;

pub async fn list_pdfs(State(state): State<Arc<AppState>>) -> ApiResult<Json<PdfListResponse>> {
    let pdfs = state.store.list_documents()?;
    Ok(Json(PdfListResponse { pdfs }))
}

pub async fn upload_pdf(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadReceipt>> {
    let mut file = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiFailure::BadRequest(e.to_string()))?
    {
        if field.name() == Some("file") {
            let filename = field.file_name().unwrap_or_default().to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiFailure::BadRequest(e.to_string()))?;
            file = Some((filename, data));
            break;
        }
    }

    let (filename, content) =
        file.ok_or_else(|| ApiFailure::BadRequest("File must be a PDF".into()))?;
    if !filename.to_lowercase().ends_with(".pdf") {
        return Err(ApiFailure::BadRequest("File must be a PDF".into()));
    }
    if content.is_empty() {
        return Err(ApiFailure::BadRequest("Uploaded file is empty".into()));
    }
    if content.len() as u64 > MAX_UPLOAD_BYTES {
        return Err(ApiFailure::BadRequest("File size exceeds 50MB limit".into()));
    }

    tracing::info!(%filename, bytes = content.len(), "extracting text from PDF");
    let chunks = tokio::task::spawn_blocking(move || -> Result<Vec<String>, ApiFailure> {
        let text = doc_processor::extract_text(&content)?;
        Ok(doc_processor::chunk_text(&text, CHUNK_SIZE, CHUNK_OVERLAP))
    })
    .await
    .map_err(|e| ApiFailure::Internal(e.to_string()))??;

    if chunks.is_empty() {
        return Err(ApiFailure::BadRequest("Failed to create document chunks".into()));
    }

    tracing::info!(chunks = chunks.len(), "generating embeddings");
    let mut embeddings = Vec::with_capacity(chunks.len());
    for batch in chunks.chunks(EMBED_BATCH) {
        embeddings.extend(state.embedder.generate(batch).await?);
    }

    let pdf_id = Uuid::new_v4().to_string();
    let stored = state
        .store
        .insert_document(&pdf_id, &filename, &chunks, &embeddings)?;
    tracing::info!(%filename, chunks = stored, "PDF processed successfully");

    Ok(Json(UploadReceipt {
        pdf_id,
        filename: Some(filename),
        chunks: stored as i64,
        message: Some("PDF processed and stored successfully".into()),
    }))
}

pub async fn delete_pdf(
    State(state): State<Arc<AppState>>,
    Path(pdf_id): Path<String>,
) -> ApiResult<Json<DeleteReceipt>> {
    let deleted = state.store.delete_document(&pdf_id)?;
    tracing::info!(%pdf_id, deleted, "deleted PDF");
    Ok(Json(DeleteReceipt {
        pdf_id,
        deleted_chunks: deleted as i64,
        message: Some("PDF deleted successfully".into()),
    }))
}
