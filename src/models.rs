//! Wire types shared by the REST server and the client.

use serde::{Deserialize, Serialize};

/// Upload size ceiling, enforced client-side before any request is issued
/// and again by the server.
pub const MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

/// One uploaded document, as listed by `GET /api/pdfs`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PdfInfo {
    pub pdf_id: String,
    pub pdf_name: String,
    pub total_chunks: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PdfListResponse {
    pub pdfs: Vec<PdfInfo>,
}

/// Response of `POST /api/upload-pdf`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UploadReceipt {
    pub pdf_id: String,
    #[serde(default)]
    pub filename: Option<String>,
    pub chunks: i64,
    #[serde(default)]
    pub message: Option<String>,
}

/// Response of `DELETE /api/pdfs/{pdf_id}`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DeleteReceipt {
    pub pdf_id: String,
    pub deleted_chunks: i64,
    #[serde(default)]
    pub message: Option<String>,
}

/// Request body of `POST /api/chat`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChatQuery {
    pub question: String,
    #[serde(default)]
    pub pdf_id: Option<String>,
}

/// Response of `POST /api/chat`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChatAnswer {
    pub answer: String,
    #[serde(default)]
    pub source_documents: Vec<SourceDocument>,
}

/// A retrieved chunk cited by an answer; `text` is a short preview.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SourceDocument {
    pub text: String,
    pub metadata: SourceMetadata,
}

/// `chunk_index` is zero-based on the wire; presentation adds one.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SourceMetadata {
    #[serde(default)]
    pub pdf_id: Option<String>,
    pub pdf_name: String,
    pub chunk_index: i64,
    #[serde(default)]
    pub total_chunks: Option<i64>,
}
