use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::db::StoreError;
use crate::doc_processor::PdfError;
use crate::llm::LlmError;
use crate::qa::QaError;

/// Public application error type.
#[derive(Debug, Error)]
pub enum ApiFailure {
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// Embedding or chat-completion API failure.
    #[error(transparent)]
    Upstream(#[from] LlmError),

    #[error("failed to bind listener")]
    Bind(#[source] std::io::Error),

    #[error("server error")]
    Server(#[source] std::io::Error),

    #[error("{0}")]
    Internal(String),
}

impl ApiFailure {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiFailure::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiFailure::Upstream(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiFailure::Store(_)
            | ApiFailure::Bind(_)
            | ApiFailure::Server(_)
            | ApiFailure::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<PdfError> for ApiFailure {
    fn from(err: PdfError) -> Self {
        ApiFailure::BadRequest(err.to_string())
    }
}

impl From<QaError> for ApiFailure {
    fn from(err: QaError) -> Self {
        match err {
            QaError::Llm(e) => ApiFailure::Upstream(e),
            QaError::Store(e) => ApiFailure::Store(e),
            QaError::NoQueryEmbedding => {
                ApiFailure::Internal("failed to generate query embedding".into())
            }
        }
    }
}

/// FastAPI-compatible error body; clients read `detail`.
#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (
            status,
            Json(ErrorBody {
                detail: self.to_string(),
            }),
        )
            .into_response()
    }
}

/// Handy result alias used across handlers.
pub type ApiResult<T> = Result<T, ApiFailure>;
