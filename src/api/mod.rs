//! REST surface of the backend: one router, JSON in/out, FastAPI-style
//! `{"detail": …}` error bodies.

pub mod chat;
pub mod error;
pub mod pdfs;

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::json;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Settings;
use crate::db::Database;
use crate::embedding::EmbeddingClient;
use crate::llm::openai::{ChatClient, OpenAiConfig};
use crate::models::MAX_UPLOAD_BYTES;
use error::ApiFailure;

pub struct AppState {
    pub store: Database,
    pub embedder: EmbeddingClient,
    pub llm: ChatClient,
}

impl AppState {
    pub fn from_settings(settings: &Settings) -> Result<Self, ApiFailure> {
        let store = Database::new(&settings.database_path)?;
        let config = OpenAiConfig {
            api_key: settings.openai_api_key.clone(),
            base_url: settings.openai_base_url.clone(),
        };
        Ok(Self {
            store,
            embedder: EmbeddingClient::new(config.clone(), settings.embedding_model.clone()),
            llm: ChatClient::new(config, settings.chat_model.clone()),
        })
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/pdfs", get(pdfs::list_pdfs))
        .route("/api/upload-pdf", post(pdfs::upload_pdf))
        .route("/api/pdfs/{pdf_id}", delete(pdfs::delete_pdf))
        .route("/api/chat", post(chat::chat))
        // The size ceiling is checked in the handler so the rejection
        // carries the documented message.
        .layer(DefaultBodyLimit::max((MAX_UPLOAD_BYTES + 1024 * 1024) as usize))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn root() -> Json<serde_json::Value> {
    Json(json!({"message": "PDF Chat API is running"}))
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.store.ping() {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({"status": "healthy", "database": "connected"})),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"status": "unhealthy", "error": e.to_string()})),
        ),
    }
}

pub async fn serve(settings: Settings) -> Result<(), ApiFailure> {
    let state = Arc::new(AppState::from_settings(&settings)?);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&settings.bind_addr)
        .await
        .map_err(ApiFailure::Bind)?;
    tracing::info!(addr = %settings.bind_addr, "PDF Chat API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(ApiFailure::Server)?;

    Ok(())
}

/// Resolves when Ctrl+C is pressed.
async fn shutdown_signal() {
    signal::ctrl_c()
        .await
        .expect("failed to listen for shutdown signal");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn test_router(dir: &TempDir) -> Router {
        let settings = Settings {
            openai_api_key: "test-key".into(),
            openai_base_url: "http://127.0.0.1:0".into(),
            embedding_model: "text-embedding-3-small".into(),
            chat_model: "gpt-test".into(),
            database_path: dir.path().join("api.db"),
            bind_addr: "127.0.0.1:0".into(),
        };
        router(Arc::new(AppState::from_settings(&settings).unwrap()))
    }

    async fn body_json(resp: axum::response::Response) -> serde_json::Value {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn multipart_upload(filename: &str, content: &[u8]) -> Request<Body> {
        let boundary = "test-boundary";
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: application/pdf\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
        Request::builder()
            .method("POST")
            .uri("/api/upload-pdf")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_root_and_health() {
        let dir = TempDir::new().unwrap();
        let app = test_router(&dir);

        let resp = app
            .clone()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            body_json(resp).await["message"],
            "PDF Chat API is running"
        );

        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["status"], "healthy");
    }

    #[tokio::test]
    async fn test_list_pdfs_empty() {
        let dir = TempDir::new().unwrap();
        let app = test_router(&dir);

        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/api/pdfs")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["pdfs"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_upload_rejects_non_pdf() {
        let dir = TempDir::new().unwrap();
        let app = test_router(&dir);

        let resp = app
            .oneshot(multipart_upload("notes.txt", b"hello"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["detail"], "File must be a PDF");
    }

    #[tokio::test]
    async fn test_upload_rejects_empty_file() {
        let dir = TempDir::new().unwrap();
        let app = test_router(&dir);

        let resp = app.oneshot(multipart_upload("empty.pdf", b"")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["detail"], "Uploaded file is empty");
    }

    #[tokio::test]
    async fn test_upload_rejects_missing_file_field() {
        let dir = TempDir::new().unwrap();
        let app = test_router(&dir);

        let boundary = "test-boundary";
        let body = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"other\"\r\n\r\nx\r\n--{boundary}--\r\n"
        );
        let req = Request::builder()
            .method("POST")
            .uri("/api/upload-pdf")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["detail"], "File must be a PDF");
    }

    #[tokio::test]
    async fn test_delete_unknown_pdf_reports_zero_chunks() {
        let dir = TempDir::new().unwrap();
        let app = test_router(&dir);

        let resp = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/api/pdfs/no-such-id")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["pdf_id"], "no-such-id");
        assert_eq!(body["deleted_chunks"], 0);
    }
}
