//! Typed client for the PDF chat REST API.
//!
//! Every failure is classified into the closed [`ApiError`] taxonomy; the
//! UI layers never inspect error strings.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, Response};
use thiserror::Error;
use tokio::io::AsyncReadExt;

use crate::models::{ChatAnswer, ChatQuery, PdfListResponse, PdfInfo, UploadReceipt};

/// Default timeout for metadata and chat calls.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Uploads wait on server-side extraction and embedding.
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(300);
/// Frame size for the streamed upload body.
const UPLOAD_FRAME_BYTES: usize = 64 * 1024;

/// What went wrong talking to the backend, one arm per classification.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request timed out")]
    Timeout,
    #[error("network unreachable: {0}")]
    Network(String),
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },
    #[error("no response received")]
    NoResponse,
    #[error("unexpected error: {0}")]
    Unknown(String),
}

fn classify(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::Timeout
    } else if err.is_connect() {
        ApiError::Network(err.to_string())
    } else if err.is_request() || err.is_body() {
        ApiError::NoResponse
    } else {
        ApiError::Unknown(err.to_string())
    }
}

/// Pass 2xx responses through; otherwise pull a human-readable message out
/// of the JSON body (`detail` or `message`) with the status reason as
/// fallback.
async fn check_status(resp: Response) -> Result<Response, ApiError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let fallback = status
        .canonical_reason()
        .unwrap_or("server error")
        .to_string();
    let message = match resp.json::<serde_json::Value>().await {
        Ok(body) => body
            .get("detail")
            .or_else(|| body.get("message"))
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or(fallback),
        Err(_) => fallback,
    };
    Err(ApiError::Server {
        status: status.as_u16(),
        message,
    })
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| ApiError::Unknown(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub async fn list_pdfs(&self) -> Result<Vec<PdfInfo>, ApiError> {
        let resp = self
            .http
            .get(format!("{}/api/pdfs", self.base_url))
            .send()
            .await
            .map_err(classify)?;
        let resp = check_status(resp).await?;
        let body: PdfListResponse = resp.json().await.map_err(classify)?;
        Ok(body.pdfs)
    }

    /// Stream `path` as a multipart body, reporting coarse progress
    /// percentages to `on_progress` as frames go out.
    pub async fn upload_pdf<F>(&self, path: &Path, on_progress: F) -> Result<UploadReceipt, ApiError>
    where
        F: Fn(u8) + Send + Sync + 'static,
    {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload.pdf")
            .to_string();
        let total = tokio::fs::metadata(path)
            .await
            .map_err(|e| ApiError::Unknown(e.to_string()))?
            .len();
        let file = tokio::fs::File::open(path)
            .await
            .map_err(|e| ApiError::Unknown(e.to_string()))?;

        let on_progress = Arc::new(on_progress);
        let stream = futures::stream::unfold((file, 0u64), move |(mut file, sent)| {
            let on_progress = on_progress.clone();
            async move {
                let mut buf = vec![0u8; UPLOAD_FRAME_BYTES];
                match file.read(&mut buf).await {
                    Ok(0) => None,
                    Ok(n) => {
                        buf.truncate(n);
                        let sent = sent + n as u64;
                        if total > 0 {
                            on_progress(((sent * 100) / total).min(100) as u8);
                        }
                        Some((Ok::<Bytes, std::io::Error>(Bytes::from(buf)), (file, sent)))
                    }
                    Err(e) => Some((Err(e), (file, sent))),
                }
            }
        });

        let part = Part::stream_with_length(Body::wrap_stream(stream), total)
            .file_name(file_name)
            .mime_str("application/pdf")
            .map_err(|e| ApiError::Unknown(e.to_string()))?;
        let form = Form::new().part("file", part);

        let resp = self
            .http
            .post(format!("{}/api/upload-pdf", self.base_url))
            .multipart(form)
            .timeout(UPLOAD_TIMEOUT)
            .send()
            .await
            .map_err(classify)?;
        let resp = check_status(resp).await?;
        resp.json().await.map_err(classify)
    }

    pub async fn delete_pdf(&self, pdf_id: &str) -> Result<(), ApiError> {
        let resp = self
            .http
            .delete(format!("{}/api/pdfs/{}", self.base_url, pdf_id))
            .send()
            .await
            .map_err(classify)?;
        check_status(resp).await?;
        Ok(())
    }

    pub async fn chat(&self, question: &str, pdf_id: &str) -> Result<ChatAnswer, ApiError> {
        let body = ChatQuery {
            question: question.to_string(),
            pdf_id: Some(pdf_id.to_string()),
        };
        let resp = self
            .http
            .post(format!("{}/api/chat", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(classify)?;
        let resp = check_status(resp).await?;
        resp.json().await.map_err(classify)
    }
}
