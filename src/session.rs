//! Client-side state controller: the single owner of the document cache,
//! the active selection, the message thread, and the transient flags the
//! UI renders from. All remote work goes through [`ApiClient`]; every
//! operation leaves the session in a usable idle state.

use std::path::Path;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::warn;

use crate::client::{ApiClient, ApiError};
use crate::models::{PdfInfo, MAX_UPLOAD_BYTES};

const SUCCESS_BANNER_TTL: Duration = Duration::from_secs(4);
const ERROR_BANNER_TTL: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    User,
    Assistant,
    System,
    Error,
}

/// One entry in the (append-only) conversation thread.
#[derive(Debug, Clone)]
pub struct Message {
    pub kind: MessageKind,
    pub content: String,
    pub sources: Vec<SourceRef>,
}

impl Message {
    fn user(content: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::User,
            content: content.into(),
            sources: Vec::new(),
        }
    }

    fn assistant(content: impl Into<String>, sources: Vec<SourceRef>) -> Self {
        Self {
            kind: MessageKind::Assistant,
            content: content.into(),
            sources,
        }
    }

    fn system(content: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::System,
            content: content.into(),
            sources: Vec::new(),
        }
    }

    fn error(content: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Error,
            content: content.into(),
            sources: Vec::new(),
        }
    }
}

/// A citation attached to an assistant message.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRef {
    pub pdf_name: String,
    /// Zero-based, as reported by the retrieval service.
    pub chunk_index: i64,
}

impl SourceRef {
    /// One-based presentation of the zero-based upstream index.
    pub fn display(&self) -> String {
        format!("{} (chunk {})", self.pdf_name, self.chunk_index + 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Success,
    Error,
}

/// Transient status banner; success banners expire quickly, error banners
/// linger.
#[derive(Debug, Clone)]
pub struct StatusBanner {
    pub kind: StatusKind,
    pub text: String,
    expires_at: Instant,
}

/// Local pre-flight rejection of an upload; no network call was made.
#[derive(Debug, Error)]
pub enum UploadRejection {
    #[error("Only .pdf files can be uploaded")]
    NotPdf,
    #[error("File size exceeds the 50MB limit")]
    TooLarge,
    #[error("Cannot read file: {0}")]
    Unreadable(String),
}

fn user_message(err: &ApiError) -> String {
    match err {
        ApiError::Timeout => {
            "The request timed out. The server may still be busy processing.".into()
        }
        ApiError::Network(_) => "Cannot reach the server. Is the backend running?".into(),
        ApiError::Server { message, .. } => message.clone(),
        ApiError::NoResponse => "No response received from the server.".into(),
        ApiError::Unknown(detail) => format!("Something went wrong: {detail}"),
    }
}

pub struct ChatSession {
    client: ApiClient,
    documents: Vec<PdfInfo>,
    selected: Option<String>,
    messages: Vec<Message>,
    uploading: bool,
    awaiting_answer: bool,
    banner: Option<StatusBanner>,
}

impl ChatSession {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            documents: Vec::new(),
            selected: None,
            messages: Vec::new(),
            uploading: false,
            awaiting_answer: false,
            banner: None,
        }
    }

    pub fn documents(&self) -> &[PdfInfo] {
        &self.documents
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_uploading(&self) -> bool {
        self.uploading
    }

    /// Drives the typing indicator; the send trigger is disabled while set.
    pub fn is_awaiting_answer(&self) -> bool {
        self.awaiting_answer
    }

    pub fn active_banner(&self) -> Option<&StatusBanner> {
        self.banner
            .as_ref()
            .filter(|b| b.expires_at > Instant::now())
    }

    fn set_banner(&mut self, kind: StatusKind, text: String) {
        let ttl = match kind {
            StatusKind::Success => SUCCESS_BANNER_TTL,
            StatusKind::Error => ERROR_BANNER_TTL,
        };
        // Re-posting the same banner refreshes its deadline instead of
        // stacking a duplicate.
        if let Some(current) = &mut self.banner {
            if current.kind == kind && current.text == text {
                current.expires_at = Instant::now() + ttl;
                return;
            }
        }
        self.banner = Some(StatusBanner {
            kind,
            text,
            expires_at: Instant::now() + ttl,
        });
    }

    /// Fetch-all and replace the cache wholesale. Failure keeps the
    /// previous cache.
    pub async fn refresh_documents(&mut self) {
        match self.client.list_pdfs().await {
            Ok(pdfs) => self.documents = pdfs,
            Err(err) => warn!(error = %err, "failed to refresh document list"),
        }
    }

    fn document_name(&self, pdf_id: &str) -> String {
        self.documents
            .iter()
            .find(|d| d.pdf_id == pdf_id)
            .map(|d| d.pdf_name.clone())
            .unwrap_or_else(|| pdf_id.to_string())
    }

    /// Upload a file. Local validation rejects before any network call;
    /// remote failures surface as the status banner.
    pub async fn upload_file<F>(
        &mut self,
        path: &Path,
        on_progress: F,
    ) -> Result<(), UploadRejection>
    where
        F: Fn(u8) + Send + Sync + 'static,
    {
        if self.uploading {
            return Ok(());
        }
        let is_pdf = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
        if !is_pdf {
            return Err(UploadRejection::NotPdf);
        }
        let size = tokio::fs::metadata(path)
            .await
            .map_err(|e| UploadRejection::Unreadable(e.to_string()))?
            .len();
        if size > MAX_UPLOAD_BYTES {
            return Err(UploadRejection::TooLarge);
        }

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload.pdf")
            .to_string();

        self.uploading = true;
        match self.client.upload_pdf(path, on_progress).await {
            Ok(receipt) => {
                self.selected = Some(receipt.pdf_id);
                self.messages = vec![Message::system(format!(
                    "Uploaded \"{file_name}\" ({} chunks). You can now ask questions about it.",
                    receipt.chunks
                ))];
                self.set_banner(
                    StatusKind::Success,
                    format!("\"{file_name}\" uploaded successfully"),
                );
                self.refresh_documents().await;
            }
            Err(err) => {
                self.set_banner(StatusKind::Error, format!("Upload failed: {}", user_message(&err)));
            }
        }
        self.uploading = false;
        Ok(())
    }

    /// Switch the active document; the thread resets to a single system
    /// notice. There is no history to fetch; sessions are client-local.
    pub fn select_document(&mut self, pdf_id: &str) {
        if self.selected.as_deref() == Some(pdf_id) {
            return;
        }
        let name = self.document_name(pdf_id);
        self.selected = Some(pdf_id.to_string());
        self.messages = vec![Message::system(format!("Now chatting with \"{name}\"."))];
    }

    /// Delete a document. The caller has already confirmed with the user.
    pub async fn delete_document(&mut self, pdf_id: &str) {
        let name = self.document_name(pdf_id);
        match self.client.delete_pdf(pdf_id).await {
            Ok(()) => {
                if self.selected.as_deref() == Some(pdf_id) {
                    self.selected = None;
                    self.messages.clear();
                }
                self.set_banner(StatusKind::Success, format!("\"{name}\" deleted"));
            }
            Err(err) => {
                self.set_banner(StatusKind::Error, format!("Delete failed: {}", user_message(&err)));
            }
        }
        self.refresh_documents().await;
    }

    /// Submit a question. No-op on blank input, with no selection, or
    /// while a previous answer is pending. Appends the user message
    /// optimistically, then exactly one assistant or error message.
    pub async fn send_question(&mut self, input: &str) {
        let question = input.trim();
        if question.is_empty() || self.awaiting_answer {
            return;
        }
        let Some(pdf_id) = self.selected.clone() else {
            return;
        };

        self.messages.push(Message::user(question));
        self.awaiting_answer = true;
        match self.client.chat(question, &pdf_id).await {
            Ok(answer) => {
                let sources = answer
                    .source_documents
                    .iter()
                    .map(|s| SourceRef {
                        pdf_name: s.metadata.pdf_name.clone(),
                        chunk_index: s.metadata.chunk_index,
                    })
                    .collect();
                self.messages.push(Message::assistant(answer.answer, sources));
            }
            Err(err) => {
                self.messages.push(Message::error(user_message(&err)));
            }
        }
        self.awaiting_answer = false;
    }
}
