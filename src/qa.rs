//! Retrieval-augmented answering: embed the question, pull the closest
//! chunks, and ask the chat model to answer from that context only.

use thiserror::Error;

use crate::db::models::RetrievedChunk;
use crate::db::{Database, StoreError};
use crate::embedding::EmbeddingClient;
use crate::llm::openai::ChatClient;
use crate::llm::{ChatMessage, LlmError};
use crate::models::{ChatAnswer, SourceDocument, SourceMetadata};

const TOP_K: usize = 5;
const PREVIEW_CHARS: usize = 200;

#[derive(Debug, Error)]
pub enum QaError {
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("failed to generate query embedding")]
    NoQueryEmbedding,
}

fn build_prompt(context: &str, question: &str) -> String {
    format!(
        "Use the following pieces of context from uploaded PDF documents to answer the question.\n\
         If you don't know the answer based on the context, just say that you don't know, don't try to make up an answer.\n\
         \n\
         Context: {context}\n\
         \n\
         Question: {question}\n\
         \n\
         Provide a detailed answer based only on the context provided:"
    )
}

fn to_source(hit: RetrievedChunk) -> SourceDocument {
    SourceDocument {
        text: preview(&hit.content),
        metadata: SourceMetadata {
            pdf_id: Some(hit.pdf_id),
            pdf_name: hit.pdf_name,
            chunk_index: hit.chunk_index,
            total_chunks: Some(hit.total_chunks),
        },
    }
}

fn preview(text: &str) -> String {
    if text.chars().count() > PREVIEW_CHARS {
        let mut p: String = text.chars().take(PREVIEW_CHARS).collect();
        p.push_str("...");
        p
    } else {
        text.to_string()
    }
}

pub async fn answer_question(
    store: &Database,
    embedder: &EmbeddingClient,
    llm: &ChatClient,
    question: &str,
    pdf_id: Option<&str>,
) -> Result<ChatAnswer, QaError> {
    let query_embeddings = embedder.generate(&[question.to_string()]).await?;
    let query = query_embeddings.first().ok_or(QaError::NoQueryEmbedding)?;

    let hits = store.vector_search(query, TOP_K, pdf_id)?;
    tracing::info!(retrieved = hits.len(), "answering question");

    let context: Vec<&str> = hits.iter().map(|h| h.content.as_str()).collect();
    let prompt = build_prompt(&context.join("\n\n"), question);
    let answer = llm.complete(&[ChatMessage::user(prompt)]).await?;

    Ok(ChatAnswer {
        answer,
        source_documents: hits.into_iter().map(to_source).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::openai::OpenAiConfig;
    use httpmock::prelude::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_answer_question_end_to_end() {
        let dir = tempdir().unwrap();
        let store = Database::new(&dir.path().join("qa.db")).unwrap();
        let long_chunk = "x".repeat(300);
        store
            .insert_document(
                "abc123",
                "report.pdf",
                &["the summary is short".into(), long_chunk.clone()],
                &[vec![1.0, 0.0], vec![0.8, 0.2]],
            )
            .unwrap();

        let server = MockServer::start_async().await;
        let embed_mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/embeddings");
                then.status(200)
                    .json_body(serde_json::json!({"data": [{"embedding": [1.0, 0.0]}]}));
            })
            .await;
        let chat_mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/chat/completions")
                    .body_includes("the summary is short");
                then.status(200).json_body(serde_json::json!({
                    "choices": [{"message": {"role": "assistant", "content": "A short summary."}}]
                }));
            })
            .await;

        let config = OpenAiConfig {
            api_key: "k".into(),
            base_url: server.base_url(),
        };
        let embedder = EmbeddingClient::new(config.clone(), "text-embedding-3-small");
        let llm = ChatClient::new(config, "gpt-test");

        let answer = answer_question(&store, &embedder, &llm, "What is the summary?", Some("abc123"))
            .await
            .unwrap();

        assert_eq!(answer.answer, "A short summary.");
        assert_eq!(answer.source_documents.len(), 2);
        let top = &answer.source_documents[0];
        assert_eq!(top.metadata.pdf_name, "report.pdf");
        assert_eq!(top.metadata.chunk_index, 0);
        assert_eq!(top.metadata.total_chunks, Some(2));
        // Long chunk text is truncated to a preview.
        let second = &answer.source_documents[1];
        assert_eq!(second.text.chars().count(), 203);
        assert!(second.text.ends_with("..."));

        embed_mock.assert_async().await;
        chat_mock.assert_async().await;
    }

    #[test]
    fn test_preview_keeps_short_text() {
        assert_eq!(preview("short"), "short");
    }
}
