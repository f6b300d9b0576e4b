/// A chunk pulled out of the store by vector search, joined with its
/// document metadata and scored against the query.
#[derive(Debug, Clone)]
pub struct RetrievedChunk {
    pub pdf_id: String,
    pub pdf_name: String,
    pub chunk_index: i64,
    pub total_chunks: i64,
    pub content: String,
    pub score: f32,
}
