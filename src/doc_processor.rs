use thiserror::Error;

/// Chunk geometry used at ingestion time.
pub const CHUNK_SIZE: usize = 1000;
pub const CHUNK_OVERLAP: usize = 200;

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("PDF parse error: {0}")]
    Parse(String),
    #[error("PDF appears to be empty or contains no extractable text")]
    Empty,
}

/// Extract the full text of a PDF from its raw bytes.
pub fn extract_text(bytes: &[u8]) -> Result<String, PdfError> {
    let text = pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| PdfError::Parse(e.to_string()))?;
    if text.trim().is_empty() {
        return Err(PdfError::Empty);
    }
    Ok(text)
}

/// Split text into overlapping chunks for embedding
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() {
        return vec![];
    }
    if text.len() <= chunk_size {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let chars: Vec<char> = text.chars().collect();
    let mut start = 0;

    while start < chars.len() {
        let end = (start + chunk_size).min(chars.len());
        let chunk: String = chars[start..end].iter().collect();
        let chunk = chunk.trim().to_string();
        if !chunk.is_empty() {
            chunks.push(chunk);
        }
        if end >= chars.len() {
            break;
        }
        start += chunk_size - overlap;
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_text_short() {
        let chunks = chunk_text("Hello world", 100, 20);
        assert_eq!(chunks, vec!["Hello world"]);
    }

    #[test]
    fn test_chunk_text_overlap() {
        let text = "a".repeat(100);
        let chunks = chunk_text(&text, 40, 10);
        assert!(chunks.len() >= 3);
        // Check overlap exists
        assert_eq!(chunks[0].len(), 40);
    }

    #[test]
    fn test_chunk_text_empty() {
        assert!(chunk_text("   \n  ", 100, 20).is_empty());
    }

    #[test]
    fn test_chunk_text_covers_tail() {
        let text = "b".repeat(95);
        let chunks = chunk_text(&text, 40, 10);
        let total: usize = chunks.iter().map(String::len).sum();
        // Overlapping windows must cover every character at least once.
        assert!(total >= 95);
        assert!(chunks.last().unwrap().len() <= 40);
    }

    #[test]
    fn test_extract_text_rejects_garbage() {
        assert!(matches!(
            extract_text(b"definitely not a pdf"),
            Err(PdfError::Parse(_))
        ));
    }
}
