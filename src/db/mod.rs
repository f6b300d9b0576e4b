pub mod models;

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection};
use thiserror::Error;

use crate::embedding::{bytes_to_embedding, embedding_to_bytes, search_similar};
use crate::models::PdfInfo;
use models::RetrievedChunk;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn new(db_path: &Path) -> Result<Self, StoreError> {
        if let Some(dir) = db_path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir).ok();
            }
        }
        let conn = Connection::open(db_path)?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(
            "
            PRAGMA journal_mode=WAL;
            PRAGMA foreign_keys=ON;

            CREATE TABLE IF NOT EXISTS documents (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                total_chunks INTEGER NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE IF NOT EXISTS chunks (
                id TEXT PRIMARY KEY,
                pdf_id TEXT NOT NULL,
                content TEXT NOT NULL,
                chunk_index INTEGER NOT NULL,
                embedding BLOB,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                FOREIGN KEY (pdf_id) REFERENCES documents(id) ON DELETE CASCADE
            );
            ",
        )?;
        Ok(())
    }

    /// Cheap liveness probe for the health endpoint.
    pub fn ping(&self) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.query_row("SELECT 1", [], |_| Ok(()))?;
        Ok(())
    }

    /// Store a document and its embedded chunks atomically.
    pub fn insert_document(
        &self,
        pdf_id: &str,
        name: &str,
        chunks: &[String],
        embeddings: &[Vec<f32>],
    ) -> Result<usize, StoreError> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO documents (id, name, total_chunks) VALUES (?1, ?2, ?3)",
            params![pdf_id, name, chunks.len() as i64],
        )?;
        for (i, (content, embedding)) in chunks.iter().zip(embeddings.iter()).enumerate() {
            let chunk_id = uuid::Uuid::new_v4().to_string();
            let bytes = embedding_to_bytes(embedding);
            tx.execute(
                "INSERT INTO chunks (id, pdf_id, content, chunk_index, embedding) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![chunk_id, pdf_id, content, i as i64, bytes],
            )?;
        }
        tx.commit()?;
        Ok(chunks.len())
    }

    pub fn list_documents(&self) -> Result<Vec<PdfInfo>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, name, total_chunks FROM documents ORDER BY created_at DESC, rowid DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(PdfInfo {
                pdf_id: row.get(0)?,
                pdf_name: row.get(1)?,
                total_chunks: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Delete a document and all its chunks; returns the number of chunks
    /// removed. Unknown ids are not an error.
    pub fn delete_document(&self, pdf_id: &str) -> Result<usize, StoreError> {
        let conn = self.conn.lock().unwrap();
        let chunk_count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM chunks WHERE pdf_id = ?1",
            params![pdf_id],
            |row| row.get(0),
        )?;
        conn.execute("DELETE FROM documents WHERE id = ?1", params![pdf_id])?;
        Ok(chunk_count as usize)
    }

    /// Rank stored chunks against a query embedding, optionally restricted
    /// to one document. Rows without an embedding are skipped.
    pub fn vector_search(
        &self,
        query_embedding: &[f32],
        limit: usize,
        pdf_id: Option<&str>,
    ) -> Result<Vec<RetrievedChunk>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let sql = "SELECT c.id, c.content, c.chunk_index, c.embedding, d.id, d.name, d.total_chunks
             FROM chunks c JOIN documents d ON c.pdf_id = d.id
             WHERE c.embedding IS NOT NULL AND (?1 IS NULL OR d.id = ?1)";
        let mut stmt = conn.prepare(sql)?;
        let rows: Vec<(String, String, i64, Vec<u8>, String, String, i64)> = stmt
            .query_map(params![pdf_id], |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                    row.get(6)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let pairs: Vec<(String, Vec<f32>)> = rows
            .iter()
            .map(|(id, _, _, blob, _, _, _)| (id.clone(), bytes_to_embedding(blob)))
            .collect();
        let ranked = search_similar(query_embedding, &pairs, limit);

        let hits = ranked
            .into_iter()
            .filter_map(|(chunk_id, score)| {
                rows.iter()
                    .find(|(id, _, _, _, _, _, _)| *id == chunk_id)
                    .map(
                        |(_, content, chunk_index, _, doc_id, name, total_chunks)| RetrievedChunk {
                            pdf_id: doc_id.clone(),
                            pdf_name: name.clone(),
                            chunk_index: *chunk_index,
                            total_chunks: *total_chunks,
                            content: content.clone(),
                            score,
                        },
                    )
            })
            .collect();
        Ok(hits)
    }
}
