// ABOUTME: SQLite-backed store of embedded recipe documents for the vector server
// ABOUTME: Embeddings and metadata are JSON columns; search is a full cosine scan
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ashpazyar Contributors

use super::{similarity, DocumentMetadata, VectorDocument};
use crate::database::connect_sqlite;
use crate::errors::{AppError, AppResult};
use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Pool, Row, Sqlite};
use tracing::{debug, info};
use uuid::Uuid;

/// Persistent document collection
#[derive(Clone)]
pub struct VectorStore {
    pool: Pool<Sqlite>,
}

impl VectorStore {
    /// Open the store and create its table
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or table creation fails
    pub async fn new(database_url: &str) -> AppResult<Self> {
        let pool = connect_sqlite(database_url).await?;
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS vector_documents (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                page_content TEXT NOT NULL,
                metadata TEXT NOT NULL,
                embedding TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create vector table: {e}")))?;

        let store = Self { pool };
        info!(documents = store.count().await?, "Vector store ready");
        Ok(store)
    }

    /// Store documents in one transaction
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the insert fails
    pub async fn insert(&self, documents: &[VectorDocument]) -> AppResult<usize> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        for doc in documents {
            sqlx::query(
                r"
                INSERT INTO vector_documents (id, page_content, metadata, embedding, created_at)
                VALUES (?, ?, ?, ?, ?)
                ",
            )
            .bind(doc.id.to_string())
            .bind(&doc.page_content)
            .bind(serde_json::to_string(&doc.metadata)?)
            .bind(serde_json::to_string(&doc.embedding)?)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        debug!(count = documents.len(), "Stored vector documents");
        Ok(documents.len())
    }

    /// Number of stored documents
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn count(&self) -> AppResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM vector_documents")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to count documents: {e}")))
    }

    /// Up to `limit` documents in insertion order
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row is corrupt
    pub async fn list(&self, limit: i64) -> AppResult<Vec<VectorDocument>> {
        let rows = sqlx::query("SELECT * FROM vector_documents ORDER BY seq LIMIT ?")
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to list documents: {e}")))?;
        rows.iter().map(row_to_document).collect()
    }

    /// The `k` documents nearest to `query`, ascending by cosine distance
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row is corrupt
    pub async fn nearest(&self, query: &[f32], k: usize) -> AppResult<Vec<(VectorDocument, f32)>> {
        let rows = sqlx::query("SELECT * FROM vector_documents ORDER BY seq")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to scan documents: {e}")))?;
        let documents = rows.iter().map(row_to_document).collect::<AppResult<Vec<_>>>()?;

        Ok(similarity::nearest(query, &documents, k)
            .into_iter()
            .map(|(doc, score)| (doc.clone(), score))
            .collect())
    }
}

fn row_to_document(row: &SqliteRow) -> AppResult<VectorDocument> {
    let id: String = row.try_get("id")?;
    let metadata: String = row.try_get("metadata")?;
    let embedding: String = row.try_get("embedding")?;
    Ok(VectorDocument {
        id: Uuid::parse_str(&id)
            .map_err(|e| AppError::internal(format!("Corrupt document id {id}: {e}")))?,
        page_content: row.try_get("page_content")?,
        metadata: serde_json::from_str::<DocumentMetadata>(&metadata)?,
        embedding: serde_json::from_str(&embedding)?,
    })
}
