//! Repository for the `documents` table.

use sourcelab_core::document::generate_share_token;
use uuid::Uuid;

use crate::models::document::{CreateDocument, Document};
use crate::DbPool;

/// Column list for documents queries.
const COLUMNS: &str = "id, title, description, image_url, share_token, created_at, updated_at";

/// Provides create and lookup operations for documents.
pub struct DocumentRepo;

impl DocumentRepo {
    /// Create a new document with a fresh share token, returning the created row.
    pub async fn create(pool: &DbPool, input: &CreateDocument) -> Result<Document, sqlx::Error> {
        let now = chrono::Utc::now();
        let query = format!(
            "INSERT INTO documents
                (id, title, description, image_url, share_token, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Document>(&query)
            .bind(Uuid::new_v4().to_string())
            .bind(input.title.trim())
            .bind(&input.description)
            .bind(&input.image_url)
            .bind(generate_share_token())
            .bind(now)
            .fetch_one(pool)
            .await
    }

    /// Find a document by its public share token.
    pub async fn find_by_share_token(
        pool: &DbPool,
        share_token: &str,
    ) -> Result<Option<Document>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM documents WHERE share_token = ?1");
        sqlx::query_as::<_, Document>(&query)
            .bind(share_token)
            .fetch_optional(pool)
            .await
    }

    /// Find a document by its ID.
    pub async fn find_by_id(pool: &DbPool, id: &str) -> Result<Option<Document>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM documents WHERE id = ?1");
        sqlx::query_as::<_, Document>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
