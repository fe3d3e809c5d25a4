//! Repository for the `annotations` table.

use sourcelab_core::annotation::{Category, DEFAULT_AUTHOR, DEFAULT_COLOR};
use uuid::Uuid;

use crate::models::annotation::{Annotation, BulkAnnotation, CreateAnnotation, UpdateAnnotation};
use crate::DbPool;

/// Column list for annotations queries.
const COLUMNS: &str = "id, document_id, x, y, width, height, text, color, category, \
    author, created_at, updated_at";

/// Provides CRUD and bulk-replace operations for annotations.
pub struct AnnotationRepo;

impl AnnotationRepo {
    /// Create a new annotation, returning the created row. Missing color,
    /// category and author fall back to their defaults.
    pub async fn create(pool: &DbPool, input: &CreateAnnotation) -> Result<Annotation, sqlx::Error> {
        let now = chrono::Utc::now();
        let query = format!(
            "INSERT INTO annotations
                (id, document_id, x, y, width, height, text, color, category, author,
                 created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Annotation>(&query)
            .bind(Uuid::new_v4().to_string())
            .bind(&input.document_id)
            .bind(input.x)
            .bind(input.y)
            .bind(input.width)
            .bind(input.height)
            .bind(input.text.trim())
            .bind(input.color.as_deref().unwrap_or(DEFAULT_COLOR))
            .bind(input.category.as_deref().unwrap_or(Category::General.as_str()))
            .bind(input.author.as_deref().unwrap_or(DEFAULT_AUTHOR))
            .bind(now)
            .fetch_one(pool)
            .await
    }

    /// Find an annotation by its ID.
    pub async fn find_by_id(pool: &DbPool, id: &str) -> Result<Option<Annotation>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM annotations WHERE id = ?1");
        sqlx::query_as::<_, Annotation>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all annotations for a document, newest first.
    pub async fn list_by_document(
        pool: &DbPool,
        document_id: &str,
    ) -> Result<Vec<Annotation>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM annotations
             WHERE document_id = ?1
             ORDER BY created_at DESC, rowid DESC"
        );
        sqlx::query_as::<_, Annotation>(&query)
            .bind(document_id)
            .fetch_all(pool)
            .await
    }

    /// Update the provided fields of an annotation. Returns `None` if the id
    /// does not exist.
    pub async fn update(
        pool: &DbPool,
        id: &str,
        input: &UpdateAnnotation,
    ) -> Result<Option<Annotation>, sqlx::Error> {
        let query = format!(
            "UPDATE annotations SET
                x = COALESCE(?1, x),
                y = COALESCE(?2, y),
                width = COALESCE(?3, width),
                height = COALESCE(?4, height),
                text = COALESCE(?5, text),
                color = COALESCE(?6, color),
                category = COALESCE(?7, category),
                updated_at = ?8
             WHERE id = ?9
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Annotation>(&query)
            .bind(input.x)
            .bind(input.y)
            .bind(input.width)
            .bind(input.height)
            .bind(input.text.as_deref().map(str::trim))
            .bind(&input.color)
            .bind(&input.category)
            .bind(chrono::Utc::now())
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Delete an annotation. Returns `true` if a row was removed.
    pub async fn delete(pool: &DbPool, id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM annotations WHERE id = ?1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Replace every annotation of a document with `annotations` in one
    /// transaction: existing rows are deleted, then the list is inserted.
    /// Returns the number of rows inserted.
    pub async fn replace_for_document(
        pool: &DbPool,
        document_id: &str,
        annotations: &[BulkAnnotation],
    ) -> Result<u64, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let removed = sqlx::query("DELETE FROM annotations WHERE document_id = ?1")
            .bind(document_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let now = chrono::Utc::now();
        let mut inserted = 0;
        for a in annotations {
            let id = a.id.clone().unwrap_or_else(|| Uuid::new_v4().to_string());
            inserted += sqlx::query(
                "INSERT INTO annotations
                    (id, document_id, x, y, width, height, text, color, category, author,
                     created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            )
            .bind(id)
            .bind(document_id)
            .bind(a.x)
            .bind(a.y)
            .bind(a.width)
            .bind(a.height)
            .bind(a.text.trim())
            .bind(a.color.as_deref().unwrap_or(DEFAULT_COLOR))
            .bind(a.category.as_deref().unwrap_or(Category::General.as_str()))
            .bind(a.author.as_deref().unwrap_or(DEFAULT_AUTHOR))
            .bind(a.created_at.unwrap_or(now))
            .bind(now)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        }

        tx.commit().await?;

        tracing::debug!(document_id, removed, inserted, "Replaced document annotations");
        Ok(inserted)
    }
}
