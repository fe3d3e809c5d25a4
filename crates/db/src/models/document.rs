//! Document model and DTOs.

use serde::{Deserialize, Serialize};
use sourcelab_core::types::{EntityId, Timestamp};
use sqlx::FromRow;

use crate::models::annotation::Annotation;

/// A row from the `documents` table.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: EntityId,
    pub title: String,
    pub description: Option<String>,
    pub image_url: String,
    pub share_token: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new document.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDocument {
    pub title: String,
    pub description: Option<String>,
    pub image_url: String,
}

/// A document together with its annotations, newest first.
#[derive(Debug, Serialize)]
pub struct DocumentWithAnnotations {
    #[serde(flatten)]
    pub document: Document,
    pub annotations: Vec<Annotation>,
}
