//! Annotation model and DTOs.

use serde::{Deserialize, Serialize};
use sourcelab_core::types::{EntityId, Timestamp};
use sqlx::FromRow;

/// A row from the `annotations` table.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    pub id: EntityId,
    pub document_id: EntityId,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub text: String,
    pub color: String,
    pub category: String,
    pub author: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a single annotation.
///
/// `color`, `category` and `author` are filled with defaults by the handler
/// before the row is written.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAnnotation {
    pub document_id: EntityId,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub text: String,
    pub color: Option<String>,
    pub category: Option<String>,
    pub author: Option<String>,
}

/// DTO for a partial annotation update.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAnnotation {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub text: Option<String>,
    pub color: Option<String>,
    pub category: Option<String>,
}

/// One entry of a bulk replace. Client-supplied ids and creation times are
/// kept so records survive a bulk sync under the id the client knows them by.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkAnnotation {
    pub id: Option<EntityId>,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub text: String,
    pub color: Option<String>,
    pub category: Option<String>,
    pub author: Option<String>,
    pub created_at: Option<Timestamp>,
}

/// Body of `POST /annotations/bulk`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkSyncRequest {
    pub document_id: EntityId,
    pub annotations: Vec<BulkAnnotation>,
}

/// Response of `POST /annotations/bulk`.
#[derive(Debug, Serialize, Deserialize)]
pub struct BulkSyncResponse {
    pub count: u64,
}
