//! Handlers for documents and image uploads.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use sourcelab_core::document::{encode_data_url, validate_title};
use sourcelab_core::error::CoreError;
use sourcelab_db::models::document::{CreateDocument, DocumentWithAnnotations};
use sourcelab_db::repositories::{AnnotationRepo, DocumentRepo};
use sourcelab_db::DbPool;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Response of `POST /documents/upload`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub image_url: String,
}

/// Verify that a document exists, returning 404 otherwise.
pub async fn ensure_document_exists(pool: &DbPool, id: &str) -> AppResult<()> {
    DocumentRepo::find_by_id(pool, id)
        .await?
        .ok_or_else(|| CoreError::not_found("Document", id))?;
    Ok(())
}

/// POST /documents
///
/// Create a document. The response carries the freshly generated share
/// token and an empty annotation list.
pub async fn create_document(
    State(state): State<AppState>,
    Json(input): Json<CreateDocument>,
) -> AppResult<(StatusCode, Json<DocumentWithAnnotations>)> {
    validate_title(&input.title)?;
    if input.image_url.trim().is_empty() {
        return Err(AppError::BadRequest("imageUrl must not be empty".into()));
    }

    let document = DocumentRepo::create(&state.pool, &input).await?;

    tracing::info!(document_id = %document.id, "Document created");

    Ok((
        StatusCode::CREATED,
        Json(DocumentWithAnnotations {
            document,
            annotations: Vec::new(),
        }),
    ))
}

/// GET /documents/{share_token}
///
/// Look a document up by its share token, with annotations newest first.
pub async fn get_document(
    State(state): State<AppState>,
    Path(share_token): Path<String>,
) -> AppResult<Json<DocumentWithAnnotations>> {
    let document = DocumentRepo::find_by_share_token(&state.pool, &share_token)
        .await?
        .ok_or_else(|| CoreError::not_found("Document", share_token.as_str()))?;

    let annotations = AnnotationRepo::list_by_document(&state.pool, &document.id).await?;

    Ok(Json(DocumentWithAnnotations {
        document,
        annotations,
    }))
}

/// POST /documents/upload
///
/// Accepts a multipart form and takes the first file part. The image is
/// returned inline as a `data:` URL rather than stored.
pub async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<UploadResponse>> {
    let mut upload: Option<(Option<String>, Vec<u8>)> = None;

    while let Some(field) = multipart.next_field().await? {
        if field.file_name().is_none() && field.name() != Some("file") {
            continue;
        }
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await?;
        upload = Some((content_type, data.to_vec()));
        break;
    }

    let (content_type, data) =
        upload.ok_or_else(|| AppError::BadRequest("No file uploaded".into()))?;

    if data.is_empty() {
        return Err(AppError::BadRequest("No file uploaded".into()));
    }
    if data.len() > state.config.max_upload_bytes {
        return Err(AppError::PayloadTooLarge(format!(
            "uploaded file is {} bytes, maximum is {}",
            data.len(),
            state.config.max_upload_bytes
        )));
    }

    tracing::info!(
        bytes = data.len(),
        content_type = content_type.as_deref().unwrap_or("unknown"),
        "Image uploaded"
    );

    Ok(Json(UploadResponse {
        image_url: encode_data_url(content_type.as_deref(), &data),
    }))
}
