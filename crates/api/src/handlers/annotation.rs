//! Handlers for annotations: single create/update/delete plus the bulk
//! replace used by debounced snapshot sync.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use sourcelab_core::annotation::{
    validate_color_hex, validate_geometry, validate_text, Category, Geometry,
};
use sourcelab_core::error::CoreError;
use sourcelab_db::models::annotation::{
    Annotation, BulkSyncRequest, BulkSyncResponse, CreateAnnotation, UpdateAnnotation,
};
use sourcelab_db::repositories::AnnotationRepo;

use crate::error::{AppError, AppResult};
use crate::handlers::document::ensure_document_exists;
use crate::state::AppState;

/* --------------------------------------------------------------------------
   Validation
   -------------------------------------------------------------------------- */

fn validate_fields(
    geometry: &Geometry,
    text: &str,
    color: Option<&str>,
    category: Option<&str>,
) -> Result<(), CoreError> {
    validate_geometry(geometry)?;
    validate_text(text)?;
    if let Some(color) = color {
        validate_color_hex(color)?;
    }
    if let Some(category) = category {
        Category::from_str(category)?;
    }
    Ok(())
}

fn validate_patch(input: &UpdateAnnotation) -> Result<(), CoreError> {
    for (name, value) in [("x", input.x), ("y", input.y)] {
        if value.is_some_and(|v| !v.is_finite()) {
            return Err(CoreError::Validation(format!("{name} must be a finite number")));
        }
    }
    for (name, value) in [("width", input.width), ("height", input.height)] {
        if value.is_some_and(|v| !v.is_finite() || v < 0.0) {
            return Err(CoreError::Validation(format!(
                "{name} must be a non-negative number"
            )));
        }
    }
    if let Some(ref text) = input.text {
        validate_text(text)?;
    }
    if let Some(ref color) = input.color {
        validate_color_hex(color)?;
    }
    if let Some(ref category) = input.category {
        Category::from_str(category)?;
    }
    Ok(())
}

/* --------------------------------------------------------------------------
   Handlers
   -------------------------------------------------------------------------- */

/// POST /annotations
///
/// Create one annotation on an existing document.
pub async fn create_annotation(
    State(state): State<AppState>,
    Json(input): Json<CreateAnnotation>,
) -> AppResult<(StatusCode, Json<Annotation>)> {
    ensure_document_exists(&state.pool, &input.document_id).await?;

    let geometry = Geometry {
        x: input.x,
        y: input.y,
        width: input.width,
        height: input.height,
    };
    validate_fields(
        &geometry,
        &input.text,
        input.color.as_deref(),
        input.category.as_deref(),
    )?;

    let annotation = AnnotationRepo::create(&state.pool, &input).await?;

    tracing::info!(
        document_id = %input.document_id,
        annotation_id = %annotation.id,
        "Annotation created"
    );

    Ok((StatusCode::CREATED, Json(annotation)))
}

/// PATCH /annotations/{id}
///
/// Partially update an annotation. Absent fields are left unchanged.
pub async fn update_annotation(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdateAnnotation>,
) -> AppResult<Json<Annotation>> {
    validate_patch(&input)?;

    let annotation = AnnotationRepo::update(&state.pool, &id, &input)
        .await?
        .ok_or_else(|| CoreError::not_found("Annotation", id.as_str()))?;

    tracing::info!(annotation_id = %id, "Annotation updated");

    Ok(Json(annotation))
}

/// DELETE /annotations/{id}
pub async fn delete_annotation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    let deleted = AnnotationRepo::delete(&state.pool, &id).await?;
    if !deleted {
        return Err(CoreError::not_found("Annotation", id).into());
    }

    tracing::info!(annotation_id = %id, "Annotation deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// POST /annotations/bulk
///
/// Replace every annotation of a document with the given list. This is a
/// last-writer-wins overwrite: whatever the document held before is gone.
pub async fn sync_annotations(
    State(state): State<AppState>,
    Json(input): Json<BulkSyncRequest>,
) -> AppResult<Json<BulkSyncResponse>> {
    ensure_document_exists(&state.pool, &input.document_id).await?;

    for (index, item) in input.annotations.iter().enumerate() {
        let geometry = Geometry {
            x: item.x,
            y: item.y,
            width: item.width,
            height: item.height,
        };
        validate_fields(
            &geometry,
            &item.text,
            item.color.as_deref(),
            item.category.as_deref(),
        )
        .map_err(|e| match e {
            CoreError::Validation(msg) => {
                AppError::Core(CoreError::Validation(format!("annotations[{index}]: {msg}")))
            }
            other => AppError::Core(other),
        })?;
    }

    let count =
        AnnotationRepo::replace_for_document(&state.pool, &input.document_id, &input.annotations)
            .await?;

    tracing::info!(
        document_id = %input.document_id,
        count,
        "Annotations replaced by bulk sync"
    );

    Ok(Json(BulkSyncResponse { count }))
}
