//! Route definitions for annotations.

use axum::routing::{patch, post};
use axum::Router;

use crate::handlers::annotation;
use crate::state::AppState;

/// Annotation routes, nested under `/annotations`.
///
/// ```text
/// POST   /             create_annotation
/// POST   /bulk         sync_annotations
/// PATCH  /{id}         update_annotation
/// DELETE /{id}         delete_annotation
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(annotation::create_annotation))
        .route("/bulk", post(annotation::sync_annotations))
        .route(
            "/{id}",
            patch(annotation::update_annotation).delete(annotation::delete_annotation),
        )
}
