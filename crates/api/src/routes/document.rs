//! Route definitions for documents.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use crate::handlers::document;
use crate::state::AppState;

/// Room left for multipart boundaries and part headers on top of the file
/// size limit. The handler enforces the exact file limit.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Document routes, nested under `/documents`.
///
/// ```text
/// POST   /                    create_document
/// POST   /upload              upload_image (multipart)
/// GET    /{share_token}       get_document
/// ```
pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/", post(document::create_document))
        .route(
            "/upload",
            post(document::upload_image).layer(DefaultBodyLimit::max(
                max_upload_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES),
            )),
        )
        .route("/{share_token}", get(document::get_document))
}
