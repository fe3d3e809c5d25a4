pub mod annotation;
pub mod document;
pub mod health;

use axum::Router;

use crate::config::ServerConfig;
use crate::state::AppState;

/// Build the `/api` route tree.
///
/// ```text
/// /documents                        create
/// /documents/upload                 upload (multipart, size-limited)
/// /documents/{share_token}          get by share token
///
/// /annotations                      create
/// /annotations/bulk                 replace all for a document
/// /annotations/{id}                 update, delete
/// ```
pub fn api_routes(config: &ServerConfig) -> Router<AppState> {
    Router::new()
        .nest("/documents", document::router(config.max_upload_bytes))
        .nest("/annotations", annotation::router())
}
