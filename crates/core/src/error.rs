/// Domain failures shared by the editor, the store and the HTTP service.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Unknown share token or annotation id.
    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    /// Rejected input: empty note, bad color, oversized upload, ...
    #[error("invalid input: {0}")]
    Validation(String),

    /// An id that is already taken.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }
}
