/// Errors from talking to the persistence service.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The HTTP request itself failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service returned a non-2xx status code.
    #[error("API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The document or annotation does not exist on the server.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rejected locally before anything was sent.
    #[error("Validation failed: {0}")]
    Validation(String),
}

impl SyncError {
    /// Whether this is a network or server failure, as opposed to a
    /// missing resource or a local rejection.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Request(_) | Self::Api { .. })
    }
}
