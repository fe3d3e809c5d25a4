//! Documents: an uploaded image plus its annotations, addressed publicly by
//! an unguessable share token.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::annotation::Annotation;
use crate::error::CoreError;
use crate::types::{EntityId, Timestamp};

/// Largest accepted image upload (10 MiB).
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Maximum document title length in characters.
pub const MAX_TITLE_LENGTH: usize = 200;

/// Content type assumed when an upload does not declare one.
pub const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

/// A document as returned by the REST collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: EntityId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub image_url: String,
    pub share_token: String,
    /// Newest first, as the server orders them.
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    pub created_at: Timestamp,
}

/// Generate a fresh share token. Tokens are random v4 UUIDs and never reused.
pub fn generate_share_token() -> String {
    Uuid::new_v4().to_string()
}

/// Validate a document title: non-empty once trimmed and at most
/// [`MAX_TITLE_LENGTH`] characters.
pub fn validate_title(title: &str) -> Result<(), CoreError> {
    if title.trim().is_empty() {
        return Err(CoreError::Validation(
            "document title must not be empty".to_string(),
        ));
    }
    let len = title.chars().count();
    if len > MAX_TITLE_LENGTH {
        return Err(CoreError::Validation(format!(
            "document title is {len} characters, maximum is {MAX_TITLE_LENGTH}"
        )));
    }
    Ok(())
}

/// Reject empty uploads and uploads larger than [`MAX_UPLOAD_BYTES`].
pub fn validate_upload_size(len: usize) -> Result<(), CoreError> {
    if len == 0 {
        return Err(CoreError::Validation("uploaded file is empty".to_string()));
    }
    if len > MAX_UPLOAD_BYTES {
        return Err(CoreError::Validation(format!(
            "uploaded file is {len} bytes, maximum is {MAX_UPLOAD_BYTES}"
        )));
    }
    Ok(())
}

/// Encode uploaded bytes as an embeddable `data:` URL.
pub fn encode_data_url(mime_type: Option<&str>, bytes: &[u8]) -> String {
    let mime = mime_type
        .filter(|m| !m.trim().is_empty())
        .unwrap_or(FALLBACK_MIME_TYPE);
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn share_tokens_are_unique() {
        assert_ne!(generate_share_token(), generate_share_token());
    }

    #[test]
    fn blank_title_rejected() {
        assert!(validate_title("  ").is_err());
        assert!(validate_title("Declaration of Independence").is_ok());
    }

    #[test]
    fn upload_size_limits() {
        assert!(validate_upload_size(0).is_err());
        assert!(validate_upload_size(MAX_UPLOAD_BYTES).is_ok());
        assert!(validate_upload_size(MAX_UPLOAD_BYTES + 1).is_err());
    }

    #[test]
    fn data_url_uses_declared_mime() {
        assert_eq!(encode_data_url(Some("image/png"), b"abc"), "data:image/png;base64,YWJj");
    }

    #[test]
    fn data_url_falls_back_without_mime() {
        let url = encode_data_url(None, b"abc");
        assert!(url.starts_with("data:application/octet-stream;base64,"));
    }

    #[test]
    fn document_without_annotations_field_deserializes() {
        let json = serde_json::json!({
            "id": "d1",
            "title": "Magna Carta",
            "imageUrl": "data:image/png;base64,AAAA",
            "shareToken": "tok",
            "createdAt": "2024-01-01T00:00:00Z"
        });
        let doc: Document = serde_json::from_value(json).unwrap();
        assert!(doc.annotations.is_empty());
        assert_eq!(doc.description, None);
    }
}
