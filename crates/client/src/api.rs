//! REST client for the persistence service.
//!
//! Wraps the document and annotation endpoints using [`reqwest`]. Every
//! non-2xx response becomes [`SyncError::Api`], except a 404 on an
//! addressed resource, which becomes [`SyncError::NotFound`].

use serde::{Deserialize, Serialize};
use sourcelab_core::annotation::Annotation;
use sourcelab_core::document::{validate_upload_size, Document};
use sourcelab_core::store::AnnotationPatch;

use crate::config::ClientConfig;
use crate::error::SyncError;

/// Body of `POST /api/documents`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDocument {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub image_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    image_url: String,
}

#[derive(Debug, Deserialize)]
struct BulkResponse {
    count: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BulkRequest<'a> {
    document_id: &'a str,
    annotations: &'a [Annotation],
}

/// HTTP client for one persistence service instance.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    api_url: String,
}

impl ApiClient {
    /// Build a client with the configured base URL and request timeout.
    pub fn new(config: &ClientConfig) -> Result<Self, SyncError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self::with_client(client, config.api_url.clone()))
    }

    /// Create an API client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, api_url: String) -> Self {
        Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    // ---- documents ----

    pub async fn create_document(&self, input: &NewDocument) -> Result<Document, SyncError> {
        let response = self
            .client
            .post(format!("{}/api/documents", self.api_url))
            .json(input)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Fetch a document by share token. An unknown token is
    /// [`SyncError::NotFound`].
    pub async fn get_document(&self, share_token: &str) -> Result<Document, SyncError> {
        let response = self
            .client
            .get(format!("{}/api/documents/{}", self.api_url, share_token))
            .send()
            .await?;

        Self::parse_response(response)
            .await
            .map_err(|e| not_found_as(e, "document", share_token))
    }

    /// Upload an image and return the embeddable URL the server issued.
    /// Files over the upload limit are refused before any request is made.
    pub async fn upload_image(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, SyncError> {
        validate_upload_size(bytes.len()).map_err(|e| SyncError::Validation(e.to_string()))?;

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(content_type)?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(format!("{}/api/documents/upload", self.api_url))
            .multipart(form)
            .send()
            .await?;

        let body: UploadResponse = Self::parse_response(response).await?;
        Ok(body.image_url)
    }

    // ---- annotations ----

    /// Create one annotation. The annotation must belong to a persisted
    /// document; the returned record carries the server-issued id.
    pub async fn create_annotation(&self, annotation: &Annotation) -> Result<Annotation, SyncError> {
        if annotation.document_id.is_none() {
            return Err(SyncError::Validation(
                "annotation does not belong to a saved document".to_string(),
            ));
        }

        let response = self
            .client
            .post(format!("{}/api/annotations", self.api_url))
            .json(annotation)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    pub async fn update_annotation(
        &self,
        id: &str,
        patch: &AnnotationPatch,
    ) -> Result<Annotation, SyncError> {
        let response = self
            .client
            .patch(format!("{}/api/annotations/{}", self.api_url, id))
            .json(patch)
            .send()
            .await?;

        Self::parse_response(response)
            .await
            .map_err(|e| not_found_as(e, "annotation", id))
    }

    pub async fn delete_annotation(&self, id: &str) -> Result<(), SyncError> {
        let response = self
            .client
            .delete(format!("{}/api/annotations/{}", self.api_url, id))
            .send()
            .await?;

        Self::check_status(response)
            .await
            .map_err(|e| not_found_as(e, "annotation", id))
    }

    /// Replace the document's whole annotation set with `annotations`.
    /// Returns the number of records the server now holds.
    pub async fn sync_annotations(
        &self,
        document_id: &str,
        annotations: &[Annotation],
    ) -> Result<u64, SyncError> {
        let body = BulkRequest {
            document_id,
            annotations,
        };

        let response = self
            .client
            .post(format!("{}/api/annotations/bulk", self.api_url))
            .json(&body)
            .send()
            .await?;

        let body: BulkResponse = Self::parse_response(response)
            .await
            .map_err(|e| not_found_as(e, "document", document_id))?;
        Ok(body.count)
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code, or return
    /// [`SyncError::Api`] with the status and body text.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, SyncError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(SyncError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, SyncError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }

    async fn check_status(response: reqwest::Response) -> Result<(), SyncError> {
        Self::ensure_success(response).await?;
        Ok(())
    }
}

fn not_found_as(err: SyncError, entity: &str, id: &str) -> SyncError {
    match err {
        SyncError::Api { status: 404, .. } => SyncError::NotFound(format!("{entity} {id}")),
        other => other,
    }
}
