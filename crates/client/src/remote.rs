//! The remote side of synchronization, as seen by the sync engine.

use std::future::Future;

use sourcelab_core::annotation::Annotation;

use crate::api::ApiClient;
use crate::error::SyncError;

/// Remote operations the sync engine issues.
///
/// [`ApiClient`] is the production implementation; tests substitute a
/// recording fake.
pub trait RemoteStore: Send + Sync + 'static {
    /// Persist a new annotation and return it with its server-issued id.
    fn create_annotation(
        &self,
        annotation: &Annotation,
    ) -> impl Future<Output = Result<Annotation, SyncError>> + Send;

    fn delete_annotation(&self, id: &str) -> impl Future<Output = Result<(), SyncError>> + Send;

    /// Overwrite every annotation of `document_id` with `annotations`.
    fn replace_annotations(
        &self,
        document_id: &str,
        annotations: &[Annotation],
    ) -> impl Future<Output = Result<u64, SyncError>> + Send;
}

impl RemoteStore for ApiClient {
    async fn create_annotation(&self, annotation: &Annotation) -> Result<Annotation, SyncError> {
        ApiClient::create_annotation(self, annotation).await
    }

    async fn delete_annotation(&self, id: &str) -> Result<(), SyncError> {
        ApiClient::delete_annotation(self, id).await
    }

    async fn replace_annotations(
        &self,
        document_id: &str,
        annotations: &[Annotation],
    ) -> Result<u64, SyncError> {
        self.sync_annotations(document_id, annotations).await
    }
}
