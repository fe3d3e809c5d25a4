//! Test doubles shared by the engine and editor tests.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use sourcelab_core::annotation::{Annotation, AnnotationDraft, Geometry};
use sourcelab_core::types::EntityId;

use crate::engine::lock;
use crate::error::SyncError;
use crate::remote::RemoteStore;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    /// Carries the id the annotation was sent under.
    Create(EntityId),
    Delete(EntityId),
    Replace {
        document_id: EntityId,
        annotations: Vec<Annotation>,
    },
}

/// Records every call and answers immediately (or after a configured
/// delay). Created annotations get ids `srv-1`, `srv-2`, ...
#[derive(Default)]
pub struct FakeRemote {
    calls: Mutex<Vec<Call>>,
    next_id: AtomicUsize,
    fail_create: AtomicBool,
    fail_delete: AtomicBool,
    fail_replace: AtomicBool,
    create_delay_ms: AtomicU64,
    replace_delay_ms: AtomicU64,
    replacing: AtomicUsize,
    max_concurrent_replaces: AtomicUsize,
}

impl FakeRemote {
    pub fn fail_creates(&self, fail: bool) {
        self.fail_create.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_delete.store(fail, Ordering::SeqCst);
    }

    pub fn fail_replaces(&self, fail: bool) {
        self.fail_replace.store(fail, Ordering::SeqCst);
    }

    pub fn set_create_delay(&self, delay: Duration) {
        self.create_delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn set_replace_delay(&self, delay: Duration) {
        self.replace_delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<Call> {
        lock(&self.calls).clone()
    }

    pub fn create_count(&self) -> usize {
        self.count(|c| matches!(c, Call::Create(_)))
    }

    pub fn replace_count(&self) -> usize {
        self.count(|c| matches!(c, Call::Replace { .. }))
    }

    /// Most replace calls ever running at the same moment.
    pub fn max_concurrent_replaces(&self) -> usize {
        self.max_concurrent_replaces.load(Ordering::SeqCst)
    }

    /// Annotations sent by the most recent snapshot sync.
    pub fn last_replace(&self) -> Option<Vec<Annotation>> {
        lock(&self.calls).iter().rev().find_map(|c| match c {
            Call::Replace { annotations, .. } => Some(annotations.clone()),
            _ => None,
        })
    }

    fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        lock(&self.calls).iter().filter(|c| pred(c)).count()
    }

    fn record(&self, call: Call) {
        lock(&self.calls).push(call);
    }

    async fn pause(delay_ms: &AtomicU64) {
        let ms = delay_ms.load(Ordering::SeqCst);
        if ms > 0 {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
    }

    fn failure() -> SyncError {
        SyncError::Api {
            status: 503,
            body: "unavailable".to_string(),
        }
    }
}

impl RemoteStore for FakeRemote {
    async fn create_annotation(&self, annotation: &Annotation) -> Result<Annotation, SyncError> {
        self.record(Call::Create(annotation.id.clone()));
        Self::pause(&self.create_delay_ms).await;
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(Self::failure());
        }
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Annotation {
            id: format!("srv-{n}"),
            ..annotation.clone()
        })
    }

    async fn delete_annotation(&self, id: &str) -> Result<(), SyncError> {
        self.record(Call::Delete(id.to_string()));
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(Self::failure());
        }
        Ok(())
    }

    async fn replace_annotations(
        &self,
        document_id: &str,
        annotations: &[Annotation],
    ) -> Result<u64, SyncError> {
        self.record(Call::Replace {
            document_id: document_id.to_string(),
            annotations: annotations.to_vec(),
        });
        let running = self.replacing.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_concurrent_replaces.fetch_max(running, Ordering::SeqCst);
        Self::pause(&self.replace_delay_ms).await;
        self.replacing.fetch_sub(1, Ordering::SeqCst);
        if self.fail_replace.load(Ordering::SeqCst) {
            return Err(Self::failure());
        }
        Ok(annotations.len() as u64)
    }
}

/// An "Article I" annotation at `{10, 10, 100, 50}` with default category.
pub fn local_annotation(id: &str, document_id: Option<EntityId>) -> Annotation {
    let mut draft = AnnotationDraft::new(Geometry {
        x: 10.0,
        y: 10.0,
        width: 100.0,
        height: 50.0,
    });
    draft.text = "Article I".to_string();
    draft.into_annotation(id.to_string(), document_id, chrono::Utc::now())
}
