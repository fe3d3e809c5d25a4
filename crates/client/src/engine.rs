//! Synchronization of the local annotation store with the remote store.
//!
//! Two independent channels, with no merge protocol between them:
//!
//! - **Per-operation**: creates and deletes are sent immediately, on a
//!   spawned task, when the document has a persisted id. Failures are
//!   logged; nothing is retried and nothing is rolled back locally.
//! - **Snapshot**: every mutation restarts a debounce timer. When it
//!   fires (or on [`SyncEngine::sync_now`]) the whole annotation list
//!   replaces the remote set. Snapshot syncs run one at a time, so the
//!   newest snapshot is always the last to commit.
//!
//! A snapshot may reach the server while a record's create is still in
//! flight, storing it under its temporary id. When that create is
//! acknowledged, the record is flagged dirty and a fresh snapshot is sent
//! so the temporary row does not outlive the rename.
//!
//! Acknowledgements are applied by id and revision, so they may arrive in
//! any order, or twice, without corrupting the store.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::FutureExt;
use serde::Serialize;
use sourcelab_core::annotation::{is_local_id, Annotation};
use sourcelab_core::store::{AnnotationStore, IdReplacement, StatusCounts};
use sourcelab_core::types::{EntityId, Timestamp};
use tokio::task::JoinHandle;

use crate::error::SyncError;
use crate::remote::RemoteStore;
use crate::timer::DebounceTimer;

/// The annotation store, shared between the editor and sync tasks.
pub type SharedStore = Arc<Mutex<AnnotationStore>>;

/// Lock a mutex, recovering the data if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// What the sync indicator shows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncIndicator {
    pub counts: StatusCounts,
    /// The most recent snapshot sync failed.
    pub has_error: bool,
    pub last_synced_at: Option<Timestamp>,
    /// A debounced snapshot sync is waiting to fire.
    pub sync_pending: bool,
}

#[derive(Debug, Default)]
struct SnapshotState {
    has_error: bool,
    last_synced_at: Option<Timestamp>,
}

struct Shared<R> {
    remote: Arc<R>,
    store: SharedStore,
    document_id: Option<EntityId>,
    snapshot_state: Mutex<SnapshotState>,
    /// Held from taking a snapshot until it is marked synced.
    snapshot_lock: tokio::sync::Mutex<()>,
    /// Temporary ids present in the last snapshot the server accepted.
    snapshotted_local: Mutex<HashSet<EntityId>>,
}

impl<R: RemoteStore> Shared<R> {
    async fn sync_snapshot(&self) -> Result<u64, SyncError> {
        let Some(document_id) = self.document_id.as_deref() else {
            return Err(SyncError::Validation(
                "document has not been saved yet".to_string(),
            ));
        };

        let _serial = self.snapshot_lock.lock().await;
        let snapshot = lock(&self.store).snapshot();

        match self
            .remote
            .replace_annotations(document_id, &snapshot.annotations)
            .await
        {
            Ok(count) => {
                let marked = lock(&self.store).mark_snapshot_synced(&snapshot);
                *lock(&self.snapshotted_local) = snapshot
                    .annotations
                    .iter()
                    .filter(|a| is_local_id(&a.id))
                    .map(|a| a.id.clone())
                    .collect();
                {
                    let mut state = lock(&self.snapshot_state);
                    state.has_error = false;
                    state.last_synced_at = Some(chrono::Utc::now());
                }
                tracing::info!(document_id, count, marked, "Annotations synced");
                Ok(count)
            }
            Err(e) => {
                lock(&self.snapshot_state).has_error = true;
                tracing::error!(document_id, error = %e, "Snapshot sync failed");
                Err(e)
            }
        }
    }

    async fn send_create(&self, annotation: Annotation, revision: u64) {
        let temp_id = annotation.id.clone();

        let created = match self.remote.create_annotation(&annotation).await {
            Ok(created) => created,
            Err(e) => {
                tracing::warn!(
                    annotation_id = %temp_id,
                    error = %e,
                    "Annotation create failed, record stays local"
                );
                return;
            }
        };

        // Wait out a snapshot that may be sending the temporary id.
        let (outcome, snapshotted) = {
            let _serial = self.snapshot_lock.lock().await;
            let outcome = lock(&self.store).acknowledge_create(&temp_id, &created.id, revision);
            let snapshotted = lock(&self.snapshotted_local).remove(&temp_id);
            (outcome, snapshotted)
        };

        match outcome {
            IdReplacement::Replaced if snapshotted => {
                lock(&self.store).mark_dirty(&created.id);
                tracing::info!(
                    temp_id = %temp_id,
                    server_id = %created.id,
                    "Annotation created remotely after a snapshot sent its temporary id, resyncing"
                );
                let _ = self.sync_snapshot().await;
            }
            IdReplacement::Replaced => {
                tracing::info!(
                    temp_id = %temp_id,
                    server_id = %created.id,
                    "Annotation created remotely"
                );
            }
            IdReplacement::AlreadyApplied => {
                tracing::debug!(server_id = %created.id, "Create acknowledgement already applied");
            }
            IdReplacement::Missing => {
                // Deleted locally while the create was in flight.
                tracing::info!(
                    temp_id = %temp_id,
                    server_id = %created.id,
                    "Annotation removed during create, deleting remote copy"
                );
                self.send_delete(&created.id).await;
            }
        }
    }

    async fn send_delete(&self, id: &str) {
        match self.remote.delete_annotation(id).await {
            Ok(()) => tracing::info!(annotation_id = %id, "Annotation deleted remotely"),
            Err(e) => tracing::warn!(annotation_id = %id, error = %e, "Annotation delete failed"),
        }
    }
}

/// Owns the debounce timer and dispatches both sync channels for one
/// document.
pub struct SyncEngine<R: RemoteStore> {
    shared: Arc<Shared<R>>,
    timer: DebounceTimer<Result<u64, SyncError>>,
    in_flight: Vec<JoinHandle<()>>,
}

impl<R: RemoteStore> SyncEngine<R> {
    /// Create an engine. With `document_id = None` (an unsaved, local-only
    /// canvas) nothing is ever sent. Must be used within a Tokio runtime.
    pub fn new(
        remote: Arc<R>,
        store: SharedStore,
        document_id: Option<EntityId>,
        debounce: Duration,
    ) -> Self {
        let shared = Arc::new(Shared {
            remote,
            store,
            document_id,
            snapshot_state: Mutex::new(SnapshotState::default()),
            snapshot_lock: tokio::sync::Mutex::new(()),
            snapshotted_local: Mutex::new(HashSet::new()),
        });

        let for_timer = Arc::clone(&shared);
        let timer = DebounceTimer::new(debounce, move || {
            let shared = Arc::clone(&for_timer);
            async move { shared.sync_snapshot().await }.boxed()
        });

        Self {
            shared,
            timer,
            in_flight: Vec::new(),
        }
    }

    pub fn document_id(&self) -> Option<&str> {
        self.shared.document_id.as_deref()
    }

    pub fn store(&self) -> &SharedStore {
        &self.shared.store
    }

    /// Record that the store changed: (re)start the snapshot countdown.
    pub fn notify_mutation(&mut self) {
        if self.shared.document_id.is_none() {
            return;
        }
        self.timer.schedule();
        tracing::debug!(delay_ms = self.timer.delay().as_millis() as u64, "Snapshot sync scheduled");
    }

    /// A record was added to the store: send it now and restart the
    /// snapshot countdown.
    pub fn on_created(&mut self, id: &str) {
        self.notify_mutation();
        if self.shared.document_id.is_none() {
            return;
        }

        let pending = lock(&self.shared.store)
            .get(id)
            .map(|record| (record.annotation.clone(), record.revision));
        let Some((annotation, revision)) = pending else {
            return;
        };

        let shared = Arc::clone(&self.shared);
        self.track(tokio::spawn(async move {
            shared.send_create(annotation, revision).await;
        }));
    }

    /// A record was removed from the store: delete it remotely and restart
    /// the snapshot countdown.
    pub fn on_deleted(&mut self, id: &str) {
        self.notify_mutation();
        if self.shared.document_id.is_none() {
            return;
        }

        let shared = Arc::clone(&self.shared);
        let id = id.to_string();
        self.track(tokio::spawn(async move {
            shared.send_delete(&id).await;
        }));
    }

    /// Run a snapshot sync immediately, cancelling any pending countdown.
    /// Waits for a snapshot sync already under way to finish first.
    pub async fn sync_now(&mut self) -> Result<u64, SyncError> {
        self.timer.fire_now().await
    }

    pub fn status(&self) -> SyncIndicator {
        let counts = lock(&self.shared.store).status_counts();
        let state = lock(&self.shared.snapshot_state);
        SyncIndicator {
            counts,
            has_error: state.has_error,
            last_synced_at: state.last_synced_at,
            sync_pending: self.timer.is_pending(),
        }
    }

    /// Wait for every per-operation request sent so far to finish.
    pub async fn settle(&mut self) {
        for handle in self.in_flight.drain(..) {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Sync task panicked");
            }
        }
    }

    /// Cancel the pending snapshot sync. Per-operation requests already
    /// sent are left to finish.
    pub fn close(&mut self) {
        if self.timer.cancel() {
            tracing::debug!("Pending snapshot sync cancelled on close");
        }
    }

    fn track(&mut self, handle: JoinHandle<()>) {
        self.in_flight.retain(|h| !h.is_finished());
        self.in_flight.push(handle);
    }
}
