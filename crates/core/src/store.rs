//! In-memory, ordered annotation collection with per-record sync status.
//!
//! Ids are unique. `update` and `remove` on an unknown id are no-ops so that
//! network acknowledgements arriving out of order, or after a local delete,
//! never fail. Every content mutation bumps the record's revision; sync
//! acknowledgements carry the revision they were taken at and only mark a
//! record synced if it has not changed since.

use serde::{Deserialize, Serialize};

use crate::annotation::{Annotation, Category, Geometry, SyncStatus};
use crate::error::CoreError;
use crate::types::EntityId;

/// A stored annotation plus its local bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationRecord {
    pub annotation: Annotation,
    pub sync_status: SyncStatus,
    pub revision: u64,
}

/// Partial update of an annotation's user-editable fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
}

impl AnnotationPatch {
    pub fn geometry(geometry: Geometry) -> Self {
        Self {
            x: Some(geometry.x),
            y: Some(geometry.y),
            width: Some(geometry.width),
            height: Some(geometry.height),
            ..Self::default()
        }
    }

    pub fn position(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    fn apply(&self, annotation: &mut Annotation) {
        let g = &mut annotation.geometry;
        if let Some(x) = self.x {
            g.x = x;
        }
        if let Some(y) = self.y {
            g.y = y;
        }
        if let Some(width) = self.width {
            g.width = width;
        }
        if let Some(height) = self.height {
            g.height = height;
        }
        if let Some(ref text) = self.text {
            annotation.text = text.clone();
        }
        if let Some(ref color) = self.color {
            annotation.color = color.clone();
        }
        if let Some(category) = self.category {
            annotation.category = category;
        }
    }
}

/// A consistent copy of the store's contents, taken before a bulk sync.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StoreSnapshot {
    pub annotations: Vec<Annotation>,
    revisions: Vec<(EntityId, u64)>,
}

/// Result of applying a create acknowledgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdReplacement {
    /// The temporary id was renamed to the server id.
    Replaced,
    /// The server id is already present; the acknowledgement was applied before.
    AlreadyApplied,
    /// Neither id is present: the record was deleted while the create was in flight.
    Missing,
}

/// Per-status record counts for the sync indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StatusCounts {
    pub local: usize,
    pub dirty: usize,
    pub synced: usize,
}

#[derive(Debug, Clone, Default)]
pub struct AnnotationStore {
    records: Vec<AnnotationRecord>,
    next_revision: u64,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from annotations loaded from the server; all of them
    /// start out `Synced`. Duplicate ids after the first are dropped.
    pub fn from_synced(annotations: Vec<Annotation>) -> Self {
        let mut store = Self::new();
        for annotation in annotations {
            if store.contains(&annotation.id) {
                continue;
            }
            let revision = store.bump();
            store.records.push(AnnotationRecord {
                annotation,
                sync_status: SyncStatus::Synced,
                revision,
            });
        }
        store
    }

    /// Append a newly created annotation with status `Local`.
    pub fn add(&mut self, annotation: Annotation) -> Result<(), CoreError> {
        if self.contains(&annotation.id) {
            return Err(CoreError::Conflict(format!(
                "annotation id '{}' already exists",
                annotation.id
            )));
        }
        let revision = self.bump();
        self.records.push(AnnotationRecord {
            annotation,
            sync_status: SyncStatus::Local,
            revision,
        });
        Ok(())
    }

    /// Apply a patch. Marks the record `Dirty` unless it is still `Local`.
    /// Returns `false` (and does nothing) for an unknown id.
    pub fn update(&mut self, id: &str, patch: &AnnotationPatch) -> bool {
        let revision = self.next_revision + 1;
        let Some(record) = self.find_mut(id) else {
            return false;
        };
        patch.apply(&mut record.annotation);
        record.revision = revision;
        if record.sync_status != SyncStatus::Local {
            record.sync_status = SyncStatus::Dirty;
        }
        self.next_revision = revision;
        true
    }

    /// Remove a record, returning it. Unknown ids are a no-op.
    pub fn remove(&mut self, id: &str) -> Option<AnnotationRecord> {
        let index = self.records.iter().position(|r| r.annotation.id == id)?;
        Some(self.records.remove(index))
    }

    pub fn list(&self) -> &[AnnotationRecord] {
        &self.records
    }

    pub fn get(&self, id: &str) -> Option<&AnnotationRecord> {
        self.records.iter().find(|r| r.annotation.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Mark the given ids `Synced` regardless of revision. Unknown ids are
    /// skipped; applying the same ids twice is the same as applying them once.
    pub fn mark_synced(&mut self, ids: &[EntityId]) -> usize {
        let mut marked = 0;
        for record in &mut self.records {
            if ids.contains(&record.annotation.id) {
                record.sync_status = SyncStatus::Synced;
                marked += 1;
            }
        }
        marked
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            annotations: self.records.iter().map(|r| r.annotation.clone()).collect(),
            revisions: self
                .records
                .iter()
                .map(|r| (r.annotation.id.clone(), r.revision))
                .collect(),
        }
    }

    /// Mark every record in `snapshot` `Synced` whose revision has not moved
    /// since the snapshot was taken. Records edited in the meantime keep
    /// their status.
    pub fn mark_snapshot_synced(&mut self, snapshot: &StoreSnapshot) -> usize {
        let mut marked = 0;
        for (id, revision) in &snapshot.revisions {
            if let Some(record) = self.find_mut(id) {
                if record.revision == *revision {
                    record.sync_status = SyncStatus::Synced;
                    marked += 1;
                }
            }
        }
        marked
    }

    /// Apply a create acknowledgement: rename `temp_id` to `server_id` and
    /// mark it `Synced` if it is unchanged since `sent_revision`, otherwise
    /// `Dirty`.
    pub fn acknowledge_create(
        &mut self,
        temp_id: &str,
        server_id: &str,
        sent_revision: u64,
    ) -> IdReplacement {
        if temp_id != server_id && self.contains(server_id) {
            return IdReplacement::AlreadyApplied;
        }
        let Some(record) = self.find_mut(temp_id) else {
            return IdReplacement::Missing;
        };
        record.annotation.id = server_id.to_string();
        record.sync_status = if record.revision == sent_revision {
            SyncStatus::Synced
        } else {
            SyncStatus::Dirty
        };
        IdReplacement::Replaced
    }

    /// Flag a record as needing another snapshot sync. A snapshot taken
    /// before this call no longer marks it `Synced`. Returns `false` for an
    /// unknown id.
    pub fn mark_dirty(&mut self, id: &str) -> bool {
        let revision = self.next_revision + 1;
        let Some(record) = self.find_mut(id) else {
            return false;
        };
        record.revision = revision;
        record.sync_status = SyncStatus::Dirty;
        self.next_revision = revision;
        true
    }

    pub fn status_counts(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for record in &self.records {
            match record.sync_status {
                SyncStatus::Local => counts.local += 1,
                SyncStatus::Dirty => counts.dirty += 1,
                SyncStatus::Synced => counts.synced += 1,
            }
        }
        counts
    }

    fn find_mut(&mut self, id: &str) -> Option<&mut AnnotationRecord> {
        self.records.iter_mut().find(|r| r.annotation.id == id)
    }

    fn bump(&mut self) -> u64 {
        self.next_revision += 1;
        self.next_revision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{AnnotationDraft, Geometry};
    use assert_matches::assert_matches;

    fn annotation(id: &str) -> Annotation {
        let mut draft = AnnotationDraft::new(Geometry { x: 10.0, y: 10.0, width: 100.0, height: 50.0 });
        draft.text = "Article I".to_string();
        draft.into_annotation(id.to_string(), Some("doc".to_string()), chrono::Utc::now())
    }

    fn status(store: &AnnotationStore, id: &str) -> SyncStatus {
        store.get(id).unwrap().sync_status
    }

    // -- add -----------------------------------------------------------------

    #[test]
    fn add_appends_local_record() {
        let mut store = AnnotationStore::new();
        store.add(annotation("a")).unwrap();
        store.add(annotation("b")).unwrap();
        let ids: Vec<_> = store.list().iter().map(|r| r.annotation.id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
        assert_eq!(status(&store, "a"), SyncStatus::Local);
    }

    #[test]
    fn add_duplicate_id_fails() {
        let mut store = AnnotationStore::new();
        store.add(annotation("a")).unwrap();
        assert_matches!(store.add(annotation("a")), Err(CoreError::Conflict(_)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn from_synced_marks_everything_synced() {
        let store = AnnotationStore::from_synced(vec![annotation("a"), annotation("b"), annotation("a")]);
        assert_eq!(store.len(), 2);
        assert_eq!(store.status_counts(), StatusCounts { local: 0, dirty: 0, synced: 2 });
    }

    // -- update --------------------------------------------------------------

    #[test]
    fn update_synced_record_marks_dirty() {
        let mut store = AnnotationStore::from_synced(vec![annotation("a")]);
        assert!(store.update("a", &AnnotationPatch::position(40.0, 25.0)));
        let record = store.get("a").unwrap();
        assert_eq!(record.sync_status, SyncStatus::Dirty);
        assert_eq!(record.annotation.geometry.x, 40.0);
        assert_eq!(record.annotation.geometry.width, 100.0);
    }

    #[test]
    fn update_local_record_stays_local() {
        let mut store = AnnotationStore::new();
        store.add(annotation("a")).unwrap();
        store.update("a", &AnnotationPatch::text("Preamble"));
        assert_eq!(status(&store, "a"), SyncStatus::Local);
        assert_eq!(store.get("a").unwrap().annotation.text, "Preamble");
    }

    #[test]
    fn update_unknown_id_is_noop() {
        let mut store = AnnotationStore::new();
        assert!(!store.update("ghost", &AnnotationPatch::text("x")));
        assert!(store.is_empty());
    }

    // -- remove --------------------------------------------------------------

    #[test]
    fn remove_returns_record_and_tolerates_unknown() {
        let mut store = AnnotationStore::from_synced(vec![annotation("a")]);
        assert!(store.remove("a").is_some());
        assert!(store.remove("a").is_none());
        assert!(store.is_empty());
    }

    // -- mark_synced ---------------------------------------------------------

    #[test]
    fn mark_synced_is_idempotent() {
        let mut store = AnnotationStore::new();
        store.add(annotation("a")).unwrap();
        store.add(annotation("b")).unwrap();
        let ids = vec!["a".to_string(), "ghost".to_string()];

        assert_eq!(store.mark_synced(&ids), 1);
        let once: Vec<_> = store.list().to_vec();
        store.mark_synced(&ids);
        assert_eq!(store.list(), once.as_slice());
        assert_eq!(status(&store, "b"), SyncStatus::Local);
    }

    #[test]
    fn snapshot_ack_skips_records_edited_after_snapshot() {
        let mut store = AnnotationStore::new();
        store.add(annotation("a")).unwrap();
        store.add(annotation("b")).unwrap();
        let snapshot = store.snapshot();

        store.update("b", &AnnotationPatch::text("edited mid-flight"));

        assert_eq!(store.mark_snapshot_synced(&snapshot), 1);
        assert_eq!(status(&store, "a"), SyncStatus::Synced);
        assert_eq!(status(&store, "b"), SyncStatus::Local);
    }

    #[test]
    fn snapshot_ack_twice_matches_once() {
        let mut store = AnnotationStore::new();
        store.add(annotation("a")).unwrap();
        let snapshot = store.snapshot();
        store.mark_snapshot_synced(&snapshot);
        let once: Vec<_> = store.list().to_vec();
        store.mark_snapshot_synced(&snapshot);
        assert_eq!(store.list(), once.as_slice());
    }

    // -- acknowledge_create --------------------------------------------------

    #[test]
    fn create_ack_replaces_temp_id() {
        let mut store = AnnotationStore::new();
        store.add(annotation("local-1")).unwrap();
        let revision = store.get("local-1").unwrap().revision;

        assert_eq!(store.acknowledge_create("local-1", "srv-1", revision), IdReplacement::Replaced);
        assert!(!store.contains("local-1"));
        assert_eq!(status(&store, "srv-1"), SyncStatus::Synced);
    }

    #[test]
    fn create_ack_applied_twice_is_noop() {
        let mut store = AnnotationStore::new();
        store.add(annotation("local-1")).unwrap();
        let revision = store.get("local-1").unwrap().revision;
        store.acknowledge_create("local-1", "srv-1", revision);
        let once: Vec<_> = store.list().to_vec();

        assert_eq!(store.acknowledge_create("local-1", "srv-1", revision), IdReplacement::AlreadyApplied);
        assert_eq!(store.list(), once.as_slice());
    }

    #[test]
    fn create_ack_after_edit_leaves_record_dirty() {
        let mut store = AnnotationStore::new();
        store.add(annotation("local-1")).unwrap();
        let revision = store.get("local-1").unwrap().revision;
        store.update("local-1", &AnnotationPatch::position(0.0, 0.0));

        store.acknowledge_create("local-1", "srv-1", revision);
        assert_eq!(status(&store, "srv-1"), SyncStatus::Dirty);
    }

    #[test]
    fn create_ack_for_deleted_record_reports_missing() {
        let mut store = AnnotationStore::new();
        store.add(annotation("local-1")).unwrap();
        store.remove("local-1");
        assert_eq!(store.acknowledge_create("local-1", "srv-1", 1), IdReplacement::Missing);
        assert!(store.is_empty());
    }

    // -- mark_dirty ----------------------------------------------------------

    #[test]
    fn mark_dirty_outlives_an_earlier_snapshot() {
        let mut store = AnnotationStore::from_synced(vec![annotation("a")]);
        let snapshot = store.snapshot();

        assert!(store.mark_dirty("a"));
        assert_eq!(status(&store, "a"), SyncStatus::Dirty);

        assert_eq!(store.mark_snapshot_synced(&snapshot), 0);
        assert_eq!(status(&store, "a"), SyncStatus::Dirty);

        let fresh = store.snapshot();
        assert_eq!(store.mark_snapshot_synced(&fresh), 1);
        assert_eq!(status(&store, "a"), SyncStatus::Synced);
        assert!(!store.mark_dirty("ghost"));
    }

    #[test]
    fn patch_serializes_only_present_fields() {
        let json = serde_json::to_value(AnnotationPatch::position(1.0, 2.0)).unwrap();
        assert_eq!(json, serde_json::json!({"x": 1.0, "y": 2.0}));
        assert!(AnnotationPatch::default().is_empty());
    }
}
