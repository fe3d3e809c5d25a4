//! One editing session over a document's annotations.
//!
//! [`Editor`] owns the tool mode, zoom scale, the draw and selection
//! machines, the annotation store and the sync engine. Host input is fed
//! in through its methods; every store mutation is reported to the engine
//! so the snapshot countdown restarts.

use std::sync::{Arc, Mutex};

use sourcelab_core::annotation::{new_local_id, validate_text, Category, Geometry};
use sourcelab_core::document::Document;
use sourcelab_core::draw_tool::{CanvasContext, DrawEvent, DrawOutcome, DrawState, ToolMode};
use sourcelab_core::error::CoreError;
use sourcelab_core::selection::{ResizeHandle, SelectionEffect, SelectionEvent, SelectionState};
use sourcelab_core::shortcuts::ShortcutHandler;
use sourcelab_core::store::{AnnotationPatch, AnnotationRecord, AnnotationStore};
use sourcelab_core::transform::{self, Point};
use sourcelab_core::types::EntityId;

use crate::api::ApiClient;
use crate::config::ClientConfig;
use crate::engine::{lock, SharedStore, SyncEngine, SyncIndicator};
use crate::error::SyncError;
use crate::remote::RemoteStore;

pub struct Editor<R: RemoteStore> {
    document: Option<Document>,
    mode: ToolMode,
    scale: f64,
    draw: DrawState,
    selection: SelectionState,
    engine: SyncEngine<R>,
}

impl Editor<ApiClient> {
    /// Fetch a document by share token and open it. An unknown token is
    /// [`SyncError::NotFound`].
    pub async fn load(
        api: Arc<ApiClient>,
        share_token: &str,
        config: &ClientConfig,
    ) -> Result<Self, SyncError> {
        let document = api.get_document(share_token).await?;
        tracing::info!(
            document_id = %document.id,
            annotations = document.annotations.len(),
            "Document loaded"
        );
        Ok(Self::open(document, api, config))
    }
}

impl<R: RemoteStore> Editor<R> {
    /// Open a persisted document. Its annotations start out synced.
    pub fn open(mut document: Document, remote: Arc<R>, config: &ClientConfig) -> Self {
        let annotations = std::mem::take(&mut document.annotations);
        let store = Arc::new(Mutex::new(AnnotationStore::from_synced(annotations)));
        let engine = SyncEngine::new(
            remote,
            store,
            Some(document.id.clone()),
            config.sync_debounce,
        );
        Self::with_engine(Some(document), engine)
    }

    /// Start an unsaved, local-only canvas. Nothing is synced.
    pub fn new_local(remote: Arc<R>, config: &ClientConfig) -> Self {
        let store: SharedStore = Arc::new(Mutex::new(AnnotationStore::new()));
        let engine = SyncEngine::new(remote, store, None, config.sync_debounce);
        Self::with_engine(None, engine)
    }

    fn with_engine(document: Option<Document>, engine: SyncEngine<R>) -> Self {
        Self {
            document,
            mode: ToolMode::default(),
            scale: transform::DEFAULT_SCALE,
            draw: DrawState::default(),
            selection: SelectionState::default(),
            engine,
        }
    }

    // ---- accessors ----

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    pub fn mode(&self) -> ToolMode {
        self.mode
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn draw_state(&self) -> &DrawState {
        &self.draw
    }

    pub fn selected(&self) -> Option<&str> {
        self.selection.selected()
    }

    /// A copy of the store's records, in insertion order.
    pub fn annotations(&self) -> Vec<AnnotationRecord> {
        lock(self.engine.store()).list().to_vec()
    }

    pub fn get(&self, id: &str) -> Option<AnnotationRecord> {
        lock(self.engine.store()).get(id).cloned()
    }

    pub fn sync_status(&self) -> SyncIndicator {
        self.engine.status()
    }

    // ---- tool and zoom ----

    pub fn set_tool(&mut self, mode: ToolMode) {
        if mode == self.mode {
            return;
        }
        self.mode = mode;
        self.apply_draw(DrawEvent::ToolChanged(mode));
        self.apply_selection(SelectionEvent::ToolChanged(mode));
    }

    pub fn zoom_in(&mut self) {
        self.scale = transform::zoom_in(self.scale);
    }

    pub fn zoom_out(&mut self) {
        self.scale = transform::zoom_out(self.scale);
    }

    pub fn reset_zoom(&mut self) {
        self.scale = transform::reset_zoom();
    }

    // ---- canvas pointer input ----

    /// Pointer pressed on empty canvas.
    pub fn pointer_down(&mut self, position: Point) -> Option<DrawOutcome> {
        if self.mode == ToolMode::Select {
            self.apply_selection(SelectionEvent::CanvasPointerDown);
        }
        self.apply_draw(DrawEvent::PointerDown {
            position,
            on_handle: false,
        })
    }

    pub fn pointer_move(&mut self, position: Point) {
        self.apply_draw(DrawEvent::PointerMove { position });
        self.drag_move(position);
    }

    pub fn pointer_up(&mut self, position: Point) -> Option<DrawOutcome> {
        let outcome = self.apply_draw(DrawEvent::PointerUp { position });
        self.drag_end(position);
        outcome
    }

    // ---- pending draft ----

    pub fn set_draft_text(&mut self, text: impl Into<String>) {
        self.apply_draw(DrawEvent::EditText(text.into()));
    }

    pub fn set_draft_category(&mut self, category: Category) {
        self.apply_draw(DrawEvent::EditCategory(category));
    }

    pub fn set_draft_color(&mut self, color: impl Into<String>) {
        self.apply_draw(DrawEvent::EditColor(color.into()));
    }

    /// Commit the pending rectangle as a new `Local` annotation and switch
    /// back to the select tool. Returns the new record's id.
    pub fn commit_draft(&mut self) -> Result<EntityId, CoreError> {
        match self.apply_draw(DrawEvent::Commit) {
            Some(DrawOutcome::Committed(draft)) => {
                let id = new_local_id();
                let document_id = self.document.as_ref().map(|d| d.id.clone());
                let annotation = draft.into_annotation(id.clone(), document_id, chrono::Utc::now());
                lock(self.engine.store()).add(annotation)?;
                tracing::debug!(annotation_id = %id, "Annotation committed");
                self.engine.on_created(&id);
                self.set_tool(ToolMode::Select);
                Ok(id)
            }
            Some(DrawOutcome::Invalid(msg)) => Err(CoreError::Validation(msg)),
            _ => Err(CoreError::Validation(
                "no rectangle is waiting to be committed".to_string(),
            )),
        }
    }

    pub fn cancel_draft(&mut self) {
        self.apply_draw(DrawEvent::Cancel);
    }

    // ---- selection and manipulation ----

    /// Select an annotation. Ignored for unknown ids and outside the select
    /// tool.
    pub fn select(&mut self, id: &str) {
        if lock(self.engine.store()).contains(id) {
            self.apply_selection(SelectionEvent::Select(id.to_string()));
        }
    }

    /// Start moving an annotation from `pointer`.
    pub fn drag_start(&mut self, id: &str, pointer: Point) {
        if let Some(geometry) = self.geometry_of(id) {
            self.apply_selection(SelectionEvent::DragStart {
                id: id.to_string(),
                pointer,
                geometry,
            });
        }
    }

    /// Start resizing an annotation from one of its handles.
    pub fn resize(&mut self, id: &str, handle: ResizeHandle, pointer: Point) {
        if let Some(geometry) = self.geometry_of(id) {
            self.apply_selection(SelectionEvent::ResizeStart {
                id: id.to_string(),
                handle,
                pointer,
                geometry,
            });
        }
    }

    pub fn drag_move(&mut self, pointer: Point) {
        self.apply_selection(SelectionEvent::PointerMove { pointer });
    }

    pub fn drag_end(&mut self, pointer: Point) {
        self.apply_selection(SelectionEvent::PointerUp { pointer });
    }

    /// Replace an annotation's note. Returns `false` for an unknown id.
    pub fn edit_text(&mut self, id: &str, text: &str) -> Result<bool, CoreError> {
        validate_text(text)?;
        let updated = lock(self.engine.store()).update(id, &AnnotationPatch::text(text.trim()));
        if updated {
            self.engine.notify_mutation();
        }
        Ok(updated)
    }

    /// Delete an annotation locally and remotely. Returns `false` for an
    /// unknown id.
    pub fn delete(&mut self, id: &str) -> bool {
        let removed = lock(self.engine.store()).remove(id).is_some();
        if !removed {
            return false;
        }
        self.apply_selection(SelectionEvent::Deleted(id.to_string()));
        self.engine.on_deleted(id);
        true
    }

    /// Delete the selected annotation, if any.
    pub fn delete_selected(&mut self) -> Option<EntityId> {
        let id = self.selection.selected()?.to_string();
        self.delete(&id).then_some(id)
    }

    // ---- sync ----

    /// Snapshot-sync now, cancelling the pending countdown.
    pub async fn save_now(&mut self) -> Result<u64, SyncError> {
        self.engine.sync_now().await
    }

    /// Wait for in-flight create and delete requests to finish.
    pub async fn settle(&mut self) {
        self.engine.settle().await;
    }

    /// Tear the session down: no snapshot sync fires afterwards.
    pub fn close(&mut self) {
        self.engine.close();
    }

    // ---- private helpers ----

    fn ctx(&self) -> CanvasContext {
        CanvasContext {
            mode: self.mode,
            scale: self.scale,
        }
    }

    fn geometry_of(&self, id: &str) -> Option<Geometry> {
        lock(self.engine.store())
            .get(id)
            .map(|record| record.annotation.geometry)
    }

    fn apply_draw(&mut self, event: DrawEvent) -> Option<DrawOutcome> {
        let ctx = self.ctx();
        let (next, outcome) = std::mem::take(&mut self.draw).transition(event, ctx);
        self.draw = next;
        if let Some(DrawOutcome::Discarded) = outcome {
            tracing::debug!("Rectangle too small, discarded");
        }
        outcome
    }

    fn apply_selection(&mut self, event: SelectionEvent) {
        let ctx = self.ctx();
        let (next, effect) = std::mem::take(&mut self.selection).transition(event, ctx);
        self.selection = next;
        if let Some(SelectionEffect { id, geometry }) = effect {
            let changed = lock(self.engine.store()).update(&id, &AnnotationPatch::geometry(geometry));
            if changed {
                self.engine.notify_mutation();
            }
        }
    }
}

impl<R: RemoteStore> ShortcutHandler for Editor<R> {
    fn on_select_tool(&mut self) {
        self.set_tool(ToolMode::Select);
    }

    fn on_annotate_tool(&mut self) {
        self.set_tool(ToolMode::Annotate);
    }

    fn on_zoom_in(&mut self) {
        self.zoom_in();
    }

    fn on_zoom_out(&mut self) {
        self.zoom_out();
    }

    fn on_delete(&mut self) {
        self.delete_selected();
    }
}
