//! The rectangle drawing tool as a pure state machine.
//!
//! ```text
//! Idle --pointer down (Annotate mode)--> Drawing
//! Drawing --pointer up, too small--> Idle            (discarded)
//! Drawing --pointer up--> PendingCommit
//! PendingCommit --cancel--> Idle                     (discarded)
//! PendingCommit --commit with text--> Idle           (committed)
//! ```
//!
//! [`DrawState::transition`] consumes the current state and an event and
//! returns the next state plus an optional [`DrawOutcome`] for the caller
//! to act on. Nothing here touches the annotation store.

use serde::{Deserialize, Serialize};

use crate::annotation::{AnnotationDraft, Category, Geometry};
use crate::transform::{to_image_space, Point};

/// Extents at or below this many image-space pixels are discarded.
pub const MIN_DRAW_EXTENT: f64 = 10.0;

/// The active canvas tool. Drawing and dragging are mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolMode {
    #[default]
    Select,
    Annotate,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum DrawState {
    #[default]
    Idle,
    /// `anchor` is in image space; extents are signed.
    Drawing { anchor: Point, width: f64, height: f64 },
    PendingCommit { draft: AnnotationDraft },
}

/// Input to the draw machine. Pointer positions are in pointer space and
/// are mapped through the current zoom scale.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawEvent {
    PointerDown { position: Point, on_handle: bool },
    PointerMove { position: Point },
    PointerUp { position: Point },
    EditText(String),
    EditCategory(Category),
    EditColor(String),
    ToolChanged(ToolMode),
    Cancel,
    Commit,
}

/// What the caller needs to react to after a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOutcome {
    Started,
    /// The rectangle was too small and has been dropped.
    Discarded,
    /// A rectangle is ready; the editor should collect its note.
    AwaitingCommit(Geometry),
    Cancelled,
    /// Append this draft to the store and switch back to the select tool.
    Committed(AnnotationDraft),
    /// Commit was refused; the draft stays pending.
    Invalid(String),
}

/// Tool mode and zoom scale a canvas transition is evaluated in.
#[derive(Debug, Clone, Copy)]
pub struct CanvasContext {
    pub mode: ToolMode,
    pub scale: f64,
}

impl DrawState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// The normalized rectangle currently being dragged out or awaiting
    /// commit, for rendering a preview.
    pub fn preview(&self) -> Option<Geometry> {
        match self {
            Self::Idle => None,
            Self::Drawing { anchor, width, height } => {
                Some(Geometry::normalized(anchor.x, anchor.y, *width, *height))
            }
            Self::PendingCommit { draft } => Some(draft.geometry),
        }
    }

    pub fn draft(&self) -> Option<&AnnotationDraft> {
        match self {
            Self::PendingCommit { draft } => Some(draft),
            _ => None,
        }
    }

    pub fn transition(self, event: DrawEvent, ctx: CanvasContext) -> (Self, Option<DrawOutcome>) {
        match (self, event) {
            (Self::Idle, DrawEvent::PointerDown { position, on_handle }) => {
                if ctx.mode != ToolMode::Annotate || on_handle {
                    return (Self::Idle, None);
                }
                let anchor = to_image_space(position, ctx.scale);
                (
                    Self::Drawing { anchor, width: 0.0, height: 0.0 },
                    Some(DrawOutcome::Started),
                )
            }

            (Self::Drawing { anchor, .. }, DrawEvent::PointerMove { position }) => {
                let current = to_image_space(position, ctx.scale);
                (
                    Self::Drawing {
                        anchor,
                        width: current.x - anchor.x,
                        height: current.y - anchor.y,
                    },
                    None,
                )
            }

            (Self::Drawing { anchor, .. }, DrawEvent::PointerUp { position }) => {
                let current = to_image_space(position, ctx.scale);
                let width = current.x - anchor.x;
                let height = current.y - anchor.y;
                if width.abs() <= MIN_DRAW_EXTENT || height.abs() <= MIN_DRAW_EXTENT {
                    return (Self::Idle, Some(DrawOutcome::Discarded));
                }
                let geometry = Geometry::normalized(anchor.x, anchor.y, width, height);
                (
                    Self::PendingCommit { draft: AnnotationDraft::new(geometry) },
                    Some(DrawOutcome::AwaitingCommit(geometry)),
                )
            }

            (Self::Drawing { .. }, DrawEvent::ToolChanged(_)) => {
                (Self::Idle, Some(DrawOutcome::Discarded))
            }

            (Self::Drawing { .. } | Self::PendingCommit { .. }, DrawEvent::Cancel) => {
                (Self::Idle, Some(DrawOutcome::Cancelled))
            }

            (Self::PendingCommit { mut draft }, DrawEvent::EditText(text)) => {
                draft.text = text;
                (Self::PendingCommit { draft }, None)
            }

            (Self::PendingCommit { mut draft }, DrawEvent::EditCategory(category)) => {
                draft.category = category;
                (Self::PendingCommit { draft }, None)
            }

            (Self::PendingCommit { mut draft }, DrawEvent::EditColor(color)) => {
                draft.color = color;
                (Self::PendingCommit { draft }, None)
            }

            (Self::PendingCommit { draft }, DrawEvent::Commit) => match draft.validate() {
                Ok(()) => (Self::Idle, Some(DrawOutcome::Committed(draft))),
                Err(e) => (
                    Self::PendingCommit { draft },
                    Some(DrawOutcome::Invalid(e.to_string())),
                ),
            },

            (state, _) => (state, None),
        }
    }
}
