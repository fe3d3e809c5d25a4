//! Single-annotation selection with move and resize gestures.
//!
//! Like the draw tool this is a pure machine: [`SelectionState::transition`]
//! returns the next state and, while a gesture is active, a
//! [`SelectionEffect`] describing the geometry the caller should write to
//! the store. Gestures only start while the select tool is active.

use serde::{Deserialize, Serialize};

use crate::annotation::Geometry;
use crate::draw_tool::{CanvasContext, ToolMode};
use crate::transform::{to_image_space, Point};
use crate::types::EntityId;

/// The eight transform handles around a selected rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizeHandle {
    TopLeft,
    Top,
    TopRight,
    Right,
    BottomRight,
    Bottom,
    BottomLeft,
    Left,
}

impl ResizeHandle {
    /// Which edges this handle moves: (left, top, right, bottom).
    fn edges(self) -> (bool, bool, bool, bool) {
        match self {
            Self::TopLeft => (true, true, false, false),
            Self::Top => (false, true, false, false),
            Self::TopRight => (false, true, true, false),
            Self::Right => (false, false, true, false),
            Self::BottomRight => (false, false, true, true),
            Self::Bottom => (false, false, false, true),
            Self::BottomLeft => (true, false, false, true),
            Self::Left => (true, false, false, false),
        }
    }

    /// Apply an image-space pointer delta to `origin`, returning a
    /// normalized rectangle (dragging an edge past its opposite flips it).
    pub fn apply(self, origin: Geometry, dx: f64, dy: f64) -> Geometry {
        let (left, top, right, bottom) = self.edges();
        let mut x0 = origin.x;
        let mut y0 = origin.y;
        let mut x1 = origin.x + origin.width;
        let mut y1 = origin.y + origin.height;
        if left {
            x0 += dx;
        }
        if right {
            x1 += dx;
        }
        if top {
            y0 += dy;
        }
        if bottom {
            y1 += dy;
        }
        Geometry::normalized(x0, y0, x1 - x0, y1 - y0)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Gesture {
    Move {
        id: EntityId,
        start: Point,
        origin: Geometry,
    },
    Resize {
        id: EntityId,
        handle: ResizeHandle,
        start: Point,
        origin: Geometry,
    },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectionState {
    selected: Option<EntityId>,
    gesture: Option<Gesture>,
}

/// Input to the selection machine. Pointer positions are in pointer space.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionEvent {
    Select(EntityId),
    /// Pointer-down on empty canvas.
    CanvasPointerDown,
    ToolChanged(ToolMode),
    Deleted(EntityId),
    DragStart {
        id: EntityId,
        pointer: Point,
        geometry: Geometry,
    },
    ResizeStart {
        id: EntityId,
        handle: ResizeHandle,
        pointer: Point,
        geometry: Geometry,
    },
    PointerMove { pointer: Point },
    PointerUp { pointer: Point },
}

/// A geometry write requested by an active gesture.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionEffect {
    pub id: EntityId,
    pub geometry: Geometry,
}

impl SelectionState {
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn is_dragging(&self) -> bool {
        self.gesture.is_some()
    }

    pub fn transition(
        mut self,
        event: SelectionEvent,
        ctx: CanvasContext,
    ) -> (Self, Option<SelectionEffect>) {
        match event {
            SelectionEvent::Select(id) => {
                if ctx.mode == ToolMode::Select {
                    self.selected = Some(id);
                }
                (self, None)
            }

            SelectionEvent::CanvasPointerDown | SelectionEvent::ToolChanged(_) => {
                (Self::default(), None)
            }

            SelectionEvent::Deleted(id) => {
                if self.selected.as_deref() == Some(id.as_str()) {
                    return (Self::default(), None);
                }
                (self, None)
            }

            SelectionEvent::DragStart { id, pointer, geometry } => {
                if ctx.mode != ToolMode::Select {
                    return (self, None);
                }
                self.selected = Some(id.clone());
                self.gesture = Some(Gesture::Move {
                    id,
                    start: to_image_space(pointer, ctx.scale),
                    origin: geometry,
                });
                (self, None)
            }

            SelectionEvent::ResizeStart { id, handle, pointer, geometry } => {
                if ctx.mode != ToolMode::Select {
                    return (self, None);
                }
                self.selected = Some(id.clone());
                self.gesture = Some(Gesture::Resize {
                    id,
                    handle,
                    start: to_image_space(pointer, ctx.scale),
                    origin: geometry,
                });
                (self, None)
            }

            SelectionEvent::PointerMove { pointer } => {
                let effect = self.gesture.as_ref().map(|g| g.effect(pointer, ctx.scale));
                (self, effect)
            }

            SelectionEvent::PointerUp { pointer } => {
                let effect = self.gesture.take().map(|g| g.effect(pointer, ctx.scale));
                (self, effect)
            }
        }
    }
}

impl Gesture {
    fn effect(&self, pointer: Point, scale: f64) -> SelectionEffect {
        let current = to_image_space(pointer, scale);
        match self {
            Gesture::Move { id, start, origin } => SelectionEffect {
                id: id.clone(),
                geometry: origin.moved_to(
                    origin.x + current.x - start.x,
                    origin.y + current.y - start.y,
                ),
            },
            Gesture::Resize { id, handle, start, origin } => SelectionEffect {
                id: id.clone(),
                geometry: handle.apply(*origin, current.x - start.x, current.y - start.y),
            },
        }
    }
}
