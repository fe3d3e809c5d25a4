//! Domain core for the image annotation editor.
//!
//! Everything in this crate is free of I/O: the annotation and document
//! model, the coordinate transform, the draw and selection state machines,
//! the in-memory annotation store, and the keyboard shortcut dispatcher.
//! The API server and the editing client both build on it.

pub mod annotation;
pub mod document;
pub mod draw_tool;
pub mod error;
pub mod selection;
pub mod shortcuts;
pub mod store;
pub mod transform;
pub mod types;
