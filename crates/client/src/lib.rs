//! Client side of the annotation editor: REST client, debounced snapshot
//! sync, and the editor session that ties the canvas machines to the
//! annotation store.

pub mod api;
pub mod config;
pub mod editor;
pub mod engine;
pub mod error;
pub mod remote;
pub mod timer;

#[cfg(test)]
mod testing;
