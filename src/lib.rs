//! Task timeline engine for event operations.
//!
//! Date-grid geometry, the dependency graph, task search and linking,
//! scroll synchronization for the split timeline, and status/filter
//! projection, all over an async [`backend::TaskBackend`] seam.

pub mod backend;
pub mod bus;
pub mod config;
pub mod debounce;
pub mod graph;
pub mod model;
pub mod projection;
pub mod session;
pub mod timeline;
