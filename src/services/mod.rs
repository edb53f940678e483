//! Services module - everything the pages need from outside the UI.
//!
//! - [`Backend`]: the request/response contract with the privileged backend
//!   (scan, clean, reveal-in-folder, quick-find). Controllers only ever hold an
//!   `Arc<dyn Backend>`, so tests substitute doubles freely.
//! - [`ProcessBackend`]: the production transport, one JSON request/response per
//!   spawned helper process.
//! - [`format`]: byte and elapsed-time formatting for summary text.
//!
//! Glob matching, directory traversal and deletion all happen behind [`Backend`];
//! nothing in this crate touches the scanned filesystem.

pub mod backend;
pub mod format;

pub use backend::{Backend, BackendError, ProcessBackend};
pub use format::{format_bytes, format_elapsed};
