//! Progress-callback trait for per-item events.
//!
//! Inject an [`Arc<dyn AssemblyProgressCallback>`] via
//! [`crate::config::AssemblyConfigBuilder::progress_callback`] to receive
//! events as the pipeline fetches each item and binds each page.
//!
//! # Example
//!
//! ```rust
//! use scanbind::{AssemblyConfig, AssemblyProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     fetched: AtomicUsize,
//! }
//!
//! impl AssemblyProgressCallback for CountingCallback {
//!     fn on_item_complete(&self, id: u32, width: u32, height: u32) {
//!         self.fetched.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("item {id}: {width}x{height}");
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { fetched: AtomicUsize::new(0) });
//!
//! let config = AssemblyConfig::builder()
//!     .progress_callback(counter as Arc<dyn AssemblyProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the pipeline as it processes each item.
///
/// Implementations must be `Send + Sync`: `on_item_start`, `on_item_complete`
/// and `on_item_error` are called concurrently from the fetch workers. All
/// methods have default no-op implementations.
pub trait AssemblyProgressCallback: Send + Sync {
    /// Called once before any worker starts.
    fn on_run_start(&self, total_items: usize) {
        let _ = total_items;
    }

    /// Called by worker `worker` (1-based) just before fetching `id`.
    fn on_item_start(&self, worker: usize, id: u32) {
        let _ = (worker, id);
    }

    /// Called when `id` was fetched and normalised.
    fn on_item_complete(&self, id: u32, width: u32, height: u32) {
        let _ = (id, width, height);
    }

    /// Called when fetching or decoding `id` failed.
    fn on_item_error(&self, id: u32, error: &str) {
        let _ = (id, error);
    }

    /// Called when a fetched item could not be placed on a page.
    fn on_page_error(&self, id: u32, error: &str) {
        let _ = (id, error);
    }

    /// Called once after the document has been written. Not called when the
    /// write fails.
    ///
    /// * `total_items`: identifiers in the configured range
    /// * `pages_written`: pages in the final document
    fn on_run_complete(&self, total_items: usize, pages_written: usize) {
        let _ = (total_items, pages_written);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl AssemblyProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::AssemblyConfig`].
pub type ProgressCallback = Arc<dyn AssemblyProgressCallback>;
