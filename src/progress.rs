//! Progress-callback trait for per-certificate run events.
//!
//! Inject an [`Arc<dyn RunProgress>`] via
//! [`crate::config::FetchConfigBuilder::progress`] or
//! [`crate::config::ExtractConfigBuilder::progress`] to receive real-time
//! events as a pipeline works through its certificates.
//!
//! # Why callbacks instead of channels?
//!
//! The callback approach is the least-invasive integration point: callers can
//! forward events to a terminal progress bar, a log file, or a channel of
//! their own — without the library knowing anything about how the host
//! application communicates. The trait is `Send + Sync` so it works correctly
//! when certificates are processed concurrently.
//!
//! # The exactly-once contract
//!
//! For every candidate ID handed to the fetcher and every file handed to the
//! extractor, exactly one of `on_item_done`, `on_item_skipped`, or
//! `on_item_error` fires. A progress display that increments on all three
//! therefore always reaches its total, regardless of how many certificates
//! were absent, already present, or broken.

use std::sync::Arc;

/// Called by a pipeline as it works through its certificates.
///
/// Implementations must be `Send + Sync` (items are processed concurrently).
/// All methods have default no-op implementations so callers only override
/// what they care about.
///
/// # Thread safety
///
/// The per-item methods may be called concurrently from different worker
/// tasks. Implementations must protect shared mutable state with appropriate
/// synchronisation primitives (e.g. `Mutex`, `AtomicUsize`).
pub trait RunProgress: Send + Sync {
    /// Called once before any certificate is processed.
    ///
    /// # Arguments
    /// * `total` — number of items the run will attempt
    fn on_run_start(&self, total: usize) {
        let _ = total;
    }

    /// Called when an item reaches a successful terminal state
    /// (fetched, confirmed absent, or row appended).
    fn on_item_done(&self, control_number: &str) {
        let _ = control_number;
    }

    /// Called when an item is skipped because the pre-run snapshot already
    /// contains it (file on disk, or row in the output table).
    fn on_item_skipped(&self, control_number: &str) {
        let _ = control_number;
    }

    /// Called when an item fails terminally (retries exhausted, or a
    /// per-document extraction fault).
    ///
    /// # Arguments
    /// * `error` — human-readable error description
    fn on_item_error(&self, control_number: &str, error: &str) {
        let _ = (control_number, error);
    }

    /// Called once after every item has reached a terminal state.
    ///
    /// # Arguments
    /// * `total`     — items the run attempted
    /// * `succeeded` — items that reached a successful terminal state
    fn on_run_complete(&self, total: usize, succeeded: usize) {
        let _ = (total, succeeded);
    }
}

/// A no-op implementation for callers that don't need progress events.
///
/// This is the default when no callback is configured.
pub struct NoopProgress;

impl RunProgress for NoopProgress {}

/// Convenience alias matching the type stored in the config structs.
pub type ProgressCallback = Arc<dyn RunProgress>;
