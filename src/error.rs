//! Error types for the mcm-certs library.
//!
//! Three distinct error types reflect three distinct failure modes:
//!
//! * [`CertError`] — **Fatal**: the run cannot proceed at all (certificate
//!   directory cannot be created or listed, output table cannot be opened,
//!   invalid configuration). Returned as `Err(CertError)` from the top-level
//!   `fetch_certificates` / `extract_certificates` functions.
//!
//! * [`DocError`] — **Non-fatal**: a single certificate failed (render
//!   glitch, tesseract fault, row write error) but all other certificates
//!   are fine. Stored inside [`crate::output::DocResult`] so callers can
//!   inspect partial success rather than losing the whole run to one bad
//!   file.
//!
//! * [`OcrError`] — returned by [`crate::pipeline::ocr::PageReader`]
//!   implementations, which don't know which certificate they are reading;
//!   the extractor wraps it into a [`DocError`] carrying the control number.
//!
//! A fetch that exhausts its retries is *not* an error at all — it is the
//! [`crate::output::FetchOutcome::Failed`] outcome, logged and tallied but
//! never propagated, matching the run-to-completion contract.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the mcm-certs library.
///
/// Per-certificate failures use [`DocError`] and are stored in
/// [`crate::output::DocResult`] rather than propagated here.
#[derive(Debug, Error)]
pub enum CertError {
    // ── Filesystem errors ─────────────────────────────────────────────────
    /// The certificate directory could not be created.
    #[error("Failed to create certificate directory '{path}': {source}")]
    DirCreateFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The certificate directory could not be listed.
    #[error("Failed to read certificate directory '{path}': {source}\nRun the fetcher first, or check the path.")]
    DirReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Output table errors ───────────────────────────────────────────────
    /// The output table could not be opened for appending.
    #[error("Failed to open output table '{path}': {source}")]
    TableOpenFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The existing output table could not be read back.
    #[error("Failed to read output table '{path}': {detail}\nThe file may be corrupt; move it aside to start a fresh table.")]
    TableReadFailed { path: PathBuf, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single certificate.
///
/// Stored in [`crate::output::DocResult`] when a certificate fails.
/// The overall extraction run continues regardless.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum DocError {
    /// First-page rasterisation failed.
    #[error("{control_number}: rasterisation failed: {detail}")]
    RenderFailed {
        control_number: String,
        detail: String,
    },

    /// Text recognition failed.
    #[error("{control_number}: text recognition failed: {detail}")]
    OcrFailed {
        control_number: String,
        detail: String,
    },

    /// The row could not be appended to the output table.
    #[error("{control_number}: row append failed: {detail}")]
    AppendFailed {
        control_number: String,
        detail: String,
    },
}

impl DocError {
    /// The control number of the certificate this error belongs to.
    pub fn control_number(&self) -> &str {
        match self {
            DocError::RenderFailed { control_number, .. }
            | DocError::OcrFailed { control_number, .. }
            | DocError::AppendFailed { control_number, .. } => control_number,
        }
    }
}

/// Error from a [`crate::pipeline::ocr::PageReader`].
///
/// Readers don't know which certificate they are processing, so these carry
/// only the stage and detail; [`crate::extract`] attaches the control number.
#[derive(Debug, Clone, Error)]
pub enum OcrError {
    /// The PDF could not be loaded or its first page could not be rendered.
    #[error("rasterisation: {0}")]
    Render(String),

    /// The recognition engine rejected the bitmap or failed to run.
    #[error("recognition: {0}")]
    Recognition(String),
}
