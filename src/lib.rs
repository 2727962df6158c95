//! # mcm-certs
//!
//! Bulk-download numbered MCM/ICM award certificates and read them into a
//! CSV table.
//!
//! ## Why this crate?
//!
//! The contest publishes every award certificate as a PDF at a guessable
//! URL — the control number is a year prefix plus a sequential serial — but
//! offers no index and no structured data. This crate walks the candidate
//! number space, saves whatever exists, then recovers the structured fields
//! (team members, advisor, university, prize) from each certificate by
//! rasterising its first page and matching three anchor phrases in the
//! recognised text.
//!
//! ## Pipeline Overview
//!
//! ```text
//! candidate IDs
//!  │
//!  ├─ 1. Fetch    GET <base>/<year>Certs/<id>.pdf, bounded concurrency,
//!  │              fixed retry delay, 404 = authoritative absence
//!  ├─ 2. Render   rasterise first page via pdfium (spawn_blocking)
//!  ├─ 3. OCR      tesseract, eng model (PageReader seam)
//!  ├─ 4. Parse    collapse blank lines, apply the three anchor patterns
//!  └─ 5. Append   one CSV row per certificate, serialized writes
//! ```
//!
//! Both pipelines are resumable: the fetcher skips IDs whose file already
//! exists, the extractor skips control numbers already in the table. Each
//! snapshot is taken once at start of run.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mcm_certs::{control_numbers, extract_certificates, fetch_certificates};
//! use mcm_certs::{ExtractConfig, FetchConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let year = 2023;
//!     let ids = control_numbers(year, 30_000);
//!
//!     let fetched = fetch_certificates(year, &ids, "paper_2023", &FetchConfig::default()).await?;
//!     eprintln!("saved {} certificates", fetched.stats.saved);
//!
//!     let report = extract_certificates(
//!         "paper_2023",
//!         "certificates_2023.csv",
//!         &ExtractConfig::default(),
//!     )
//!     .await?;
//!     eprintln!("appended {} rows", report.stats.appended);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `mcm-certs` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! mcm-certs = { version = "0.3", default-features = false }
//! ```
//!
//! ## Host requirements
//!
//! The built-in reader needs a pdfium shared library reachable by
//! `pdfium-render` and a `tesseract` executable with the configured
//! language's traineddata on `PATH`. Tests and alternative backends can
//! bypass both through [`pipeline::ocr::PageReader`].

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod resume;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    ExtractConfig, ExtractConfigBuilder, FetchConfig, FetchConfigBuilder, DEFAULT_BASE_URL,
    DEFAULT_USER_AGENT,
};
pub use error::{CertError, DocError, OcrError};
pub use extract::extract_certificates;
pub use fetch::fetch_certificates;
pub use output::{
    DocResult, DocStatus, ExtractReport, ExtractStats, ExtractedRecord, FetchOutcome, FetchReport,
    FetchStats,
};
pub use pipeline::ocr::{PageReader, TesseractReader};
pub use progress::{NoopProgress, ProgressCallback, RunProgress};
pub use resume::{control_numbers, downloaded_set};
