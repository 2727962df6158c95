//! Per-certificate pipeline stages for the extractor.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations (e.g. a different OCR backend) without touching
//! other stages.
//!
//! ## Data Flow
//!
//! ```text
//! <id>.pdf ──▶ render ──▶ ocr ──▶ parse ──▶ table
//!              (pdfium)  (tesseract) (anchors) (csv append)
//! ```
//!
//! 1. [`render`] — rasterise the first page; runs in `spawn_blocking`
//!    because pdfium is not async-safe
//! 2. [`ocr`]    — the [`ocr::PageReader`] seam and its tesseract-backed
//!    default; the only stage that shells out
//! 3. [`parse`]  — normalise recognised text and apply the three anchored
//!    patterns (team block, university, prize)
//! 4. [`table`]  — serialise rows to the append-only CSV under a lock

pub mod ocr;
pub mod parse;
pub mod render;
pub mod table;
