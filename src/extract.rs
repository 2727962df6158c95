//! The extraction pipeline: certificate files → rows in the output table.
//!
//! Walks a directory of downloaded certificates and, for each file whose
//! control number is not yet in the table, rasterises the first page, runs
//! text recognition, applies the anchored field patterns, and appends one
//! row. At most `config.concurrency` certificates undergo OCR at once; row
//! writes are serialized by [`CsvSink`].
//!
//! A certificate that fails anywhere along the way is logged with its
//! control number and produces no row — the remaining certificates are
//! unaffected, and the next run will pick the failed one up again because
//! nothing was appended for it.
//!
//! ## Per-certificate states
//!
//! ```text
//! Pending ──▶ Skipped                      (already in the table)
//! Pending ──▶ render ─▶ ocr ─▶ parse ─▶ Appended
//! Pending ──▶ render ─▶ ocr ─▶ parse ─▶ Failed   (logged, no row)
//! ```

use crate::config::ExtractConfig;
use crate::error::{CertError, DocError, OcrError};
use crate::output::{DocResult, DocStatus, ExtractReport, ExtractStats, ExtractedRecord};
use crate::pipeline::ocr::{PageReader, TesseractReader};
use crate::pipeline::parse;
use crate::pipeline::table::{self, CsvSink};
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Extract every not-yet-processed certificate under `dir` into `csv_path`.
///
/// The set of already-processed control numbers is read from the table once,
/// before any row is appended, and held fixed for the duration of the run.
/// All submitted certificates are driven to a terminal state before the
/// function returns.
///
/// # Errors
/// Returns `Err(CertError)` only for setup-level faults (unreadable
/// directory, unopenable table). Per-certificate failures are reported
/// through [`ExtractReport`].
pub async fn extract_certificates(
    dir: impl AsRef<Path>,
    csv_path: impl AsRef<Path>,
    config: &ExtractConfig,
) -> Result<ExtractReport, CertError> {
    let start = Instant::now();
    let dir = dir.as_ref();
    let csv_path = csv_path.as_ref();

    let files = certificate_files(dir)?;
    let processed = Arc::new(table::processed_set(csv_path)?);
    info!(
        "Extracting {} certificates from {} ({} already in {})",
        files.len(),
        dir.display(),
        processed.len(),
        csv_path.display()
    );

    let sink = Arc::new(CsvSink::open_append(csv_path, processed.is_empty())?);
    let reader: Arc<dyn PageReader> = match config.reader {
        Some(ref reader) => Arc::clone(reader),
        None => Arc::new(TesseractReader::new(
            config.lang.clone(),
            config.max_rendered_pixels,
        )),
    };

    if let Some(ref cb) = config.progress {
        cb.on_run_start(files.len());
    }

    let mut results: Vec<DocResult> = stream::iter(files.iter().map(|(control_number, path)| {
        let control_number = control_number.clone();
        let path = path.clone();
        let processed = Arc::clone(&processed);
        let reader = Arc::clone(&reader);
        let sink = Arc::clone(&sink);
        let config = config.clone();
        async move {
            if processed.contains(&control_number) {
                if let Some(ref cb) = config.progress {
                    cb.on_item_skipped(&control_number);
                }
                return DocResult {
                    control_number,
                    status: DocStatus::Skipped,
                    record: None,
                    error: None,
                    duration_ms: 0,
                };
            }

            let result = process_document(path, control_number, reader, sink).await;
            if let Some(ref cb) = config.progress {
                match result.error {
                    Some(ref e) => cb.on_item_error(&result.control_number, &e.to_string()),
                    None => cb.on_item_done(&result.control_number),
                }
            }
            result
        }
    }))
    .buffer_unordered(config.concurrency)
    .collect()
    .await;

    results.sort_by(|a, b| a.control_number.cmp(&b.control_number));

    let stats = ExtractStats {
        total_files: files.len(),
        appended: results
            .iter()
            .filter(|r| r.status == DocStatus::Appended)
            .count(),
        skipped: results
            .iter()
            .filter(|r| r.status == DocStatus::Skipped)
            .count(),
        failed: results
            .iter()
            .filter(|r| r.status == DocStatus::Failed)
            .count(),
        duration_ms: start.elapsed().as_millis() as u64,
    };

    if let Some(ref cb) = config.progress {
        cb.on_run_complete(stats.total_files, stats.total_files - stats.failed);
    }

    info!(
        "Extraction complete: {} appended, {} skipped, {} failed, {}ms",
        stats.appended, stats.skipped, stats.failed, stats.duration_ms
    );

    Ok(ExtractReport { stats, results })
}

/// List `<control_number>.pdf` files under `dir`, sorted by control number.
///
/// The control number is the filename with the `.pdf` suffix stripped.
/// Non-PDF entries are ignored — the directory may hold other tools' files.
fn certificate_files(dir: &Path) -> Result<Vec<(String, PathBuf)>, CertError> {
    let entries = std::fs::read_dir(dir).map_err(|e| CertError::DirReadFailed {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| CertError::DirReadFailed {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("pdf") {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            files.push((stem.to_string(), path.clone()));
        }
    }

    files.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(files)
}

/// Drive one certificate through render → recognise → parse → append.
///
/// Always returns a `DocResult` — a failure at any stage is captured and
/// logged, never propagated, so one bad certificate cannot take down the
/// run.
async fn process_document(
    path: PathBuf,
    control_number: String,
    reader: Arc<dyn PageReader>,
    sink: Arc<CsvSink>,
) -> DocResult {
    let start = Instant::now();

    let failed = |error: DocError, start: Instant| {
        warn!("{error}");
        DocResult {
            control_number: error.control_number().to_string(),
            status: DocStatus::Failed,
            record: None,
            error: Some(error),
            duration_ms: start.elapsed().as_millis() as u64,
        }
    };

    // Rasterisation and recognition are CPU-bound blocking work; move them
    // off the async workers. The admission gate upstream bounds how many of
    // these blocking tasks exist at once.
    let read = tokio::task::spawn_blocking(move || reader.read_text(&path)).await;

    let raw = match read {
        Ok(Ok(text)) => text,
        Ok(Err(OcrError::Render(detail))) => {
            return failed(
                DocError::RenderFailed {
                    control_number,
                    detail,
                },
                start,
            )
        }
        Ok(Err(OcrError::Recognition(detail))) => {
            return failed(
                DocError::OcrFailed {
                    control_number,
                    detail,
                },
                start,
            )
        }
        Err(join_err) => {
            return failed(
                DocError::OcrFailed {
                    control_number,
                    detail: format!("recognition task panicked: {join_err}"),
                },
                start,
            )
        }
    };

    let fields = parse::extract_fields(&parse::normalise_text(&raw));
    let record = ExtractedRecord::new(control_number.clone(), fields);

    if let Err(e) = sink.append(&record) {
        return failed(
            DocError::AppendFailed {
                control_number,
                detail: e.to_string(),
            },
            start,
        );
    }

    DocResult {
        control_number,
        status: DocStatus::Appended,
        record: Some(record),
        error: None,
        duration_ms: start.elapsed().as_millis() as u64,
    }
}
