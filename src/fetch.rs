//! The fetch pipeline: materialise candidate certificate IDs as local files.
//!
//! One HTTP GET per candidate ID, under a bounded number of in-flight
//! requests. The pipeline never fails part-way: every ID reaches one of the
//! four [`FetchOutcome`] states and the run returns a tally. IDs whose file
//! already exists are skipped without a network call, so re-running against
//! the same directory only touches the gaps — resumption is free.
//!
//! ## Retry policy
//!
//! A 404 is an answer, not a failure: certificate numbers are allocated
//! sparsely and most candidates in a range were simply never issued. Only
//! other non-200 statuses and transport faults are retried, a fixed number
//! of attempts with a fixed pause between them. An ID that exhausts its
//! attempts is logged and counted, never escalated — the next run will try
//! it again.

use crate::config::FetchConfig;
use crate::error::CertError;
use crate::output::{FetchOutcome, FetchReport, FetchStats};
use crate::resume;
use futures::stream::{self, StreamExt};
use reqwest::StatusCode;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

/// Fetch every candidate ID into `dir` as `<id>.pdf`.
///
/// Creates `dir` if needed, snapshots its existing contents once, then runs
/// one task per ID through an admission gate of `config.concurrency`
/// in-flight downloads. All tasks are driven to completion before the
/// function returns; per-ID order is unspecified.
///
/// # Errors
/// Returns `Err(CertError)` only for setup-level faults (directory
/// creation/listing, HTTP client construction). Per-ID failures are
/// reported through [`FetchReport`].
pub async fn fetch_certificates(
    year: u16,
    ids: &[u32],
    dir: impl AsRef<Path>,
    config: &FetchConfig,
) -> Result<FetchReport, CertError> {
    let start = Instant::now();
    let dir = dir.as_ref();

    let mut stats = FetchStats {
        requested: ids.len(),
        saved: 0,
        already_downloaded: 0,
        absent: 0,
        failed: 0,
        duration_ms: 0,
    };

    if ids.is_empty() {
        return Ok(FetchReport {
            stats,
            failed: Vec::new(),
        });
    }

    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| CertError::DirCreateFailed {
            path: dir.to_path_buf(),
            source: e,
        })?;

    let downloaded = Arc::new(resume::downloaded_set(dir)?);
    info!(
        "Fetching {} candidate IDs for {} ({} already on disk)",
        ids.len(),
        year,
        downloaded.len()
    );

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .user_agent(&config.user_agent)
        .build()
        .map_err(|e| CertError::Internal(format!("Failed to build HTTP client: {e}")))?;

    if let Some(ref cb) = config.progress {
        cb.on_run_start(ids.len());
    }

    let outcomes: Vec<(u32, FetchOutcome)> = stream::iter(ids.iter().map(|&id| {
        let client = client.clone();
        let downloaded = Arc::clone(&downloaded);
        let config = config.clone();
        let dir = dir.to_path_buf();
        async move {
            let outcome = fetch_one(&client, year, id, &dir, &config, &downloaded).await;
            if let Some(ref cb) = config.progress {
                let id_str = id.to_string();
                match outcome {
                    FetchOutcome::AlreadyDownloaded => cb.on_item_skipped(&id_str),
                    FetchOutcome::Failed => cb.on_item_error(&id_str, "retries exhausted"),
                    FetchOutcome::Saved | FetchOutcome::Absent => cb.on_item_done(&id_str),
                }
            }
            (id, outcome)
        }
    }))
    .buffer_unordered(config.concurrency)
    .collect()
    .await;

    let mut failed = Vec::new();
    for (id, outcome) in &outcomes {
        match outcome {
            FetchOutcome::Saved => stats.saved += 1,
            FetchOutcome::AlreadyDownloaded => stats.already_downloaded += 1,
            FetchOutcome::Absent => stats.absent += 1,
            FetchOutcome::Failed => {
                stats.failed += 1;
                failed.push(*id);
            }
        }
    }
    failed.sort_unstable();
    stats.duration_ms = start.elapsed().as_millis() as u64;

    if let Some(ref cb) = config.progress {
        cb.on_run_complete(stats.requested, stats.requested - stats.failed);
    }

    info!(
        "Fetch complete for {}: {} saved, {} already present, {} absent, {} failed, {}ms",
        year, stats.saved, stats.already_downloaded, stats.absent, stats.failed, stats.duration_ms
    );

    Ok(FetchReport { stats, failed })
}

/// Remote location of one certificate.
fn certificate_url(base_url: &str, year: u16, id: u32) -> String {
    format!("{base_url}/{year}Certs/{id}.pdf")
}

/// Drive one candidate ID to a terminal outcome. Never returns an error —
/// everything short of a saved file or an authoritative 404 ends in
/// [`FetchOutcome::Failed`] once the attempts run out.
async fn fetch_one(
    client: &reqwest::Client,
    year: u16,
    id: u32,
    dir: &Path,
    config: &FetchConfig,
    downloaded: &HashSet<u32>,
) -> FetchOutcome {
    if downloaded.contains(&id) {
        debug!("{id}: already downloaded, skipping");
        return FetchOutcome::AlreadyDownloaded;
    }

    let url = certificate_url(&config.base_url, year, id);
    let path = dir.join(format!("{id}.pdf"));

    for attempt in 1..=config.max_retries {
        if attempt > 1 {
            sleep(Duration::from_millis(config.retry_delay_ms)).await;
        }

        match client.get(&url).send().await {
            Ok(response) => match response.status() {
                StatusCode::OK => match response.bytes().await {
                    Ok(body) => {
                        if let Err(e) = tokio::fs::write(&path, &body).await {
                            warn!("{id}: failed to write {}: {e}", path.display());
                            return FetchOutcome::Failed;
                        }
                        debug!("{id}: saved {} bytes", body.len());
                        return FetchOutcome::Saved;
                    }
                    Err(e) => warn!(
                        "{id}: attempt {attempt}/{}: body read failed — {e}",
                        config.max_retries
                    ),
                },
                StatusCode::NOT_FOUND => {
                    debug!("{id}: 404 — certificate was never issued");
                    return FetchOutcome::Absent;
                }
                status => warn!(
                    "{id}: attempt {attempt}/{}: HTTP {status}",
                    config.max_retries
                ),
            },
            Err(e) => warn!("{id}: attempt {attempt}/{}: {e}", config.max_retries),
        }
    }

    warn!("{id}: giving up after {} attempts", config.max_retries);
    FetchOutcome::Failed
}
