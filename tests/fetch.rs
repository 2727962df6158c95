//! Integration tests for the fetch pipeline.
//!
//! A minimal canned-response HTTP responder on a local TCP listener stands
//! in for the certificate host. Routes map request paths to a status + body;
//! unknown paths answer 404, which is exactly how the real host reports a
//! never-issued control number. Per-path hit counters make retry and
//! skip behaviour observable.

use mcm_certs::{fetch_certificates, FetchConfig, RunProgress};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

// ── Canned-response HTTP responder ───────────────────────────────────────────

type Hits = Arc<Mutex<HashMap<String, usize>>>;

struct MockHost {
    base_url: String,
    hits: Hits,
}

impl MockHost {
    /// Requests seen for `path` (0 when the path was never requested).
    fn hits_for(&self, path: &str) -> usize {
        *self.hits.lock().unwrap().get(path).unwrap_or(&0)
    }
}

/// Serve `routes` (path → status + body) on an ephemeral local port.
/// Unknown paths answer 404 with an empty body.
async fn spawn_host(routes: HashMap<String, (u16, Vec<u8>)>) -> MockHost {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits: Hits = Arc::new(Mutex::new(HashMap::new()));
    let routes = Arc::new(routes);

    let task_hits = Arc::clone(&hits);
    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                break;
            };
            let hits = Arc::clone(&task_hits);
            let routes = Arc::clone(&routes);
            tokio::spawn(async move {
                let mut buf = vec![0u8; 8192];
                let mut read = 0;
                loop {
                    match stream.read(&mut buf[read..]).await {
                        Ok(0) => break,
                        Ok(n) => {
                            read += n;
                            if buf[..read].windows(4).any(|w| w == b"\r\n\r\n") {
                                break;
                            }
                            if read == buf.len() {
                                break;
                            }
                        }
                        Err(_) => return,
                    }
                }

                let request = String::from_utf8_lossy(&buf[..read]);
                let path = request.split_whitespace().nth(1).unwrap_or("/").to_string();
                *hits.lock().unwrap().entry(path.clone()).or_insert(0) += 1;

                let (status, body) = routes
                    .get(&path)
                    .cloned()
                    .unwrap_or((404, Vec::new()));
                let reason = match status {
                    200 => "OK",
                    404 => "Not Found",
                    500 => "Internal Server Error",
                    _ => "Error",
                };
                let header = format!(
                    "HTTP/1.1 {status} {reason}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    body.len()
                );
                let _ = stream.write_all(header.as_bytes()).await;
                let _ = stream.write_all(&body).await;
                let _ = stream.shutdown().await;
            });
        }
    });

    MockHost {
        base_url: format!("http://{addr}"),
        hits,
    }
}

fn fast_config(base_url: &str) -> FetchConfig {
    FetchConfig::builder()
        .base_url(base_url)
        .concurrency(4)
        .max_retries(3)
        .retry_delay_ms(1)
        .build()
        .unwrap()
}

/// Counts every per-item event; used to verify the exactly-once contract.
#[derive(Default)]
struct CountingProgress {
    started_total: AtomicUsize,
    done: AtomicUsize,
    skipped: AtomicUsize,
    errors: AtomicUsize,
}

impl RunProgress for CountingProgress {
    fn on_run_start(&self, total: usize) {
        self.started_total.store(total, Ordering::SeqCst);
    }
    fn on_item_done(&self, _control_number: &str) {
        self.done.fetch_add(1, Ordering::SeqCst);
    }
    fn on_item_skipped(&self, _control_number: &str) {
        self.skipped.fetch_add(1, Ordering::SeqCst);
    }
    fn on_item_error(&self, _control_number: &str, _error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn saved_file_matches_response_body_byte_for_byte() {
    let body = b"%PDF-1.4 certificate payload \x00\x01\x02".to_vec();
    let host = spawn_host(HashMap::from([(
        "/2023Certs/2300001.pdf".to_string(),
        (200, body.clone()),
    )]))
    .await;
    let dir = tempfile::tempdir().unwrap();

    let report = fetch_certificates(2023, &[2300001], dir.path(), &fast_config(&host.base_url))
        .await
        .unwrap();

    assert_eq!(report.stats.saved, 1);
    assert_eq!(report.stats.failed, 0);
    let saved = std::fs::read(dir.path().join("2300001.pdf")).unwrap();
    assert_eq!(saved, body);
    assert_eq!(host.hits_for("/2023Certs/2300001.pdf"), 1);
}

#[tokio::test]
async fn absent_certificate_is_not_retried_and_leaves_no_file() {
    let host = spawn_host(HashMap::new()).await; // everything 404s
    let dir = tempfile::tempdir().unwrap();

    let report = fetch_certificates(2023, &[2300002], dir.path(), &fast_config(&host.base_url))
        .await
        .unwrap();

    assert_eq!(report.stats.absent, 1);
    assert!(report.failed.is_empty());
    assert!(!dir.path().join("2300002.pdf").exists());
    assert_eq!(host.hits_for("/2023Certs/2300002.pdf"), 1);
}

#[tokio::test]
async fn persistent_500_is_attempted_exactly_max_retries_times() {
    let host = spawn_host(HashMap::from([(
        "/2023Certs/2300003.pdf".to_string(),
        (500, Vec::new()),
    )]))
    .await;
    let dir = tempfile::tempdir().unwrap();

    let report = fetch_certificates(2023, &[2300003], dir.path(), &fast_config(&host.base_url))
        .await
        .unwrap();

    assert_eq!(report.stats.failed, 1);
    assert_eq!(report.failed, vec![2300003]);
    assert!(!dir.path().join("2300003.pdf").exists());
    assert_eq!(host.hits_for("/2023Certs/2300003.pdf"), 3);
}

#[tokio::test]
async fn preexisting_file_is_skipped_without_a_network_call() {
    let host = spawn_host(HashMap::from([(
        "/2023Certs/2300004.pdf".to_string(),
        (200, b"fresh body".to_vec()),
    )]))
    .await;
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("2300004.pdf"), b"old body").unwrap();

    let report = fetch_certificates(2023, &[2300004], dir.path(), &fast_config(&host.base_url))
        .await
        .unwrap();

    assert_eq!(report.stats.already_downloaded, 1);
    assert_eq!(host.hits_for("/2023Certs/2300004.pdf"), 0);
    // The existing file is untouched.
    assert_eq!(
        std::fs::read(dir.path().join("2300004.pdf")).unwrap(),
        b"old body"
    );
}

#[tokio::test]
async fn second_run_issues_no_requests_for_already_downloaded_ids() {
    let ids = [2300010, 2300011];
    let routes = HashMap::from([
        ("/2023Certs/2300010.pdf".to_string(), (200, b"a".to_vec())),
        ("/2023Certs/2300011.pdf".to_string(), (200, b"b".to_vec())),
    ]);
    let host = spawn_host(routes).await;
    let dir = tempfile::tempdir().unwrap();
    let config = fast_config(&host.base_url);

    let first = fetch_certificates(2023, &ids, dir.path(), &config).await.unwrap();
    assert_eq!(first.stats.saved, 2);

    let second = fetch_certificates(2023, &ids, dir.path(), &config).await.unwrap();
    assert_eq!(second.stats.saved, 0);
    assert_eq!(second.stats.already_downloaded, 2);
    assert_eq!(host.hits_for("/2023Certs/2300010.pdf"), 1);
    assert_eq!(host.hits_for("/2023Certs/2300011.pdf"), 1);
}

#[tokio::test]
async fn progress_advances_exactly_once_per_id_regardless_of_outcome() {
    // One saved, one absent (default 404), one persistently failing, one
    // already on disk.
    let routes = HashMap::from([
        ("/2023Certs/2300020.pdf".to_string(), (200, b"pdf".to_vec())),
        ("/2023Certs/2300022.pdf".to_string(), (500, Vec::new())),
    ]);
    let host = spawn_host(routes).await;
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("2300023.pdf"), b"present").unwrap();

    let progress = Arc::new(CountingProgress::default());
    let config = FetchConfig::builder()
        .base_url(&host.base_url)
        .concurrency(4)
        .max_retries(2)
        .retry_delay_ms(1)
        .progress(Arc::clone(&progress) as Arc<dyn RunProgress>)
        .build()
        .unwrap();

    let ids = [2300020, 2300021, 2300022, 2300023];
    let report = fetch_certificates(2023, &ids, dir.path(), &config)
        .await
        .unwrap();

    assert_eq!(progress.started_total.load(Ordering::SeqCst), 4);
    let advanced = progress.done.load(Ordering::SeqCst)
        + progress.skipped.load(Ordering::SeqCst)
        + progress.errors.load(Ordering::SeqCst);
    assert_eq!(advanced, 4);
    assert_eq!(progress.errors.load(Ordering::SeqCst), 1);
    assert_eq!(progress.skipped.load(Ordering::SeqCst), 1);

    let s = &report.stats;
    assert_eq!(
        (s.saved, s.already_downloaded, s.absent, s.failed),
        (1, 1, 1, 1)
    );
}

#[tokio::test]
async fn outcome_partition_sums_to_requested() {
    let host = spawn_host(HashMap::from([(
        "/2023Certs/2300030.pdf".to_string(),
        (200, b"pdf".to_vec()),
    )]))
    .await;
    let dir = tempfile::tempdir().unwrap();

    let ids = [2300030, 2300031, 2300032];
    let report = fetch_certificates(2023, &ids, dir.path(), &fast_config(&host.base_url))
        .await
        .unwrap();

    let s = &report.stats;
    assert_eq!(
        s.saved + s.already_downloaded + s.absent + s.failed,
        s.requested
    );
}
