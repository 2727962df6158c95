//! Resumability bookkeeping: candidate IDs and the downloaded-file snapshot.
//!
//! Both pipelines are resumable across process runs with no state beyond
//! what is already on disk. The fetcher snapshots the certificate directory
//! once at start of run ([`downloaded_set`]) and skips every ID it finds;
//! the extractor does the analogous snapshot of the output table
//! ([`crate::pipeline::table::processed_set`]). Snapshots are never
//! refreshed mid-run — workers within one run each own a distinct ID, so
//! there is nothing to cross-check.

use crate::error::CertError;
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

/// Candidate certificate IDs for a competition year.
///
/// Control numbers are the two-digit year followed by a five-digit serial:
/// `(year % 100) * 100_000 + i` for `i` in `1..range`. Year 2023 with a
/// range of 30 000 yields `2300001 ..= 2329999`.
pub fn control_numbers(year: u16, range: u32) -> Vec<u32> {
    let prefix = u32::from(year % 100) * 100_000;
    (1..range).map(|i| prefix + i).collect()
}

/// Snapshot the control numbers already saved under `dir`.
///
/// Reads the directory listing once; `<number>.pdf` filenames become set
/// members. Files that don't follow the naming scheme are ignored — the
/// directory may legitimately hold notes or partial downloads from other
/// tools.
///
/// A missing directory yields an empty set rather than an error: the fetcher
/// creates it before writing, and an empty snapshot is exactly what a first
/// run should see.
pub fn downloaded_set(dir: &Path) -> Result<HashSet<u32>, CertError> {
    let mut set = HashSet::new();
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(set),
        Err(e) => {
            return Err(CertError::DirReadFailed {
                path: dir.to_path_buf(),
                source: e,
            })
        }
    };

    for entry in entries {
        let entry = entry.map_err(|e| CertError::DirReadFailed {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("pdf") {
            continue;
        }
        match path
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(|s| s.parse::<u32>().ok())
        {
            Some(n) => {
                set.insert(n);
            }
            None => debug!("Ignoring non-certificate file: {}", path.display()),
        }
    }

    debug!("{} certificates already on disk in {}", set.len(), dir.display());
    Ok(set)
}
