//! The output table: append-only CSV with serialized row writes.
//!
//! ## Why a mutex around one writer?
//!
//! Every concurrently processed certificate appends to the same per-year
//! file. Rows must never interleave, so there is a single [`csv::Writer`]
//! and each append takes the lock, writes one complete row, and flushes
//! before releasing. Flushing per row also means an interrupted run loses at
//! most the row being written — everything flushed earlier survives and
//! seeds the next run's processed-set snapshot.
//!
//! ## Header bootstrap
//!
//! The header is written exactly when the pre-run snapshot found no prior
//! rows: a fresh table starts with the header, a resumed table appends
//! below its existing one.

use crate::error::CertError;
use crate::output::ExtractedRecord;
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing::debug;

/// Column order of the output table.
pub const HEADER: [&str; 7] = [
    "control_number",
    "student1",
    "student2",
    "student3",
    "advisor",
    "university",
    "prize",
];

/// Snapshot the control numbers already recorded in the table at `path`.
///
/// Reads column 0 of every data row, skipping the header. A missing file is
/// an empty snapshot. The reader tolerates rows of uneven width so that a
/// torn final row from an interrupted run doesn't block resumption.
pub fn processed_set(path: &Path) -> Result<HashSet<String>, CertError> {
    let mut set = HashSet::new();
    if !path.exists() {
        return Ok(set);
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|e| CertError::TableReadFailed {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;

    for result in reader.records() {
        let record = result.map_err(|e| CertError::TableReadFailed {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
        if let Some(control_number) = record.get(0) {
            if !control_number.is_empty() {
                set.insert(control_number.to_string());
            }
        }
    }

    debug!("{} control numbers already in {}", set.len(), path.display());
    Ok(set)
}

/// The mutually-excluded append-only writer shared by all worker tasks.
pub struct CsvSink {
    writer: Mutex<csv::Writer<File>>,
}

impl CsvSink {
    /// Open `path` for appending, creating it if needed.
    ///
    /// When `write_header` is true the header row is written (and flushed)
    /// before any record; pass the emptiness of the pre-run
    /// [`processed_set`] snapshot.
    pub fn open_append(path: &Path, write_header: bool) -> Result<Self, CertError> {
        let open_err = |e| CertError::TableOpenFailed {
            path: path.to_path_buf(),
            source: e,
        };
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(open_err)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if write_header {
            writer
                .write_record(HEADER)
                .and_then(|()| writer.flush().map_err(csv::Error::from))
                .map_err(|e| CertError::TableOpenFailed {
                    path: path.to_path_buf(),
                    source: std::io::Error::other(e),
                })?;
        }

        Ok(Self {
            writer: Mutex::new(writer),
        })
    }

    /// Append one complete row and flush it.
    pub fn append(&self, record: &ExtractedRecord) -> Result<(), csv::Error> {
        let mut writer = self.writer.lock().unwrap();
        writer.write_record(record.to_row())?;
        writer.flush()?;
        Ok(())
    }
}
