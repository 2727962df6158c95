//! Result types returned by the fetch and extract pipelines.
//!
//! Both pipelines run every item to a terminal state and report what
//! happened, rather than aborting on partial failure. The fetcher's real
//! output is the certificate files themselves — [`FetchReport`] only tallies
//! outcomes and lists the IDs that exhausted their retries, so a later run
//! can be pointed at exactly the stragglers. The extractor's real output is
//! the CSV table; [`ExtractReport`] additionally carries one
//! [`DocResult`] per file for callers that want the parsed fields or the
//! per-document error.

use crate::error::DocError;
use crate::pipeline::parse::CertificateFields;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Student-name columns in the output table. Shorter teams are padded with
/// empty values; longer teams are truncated (see [`ExtractedRecord::new`]).
pub const STUDENT_SLOTS: usize = 3;

// ── Fetch ────────────────────────────────────────────────────────────────

/// Terminal state of one candidate certificate ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FetchOutcome {
    /// HTTP 200; body written to `<dir>/<id>.pdf`.
    Saved,
    /// The file was on disk before the run started; no request was issued.
    AlreadyDownloaded,
    /// HTTP 404; the number was never issued. Not retried, not an error.
    Absent,
    /// Retries exhausted without a 200 or 404. No file produced.
    Failed,
}

/// Aggregate counts for one fetch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchStats {
    /// Candidate IDs handed to the run.
    pub requested: usize,
    pub saved: usize,
    pub already_downloaded: usize,
    pub absent: usize,
    pub failed: usize,
    pub duration_ms: u64,
}

/// Everything a fetch run reports back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchReport {
    pub stats: FetchStats,
    /// IDs that exhausted their retries. Saved certificates are observable
    /// on disk; absent ones leave no trace, so only failures are listed.
    pub failed: Vec<u32>,
}

// ── Extract ──────────────────────────────────────────────────────────────

/// One row of the output table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedRecord {
    pub control_number: String,
    pub student1: String,
    pub student2: String,
    pub student3: String,
    pub advisor: String,
    pub university: String,
    pub prize: String,
}

impl ExtractedRecord {
    /// Shape parsed certificate fields into a fixed-arity row.
    ///
    /// Teams shorter than [`STUDENT_SLOTS`] are padded with empty strings.
    /// Longer teams are truncated to the first three names — the published
    /// header is a fixed 7-column schema, and a malformed wide row would
    /// corrupt the table for every downstream reader. Truncation is logged
    /// so the affected certificate can be audited.
    pub fn new(control_number: impl Into<String>, fields: CertificateFields) -> Self {
        let control_number = control_number.into();
        let CertificateFields {
            mut students,
            advisor,
            university,
            prize,
        } = fields;

        if students.len() > STUDENT_SLOTS {
            warn!(
                "{}: {} students detected, keeping the first {}",
                control_number,
                students.len(),
                STUDENT_SLOTS
            );
            students.truncate(STUDENT_SLOTS);
        }
        students.resize(STUDENT_SLOTS, String::new());

        let mut names = students.into_iter();
        Self {
            control_number,
            student1: names.next().unwrap_or_default(),
            student2: names.next().unwrap_or_default(),
            student3: names.next().unwrap_or_default(),
            advisor,
            university,
            prize,
        }
    }

    /// The row in output-table column order.
    pub fn to_row(&self) -> [&str; 7] {
        [
            &self.control_number,
            &self.student1,
            &self.student2,
            &self.student3,
            &self.advisor,
            &self.university,
            &self.prize,
        ]
    }
}

/// Terminal state of one certificate file in an extraction run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocStatus {
    /// A row was appended to the output table.
    Appended,
    /// The control number was already in the table before the run started.
    Skipped,
    /// Rasterisation, recognition, or the row write failed; no row emitted.
    Failed,
}

/// Per-certificate result of an extraction run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocResult {
    pub control_number: String,
    pub status: DocStatus,
    /// The appended row; `None` unless `status` is [`DocStatus::Appended`].
    pub record: Option<ExtractedRecord>,
    /// The failure; `None` unless `status` is [`DocStatus::Failed`].
    pub error: Option<DocError>,
    pub duration_ms: u64,
}

/// Aggregate counts for one extraction run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractStats {
    /// Certificate files found in the directory.
    pub total_files: usize,
    pub appended: usize,
    pub skipped: usize,
    pub failed: usize,
    pub duration_ms: u64,
}

/// Everything an extraction run reports back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractReport {
    pub stats: ExtractStats,
    pub results: Vec<DocResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(students: &[&str]) -> CertificateFields {
        CertificateFields {
            students: students.iter().map(|s| s.to_string()).collect(),
            advisor: "Carol Doe".into(),
            university: "Example University".into(),
            prize: "MERITORIOUS WINNER".into(),
        }
    }

    #[test]
    fn short_team_is_padded_to_three() {
        let r = ExtractedRecord::new("2300001", fields(&["Alice Smith"]));
        assert_eq!(r.student1, "Alice Smith");
        assert_eq!(r.student2, "");
        assert_eq!(r.student3, "");
    }

    #[test]
    fn oversized_team_is_truncated() {
        let r = ExtractedRecord::new("2300002", fields(&["A", "B", "C", "D"]));
        assert_eq!(r.to_row()[1..4], ["A", "B", "C"]);
    }

    #[test]
    fn row_preserves_column_order() {
        let r = ExtractedRecord::new("2300003", fields(&["A", "B", "C"]));
        assert_eq!(
            r.to_row(),
            [
                "2300003",
                "A",
                "B",
                "C",
                "Carol Doe",
                "Example University",
                "MERITORIOUS WINNER"
            ]
        );
    }
}
