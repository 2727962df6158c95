//! Anchored field extraction from recognised certificate text.
//!
//! ## Why literal anchors?
//!
//! Every certificate is printed from the same template, so three literal
//! phrases locate every field of interest:
//!
//! ```text
//! Be It Known That The Team Of      ← team block starts after this line
//! <student 1..n>
//! With Faculty Advisor              ← caption, not a name
//! <advisor>
//! Of                                ← team block ends; university follows
//! <university>
//! ...
//! Was Designated As
//! <prize>
//! ```
//!
//! Structural document parsing buys nothing here — the input is OCR text,
//! not a tagged layout, and the anchors are the only stable landmarks.
//! Anchors match case-insensitively because recognition sometimes mangles
//! letter case; a pattern that finds no anchor yields an empty field, never
//! an error.
//!
//! The `regex` crate has no look-around, so each anchor is consumed text
//! and the field is a capture group. Anchor text is only ever a boundary,
//! so nothing is lost by consuming it.

use once_cell::sync::Lazy;
use regex::Regex;

/// All fields a certificate yields. Any of them may be empty when the
/// corresponding anchor was not recognised.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CertificateFields {
    /// Team member names in document order, advisor excluded.
    pub students: Vec<String>,
    pub advisor: String,
    pub university: String,
    pub prize: String,
}

// ── Normalisation ────────────────────────────────────────────────────────

static RE_BLANK_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n").unwrap());

/// Collapse any run of blank lines to a single newline.
///
/// Recognition renders the certificate's generous vertical whitespace as
/// stacks of empty lines; the anchor patterns assume fields sit on the line
/// directly after their anchor, so the stacks must go first.
pub fn normalise_text(raw: &str) -> String {
    RE_BLANK_RUNS.replace_all(raw, "\n").into_owned()
}

// ── Anchored extractions ─────────────────────────────────────────────────

static RE_TEAM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)Be It Known That The Team Of\n(.*?)\nOf").unwrap());

static RE_UNIVERSITY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\nOf\n(.*)").unwrap());

static RE_PRIZE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)Was Designated As\n(.*)").unwrap());

/// Apply the three anchored extractions to normalised certificate text.
///
/// The team block runs from "Be It Known That The Team Of" to the next line
/// reading "Of". Within it, any line containing the substring `Advisor` is a
/// printed caption and is dropped; of the remaining lines the last is the
/// advisor's name and the rest are students, in document order. The
/// substring test is case-sensitive on purpose: the captions are typeset,
/// not hand-written, and a case-folded test would eat a student whose name
/// contains "advisor" in another casing context.
pub fn extract_fields(text: &str) -> CertificateFields {
    let team: Vec<String> = RE_TEAM
        .captures(text)
        .map(|c| {
            c[1].trim()
                .split('\n')
                .filter(|line| !line.contains("Advisor"))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let (students, advisor) = match team.split_last() {
        Some((advisor, students)) => (students.to_vec(), advisor.clone()),
        None => (Vec::new(), String::new()),
    };

    let university = RE_UNIVERSITY
        .captures(text)
        .map(|c| c[1].trim().to_string())
        .unwrap_or_default();

    let prize = RE_PRIZE
        .captures(text)
        .map(|c| c[1].trim().to_string())
        .unwrap_or_default();

    CertificateFields {
        students,
        advisor,
        university,
        prize,
    }
}
