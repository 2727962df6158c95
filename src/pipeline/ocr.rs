//! Text recognition: the [`PageReader`] seam and its tesseract default.
//!
//! The extractor never talks to pdfium or tesseract directly — it goes
//! through [`PageReader`], the one seam in the per-document pipeline with a
//! heavyweight external dependency. Tests inject a canned-text reader;
//! callers with a different OCR backend inject their own via
//! [`crate::config::ExtractConfigBuilder::reader`].
//!
//! The default [`TesseractReader`] drives the `tesseract` executable, which
//! must be installed on the host along with the configured language's
//! traineddata file.

use crate::error::OcrError;
use crate::pipeline::render;
use rusty_tesseract::{Args, Image};
use std::path::Path;
use tempfile::Builder;
use tracing::debug;

/// Rasterise a certificate's first page and recognise its text.
///
/// Implementations must be `Send + Sync`: the extractor calls `read_text`
/// concurrently from blocking-pool threads, one call per in-flight
/// certificate.
pub trait PageReader: Send + Sync {
    /// Produce the raw recognised text of the document's first page.
    ///
    /// The result is fed unmodified to
    /// [`crate::pipeline::parse::normalise_text`]; implementations should
    /// not collapse whitespace themselves.
    fn read_text(&self, pdf_path: &Path) -> Result<String, OcrError>;
}

/// The built-in reader: pdfium rasterisation + tesseract recognition.
pub struct TesseractReader {
    lang: String,
    max_pixels: u32,
}

impl TesseractReader {
    pub fn new(lang: impl Into<String>, max_pixels: u32) -> Self {
        Self {
            lang: lang.into(),
            max_pixels,
        }
    }
}

impl PageReader for TesseractReader {
    fn read_text(&self, pdf_path: &Path) -> Result<String, OcrError> {
        let bitmap = render::render_first_page(pdf_path, self.max_pixels)?;

        // The tesseract executable reads from disk; hand it a short-lived
        // PNG. Lossless encoding matters — compression artefacts on rendered
        // text degrade recognition. The file is removed when `tmp` drops.
        let tmp = Builder::new()
            .prefix("mcm-cert-")
            .suffix(".png")
            .tempfile()
            .map_err(|e| OcrError::Recognition(format!("temp image: {e}")))?;
        bitmap
            .save_with_format(tmp.path(), image::ImageFormat::Png)
            .map_err(|e| OcrError::Recognition(format!("temp image: {e}")))?;

        let image = Image::from_path(tmp.path())
            .map_err(|e| OcrError::Recognition(e.to_string()))?;
        let args = Args {
            lang: self.lang.clone(),
            ..Args::default()
        };

        let text = rusty_tesseract::image_to_string(&image, &args)
            .map_err(|e| OcrError::Recognition(e.to_string()))?;

        debug!(
            "Recognised {} chars from {}",
            text.len(),
            pdf_path.display()
        );
        Ok(text)
    }
}
