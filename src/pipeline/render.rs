//! First-page rasterisation: certificate PDF → `DynamicImage` via pdfium.
//!
//! ## Why blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async
//! contexts. Callers ([`crate::pipeline::ocr::TesseractReader`] via the
//! extractor) run this module inside `tokio::task::spawn_blocking`, keeping
//! the Tokio worker threads free while a page renders.
//!
//! ## Why cap pixels, not DPI?
//!
//! The certificates are a single landscape page, but a hostile or corrupt
//! PDF can declare an arbitrarily large media box. `max_pixels` caps the
//! longest rendered edge regardless of declared size, so pdfium never
//! allocates an unbounded bitmap.

use crate::error::OcrError;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::debug;

/// Rasterise the first page of `pdf_path` into a bitmap.
///
/// Blocking; call from `spawn_blocking`. Only the first page is rendered —
/// a certificate is a single page, and trailing pages in a malformed
/// download carry nothing extractable.
pub fn render_first_page(pdf_path: &Path, max_pixels: u32) -> Result<DynamicImage, OcrError> {
    let pdfium = Pdfium::default();

    let document = pdfium
        .load_pdf_from_file(pdf_path, None)
        .map_err(|e| OcrError::Render(format!("{:?}", e)))?;

    let pages = document.pages();
    if pages.len() == 0 {
        return Err(OcrError::Render("document has no pages".into()));
    }

    let render_config = PdfRenderConfig::new()
        .set_target_width(max_pixels as i32)
        .set_maximum_height(max_pixels as i32);

    let page = pages
        .get(0)
        .map_err(|e| OcrError::Render(format!("{:?}", e)))?;

    let bitmap = page
        .render_with_config(&render_config)
        .map_err(|e| OcrError::Render(format!("{:?}", e)))?;

    let image = bitmap.as_image();
    debug!(
        "Rendered {} → {}x{} px",
        pdf_path.display(),
        image.width(),
        image.height()
    );

    Ok(image)
}
