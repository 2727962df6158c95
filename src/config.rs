//! Configuration types for the fetch and extract pipelines.
//!
//! Each pipeline is controlled through its own struct ([`FetchConfig`],
//! [`ExtractConfig`]), built via a builder. Keeping every knob in one struct
//! makes it trivial to share configs across tasks, log them, and diff two
//! runs to understand why their outputs differ.
//!
//! # Design choice: builder over constructor
//! A many-field constructor is unreadable and breaks on every new field.
//! The builder pattern lets callers set only what they care about and rely on
//! documented defaults for the rest.

use crate::error::CertError;
use crate::pipeline::ocr::PageReader;
use crate::progress::ProgressCallback;
use std::fmt;
use std::sync::Arc;

/// Default remote host serving the numbered certificates.
pub const DEFAULT_BASE_URL: &str = "http://www.comap-math.com/mcm";

/// Browser-like identifying header sent with every certificate request.
/// The certificate server rejects requests with a default library User-Agent.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; WOW64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/73.0.3683.103 Safari/537.36";

/// Configuration for a certificate fetch run.
///
/// Built via [`FetchConfig::builder()`] or using
/// [`FetchConfig::default()`].
///
/// # Example
/// ```rust
/// use mcm_certs::FetchConfig;
///
/// let config = FetchConfig::builder()
///     .concurrency(32)
///     .max_retries(5)
///     .retry_delay_ms(250)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct FetchConfig {
    /// Base URL of the certificate host. Default: [`DEFAULT_BASE_URL`].
    ///
    /// Requests go to `<base_url>/<year>Certs/<control_number>.pdf`.
    pub base_url: String,

    /// Number of certificate downloads in flight at once. Default: 20.
    ///
    /// Downloads are network-bound; tens of concurrent requests keep the
    /// pipe full without hammering the host. Lower this if the server starts
    /// answering with transient errors under load.
    pub concurrency: usize,

    /// Total attempts per certificate on a transient failure. Default: 3.
    ///
    /// A 404 is authoritative (the certificate number was never issued) and
    /// is never retried; only non-200/404 statuses and transport faults
    /// count against this bound.
    pub max_retries: u32,

    /// Fixed delay between attempts, in milliseconds. Default: 100.
    ///
    /// The remote host rate-limits bursts rather than sustained load, so a
    /// short constant pause is enough; there is no exponential backoff.
    pub retry_delay_ms: u64,

    /// Per-request timeout in seconds. Default: 30.
    pub request_timeout_secs: u64,

    /// `User-Agent` header value. Default: [`DEFAULT_USER_AGENT`].
    pub user_agent: String,

    /// Per-item progress callback. Default: none.
    pub progress: Option<ProgressCallback>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            concurrency: 20,
            max_retries: 3,
            retry_delay_ms: 100,
            request_timeout_secs: 30,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            progress: None,
        }
    }
}

impl fmt::Debug for FetchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchConfig")
            .field("base_url", &self.base_url)
            .field("concurrency", &self.concurrency)
            .field("max_retries", &self.max_retries)
            .field("retry_delay_ms", &self.retry_delay_ms)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("progress", &self.progress.as_ref().map(|_| "<dyn RunProgress>"))
            .finish()
    }
}

impl FetchConfig {
    /// Create a new builder for `FetchConfig`.
    pub fn builder() -> FetchConfigBuilder {
        FetchConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`FetchConfig`].
#[derive(Debug)]
pub struct FetchConfigBuilder {
    config: FetchConfig,
}

impl FetchConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        // A trailing slash would produce `//<year>Certs/…` in request paths.
        let mut url = url.into();
        while url.ends_with('/') {
            url.pop();
        }
        self.config.base_url = url;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n.max(1);
        self
    }

    pub fn retry_delay_ms(mut self, ms: u64) -> Self {
        self.config.retry_delay_ms = ms;
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs.max(1);
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = ua.into();
        self
    }

    pub fn progress(mut self, cb: ProgressCallback) -> Self {
        self.config.progress = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<FetchConfig, CertError> {
        let c = &self.config;
        if c.base_url.is_empty() {
            return Err(CertError::InvalidConfig("base_url must not be empty".into()));
        }
        if c.concurrency == 0 {
            return Err(CertError::InvalidConfig("Concurrency must be ≥ 1".into()));
        }
        Ok(self.config)
    }
}

/// Configuration for a certificate extraction run.
///
/// # Example
/// ```rust
/// use mcm_certs::ExtractConfig;
///
/// let config = ExtractConfig::builder()
///     .concurrency(8)
///     .lang("eng")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ExtractConfig {
    /// Number of certificates undergoing OCR at once. Default: 4.
    ///
    /// Rasterisation and recognition are CPU-bound; each in-flight document
    /// occupies a blocking-pool thread and a tesseract process. Values above
    /// the physical core count only add memory pressure.
    pub concurrency: usize,

    /// Recognition language model passed to tesseract. Default: `"eng"`.
    ///
    /// The certificates are English-language; the matching traineddata file
    /// must be installed on the host.
    pub lang: String,

    /// Maximum rendered first-page dimension (width or height) in pixels.
    /// Default: 2000.
    ///
    /// Caps either dimension, scaling the other proportionally, so pdfium
    /// never allocates an unbounded bitmap for an oversized page. 2000 px is
    /// comfortably above what tesseract needs for the certificate typeface.
    pub max_rendered_pixels: u32,

    /// Pre-constructed page reader. Takes precedence over the built-in
    /// pdfium + tesseract reader. Useful in tests or when the caller needs
    /// custom middleware (caching, a different OCR backend).
    pub reader: Option<Arc<dyn PageReader>>,

    /// Per-item progress callback. Default: none.
    pub progress: Option<ProgressCallback>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            lang: "eng".to_string(),
            max_rendered_pixels: 2000,
            reader: None,
            progress: None,
        }
    }
}

impl fmt::Debug for ExtractConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractConfig")
            .field("concurrency", &self.concurrency)
            .field("lang", &self.lang)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("reader", &self.reader.as_ref().map(|_| "<dyn PageReader>"))
            .field("progress", &self.progress.as_ref().map(|_| "<dyn RunProgress>"))
            .finish()
    }
}

impl ExtractConfig {
    /// Create a new builder for `ExtractConfig`.
    pub fn builder() -> ExtractConfigBuilder {
        ExtractConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ExtractConfig`].
#[derive(Debug)]
pub struct ExtractConfigBuilder {
    config: ExtractConfig,
}

impl ExtractConfigBuilder {
    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn lang(mut self, lang: impl Into<String>) -> Self {
        self.config.lang = lang.into();
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn reader(mut self, reader: Arc<dyn PageReader>) -> Self {
        self.config.reader = Some(reader);
        self
    }

    pub fn progress(mut self, cb: ProgressCallback) -> Self {
        self.config.progress = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractConfig, CertError> {
        let c = &self.config;
        if c.concurrency == 0 {
            return Err(CertError::InvalidConfig("Concurrency must be ≥ 1".into()));
        }
        if c.lang.is_empty() {
            return Err(CertError::InvalidConfig(
                "Recognition language must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_defaults() {
        let c = FetchConfig::default();
        assert_eq!(c.base_url, DEFAULT_BASE_URL);
        assert_eq!(c.concurrency, 20);
        assert_eq!(c.max_retries, 3);
        assert_eq!(c.retry_delay_ms, 100);
    }

    #[test]
    fn fetch_builder_clamps_zero_concurrency() {
        let c = FetchConfig::builder().concurrency(0).build().unwrap();
        assert_eq!(c.concurrency, 1);
    }

    #[test]
    fn fetch_builder_strips_trailing_slash() {
        let c = FetchConfig::builder()
            .base_url("http://localhost:8080/")
            .build()
            .unwrap();
        assert_eq!(c.base_url, "http://localhost:8080");
    }

    #[test]
    fn extract_rejects_empty_lang() {
        let err = ExtractConfig::builder().lang("").build().unwrap_err();
        assert!(err.to_string().contains("language"));
    }

    #[test]
    fn debug_impls_hide_trait_objects() {
        let dbg = format!("{:?}", ExtractConfig::default());
        assert!(dbg.contains("reader: None"));
    }
}
