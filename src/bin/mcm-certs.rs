//! CLI binary for mcm-certs.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `FetchConfig` / `ExtractConfig` and prints results.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use mcm_certs::{
    control_numbers, extract_certificates, fetch_certificates, ExtractConfig, ExtractReport,
    FetchConfig, FetchReport, ProgressCallback, RunProgress,
};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: renders a live progress bar and per-failure
/// log lines using [indicatif]. Works correctly when items complete
/// out-of-order (concurrent mode).
struct CliProgress {
    /// The single progress bar anchored at the bottom of the terminal.
    bar: ProgressBar,
    /// Count of items that failed terminally.
    errors: AtomicUsize,
}

impl CliProgress {
    /// Create a callback whose progress-bar length is set dynamically by
    /// `on_run_start` (called before any items are processed).
    fn new_dynamic(prefix: &'static str) -> Arc<Self> {
        let bar = ProgressBar::new(0); // length set in on_run_start

        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(spinner_style);
        bar.set_prefix(prefix);
        bar.set_message("Preparing…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            errors: AtomicUsize::new(0),
        })
    }

    /// Switch to the full progress-bar style once we know `total`.
    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>6}/{len}  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.reset_eta();
    }
}

impl RunProgress for CliProgress {
    fn on_run_start(&self, total: usize) {
        self.activate_bar(total);
    }

    fn on_item_done(&self, control_number: &str) {
        self.bar.set_message(control_number.to_string());
        self.bar.inc(1);
    }

    fn on_item_skipped(&self, _control_number: &str) {
        self.bar.inc(1);
    }

    fn on_item_error(&self, control_number: &str, error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);

        // Truncate very long error messages to keep output tidy.
        let msg = if error.len() > 80 {
            format!("{}\u{2026}", &error[..79])
        } else {
            error.to_string()
        };

        self.bar
            .println(format!("  {} {}  {}", red("✗"), control_number, red(&msg)));
        self.bar.inc(1);
    }

    fn on_run_complete(&self, _total: usize, _succeeded: usize) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Download 2023 certificates into ./paper_2023/
  mcm-certs fetch 2023

  # Narrower candidate range, gentler on the host
  mcm-certs fetch 2023 --range 5000 --fetch-workers 8 --retry-delay-ms 500

  # OCR downloaded certificates into ./certificates_2023.csv
  mcm-certs extract 2023

  # Both pipelines for several years, back to back
  mcm-certs run 2023,2022

  # Machine-readable per-run report
  mcm-certs extract 2023 --json > report.json

ENVIRONMENT VARIABLES:
  MCM_YEARS            Years for `run` (comma-separated)
  MCM_RANGE            Candidate serials per year (default 30000)
  MCM_MAX_RETRIES      Attempts per certificate (default 3)
  MCM_FETCH_WORKERS    Concurrent downloads (default 20)
  MCM_RETRY_DELAY_MS   Pause between attempts (default 100)
  MCM_OCR_WORKERS      Concurrent OCR tasks (default 4)
  MCM_BASE_URL         Certificate host base URL
  MCM_LANG             Tesseract language model (default eng)

SETUP:
  The extractor needs a pdfium shared library (see pdfium-render's
  documentation) and a `tesseract` executable with the chosen language's
  traineddata on PATH. The fetcher has no external requirements.
"#;

/// Bulk-download numbered award certificates and OCR them into a CSV table.
#[derive(Parser, Debug)]
#[command(
    name = "mcm-certs",
    version,
    about = "Bulk-download numbered award certificates and OCR them into a CSV table",
    long_about = "Walk a year's certificate number space, download every certificate that \
exists, then recover team members, advisor, university, and prize from each one via OCR \
and anchored pattern matching, appending rows to a per-year CSV. Both stages are \
resumable and idempotent.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Output the run report as JSON instead of a summary line.
    #[arg(long, global = true, env = "MCM_JSON")]
    json: bool,

    /// Disable the progress bar.
    #[arg(long, global = true, env = "MCM_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "MCM_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "MCM_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Download a year's certificates into a directory.
    Fetch {
        /// Competition year, e.g. 2023.
        #[arg(env = "MCM_YEAR")]
        year: u16,

        #[command(flatten)]
        fetch: FetchOpts,

        /// Certificate directory. Default: paper_<year>.
        #[arg(long, env = "MCM_DIR")]
        dir: Option<PathBuf>,
    },

    /// OCR a year's downloaded certificates into the output table.
    Extract {
        /// Competition year, e.g. 2023.
        #[arg(env = "MCM_YEAR")]
        year: u16,

        #[command(flatten)]
        extract: ExtractOpts,

        /// Certificate directory. Default: paper_<year>.
        #[arg(long, env = "MCM_DIR")]
        dir: Option<PathBuf>,

        /// Output table path. Default: certificates_<year>.csv.
        #[arg(long, env = "MCM_CSV")]
        csv: Option<PathBuf>,
    },

    /// Fetch then extract, for each given year.
    Run {
        /// Competition years, e.g. 2023,2022.
        #[arg(env = "MCM_YEARS", value_delimiter = ',', required = true)]
        years: Vec<u16>,

        #[command(flatten)]
        fetch: FetchOpts,

        #[command(flatten)]
        extract: ExtractOpts,
    },
}

#[derive(Args, Debug)]
struct FetchOpts {
    /// Candidate serials per year; control numbers 1..RANGE are tried.
    #[arg(long, env = "MCM_RANGE", default_value_t = 30_000)]
    range: u32,

    /// Concurrent downloads.
    #[arg(long, env = "MCM_FETCH_WORKERS", default_value_t = 20)]
    fetch_workers: usize,

    /// Attempts per certificate on transient failures.
    #[arg(long, env = "MCM_MAX_RETRIES", default_value_t = 3)]
    max_retries: u32,

    /// Pause between attempts, in milliseconds.
    #[arg(long, env = "MCM_RETRY_DELAY_MS", default_value_t = 100)]
    retry_delay_ms: u64,

    /// Per-request timeout in seconds.
    #[arg(long, env = "MCM_TIMEOUT", default_value_t = 30)]
    timeout: u64,

    /// Certificate host base URL.
    #[arg(long, env = "MCM_BASE_URL", default_value = mcm_certs::DEFAULT_BASE_URL)]
    base_url: String,
}

#[derive(Args, Debug)]
struct ExtractOpts {
    /// Concurrent OCR tasks. Rasterisation and recognition are CPU-bound;
    /// values above the core count only add memory pressure.
    #[arg(long, env = "MCM_OCR_WORKERS", default_value_t = 4)]
    ocr_workers: usize,

    /// Tesseract language model.
    #[arg(long, env = "MCM_LANG", default_value = "eng")]
    lang: String,

    /// Maximum rendered page dimension in pixels.
    #[arg(long, env = "MCM_MAX_PIXELS", default_value_t = 2000)]
    max_pixels: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Fetch {
            year,
            ref fetch,
            ref dir,
        } => {
            let report = run_fetch(year, fetch, dir.clone(), &cli).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
        }
        Command::Extract {
            year,
            ref extract,
            ref dir,
            ref csv,
        } => {
            let report = run_extract(year, extract, dir.clone(), csv.clone(), &cli).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
        }
        Command::Run {
            ref years,
            ref fetch,
            ref extract,
        } => {
            for &year in years {
                if !cli.quiet {
                    eprintln!("{} {}", cyan("◆"), bold(&format!("Year {year}")));
                }
                let fetched = run_fetch(year, fetch, None, &cli).await?;
                let extracted = run_extract(year, extract, None, None, &cli).await?;
                if cli.json {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&serde_json::json!({
                            "year": year,
                            "fetch": fetched,
                            "extract": extracted,
                        }))?
                    );
                }
            }
        }
    }

    Ok(())
}

/// Default certificate directory for a year.
fn year_dir(year: u16) -> PathBuf {
    PathBuf::from(format!("paper_{year}"))
}

async fn run_fetch(
    year: u16,
    opts: &FetchOpts,
    dir: Option<PathBuf>,
    cli: &Cli,
) -> Result<FetchReport> {
    let dir = dir.unwrap_or_else(|| year_dir(year));
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;

    let mut builder = FetchConfig::builder()
        .base_url(&opts.base_url)
        .concurrency(opts.fetch_workers)
        .max_retries(opts.max_retries)
        .retry_delay_ms(opts.retry_delay_ms)
        .request_timeout_secs(opts.timeout);

    if show_progress {
        let cb = CliProgress::new_dynamic("Fetching");
        builder = builder.progress(cb as ProgressCallback);
    }
    let config = builder.build().context("Invalid fetch configuration")?;

    let ids = control_numbers(year, opts.range);
    let report = fetch_certificates(year, &ids, &dir, &config)
        .await
        .context("Fetch run failed")?;

    if !cli.quiet && !cli.json {
        let s = &report.stats;
        eprintln!(
            "{} {} saved  {} present  {} absent  {} failed  {}  →  {}",
            if s.failed == 0 { green("✔") } else { cyan("⚠") },
            bold(&s.saved.to_string()),
            s.already_downloaded,
            s.absent,
            if s.failed == 0 {
                s.failed.to_string()
            } else {
                red(&s.failed.to_string())
            },
            dim(&format!("{}ms", s.duration_ms)),
            bold(&dir.display().to_string()),
        );
    }

    Ok(report)
}

async fn run_extract(
    year: u16,
    opts: &ExtractOpts,
    dir: Option<PathBuf>,
    csv: Option<PathBuf>,
    cli: &Cli,
) -> Result<ExtractReport> {
    let dir = dir.unwrap_or_else(|| year_dir(year));
    let csv = csv.unwrap_or_else(|| PathBuf::from(format!("certificates_{year}.csv")));
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;

    let mut builder = ExtractConfig::builder()
        .concurrency(opts.ocr_workers)
        .lang(&opts.lang)
        .max_rendered_pixels(opts.max_pixels);

    if show_progress {
        let cb = CliProgress::new_dynamic("Extracting");
        builder = builder.progress(cb as ProgressCallback);
    }
    let config = builder.build().context("Invalid extract configuration")?;

    let report = extract_certificates(&dir, &csv, &config)
        .await
        .context("Extraction run failed")?;

    if !cli.quiet && !cli.json {
        let s = &report.stats;
        eprintln!(
            "{} {} appended  {} skipped  {} failed  {}  →  {}",
            if s.failed == 0 { green("✔") } else { cyan("⚠") },
            bold(&s.appended.to_string()),
            s.skipped,
            if s.failed == 0 {
                s.failed.to_string()
            } else {
                red(&s.failed.to_string())
            },
            dim(&format!("{}ms", s.duration_ms)),
            bold(&csv.display().to_string()),
        );
    }

    Ok(report)
}
