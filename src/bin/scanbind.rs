//! CLI binary for scanbind.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `AssemblyConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use scanbind::{
    assemble, AssemblyConfig, AssemblyProgressCallback, PageSize, ProgressCallback, ScanbindError,
};
use std::io;
use std::path::PathBuf;
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

// ── CLI progress callbacks ───────────────────────────────────────────────────

/// Progress bar with one log line per item, printed above the bar.
/// Items complete out of order; the bar only counts.
struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} items  \
             ⏱ {elapsed_precise}  ETA {eta_precise}  {msg:.dim}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Fetching");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar })
    }
}

impl AssemblyProgressCallback for BarProgress {
    fn on_run_start(&self, total_items: usize) {
        self.bar.set_length(total_items as u64);
        self.bar.reset_eta();
    }

    fn on_item_start(&self, worker: usize, id: u32) {
        self.bar.set_message(format!("worker {worker}: item {id}"));
    }

    fn on_item_complete(&self, id: u32, width: u32, height: u32) {
        self.bar.println(format!(
            "  {} Item {:>4}  {}",
            green("✓"),
            id,
            dim(&format!("{width}x{height} px")),
        ));
        self.bar.inc(1);
    }

    fn on_item_error(&self, id: u32, error: &str) {
        self.bar
            .println(format!("  {} Item {:>4}  {}", red("✗"), id, red(error)));
        self.bar.inc(1);
    }

    fn on_page_error(&self, id: u32, error: &str) {
        self.bar
            .println(format!("  {} Page {:>4}  {}", red("✗"), id, red(error)));
    }

    fn on_run_complete(&self, total_items: usize, pages_written: usize) {
        self.bar.finish_and_clear();
        let failed = total_items.saturating_sub(pages_written);
        if failed == 0 {
            eprintln!("{} {} pages bound", green("✔"), bold(&pages_written.to_string()));
        } else {
            eprintln!(
                "{} {}/{} pages bound  ({} skipped)",
                if pages_written == 0 { red("✘") } else { cyan("⚠") },
                bold(&pages_written.to_string()),
                total_items,
                red(&failed.to_string()),
            );
        }
    }
}

/// Plain per-item lines on stdout, for logs and non-interactive shells.
struct LineProgress;

impl AssemblyProgressCallback for LineProgress {
    fn on_item_start(&self, worker: usize, id: u32) {
        println!("Worker {worker}: Downloading image {id}...");
    }

    fn on_item_error(&self, id: u32, error: &str) {
        println!("Error downloading image {id}: {error}");
    }

    fn on_page_error(&self, id: u32, error: &str) {
        println!("Error adding image {id} to PDF: {error}");
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Fetch items 1..=56 with 10 workers into final_output.pdf
  scanbind --url-template 'https://example.com/scans/{id}.png'

  # Explicit range, more workers, custom output
  scanbind -u 'https://example.com/p/%d.jpg' --first 3 --last 120 -w 16 -o book.pdf

  # Pages sized to each image instead of A4
  scanbind -u 'https://example.com/{}.png' --page-size fit

  # Machine-readable report (pages + skipped ids)
  scanbind -u 'https://example.com/{id}.png' --json > report.json

URL TEMPLATE:
  Exactly one identifier slot, written {id}, {} or %d.

ENVIRONMENT VARIABLES:
  SCANBIND_URL_TEMPLATE, SCANBIND_FIRST, SCANBIND_LAST, SCANBIND_WORKERS,
  SCANBIND_OUTPUT, …  mirror the flags of the same name.
  RUST_LOG            Override log filtering (e.g. scanbind=debug).
"#;

/// Fetch a numbered image sequence and bind it into one PDF.
#[derive(Parser, Debug)]
#[command(
    name = "scanbind",
    version,
    about = "Fetch a numbered image sequence concurrently and bind it, in order, into one PDF",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// URL with one identifier slot: {id}, {} or %d.
    #[arg(short, long, env = "SCANBIND_URL_TEMPLATE")]
    url_template: String,

    /// First identifier (inclusive).
    #[arg(long, env = "SCANBIND_FIRST", default_value_t = 1)]
    first: u32,

    /// Last identifier (inclusive).
    #[arg(long, env = "SCANBIND_LAST", default_value_t = 56)]
    last: u32,

    /// Number of concurrent download workers.
    #[arg(short, long, env = "SCANBIND_WORKERS", default_value_t = 10)]
    workers: usize,

    /// Output PDF path.
    #[arg(short, long, env = "SCANBIND_OUTPUT", default_value = "final_output.pdf")]
    output: PathBuf,

    /// Page size: a4 or fit (page wraps each image).
    #[arg(long, env = "SCANBIND_PAGE_SIZE", value_enum, default_value = "a4")]
    page_size: PageSizeArg,

    /// Image offset from the top-left page corner, in millimetres.
    #[arg(long, env = "SCANBIND_OFFSET_MM", default_value_t = 10.0)]
    offset_mm: f32,

    /// Pixels per millimetre on the page.
    #[arg(long, env = "SCANBIND_SCALE_DIVISOR", default_value_t = 4.0)]
    scale_divisor: f32,

    /// Per-request timeout in seconds (default: wait indefinitely).
    #[arg(long, env = "SCANBIND_TIMEOUT")]
    timeout: Option<u64>,

    /// Print the run report as JSON on stdout.
    #[arg(long, env = "SCANBIND_JSON")]
    json: bool,

    /// Disable the progress bar; print plain per-item lines instead.
    #[arg(long, env = "SCANBIND_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "SCANBIND_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "SCANBIND_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum PageSizeArg {
    A4,
    Fit,
}

impl From<PageSizeArg> for PageSize {
    fn from(v: PageSizeArg) -> Self {
        match v {
            PageSizeArg::A4 => PageSize::A4,
            PageSizeArg::Fit => PageSize::FitImage,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // With the bar active, per-item feedback comes from the callback, so
    // library logs drop to errors only.
    let show_bar = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_bar || cli.json {
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

    // ── Build config ─────────────────────────────────────────────────────
    let bar = show_bar.then(BarProgress::new);
    let progress: Option<ProgressCallback> = if cli.quiet || cli.json {
        None
    } else if let Some(ref bar) = bar {
        Some(Arc::clone(bar) as Arc<dyn AssemblyProgressCallback>)
    } else {
        Some(Arc::new(LineProgress) as Arc<dyn AssemblyProgressCallback>)
    };

    let config = build_config(&cli, progress)?;

    // ── Run ──────────────────────────────────────────────────────────────
    let outcome = assemble(&config).await;
    // The bar only finishes itself on a completed run.
    if let (Some(bar), Err(_)) = (&bar, &outcome) {
        bar.bar.finish_and_clear();
    }

    match outcome {
        Ok(report) => {
            if cli.json {
                let json =
                    serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
                println!("{json}");
            } else if !cli.quiet {
                let stats = &report.stats;
                eprintln!(
                    "{}  {}/{} pages  {}ms  →  {}",
                    if stats.pages_written == stats.total_items {
                        green("✔")
                    } else {
                        cyan("⚠")
                    },
                    stats.pages_written,
                    stats.total_items,
                    stats.total_duration_ms,
                    bold(&report.output_path.display().to_string()),
                );
                let skipped = report.skipped_ids();
                if !skipped.is_empty() {
                    eprintln!("   skipped: {}", dim(&format!("{skipped:?}")));
                }
            }
        }
        // The run itself finished; only saving failed. Reported, not fatal.
        Err(e @ ScanbindError::OutputWriteFailed { .. })
        | Err(e @ ScanbindError::DocumentSerialize(_)) => {
            eprintln!("{} Error saving PDF: {e}", red("✘"));
        }
        Err(e) => return Err(e).context("Run failed"),
    }

    Ok(())
}

/// Map CLI args to `AssemblyConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<AssemblyConfig> {
    let mut builder = AssemblyConfig::builder()
        .url_template(cli.url_template.clone())
        .range(cli.first, cli.last)
        .workers(cli.workers)
        .output_path(cli.output.clone())
        .page_size(cli.page_size.clone().into())
        .offset_mm(cli.offset_mm)
        .scale_divisor(cli.scale_divisor);

    if let Some(secs) = cli.timeout {
        builder = builder.request_timeout_secs(secs);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
