//! # scanbind
//!
//! Fetch a numbered sequence of remote images concurrently and bind them, in
//! their original order, into a single PDF.
//!
//! ## Pipeline Overview
//!
//! ```text
//! ids first..=last
//!  │
//!  ├─ 1. Pool       N workers drain one sealed, bounded FCFS queue
//!  ├─ 2. Fetch      one HTTP GET per id (no retry)
//!  ├─ 3. Normalize  decode (format sniffed) → RGBA, 8 bits per channel
//!  ├─ 4. Collect    unordered results → slot arena → ascending ids
//!  ├─ 5. Encode     bitmap → PNG
//!  └─ 6. Bind       one PDF page per image, written atomically
//! ```
//!
//! A failed item is logged, listed in [`AssemblyReport::failures`], and left
//! out of the document. Nothing short of a bad configuration or an
//! unwritable output file stops a run.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scanbind::{assemble, AssemblyConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AssemblyConfig::builder()
//!         .url_template("https://example.com/scans/{id}.png")
//!         .range(1, 56)
//!         .workers(10)
//!         .output_path("final_output.pdf")
//!         .build()?;
//!     let report = assemble(&config).await?;
//!     eprintln!(
//!         "{} pages written, skipped: {:?}",
//!         report.stats.pages_written,
//!         report.skipped_ids()
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `scanbind` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod assemble;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use assemble::{assemble, assemble_sync, assemble_with_source, fetch_ordered, render_pdf};
pub use config::{AssemblyConfig, AssemblyConfigBuilder, IdRange, PageLayout, PageSize, UrlTemplate};
pub use error::{ItemError, ScanbindError};
pub use output::{AssemblyReport, FetchResult, RunStats};
pub use pipeline::collect::{Collected, Collector, OrderedPages};
pub use pipeline::fetch::{HttpImageSource, ImageSource};
pub use pipeline::normalize::NormalizedBitmap;
pub use progress::{AssemblyProgressCallback, NoopProgressCallback, ProgressCallback};
