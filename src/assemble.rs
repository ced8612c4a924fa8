//! Run entry points: fetch every identifier, reorder, bind, write.
//!
//! The whole ordered collection is held in memory until the document is
//! built; there is no streaming output.

use crate::config::{AssemblyConfig, PageLayout};
use crate::error::{ItemError, ScanbindError};
use crate::output::{AssemblyReport, RunStats};
use crate::pipeline::collect::{collect, Collected, OrderedPages};
use crate::pipeline::document::{bind_pages, BoundDocument};
use crate::pipeline::fetch::{HttpImageSource, ImageSource};
use crate::pipeline::pool::spawn_pool;
use crate::progress::ProgressCallback;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Download every identifier over HTTP and write the PDF.
///
/// This is the primary entry point for the library.
///
/// # Returns
/// `Ok(AssemblyReport)` even when some items failed; check
/// `report.failures` for the identifiers that were skipped.
///
/// # Errors
/// Returns `Err(ScanbindError)` only for fatal errors:
/// - no URL template configured / HTTP client could not be built
/// - the PDF could not be serialised or written
pub async fn assemble(config: &AssemblyConfig) -> Result<AssemblyReport, ScanbindError> {
    let template = config.url_template.clone().ok_or_else(|| {
        ScanbindError::InvalidConfig("A URL template is required to download items".into())
    })?;
    let source = HttpImageSource::new(template, config.request_timeout_secs)?;
    assemble_with_source(Arc::new(source), config).await
}

/// Like [`assemble`], fetching from any [`ImageSource`].
pub async fn assemble_with_source(
    source: Arc<dyn ImageSource>,
    config: &AssemblyConfig,
) -> Result<AssemblyReport, ScanbindError> {
    let total_start = Instant::now();
    let total_items = config.range.len();
    info!(
        "Starting run: ids {}..={} ({} items), {} workers",
        config.range.first, config.range.last, total_items, config.workers
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_run_start(total_items);
    }

    // ── Step 1: Fetch + reorder ──────────────────────────────────────────
    let fetch_start = Instant::now();
    let Collected { pages, failures } = fetch_ordered(source, config).await;
    let fetch_duration_ms = fetch_start.elapsed().as_millis() as u64;
    let fetched_items = pages.len();
    let failed_items = failures.len();
    info!(
        "Fetched {}/{} items in {}ms",
        fetched_items, total_items, fetch_duration_ms
    );

    // ── Step 2: Bind pages ───────────────────────────────────────────────
    let build_start = Instant::now();
    let bound = render_pdf(pages, config.layout, config.progress_callback.clone()).await?;
    let build_duration_ms = build_start.elapsed().as_millis() as u64;

    // ── Step 3: Write ────────────────────────────────────────────────────
    write_atomic(&config.output_path, &bound.bytes).await?;

    if let Some(ref cb) = config.progress_callback {
        cb.on_run_complete(total_items, bound.pages.len());
    }

    let mut all_failures: Vec<ItemError> = failures;
    all_failures.extend(bound.failures);
    all_failures.sort_by_key(ItemError::id);

    let stats = RunStats {
        total_items,
        fetched_items,
        failed_items,
        pages_written: bound.pages.len(),
        fetch_duration_ms,
        build_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "PDF created with {} pages as {} ({}ms total)",
        stats.pages_written,
        config.output_path.display(),
        stats.total_duration_ms
    );

    Ok(AssemblyReport {
        output_path: config.output_path.clone(),
        pages: bound.pages,
        failures: all_failures,
        stats,
    })
}

/// Run the worker pool and collector; no document is built.
pub async fn fetch_ordered(source: Arc<dyn ImageSource>, config: &AssemblyConfig) -> Collected {
    let results = spawn_pool(
        source,
        config.range,
        config.workers,
        config.progress_callback.clone(),
    );
    collect(config.range, results).await
}

/// Encode and bind ordered pages into PDF bytes on the blocking pool.
pub async fn render_pdf(
    pages: OrderedPages,
    layout: PageLayout,
    progress: Option<ProgressCallback>,
) -> Result<BoundDocument, ScanbindError> {
    tokio::task::spawn_blocking(move || bind_pages(pages, layout, progress.as_ref()))
        .await
        .map_err(|e| ScanbindError::Internal(format!("Document task panicked: {e}")))?
}

/// Synchronous wrapper around [`assemble`].
///
/// Creates a temporary tokio runtime internally.
pub fn assemble_sync(config: &AssemblyConfig) -> Result<AssemblyReport, ScanbindError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ScanbindError::Internal(format!("Failed to create tokio runtime: {e}")))?
        .block_on(assemble(config))
}

/// Write via a temp file + rename so a failed run never leaves a partial PDF.
async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), ScanbindError> {
    let write_err = |source: std::io::Error| ScanbindError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let tmp_path = path.with_extension("pdf.tmp");
    if let Err(e) = tokio::fs::write(&tmp_path, bytes).await {
        discard_tmp(&tmp_path).await;
        return Err(write_err(e));
    }
    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        discard_tmp(&tmp_path).await;
        return Err(write_err(e));
    }
    Ok(())
}

/// Best-effort removal of a temp file left behind by a failed write.
async fn discard_tmp(tmp_path: &Path) {
    match tokio::fs::remove_file(tmp_path).await {
        Ok(()) => debug!("Removed temp file {}", tmp_path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Could not remove temp file {}: {}", tmp_path.display(), e),
    }
}
