//! Configuration types for an assembly run.
//!
//! All run behaviour is controlled through [`AssemblyConfig`], built via its
//! [`AssemblyConfigBuilder`]. The config is an explicit, immutable value
//! threaded into every entry point; nothing is read from process-wide state.

use crate::error::ScanbindError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Placeholders accepted in a URL template. `%d` is the printf form.
const TEMPLATE_SLOTS: [&str; 3] = ["{id}", "{}", "%d"];

/// Millimetres per PDF point denominator (1 in = 25.4 mm = 72 pt).
const MM_PER_INCH: f32 = 25.4;
const POINTS_PER_INCH: f32 = 72.0;

/// Configuration for one fetch-and-bind run.
///
/// Built via [`AssemblyConfig::builder()`] or using
/// [`AssemblyConfig::default()`].
///
/// # Example
/// ```rust
/// use scanbind::AssemblyConfig;
///
/// let config = AssemblyConfig::builder()
///     .url_template("https://example.com/scans/{id}.png")
///     .range(1, 12)
///     .workers(4)
///     .output_path("book.pdf")
///     .build()
///     .unwrap();
/// assert_eq!(config.range.len(), 12);
/// ```
#[derive(Clone)]
pub struct AssemblyConfig {
    /// URL template with exactly one identifier slot. Required only for the
    /// HTTP entry points; `assemble_with_source` ignores it.
    pub url_template: Option<UrlTemplate>,

    /// Identifiers to fetch, inclusive. Default: 1–56.
    pub range: IdRange,

    /// Number of concurrent fetch workers. Default: 10.
    pub workers: usize,

    /// Where the finished PDF is written. Default: `final_output.pdf`.
    pub output_path: PathBuf,

    /// Page geometry for the output document.
    pub layout: PageLayout,

    /// Optional per-request timeout. Default: none; a hung request blocks
    /// its worker.
    pub request_timeout_secs: Option<u64>,

    /// Receives per-item progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            url_template: None,
            range: IdRange::new(1, 56),
            workers: 10,
            output_path: PathBuf::from("final_output.pdf"),
            layout: PageLayout::default(),
            request_timeout_secs: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for AssemblyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssemblyConfig")
            .field("url_template", &self.url_template)
            .field("range", &self.range)
            .field("workers", &self.workers)
            .field("output_path", &self.output_path)
            .field("layout", &self.layout)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn AssemblyProgressCallback>"),
            )
            .finish()
    }
}

impl AssemblyConfig {
    /// Create a new builder for `AssemblyConfig`.
    pub fn builder() -> AssemblyConfigBuilder {
        AssemblyConfigBuilder {
            config: Self::default(),
            raw_template: None,
        }
    }
}

/// Builder for [`AssemblyConfig`].
#[derive(Debug)]
pub struct AssemblyConfigBuilder {
    config: AssemblyConfig,
    raw_template: Option<String>,
}

impl AssemblyConfigBuilder {
    pub fn url_template(mut self, template: impl Into<String>) -> Self {
        self.raw_template = Some(template.into());
        self
    }

    pub fn range(mut self, first: u32, last: u32) -> Self {
        self.config.range = IdRange::new(first, last);
        self
    }

    pub fn workers(mut self, n: usize) -> Self {
        self.config.workers = n;
        self
    }

    pub fn output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.output_path = path.into();
        self
    }

    pub fn page_size(mut self, size: PageSize) -> Self {
        self.config.layout.page_size = size;
        self
    }

    pub fn offset_mm(mut self, mm: f32) -> Self {
        self.config.layout.offset_mm = mm;
        self
    }

    pub fn scale_divisor(mut self, divisor: f32) -> Self {
        self.config.layout.scale_divisor = divisor;
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = Some(secs);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(mut self) -> Result<AssemblyConfig, ScanbindError> {
        if let Some(raw) = self.raw_template.take() {
            self.config.url_template = Some(UrlTemplate::parse(&raw)?);
        }

        let c = &self.config;
        if c.workers == 0 {
            return Err(ScanbindError::InvalidConfig("Worker count must be ≥ 1".into()));
        }
        if !c.layout.scale_divisor.is_finite() || c.layout.scale_divisor <= 0.0 {
            return Err(ScanbindError::InvalidConfig(format!(
                "Scale divisor must be a positive number, got {}",
                c.layout.scale_divisor
            )));
        }
        if !c.layout.offset_mm.is_finite() || c.layout.offset_mm < 0.0 {
            return Err(ScanbindError::InvalidConfig(format!(
                "Page offset must be ≥ 0 mm, got {}",
                c.layout.offset_mm
            )));
        }
        if c.output_path.as_os_str().is_empty() {
            return Err(ScanbindError::InvalidConfig("Output path is empty".into()));
        }
        Ok(self.config)
    }
}

// ── Identifier range ─────────────────────────────────────────────────────

/// Closed, contiguous range of item identifiers `[first, last]`.
///
/// `first > last` is a valid, empty range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdRange {
    pub first: u32,
    pub last: u32,
}

impl IdRange {
    pub fn new(first: u32, last: u32) -> Self {
        Self { first, last }
    }

    /// Number of identifiers in the range.
    pub fn len(&self) -> usize {
        if self.first > self.last {
            0
        } else {
            (self.last - self.first) as usize + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.first > self.last
    }

    pub fn contains(&self, id: u32) -> bool {
        id >= self.first && id <= self.last
    }

    /// Ascending iterator over every identifier.
    pub fn ids(&self) -> std::ops::RangeInclusive<u32> {
        self.first..=self.last
    }

    /// Zero-based slot of `id`, or `None` when it lies outside the range.
    pub fn slot(&self, id: u32) -> Option<usize> {
        self.contains(id).then(|| (id - self.first) as usize)
    }
}

// ── URL template ─────────────────────────────────────────────────────────

/// A URL with exactly one integer substitution slot.
///
/// The slot may be written `{id}`, `{}` or `%d`.
#[derive(Clone, PartialEq, Eq)]
pub struct UrlTemplate {
    raw: String,
    prefix: String,
    suffix: String,
}

impl UrlTemplate {
    pub fn parse(template: &str) -> Result<Self, ScanbindError> {
        let mut slots: Vec<(usize, &str)> = TEMPLATE_SLOTS
            .iter()
            .flat_map(|slot| template.match_indices(slot))
            .collect();

        match slots.len() {
            0 => Err(ScanbindError::InvalidConfig(format!(
                "URL template '{template}' has no identifier slot (use {{id}}, {{}} or %d)"
            ))),
            1 => {
                let (pos, slot) = slots.remove(0);
                Ok(Self {
                    raw: template.to_string(),
                    prefix: template[..pos].to_string(),
                    suffix: template[pos + slot.len()..].to_string(),
                })
            }
            n => Err(ScanbindError::InvalidConfig(format!(
                "URL template '{template}' has {n} identifier slots, expected exactly one"
            ))),
        }
    }

    /// Substitute `id` into the slot.
    pub fn render(&self, id: u32) -> String {
        format!("{}{}{}", self.prefix, id, self.suffix)
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Debug for UrlTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("UrlTemplate").field(&self.raw).finish()
    }
}

impl fmt::Display for UrlTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

// ── Page layout ──────────────────────────────────────────────────────────

/// Media box used for every page.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum PageSize {
    /// ISO A4 portrait, 210 × 297 mm. (default)
    #[default]
    A4,
    /// Page sized to the scaled image plus the offset on every side.
    FitImage,
}

/// Fixed page geometry: each image is drawn at `pixels / scale_divisor`
/// millimetres, `offset_mm` from the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageLayout {
    pub page_size: PageSize,
    pub offset_mm: f32,
    pub scale_divisor: f32,
}

impl Default for PageLayout {
    fn default() -> Self {
        Self {
            page_size: PageSize::A4,
            offset_mm: 10.0,
            scale_divisor: 4.0,
        }
    }
}

impl PageLayout {
    /// Drawn image size in millimetres for a `width × height` px bitmap.
    pub fn image_size_mm(&self, width: u32, height: u32) -> (f32, f32) {
        (
            width as f32 / self.scale_divisor,
            height as f32 / self.scale_divisor,
        )
    }

    /// Page size in millimetres for a `width × height` px bitmap.
    pub fn page_size_mm(&self, width: u32, height: u32) -> (f32, f32) {
        match self.page_size {
            PageSize::A4 => (210.0, 297.0),
            PageSize::FitImage => {
                let (w, h) = self.image_size_mm(width, height);
                (w + 2.0 * self.offset_mm, h + 2.0 * self.offset_mm)
            }
        }
    }
}

/// Convert millimetres to PDF points.
pub fn mm_to_pt(mm: f32) -> f32 {
    mm * POINTS_PER_INCH / MM_PER_INCH
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_run() {
        let c = AssemblyConfig::default();
        assert_eq!(c.range, IdRange::new(1, 56));
        assert_eq!(c.workers, 10);
        assert_eq!(c.output_path, PathBuf::from("final_output.pdf"));
        assert_eq!(c.layout.offset_mm, 10.0);
        assert_eq!(c.layout.scale_divisor, 4.0);
        assert!(c.request_timeout_secs.is_none());
    }

    #[test]
    fn template_accepts_each_slot_form() {
        for raw in [
            "https://host/img/{id}.png",
            "https://host/img/{}.png",
            "https://host/img/%d.png",
        ] {
            let t = UrlTemplate::parse(raw).expect("one slot is valid");
            assert_eq!(t.render(42), "https://host/img/42.png");
        }
    }

    #[test]
    fn template_rejects_missing_or_repeated_slot() {
        assert!(UrlTemplate::parse("https://host/img/cover.png").is_err());
        assert!(UrlTemplate::parse("https://host/{id}/{id}.png").is_err());
        assert!(UrlTemplate::parse("https://host/%d/{}.png").is_err());
    }

    #[test]
    fn builder_parses_template() {
        let c = AssemblyConfig::builder()
            .url_template("http://h/{id}.jpg")
            .workers(1)
            .build()
            .expect("valid config");
        assert_eq!(c.workers, 1);
        assert_eq!(
            c.url_template.as_ref().map(|t| t.render(3)),
            Some("http://h/3.jpg".to_string())
        );
    }

    #[test]
    fn builder_rejects_zero_workers() {
        let err = AssemblyConfig::builder().workers(0).build().unwrap_err();
        assert!(
            matches!(&err, ScanbindError::InvalidConfig(msg) if msg.contains("Worker count")),
            "got: {err:?}"
        );
    }

    #[test]
    fn builder_rejects_bad_layout() {
        assert!(AssemblyConfig::builder().scale_divisor(0.0).build().is_err());
        assert!(AssemblyConfig::builder().offset_mm(-1.0).build().is_err());
        assert!(AssemblyConfig::builder().output_path("").build().is_err());
    }

    #[test]
    fn id_range_len_and_slots() {
        let r = IdRange::new(3, 7);
        assert_eq!(r.len(), 5);
        assert_eq!(r.slot(3), Some(0));
        assert_eq!(r.slot(7), Some(4));
        assert_eq!(r.slot(8), None);
        assert_eq!(r.slot(2), None);

        let empty = IdRange::new(5, 1);
        assert!(empty.is_empty());
        assert_eq!(empty.len(), 0);
        assert_eq!(empty.ids().count(), 0);
    }

    #[test]
    fn layout_geometry() {
        let layout = PageLayout::default();
        assert_eq!(layout.image_size_mm(400, 800), (100.0, 200.0));
        assert_eq!(layout.page_size_mm(400, 800), (210.0, 297.0));

        let fit = PageLayout {
            page_size: PageSize::FitImage,
            ..PageLayout::default()
        };
        assert_eq!(fit.page_size_mm(400, 800), (120.0, 220.0));
        assert!((mm_to_pt(25.4) - 72.0).abs() < 1e-4);
    }
}
