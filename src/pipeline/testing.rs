//! In-memory image sources shared by the unit tests.

use crate::error::ItemError;
use crate::pipeline::fetch::ImageSource;
use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use std::sync::Mutex;
use std::time::Duration;

/// Deterministic colour for `id`.
pub(crate) fn colour_for(id: u32) -> Rgba<u8> {
    Rgba([
        (id.wrapping_mul(37) % 256) as u8,
        (id.wrapping_mul(91) % 256) as u8,
        (id.wrapping_mul(13) % 256) as u8,
        255,
    ])
}

/// 2×2 PNG filled with [`colour_for`]`(id)`.
pub(crate) fn solid_png(id: u32) -> Vec<u8> {
    let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, colour_for(id)));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .expect("png encode");
    buf
}

/// Serves [`solid_png`] for every id except `failing`, which get a
/// `Network` error. With jitter, completion order is scrambled.
pub(crate) struct SolidSource {
    failing: HashSet<u32>,
    jitter: bool,
}

impl SolidSource {
    pub(crate) fn new(failing: &[u32]) -> Self {
        Self {
            failing: failing.iter().copied().collect(),
            jitter: false,
        }
    }

    pub(crate) fn with_jitter(mut self) -> Self {
        self.jitter = true;
        self
    }
}

#[async_trait]
impl ImageSource for SolidSource {
    async fn fetch(&self, id: u32) -> Result<Vec<u8>, ItemError> {
        if self.jitter {
            tokio::time::sleep(Duration::from_millis(u64::from((id * 7) % 5))).await;
        }
        if self.failing.contains(&id) {
            return Err(ItemError::Network {
                id,
                url: format!("mem://{id}"),
                detail: "HTTP 404 Not Found".into(),
            });
        }
        Ok(solid_png(id))
    }
}

/// Counts calls per identifier before delegating.
pub(crate) struct CountingSource<S> {
    inner: S,
    calls: Mutex<HashMap<u32, usize>>,
}

impl<S> CountingSource<S> {
    pub(crate) fn new(inner: S) -> Self {
        Self {
            inner,
            calls: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) fn calls_for(&self, id: u32) -> usize {
        self.calls.lock().unwrap().get(&id).copied().unwrap_or(0)
    }

    pub(crate) fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl<S: ImageSource> ImageSource for CountingSource<S> {
    async fn fetch(&self, id: u32) -> Result<Vec<u8>, ItemError> {
        *self.calls.lock().unwrap().entry(id).or_insert(0) += 1;
        self.inner.fetch(id).await
    }
}
