//! Collector: unordered results in, ascending identifier order out.
//!
//! Results land in a slot arena sized to the range, one slot per identifier
//! at `id - first`. The arena is owned by the single consumer, so storing a
//! result is an index write with no map and no locking. Reading back is a
//! walk over the slots in index order.

use crate::config::IdRange;
use crate::error::ItemError;
use crate::output::FetchResult;
use crate::pipeline::normalize::NormalizedBitmap;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Accumulates [`FetchResult`]s in any arrival order.
pub struct Collector {
    range: IdRange,
    slots: Vec<Option<NormalizedBitmap>>,
    failures: Vec<ItemError>,
}

/// Everything the collector learned once the stream was sealed.
pub struct Collected {
    pub pages: OrderedPages,
    /// Failed identifiers with their errors, ascending by id.
    pub failures: Vec<ItemError>,
}

impl Collector {
    pub fn new(range: IdRange) -> Self {
        let mut slots = Vec::with_capacity(range.len());
        slots.resize_with(range.len(), || None);
        Self {
            range,
            slots,
            failures: Vec::new(),
        }
    }

    /// Record one result.
    pub fn accept(&mut self, result: FetchResult) {
        let FetchResult { id, worker, outcome } = result;

        let Some(slot) = self.range.slot(id) else {
            warn!(id, worker, "Dropping result for identifier outside the configured range");
            return;
        };

        match outcome {
            Ok(bitmap) => {
                if self.slots[slot].is_some() {
                    warn!(id, worker, "Ignoring duplicate result");
                    return;
                }
                debug!(id, worker, "Stored {}x{} bitmap", bitmap.width(), bitmap.height());
                self.slots[slot] = Some(bitmap);
            }
            Err(e) => {
                warn!(id, worker, "Error downloading item {}: {}", id, e);
                self.failures.push(e);
            }
        }
    }

    /// Seal the collector and hand back the ordered view.
    pub fn finish(mut self) -> Collected {
        self.failures.sort_by_key(ItemError::id);
        Collected {
            pages: OrderedPages {
                first: self.range.first,
                slots: self.slots,
            },
            failures: self.failures,
        }
    }
}

/// Drain `results` until the pool seals it, then return the ordered view.
pub async fn collect(range: IdRange, mut results: mpsc::Receiver<FetchResult>) -> Collected {
    let mut collector = Collector::new(range);
    while let Some(result) = results.recv().await {
        collector.accept(result);
    }
    collector.finish()
}

/// Successfully fetched bitmaps in ascending identifier order.
///
/// Consumed once, by value. Identifiers whose fetch failed are simply
/// absent; nothing is padded in their place.
pub struct OrderedPages {
    first: u32,
    slots: Vec<Option<NormalizedBitmap>>,
}

impl OrderedPages {
    /// Number of bitmaps that will be yielded.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Identifiers that will be yielded, ascending.
    pub fn ids(&self) -> Vec<u32> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|_| self.first + i as u32))
            .collect()
    }
}

impl IntoIterator for OrderedPages {
    type Item = (u32, NormalizedBitmap);
    type IntoIter = OrderedIter;

    fn into_iter(self) -> OrderedIter {
        OrderedIter {
            first: self.first,
            inner: self.slots.into_iter().enumerate(),
        }
    }
}

/// Lazy, single-pass iterator over [`OrderedPages`].
pub struct OrderedIter {
    first: u32,
    inner: std::iter::Enumerate<std::vec::IntoIter<Option<NormalizedBitmap>>>,
}

impl Iterator for OrderedIter {
    type Item = (u32, NormalizedBitmap);

    fn next(&mut self) -> Option<Self::Item> {
        let first = self.first;
        self.inner
            .by_ref()
            .find_map(|(i, slot)| slot.map(|bitmap| (first + i as u32, bitmap)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.inner.size_hint().1)
    }
}
