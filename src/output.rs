//! Result types produced by the pipeline.

use crate::error::ItemError;
use crate::pipeline::normalize::NormalizedBitmap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Outcome of one fetch attempt, tagged with its identifier.
///
/// Produced once per identifier by a pool worker and consumed once by the
/// collector.
#[derive(Debug)]
pub struct FetchResult {
    pub id: u32,
    /// 1-based index of the worker that produced this result.
    pub worker: usize,
    pub outcome: Result<NormalizedBitmap, ItemError>,
}

/// Aggregate counters for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    /// Identifiers in the configured range.
    pub total_items: usize,
    /// Items fetched and normalised.
    pub fetched_items: usize,
    /// Items that failed to fetch or decode.
    pub failed_items: usize,
    /// Pages in the final document.
    pub pages_written: usize,
    pub fetch_duration_ms: u64,
    pub build_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// What a completed run produced.
///
/// `failures` is the manifest of skipped identifiers, sorted by id: every
/// identifier in the range that has no page in the document appears here
/// with the reason it was dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssemblyReport {
    pub output_path: PathBuf,
    /// Identifiers that became pages, ascending.
    pub pages: Vec<u32>,
    pub failures: Vec<ItemError>,
    pub stats: RunStats,
}

impl AssemblyReport {
    /// Identifiers that were dropped, ascending.
    pub fn skipped_ids(&self) -> Vec<u32> {
        self.failures.iter().map(ItemError::id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_serialises_failure_manifest() {
        let report = AssemblyReport {
            output_path: PathBuf::from("out.pdf"),
            pages: vec![1, 3],
            failures: vec![ItemError::Decode {
                id: 2,
                detail: "not an image".into(),
            }],
            stats: RunStats {
                total_items: 3,
                fetched_items: 2,
                failed_items: 1,
                pages_written: 2,
                ..RunStats::default()
            },
        };

        assert_eq!(report.skipped_ids(), vec![2]);
        let json = serde_json::to_string(&report).expect("serialisable");
        assert!(json.contains("\"pages\":[1,3]"), "got: {json}");
        assert!(json.contains("Decode"), "got: {json}");
    }
}
