//! Bounded worker pool: N tasks drain one shared FCFS queue of identifiers.
//!
//! ```text
//!  producer ──▶ [ work queue, cap = N ] ──▶ worker 1..N ──▶ [ results, cap = N ] ──▶ collector
//!     │ drops sender after the last id           │                      ▲
//!     ▼                                          ▼                      │
//!   queue sealed                     supervisor joins all workers ──────┘ drops last sender
//! ```
//!
//! The result channel is sealed by the supervisor, and only after
//! `JoinSet::join_next` has returned for every worker. The collector therefore
//! sees `recv() == None` strictly after the last worker has exited.

use crate::config::IdRange;
use crate::output::FetchResult;
use crate::pipeline::fetch::{fetch_item, ImageSource};
use crate::progress::ProgressCallback;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Shared receiving end of the work queue.
type WorkQueue = Arc<Mutex<mpsc::Receiver<u32>>>;

/// Start `workers` executors over every identifier in `range`.
///
/// Returns the receiving end of the result channel. It yields exactly one
/// [`FetchResult`] per identifier (barring a worker panic) and then `None`
/// once every worker has exited.
pub fn spawn_pool(
    source: Arc<dyn ImageSource>,
    range: IdRange,
    workers: usize,
    progress: Option<ProgressCallback>,
) -> mpsc::Receiver<FetchResult> {
    let workers = workers.max(1);
    let (job_tx, job_rx) = mpsc::channel::<u32>(workers);
    let (result_tx, result_rx) = mpsc::channel::<FetchResult>(workers);

    tokio::spawn(async move {
        for id in range.ids() {
            if job_tx.send(id).await.is_err() {
                // Every worker is gone; nothing left to feed.
                break;
            }
        }
        debug!("Work queue sealed after {} items", range.len());
    });

    let queue: WorkQueue = Arc::new(Mutex::new(job_rx));
    let mut set = JoinSet::new();
    for worker in 1..=workers {
        set.spawn(run_worker(
            worker,
            Arc::clone(&queue),
            Arc::clone(&source),
            result_tx.clone(),
            progress.clone(),
        ));
    }
    info!("Started {} fetch workers for {} items", workers, range.len());

    tokio::spawn(async move {
        while let Some(joined) = set.join_next().await {
            if let Err(e) = joined {
                warn!("Fetch worker terminated abnormally: {}", e);
            }
        }
        drop(result_tx);
        debug!("All fetch workers exited; result stream sealed");
    });

    result_rx
}

/// One executor: take an id, fetch it, publish the tagged outcome, repeat.
async fn run_worker(
    worker: usize,
    queue: WorkQueue,
    source: Arc<dyn ImageSource>,
    results: mpsc::Sender<FetchResult>,
    progress: Option<ProgressCallback>,
) {
    loop {
        let next = queue.lock().await.recv().await;
        let Some(id) = next else {
            break;
        };

        debug!(worker, id, "Fetching item");
        if let Some(ref cb) = progress {
            cb.on_item_start(worker, id);
        }

        let outcome = fetch_item(source.as_ref(), id).await;

        if let Some(ref cb) = progress {
            match &outcome {
                Ok(bitmap) => cb.on_item_complete(id, bitmap.width(), bitmap.height()),
                Err(e) => cb.on_item_error(id, &e.to_string()),
            }
        }

        let result = FetchResult {
            id,
            worker,
            outcome,
        };
        if results.send(result).await.is_err() {
            // Collector dropped the stream; no one wants further results.
            break;
        }
    }
    debug!(worker, "Worker finished");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::testing::{CountingSource, SolidSource};
    use std::collections::HashSet;

    async fn drain(mut rx: mpsc::Receiver<FetchResult>) -> Vec<FetchResult> {
        let mut out = Vec::new();
        while let Some(r) = rx.recv().await {
            out.push(r);
        }
        out
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn every_identifier_fetched_exactly_once() {
        let source = Arc::new(CountingSource::new(SolidSource::new(&[])));
        let rx = spawn_pool(source.clone(), IdRange::new(10, 49), 7, None);
        let results = drain(rx).await;

        assert_eq!(results.len(), 40);
        let ids: HashSet<u32> = results.iter().map(|r| r.id).collect();
        assert_eq!(ids, (10..=49).collect::<HashSet<u32>>());
        for id in 10..=49 {
            assert_eq!(source.calls_for(id), 1, "id {id} fetched more than once");
        }
        assert_eq!(source.total_calls(), 40);
    }

    #[tokio::test]
    async fn failures_do_not_stop_the_pool() {
        let source = Arc::new(SolidSource::new(&[2, 3, 5]));
        let results = drain(spawn_pool(source, IdRange::new(1, 6), 2, None)).await;

        assert_eq!(results.len(), 6);
        let mut failed: Vec<u32> = results
            .iter()
            .filter(|r| r.outcome.is_err())
            .map(|r| r.id)
            .collect();
        failed.sort_unstable();
        assert_eq!(failed, vec![2, 3, 5]);
    }

    #[tokio::test]
    async fn empty_range_seals_immediately() {
        let source = Arc::new(SolidSource::new(&[]));
        let results = drain(spawn_pool(source, IdRange::new(5, 4), 3, None)).await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn worker_indices_stay_within_pool_size() {
        let source = Arc::new(SolidSource::new(&[]));
        let results = drain(spawn_pool(source, IdRange::new(1, 20), 3, None)).await;
        assert!(results.iter().all(|r| (1..=3).contains(&r.worker)));
    }
}
