use std::sync::Arc;
use tokio::task::JoinSet;

use crate::error::RunError;
use crate::library::LibraryClient;
use crate::naming::NamedItem;
use crate::run_log::RunLog;
use crate::worker::{self, DownloadOutcome};

/// Fixed-size pool of download workers.
#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    max_concurrency: usize,
}

impl WorkerPool {
    /// Rejects a pool size of zero.
    pub fn new(max_concurrency: usize) -> Result<Self, RunError> {
        if max_concurrency == 0 {
            return Err(RunError::Config(
                "max concurrency must be at least 1".to_string(),
            ));
        }
        Ok(Self { max_concurrency })
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Downloads every item with at most `max_concurrency` in flight and
    /// returns one outcome per item, indexed like `items`.
    ///
    /// There is no cancellation: the call returns only after every item reported.
    pub async fn run<C: LibraryClient>(
        &self,
        client: Arc<C>,
        items: &[NamedItem],
        log: Arc<RunLog>,
    ) -> Vec<DownloadOutcome> {
        let mut slots: Vec<Option<DownloadOutcome>> = vec![None; items.len()];
        let mut pending = items.iter().cloned().enumerate();
        let mut join_set = JoinSet::new();

        loop {
            while join_set.len() < self.max_concurrency {
                let Some((idx, item)) = pending.next() else {
                    break;
                };
                let client = Arc::clone(&client);
                let log = Arc::clone(&log);
                join_set.spawn(async move { (idx, worker::download_item(client, item, log).await) });
            }

            let Some(res) = join_set.join_next().await else {
                break;
            };
            match res {
                Ok((idx, outcome)) => slots[idx] = Some(outcome),
                Err(e) => tracing::error!("worker task join: {}", e),
            }
        }

        slots
            .into_iter()
            .zip(items)
            .map(|(slot, item)| {
                slot.unwrap_or_else(|| {
                    let reason = "worker task ended without reporting".to_string();
                    log.error(format!("Failed to download {}: {}", item.title(), reason));
                    DownloadOutcome::Failure {
                        title: item.title().to_string(),
                        reason,
                    }
                })
            })
            .collect()
    }
}
