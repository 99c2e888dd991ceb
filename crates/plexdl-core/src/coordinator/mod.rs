//! Batch coordinator: owns one run end to end.
//!
//! `Initializing` (validate, switch account, look up the collection, create
//! the destination, sort, name, apply the collision policy) → `Previewing`
//! (confirmation gate) → `Downloading` (worker pool) → `Finalized` (summary).
//! Names are resolved once, before the first fetch, and never recomputed.

mod request;
mod summary;

pub use request::RunRequest;
pub use summary::RunSummary;
pub use crate::worker::DownloadOutcome;

use std::sync::Arc;

use crate::error::{LibraryError, RunError};
use crate::library::LibraryClient;
use crate::naming::{self, NamedItem};
use crate::run_log::RunLog;
use crate::scheduler::WorkerPool;
use crate::worker;

/// Lifecycle of a run. Transitions never skip a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Initializing,
    Previewing,
    Downloading,
    Finalized,
}

/// Gate between `Previewing` and `Downloading`. Receives the full resolved
/// item list; returning `false` keeps the run in `Previewing`.
pub trait Confirm {
    fn confirm(&self, items: &[NamedItem]) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&[NamedItem]) -> bool,
{
    fn confirm(&self, items: &[NamedItem]) -> bool {
        self(items)
    }
}

/// A setup step that talks to the library before anything is previewed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupStep<'a> {
    SwitchAccount(&'a str),
    LoadCollection(&'a str),
}

/// Observer for setup steps (console progress labels and the like).
pub trait Progress: Send + Sync {
    fn started(&self, _step: SetupStep<'_>) {}
    fn finished(&self, _step: SetupStep<'_>, _ok: bool) {}
}

/// Progress observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl Progress for Silent {}

/// Gate that always proceeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoConfirm;

impl Confirm for AutoConfirm {
    fn confirm(&self, _items: &[NamedItem]) -> bool {
        true
    }
}

pub struct BatchCoordinator<C: LibraryClient> {
    client: Arc<C>,
    log: Arc<RunLog>,
    progress: Arc<dyn Progress>,
    state: RunState,
}

impl<C: LibraryClient> BatchCoordinator<C> {
    pub fn new(client: Arc<C>, log: Arc<RunLog>) -> Self {
        Self {
            client,
            log,
            progress: Arc::new(Silent),
            state: RunState::Initializing,
        }
    }

    pub fn with_progress(mut self, progress: Arc<dyn Progress>) -> Self {
        self.progress = progress;
        self
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Client in use (the switched account after a run with `switch_account`).
    pub fn client(&self) -> &Arc<C> {
        &self.client
    }

    /// Runs the pipeline for `request`.
    ///
    /// Returns `Ok(None)` when the gate declines (state stays `Previewing`,
    /// nothing is fetched). Setup failures are logged to the run log and
    /// returned before any download starts; per-item failures are only in the summary.
    pub async fn run<G: Confirm + ?Sized>(
        &mut self,
        request: &RunRequest,
        gate: &G,
    ) -> Result<Option<RunSummary>, RunError> {
        self.state = RunState::Initializing;
        let result = self.run_inner(request, gate).await;
        if let Err(e) = &result {
            tracing::error!("run aborted: {}", e);
            self.log.error(format!("Run aborted: {}", e));
        }
        result
    }

    async fn run_inner<G: Confirm + ?Sized>(
        &mut self,
        request: &RunRequest,
        gate: &G,
    ) -> Result<Option<RunSummary>, RunError> {
        let pool = WorkerPool::new(request.max_concurrency)?;

        if let Some(account) = &request.switch_account {
            let step = SetupStep::SwitchAccount(account);
            let target = account.clone();
            let switched = self
                .observed(step, move |c| c.switch_account(&target))
                .await?;
            self.client = Arc::new(switched);
            self.log.info(format!("Switched to managed account {}", account));
        }

        let name = request.collection.clone();
        let collection = self
            .observed(SetupStep::LoadCollection(&request.collection), move |c| {
                c.collection(&name)
            })
            .await?;
        self.log.info(format!(
            "Playlist {}: {} items",
            collection.title,
            collection.items.len()
        ));

        let directory = request.destination(&collection.title);
        worker::ensure_directory(&directory).map_err(|source| RunError::Io {
            path: directory.clone(),
            source,
        })?;

        let mut assets = collection.items;
        if let Some(key) = &request.order_by {
            naming::sort_by_attribute(&mut assets, key)?;
        }

        let mut items = naming::resolve_items(assets, &directory, request.naming);
        for c in naming::apply_collision_policy(&mut items, request.collisions)? {
            self.log.warn(format!(
                "{} items resolve to {} ({})",
                c.titles.len(),
                c.name,
                request.collisions
            ));
        }

        self.state = RunState::Previewing;
        if !request.confirmed && !gate.confirm(&items) {
            tracing::info!("run not confirmed; nothing downloaded");
            return Ok(None);
        }

        self.state = RunState::Downloading;
        tracing::info!(
            items = items.len(),
            workers = pool.max_concurrency(),
            dir = %directory.display(),
            "downloading"
        );
        let outcomes = pool
            .run(Arc::clone(&self.client), &items, Arc::clone(&self.log))
            .await;

        let summary = RunSummary::new(collection.title, directory, items, outcomes);
        self.log.info(format!(
            "Finished {}: {} downloaded, {} failed",
            summary.collection, summary.succeeded, summary.failed
        ));
        self.state = RunState::Finalized;
        Ok(Some(summary))
    }
}

impl<C: LibraryClient> BatchCoordinator<C> {
    /// [`call_library`] bracketed by progress notifications.
    async fn observed<T, F>(&self, step: SetupStep<'_>, f: F) -> Result<T, RunError>
    where
        T: Send + 'static,
        F: FnOnce(&C) -> Result<T, LibraryError> + Send + 'static,
    {
        self.progress.started(step);
        let result = call_library(Arc::clone(&self.client), f).await;
        self.progress.finished(step, result.is_ok());
        result
    }
}

/// Runs a blocking library call off the coordinating task.
async fn call_library<C, T, F>(client: Arc<C>, f: F) -> Result<T, RunError>
where
    C: LibraryClient,
    T: Send + 'static,
    F: FnOnce(&C) -> Result<T, LibraryError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || f(client.as_ref()))
        .await
        .map_err(|e| LibraryError::Connection(format!("library call did not complete: {}", e)))?
        .map_err(RunError::from)
}
