//! Download worker: one asset fetch plus atomic placement.
//!
//! A worker never fails the batch. Whatever goes wrong becomes a
//! [`DownloadOutcome::Failure`] and an ERROR line in the run log.

mod place;

pub use place::{ensure_directory, place_file, staging_dir, STAGING_PREFIX};

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;

use crate::library::LibraryClient;
use crate::naming::{NamedItem, TargetName};
use crate::run_log::RunLog;

/// Result of one download attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    Success { path: PathBuf },
    Failure { title: String, reason: String },
}

impl DownloadOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, DownloadOutcome::Success { .. })
    }
}

/// Fetches `item` into a staging directory under its destination and renames
/// it into place. Blocking; returns the final path.
pub fn fetch_and_place<C: LibraryClient + ?Sized>(client: &C, item: &NamedItem) -> Result<PathBuf> {
    ensure_directory(&item.directory)
        .with_context(|| format!("failed to create {}", item.directory.display()))?;
    let staging = staging_dir(&item.directory)?;

    let fetched = client.fetch_asset(&item.asset, staging.path())?;

    let final_path = match &item.target {
        TargetName::Resolved(name) => item.directory.join(name),
        TargetName::Original => {
            let name = fetched.file_name().with_context(|| {
                format!("fetched path {} has no file name", fetched.display())
            })?;
            item.directory.join(name)
        }
    };
    place_file(&fetched, &final_path)?;
    Ok(final_path)
}

/// Runs [`fetch_and_place`] on the blocking pool and turns the result into an
/// outcome. Every outcome is also written to `log`.
pub async fn download_item<C: LibraryClient>(
    client: Arc<C>,
    item: NamedItem,
    log: Arc<RunLog>,
) -> DownloadOutcome {
    let title = item.title().to_string();
    let joined = tokio::task::spawn_blocking(move || fetch_and_place(client.as_ref(), &item)).await;

    let outcome = match joined {
        Ok(Ok(path)) => DownloadOutcome::Success { path },
        Ok(Err(e)) => DownloadOutcome::Failure {
            title: title.clone(),
            reason: format!("{:#}", e),
        },
        Err(e) => DownloadOutcome::Failure {
            title: title.clone(),
            reason: format!("worker panicked: {}", e),
        },
    };

    match &outcome {
        DownloadOutcome::Success { path } => {
            tracing::debug!(title = %title, path = %path.display(), "download placed");
            log.info(format!("Downloaded {} to {}", title, path.display()));
        }
        DownloadOutcome::Failure { reason, .. } => {
            tracing::warn!(title = %title, "download failed: {}", reason);
            log.error(format!("Failed to download {}: {}", title, reason));
        }
    }
    outcome
}
